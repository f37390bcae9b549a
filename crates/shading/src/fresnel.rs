//! Fresnel reflectance terms for dielectric and conductor interfaces.

use math::Rgb;

pub trait Fresnel {
	fn eval(&self, cos_i: f32) -> Rgb;
}

/// A dielectric (non-conducting, e.g. glass/water) interface.
#[derive(Clone, Copy)]
pub struct FresnelDielectric {
	pub eta_i: f32,
	pub eta_t: f32,
}

impl Fresnel for FresnelDielectric {
	fn eval(&self, cos_i: f32) -> Rgb {
		Rgb::splat(fresnel_dielectric(cos_i, self.eta_i, self.eta_t))
	}
}

pub fn fresnel_dielectric(cos_theta_i: f32, eta_i: f32, eta_t: f32) -> f32 {
	let cos_i = cos_theta_i.clamp(-1.0, 1.0);

	let (eta_i, eta_t, cos_i) = if cos_i > 0.0 {
		(eta_i, eta_t, cos_i)
	} else {
		(eta_t, eta_i, -cos_i)
	};

	let sin_t = eta_i / eta_t * (1.0 - cos_i * cos_i).max(0.0).sqrt();
	if sin_t >= 1.0 {
		return 1.0;
	}

	let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

	let r_parl = ((eta_t * cos_i) - (eta_i * cos_t)) / ((eta_t * cos_i) + (eta_i * cos_t));
	let r_perp = ((eta_i * cos_i) - (eta_t * cos_t)) / ((eta_i * cos_i) + (eta_t * cos_t));

	(r_parl * r_parl + r_perp * r_perp) / 2.0
}

/// A conductor (metal) interface, parameterized by complex IOR `eta + i*k`.
#[derive(Clone, Copy)]
pub struct FresnelConductor {
	pub eta: Rgb,
	pub k: Rgb,
}

impl Fresnel for FresnelConductor {
	fn eval(&self, cos_i: f32) -> Rgb {
		Rgb::new(
			fresnel_conductor(cos_i, self.eta.r, self.k.r),
			fresnel_conductor(cos_i, self.eta.g, self.k.g),
			fresnel_conductor(cos_i, self.eta.b, self.k.b),
		)
	}
}

fn fresnel_conductor(cos_theta_i: f32, eta: f32, k: f32) -> f32 {
	let cos_i2 = cos_theta_i * cos_theta_i;
	let sin_i2 = 1.0 - cos_i2;
	let eta2 = eta * eta;
	let k2 = k * k;

	let t0 = eta2 - k2 - sin_i2;
	let a2_plus_b2 = (t0 * t0 + 4.0 * eta2 * k2).max(0.0).sqrt();
	let t1 = a2_plus_b2 + cos_i2;
	let a = (0.5 * (a2_plus_b2 + t0)).max(0.0).sqrt();
	let t2 = 2.0 * a * cos_theta_i;
	let rs = (t1 - t2) / (t1 + t2);

	let t3 = cos_i2 * a2_plus_b2 + sin_i2 * sin_i2;
	let t4 = t2 * sin_i2;
	let rp = rs * (t3 - t4) / (t3 + t4);

	0.5 * (rp + rs)
}

/// A no-op Fresnel term for BxDFs that don't model an interface (e.g. diffuse).
#[derive(Clone, Copy, Default)]
pub struct FresnelNoOp;

impl Fresnel for FresnelNoOp {
	fn eval(&self, _cos_i: f32) -> Rgb {
		Rgb::WHITE
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normal_incidence_on_glass_matches_schlick_approximation() {
		let r0 = ((1.0 - 1.5) / (1.0 + 1.5)).powi(2);
		let f = fresnel_dielectric(1.0, 1.0, 1.5);
		assert!((f - r0).abs() < 1e-4);
	}

	#[test]
	fn grazing_angle_reflects_fully() {
		let f = fresnel_dielectric(0.0, 1.0, 1.5);
		assert!((f - 1.0).abs() < 1e-4);
	}

	#[test]
	fn total_internal_reflection_returns_one() {
		let f = fresnel_dielectric(0.05, 1.5, 1.0);
		assert!((f - 1.0).abs() < 1e-4);
	}
}
