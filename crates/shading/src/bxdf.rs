//! BxDFs operate entirely in the shading-local frame, where `+z` is the
//! shading normal and `cos_theta = w.z`. The [`crate::bsdf::Bsdf`] rotates
//! world-space directions into this frame before calling in.

use math::sampling::cosine_sample_hemisphere;
use math::{Rgb, Vec3};

use crate::fresnel::{fresnel_dielectric, Fresnel, FresnelConductor, FresnelDielectric, FresnelNoOp};

bitflags::bitflags! {
	#[derive(Clone, Copy, PartialEq, Eq, Debug)]
	pub struct BxdfFlags: u8 {
		const REFLECTION   = 1 << 0;
		const TRANSMISSION = 1 << 1;
		const DIFFUSE      = 1 << 2;
		const GLOSSY       = 1 << 3;
		const SPECULAR     = 1 << 4;
	}
}

pub fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
	a.z * b.z > 0.0
}

pub fn cos_theta(w: Vec3) -> f32 {
	w.z
}

pub trait Bxdf {
	fn flags(&self) -> BxdfFlags;

	fn eval(&self, wo: Vec3, wi: Vec3) -> Rgb;

	fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
		if same_hemisphere(wo, wi) {
			cos_theta(wi).abs() * std::f32::consts::FRAC_1_PI
		} else {
			0.0
		}
	}

	/// Returns `(wi, f, pdf)`. The default implementation draws a
	/// cosine-weighted direction, correct for purely diffuse lobes.
	fn sample(&self, wo: Vec3, u: (f32, f32)) -> (Vec3, Rgb, f32) {
		let (mut wi, pdf) = cosine_sample_hemisphere(u);
		if wo.z < 0.0 {
			wi.z = -wi.z;
		}
		(wi, self.eval(wo, wi), pdf)
	}
}

/// Perfectly diffuse (Lambertian) reflection: `f = R / pi`.
#[derive(Clone, Copy)]
pub struct Lambertian {
	pub reflectance: Rgb,
}

impl Bxdf for Lambertian {
	fn flags(&self) -> BxdfFlags {
		BxdfFlags::REFLECTION | BxdfFlags::DIFFUSE
	}

	fn eval(&self, wo: Vec3, wi: Vec3) -> Rgb {
		if !same_hemisphere(wo, wi) {
			return Rgb::BLACK;
		}
		self.reflectance * std::f32::consts::FRAC_1_PI
	}
}

/// Rough diffuse reflection accounting for microfacet shadowing/masking,
/// parameterized by standard deviation `sigma` (degrees).
#[derive(Clone, Copy)]
pub struct OrenNayar {
	pub reflectance: Rgb,
	a: f32,
	b: f32,
}

impl OrenNayar {
	pub fn new(reflectance: Rgb, sigma_degrees: f32) -> Self {
		let sigma = sigma_degrees.to_radians();
		let sigma2 = sigma * sigma;
		let a = 1.0 - sigma2 / (2.0 * (sigma2 + 0.33));
		let b = 0.45 * sigma2 / (sigma2 + 0.09);
		Self { reflectance, a, b }
	}
}

impl Bxdf for OrenNayar {
	fn flags(&self) -> BxdfFlags {
		BxdfFlags::REFLECTION | BxdfFlags::DIFFUSE
	}

	fn eval(&self, wo: Vec3, wi: Vec3) -> Rgb {
		if !same_hemisphere(wo, wi) {
			return Rgb::BLACK;
		}

		let sin_theta_i = sin_theta(wi);
		let sin_theta_o = sin_theta(wo);

		let max_cos = if sin_theta_i > 1e-4 && sin_theta_o > 1e-4 {
			let sin_phi_i = sin_phi(wi);
			let cos_phi_i = cos_phi(wi);
			let sin_phi_o = sin_phi(wo);
			let cos_phi_o = cos_phi(wo);
			(cos_phi_i * cos_phi_o + sin_phi_i * sin_phi_o).max(0.0)
		} else {
			0.0
		};

		let (sin_alpha, tan_beta) = if cos_theta(wi).abs() > cos_theta(wo).abs() {
			(sin_theta_o, sin_theta_i / cos_theta(wi).abs())
		} else {
			(sin_theta_i, sin_theta_o / cos_theta(wo).abs())
		};

		self.reflectance * std::f32::consts::FRAC_1_PI * (self.a + self.b * max_cos * sin_alpha * tan_beta)
	}
}

fn sin_theta(w: Vec3) -> f32 {
	(1.0 - w.z * w.z).max(0.0).sqrt()
}

fn cos_phi(w: Vec3) -> f32 {
	let s = sin_theta(w);
	if s == 0.0 { 1.0 } else { (w.x / s).clamp(-1.0, 1.0) }
}

fn sin_phi(w: Vec3) -> f32 {
	let s = sin_theta(w);
	if s == 0.0 { 0.0 } else { (w.y / s).clamp(-1.0, 1.0) }
}

/// A delta-function mirror: zero everywhere except the reflected direction.
#[derive(Clone, Copy)]
pub struct SpecularReflection<F: Fresnel> {
	pub reflectance: Rgb,
	pub fresnel: F,
}

impl SpecularReflection<FresnelDielectric> {
	pub fn dielectric(reflectance: Rgb, eta_i: f32, eta_t: f32) -> Self {
		Self { reflectance, fresnel: FresnelDielectric { eta_i, eta_t } }
	}
}

impl SpecularReflection<FresnelConductor> {
	pub fn conductor(reflectance: Rgb, eta: Rgb, k: Rgb) -> Self {
		Self { reflectance, fresnel: FresnelConductor { eta, k } }
	}
}

impl<F: Fresnel> Bxdf for SpecularReflection<F> {
	fn flags(&self) -> BxdfFlags {
		BxdfFlags::REFLECTION | BxdfFlags::SPECULAR
	}

	fn eval(&self, _wo: Vec3, _wi: Vec3) -> Rgb {
		Rgb::BLACK
	}

	fn pdf(&self, _wo: Vec3, _wi: Vec3) -> f32 {
		0.0
	}

	fn sample(&self, wo: Vec3, _u: (f32, f32)) -> (Vec3, Rgb, f32) {
		let wi = Vec3::new(-wo.x, -wo.y, wo.z);
		let f = self.fresnel.eval(cos_theta(wi)) * self.reflectance / cos_theta(wi).abs();
		(wi, f, 1.0)
	}
}

/// Delta-function refraction through a dielectric interface.
#[derive(Clone, Copy)]
pub struct SpecularTransmission {
	pub transmittance: Rgb,
	pub eta_a: f32,
	pub eta_b: f32,
}

impl Bxdf for SpecularTransmission {
	fn flags(&self) -> BxdfFlags {
		BxdfFlags::TRANSMISSION | BxdfFlags::SPECULAR
	}

	fn eval(&self, _wo: Vec3, _wi: Vec3) -> Rgb {
		Rgb::BLACK
	}

	fn pdf(&self, _wo: Vec3, _wi: Vec3) -> f32 {
		0.0
	}

	fn sample(&self, wo: Vec3, _u: (f32, f32)) -> (Vec3, Rgb, f32) {
		let entering = cos_theta(wo) > 0.0;
		let (eta_i, eta_t) = if entering { (self.eta_a, self.eta_b) } else { (self.eta_b, self.eta_a) };

		let Some(wi) = refract(wo, Vec3::new(0.0, 0.0, if entering { 1.0 } else { -1.0 }), eta_i / eta_t) else {
			return (Vec3::ZERO, Rgb::BLACK, 0.0);
		};

		let f = fresnel_dielectric(cos_theta(wi), eta_i, eta_t);
		let ft = self.transmittance * (1.0 - f) / cos_theta(wi).abs();
		(wi, ft, 1.0)
	}
}

fn refract(wi: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
	let cos_theta_i = n.dot(wi);
	let sin2_theta_i = (1.0 - cos_theta_i * cos_theta_i).max(0.0);
	let sin2_theta_t = eta * eta * sin2_theta_i;
	if sin2_theta_t >= 1.0 {
		return None;
	}
	let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
	Some(-wi * eta + n * (eta * cos_theta_i - cos_theta_t))
}

/// Torrance-Sparrow microfacet model with a Blinn distribution.
#[derive(Clone, Copy)]
pub struct TorranceSparrow<F: Fresnel> {
	pub reflectance: Rgb,
	pub exponent: f32,
	pub fresnel: F,
}

impl<F: Fresnel> TorranceSparrow<F> {
	fn distribution(&self, wh: Vec3) -> f32 {
		let cos_theta_h = cos_theta(wh).abs();
		(self.exponent + 2.0) * std::f32::consts::FRAC_1_PI * 0.5 * cos_theta_h.powf(self.exponent)
	}

	fn geometry(&self, wo: Vec3, wi: Vec3, wh: Vec3) -> f32 {
		let n_dot_wh = cos_theta(wh).abs();
		let n_dot_wo = cos_theta(wo).abs();
		let n_dot_wi = cos_theta(wi).abs();
		let wo_dot_wh = wo.dot(wh).abs();

		(1.0f32)
			.min(2.0 * n_dot_wh * n_dot_wo / wo_dot_wh)
			.min(2.0 * n_dot_wh * n_dot_wi / wo_dot_wh)
	}
}

impl<F: Fresnel> Bxdf for TorranceSparrow<F> {
	fn flags(&self) -> BxdfFlags {
		BxdfFlags::REFLECTION | BxdfFlags::GLOSSY
	}

	fn eval(&self, wo: Vec3, wi: Vec3) -> Rgb {
		let cos_theta_o = cos_theta(wo).abs();
		let cos_theta_i = cos_theta(wi).abs();
		if cos_theta_o == 0.0 || cos_theta_i == 0.0 || !same_hemisphere(wo, wi) {
			return Rgb::BLACK;
		}

		let wh = wo + wi;
		if wh.length_sq() == 0.0 {
			return Rgb::BLACK;
		}
		let wh = *wh.normalize();

		let d = self.distribution(wh);
		let g = self.geometry(wo, wi, wh);
		let f = self.fresnel.eval(wi.dot(wh));

		self.reflectance * f * (d * g / (4.0 * cos_theta_i * cos_theta_o))
	}

	fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
		if !same_hemisphere(wo, wi) {
			return 0.0;
		}
		let wh = *(wo + wi).normalize();
		let cos_theta_h = cos_theta(wh).abs();
		let pdf_wh = (self.exponent + 1.0) * cos_theta_h.powf(self.exponent) * std::f32::consts::FRAC_1_PI * 0.5;
		pdf_wh / (4.0 * wo.dot(wh).abs())
	}

	fn sample(&self, wo: Vec3, u: (f32, f32)) -> (Vec3, Rgb, f32) {
		let cos_theta_h = u.0.powf(1.0 / (self.exponent + 1.0));
		let sin_theta_h = (1.0 - cos_theta_h * cos_theta_h).max(0.0).sqrt();
		let phi = std::f32::consts::TAU * u.1;

		let wh = Vec3::new(sin_theta_h * phi.cos(), sin_theta_h * phi.sin(), cos_theta_h);
		let wh = if wo.z < 0.0 { -wh } else { wh };

		let wi = -wo + wh * (2.0 * wo.dot(wh));
		if !same_hemisphere(wo, wi) {
			return (wi, Rgb::BLACK, 0.0);
		}

		(wi, self.eval(wo, wi), self.pdf(wo, wi))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lambertian_is_energy_conserving_below_albedo_one() {
		let bxdf = Lambertian { reflectance: Rgb::splat(0.5) };
		let wo = Vec3::new(0.0, 0.0, 1.0);
		let wi = Vec3::new(0.0, 0.0, 1.0);
		let f = bxdf.eval(wo, wi);
		assert!(f.r <= std::f32::consts::FRAC_1_PI * 0.5 + 1e-5);
	}

	#[test]
	fn specular_reflection_mirrors_direction() {
		let bxdf = SpecularReflection::dielectric(Rgb::WHITE, 1.0, 1.5);
		let wo = Vec3::new(0.3, 0.4, 0.8).normalize();
		let (wi, _, pdf) = bxdf.sample(*wo, (0.0, 0.0));
		assert!((wi.x - (-wo.x)).abs() < 1e-5);
		assert!((wi.y - (-wo.y)).abs() < 1e-5);
		assert!((pdf - 1.0).abs() < 1e-6);
	}

	#[test]
	fn torrance_sparrow_sample_matches_its_own_pdf() {
		let bxdf = TorranceSparrow { reflectance: Rgb::WHITE, exponent: 20.0, fresnel: FresnelNoOp };
		let wo = Vec3::new(0.1, 0.2, 0.97).normalize();
		let (wi, _, pdf) = bxdf.sample(*wo, (0.3, 0.6));
		if pdf > 0.0 {
			let pdf2 = bxdf.pdf(*wo, wi);
			assert!((pdf - pdf2).abs() < 1e-3);
		}
	}
}
