//! Light sources. Delta lights (point, directional) have no surface to
//! sample, so their radiance and PDF are the same regardless of `u`; area
//! lights sample a point on their owning shape via
//! [`geometry::Instance::sample_from`]/`pdf_from`.
//!
//! Grounded in `PointLight`/`DirectionalLight`/`AreaLight` in `Light.cpp`.

use math::{Rgb, Unit, Vec3};

/// Result of sampling a light from a shading point: incident radiance along
/// `wi`, the PDF (solid angle at the shading point), and the point on the
/// light used to build the occlusion ray.
pub struct LightSample {
	pub radiance: Rgb,
	pub wi: Unit<Vec3>,
	pub pdf: f32,
	pub light_point: Vec3,
}

pub enum Light {
	Point { position: Vec3, intensity: Rgb },
	Directional { direction: Unit<Vec3>, radiance: Rgb },
	Area { instance: usize, radiance: Rgb, samples: u32 },
}

impl Light {
	/// Delta lights have zero probability of being hit by a BSDF sample, so
	/// integrators must skip the BSDF half of MIS for them.
	pub fn is_delta(&self) -> bool {
		matches!(self, Light::Point { .. } | Light::Directional { .. })
	}

	/// Samples declared for `Sample_All_Uniform` (area lights declare more
	/// than one to reduce variance; delta lights always resolve in one).
	pub fn num_samples(&self) -> u32 {
		match self {
			Light::Area { samples, .. } => *samples,
			_ => 1,
		}
	}

	pub fn sample_li(&self, scene: &crate::scene::Scene, pt: Vec3, u: (f32, f32)) -> LightSample {
		match *self {
			Light::Point { position, intensity } => {
				let to_light = position - pt;
				let dist_sq = to_light.length_sq().max(1e-12);
				let wi = *to_light.normalize();
				LightSample { radiance: intensity / dist_sq, wi: Unit::new_unchecked(wi), pdf: 1.0, light_point: position }
			}
			Light::Directional { direction, radiance } => {
				let wi = -*direction;
				LightSample { radiance, wi: Unit::new_unchecked(wi), pdf: 1.0, light_point: pt + wi * 1e6 }
			}
			Light::Area { instance, radiance, .. } => {
				let inst = &scene.instances[instance];
				let (p, n, pdf) = inst.sample_from(pt, u);
				let to_light = p - pt;
				let dist_sq = to_light.length_sq();
				if pdf <= 0.0 || dist_sq < 1e-12 {
					return LightSample { radiance: Rgb::BLACK, wi: Unit::new_unchecked(Vec3::new(0.0, 0.0, 1.0)), pdf: 0.0, light_point: p };
				}
				let wi = *to_light.normalize();
				let emits = n.dot(-wi) > 0.0;
				let radiance = if emits { radiance } else { Rgb::BLACK };
				LightSample { radiance, wi: Unit::new_unchecked(wi), pdf, light_point: p }
			}
		}
	}

	/// PDF (solid angle at `pt`) of sampling direction `wi` towards this
	/// light; zero for delta lights, which can never be hit by a BSDF sample.
	pub fn pdf_li(&self, scene: &crate::scene::Scene, pt: Vec3, wi: Unit<Vec3>) -> f32 {
		match self {
			Light::Point { .. } | Light::Directional { .. } => 0.0,
			Light::Area { instance, .. } => scene.instances[*instance].pdf_from(pt, wi),
		}
	}

	/// Total emitted power, used to weight `Sample_One_Uniform`'s light
	/// selection. `scene_radius` bounds directional lights, which otherwise
	/// have no natural area to integrate over.
	pub fn power(&self, scene_radius: f32) -> Rgb {
		match self {
			Light::Point { intensity, .. } => *intensity * (4.0 * std::f32::consts::PI),
			Light::Directional { radiance, .. } => *radiance * (std::f32::consts::PI * scene_radius * scene_radius),
			Light::Area { instance: _, radiance, .. } => *radiance * std::f32::consts::PI,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_light_falls_off_with_inverse_square_distance() {
		let light = Light::Point { position: Vec3::new(0.0, 2.0, 0.0), intensity: Rgb::WHITE };
		let near = light.power(1.0);
		assert!(near.r > 0.0);
		assert!(light.is_delta());
	}

	#[test]
	fn directional_light_points_opposite_its_direction() {
		let light = Light::Directional { direction: Unit::new_unchecked(Vec3::new(0.0, -1.0, 0.0)), radiance: Rgb::WHITE };
		assert!(light.is_delta());
	}
}
