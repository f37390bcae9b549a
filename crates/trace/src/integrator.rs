//! Surface integrators: Whitted (analytic direct + recursive specular),
//! direct-lighting (multiple importance sampling over one strategy), and
//! path (Russian-roulette throughput tracking).
//!
//! Grounded in `WhittedIntegrator::Li`, `DirectLightingIntegrator::Li`,
//! `PathIntegrator::Li` and their shared `EstimateDirect`/
//! `UniformSampleOneLight`/`UniformSampleAllLights`/`SpecularReflect`/
//! `SpecularTransmit` helpers in `Integrator.cpp`.

use geometry::shape::DifferentialGeometry;
use geometry::{Ray, RayDifferential};
use math::{Arena, Rgb, Rng, Unit, Vec3};
use shading::bsdf::power_heuristic;
use shading::{bxdfs_for, Bsdf, BxdfFlags, Material};

use crate::light::Light;
use crate::scene::Scene;

/// How a surface's direct lighting is estimated: sum every light each frame,
/// or pick one light at random and scale its contribution by the light
/// count (cheaper per-sample, same expectation).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LightStrategy {
	SampleAllUniform,
	SampleOneUniform,
}

pub trait Integrator: Send + Sync {
	fn li(&self, scene: &Scene, ray: RayDifferential, rng: &mut Rng, arena: &Arena) -> Rgb;
}

fn eta_of(material: &Material) -> f32 {
	match *material {
		Material::Glass { eta, .. } => eta,
		_ => 1.0,
	}
}

/// Emitted radiance towards `w` if `instance` is an area light's shape and
/// `w` is on the emissive side; black otherwise.
fn emitted(scene: &Scene, instance: usize, dg: &DifferentialGeometry, w: Vec3) -> Rgb {
	for light in &scene.lights {
		if let Light::Area { instance: light_instance, radiance, .. } = light {
			if *light_instance == instance {
				return if dg.normal.dot(w) > 0.0 { *radiance } else { Rgb::BLACK };
			}
		}
	}
	Rgb::BLACK
}

fn unoccluded(scene: &Scene, p: Vec3, light_point: Vec3) -> bool {
	let to_light = light_point - p;
	let dist = to_light.length();
	if dist < 1e-4 {
		return true;
	}
	let wi = *to_light.normalize();
	let ray = Ray { origin: p, dir: wi, t_min: 1e-4, t_max: dist * (1.0 - 1e-3), depth: 0 };
	!scene.intersect_p(ray)
}

/// One light's contribution to reflected radiance at `p`, combining one
/// light sample and one BSDF sample with the power heuristic; skips the BSDF
/// half for delta lights, which a BSDF sample can never hit.
fn estimate_direct(scene: &Scene, light: &Light, p: Vec3, n: Vec3, wo: Vec3, bsdf: &Bsdf, rng: &mut Rng) -> Rgb {
	let flags = BxdfFlags::all() - BxdfFlags::SPECULAR;
	let mut ld = Rgb::BLACK;

	let u_light = (rng.next_f32(), rng.next_f32());
	let light_sample = light.sample_li(scene, p, u_light);

	if light_sample.pdf > 0.0 && !light_sample.radiance.is_black() {
		let wi = *light_sample.wi;
		let f = bsdf.eval(wo, wi, flags);
		if !f.is_black() && unoccluded(scene, p, light_sample.light_point) {
			if light.is_delta() {
				ld += f.cmul(light_sample.radiance) * (wi.dot(n).abs() / light_sample.pdf);
			} else {
				let bsdf_pdf = bsdf.pdf(wo, wi, flags);
				let weight = power_heuristic(1, light_sample.pdf, 1, bsdf_pdf);
				ld += f.cmul(light_sample.radiance) * (wi.dot(n).abs() * weight / light_sample.pdf);
			}
		}
	}

	if !light.is_delta() {
		let u_component = rng.next_f32();
		let u_bsdf = (rng.next_f32(), rng.next_f32());
		if let Some((wi, f, bsdf_pdf, sampled_flags)) = bsdf.sample(wo, u_component, u_bsdf, flags) {
			if !f.is_black() && bsdf_pdf > 0.0 {
				let weight = if sampled_flags.contains(BxdfFlags::SPECULAR) {
					1.0
				} else {
					let light_pdf = light.pdf_li(scene, p, Unit::new_unchecked(wi));
					if light_pdf == 0.0 {
						return ld;
					}
					power_heuristic(1, bsdf_pdf, 1, light_pdf)
				};

				let shadow_ray = Ray::new(p, wi);
				let li = match scene.intersect(shadow_ray) {
					Some((_, hit_dg, hit_instance)) => {
						if matches!(light, Light::Area { instance, .. } if *instance == hit_instance) {
							emitted(scene, hit_instance, &hit_dg, -wi)
						} else {
							Rgb::BLACK
						}
					}
					None => Rgb::BLACK,
				};

				if !li.is_black() {
					ld += f.cmul(li) * (wi.dot(n).abs() * weight / bsdf_pdf);
				}
			}
		}
	}

	ld
}

fn uniform_sample_one_light(scene: &Scene, p: Vec3, n: Vec3, wo: Vec3, bsdf: &Bsdf, rng: &mut Rng) -> Rgb {
	let n_lights = scene.lights.len();
	if n_lights == 0 {
		return Rgb::BLACK;
	}
	let idx = ((rng.next_f32() * n_lights as f32) as usize).min(n_lights - 1);
	estimate_direct(scene, &scene.lights[idx], p, n, wo, bsdf, rng) * n_lights as f32
}

fn uniform_sample_all_lights(scene: &Scene, p: Vec3, n: Vec3, wo: Vec3, bsdf: &Bsdf, rng: &mut Rng) -> Rgb {
	let mut l = Rgb::BLACK;
	for light in &scene.lights {
		let samples = light.num_samples().max(1);
		let mut ld = Rgb::BLACK;
		for _ in 0..samples {
			ld += estimate_direct(scene, light, p, n, wo, bsdf, rng);
		}
		l += ld / samples as f32;
	}
	l
}

fn specular_reflect(integrator: &dyn Integrator, scene: &Scene, ray: &RayDifferential, bsdf: &Bsdf, dg: &DifferentialGeometry, rng: &mut Rng, arena: &Arena) -> Rgb {
	let wo = -ray.ray.dir;
	let u_component = rng.next_f32();
	let u = (rng.next_f32(), rng.next_f32());

	let Some((wi, f, pdf, _)) = bsdf.sample(wo, u_component, u, BxdfFlags::REFLECTION | BxdfFlags::SPECULAR) else {
		return Rgb::BLACK;
	};
	if f.is_black() || pdf == 0.0 || wi.dot(dg.normal).abs() == 0.0 {
		return Rgb::BLACK;
	}

	let mut next_ray = Ray::new(dg.point, wi);
	next_ray.depth = ray.ray.depth + 1;
	let li = integrator.li(scene, RayDifferential::new(next_ray), rng, arena);
	f.cmul(li) * (wi.dot(dg.normal).abs() / pdf)
}

fn specular_transmit(integrator: &dyn Integrator, scene: &Scene, ray: &RayDifferential, bsdf: &Bsdf, dg: &DifferentialGeometry, rng: &mut Rng, arena: &Arena) -> Rgb {
	let wo = -ray.ray.dir;
	let u_component = rng.next_f32();
	let u = (rng.next_f32(), rng.next_f32());

	let Some((wi, f, pdf, _)) = bsdf.sample(wo, u_component, u, BxdfFlags::TRANSMISSION | BxdfFlags::SPECULAR) else {
		return Rgb::BLACK;
	};
	if f.is_black() || pdf == 0.0 || wi.dot(dg.normal).abs() == 0.0 {
		return Rgb::BLACK;
	}

	let mut next_ray = Ray::new(dg.point, wi);
	next_ray.depth = ray.ray.depth + 1;
	let li = integrator.li(scene, RayDifferential::new(next_ray), rng, arena);
	f.cmul(li) * (wi.dot(dg.normal).abs() / pdf)
}

/// Analytic direct lighting (one light sample per light, no MIS) plus
/// recursive specular reflection/transmission.
pub struct WhittedIntegrator {
	pub max_depth: u32,
}

impl Integrator for WhittedIntegrator {
	fn li(&self, scene: &Scene, ray: RayDifferential, rng: &mut Rng, arena: &Arena) -> Rgb {
		let Some((_, dg, instance)) = scene.intersect(ray.ray) else {
			return scene.environment;
		};

		let material = scene.material_for(instance);
		let bxdfs = bxdfs_for(material, arena);
		let bsdf = Bsdf::new(&dg, dg.normal, eta_of(material), &bxdfs);

		let wo = -ray.ray.dir;
		let mut l = emitted(scene, instance, &dg, wo);

		for light in &scene.lights {
			let u = (rng.next_f32(), rng.next_f32());
			let sample = light.sample_li(scene, dg.point, u);
			if sample.radiance.is_black() || sample.pdf == 0.0 {
				continue;
			}
			let wi = *sample.wi;
			let f = bsdf.eval(wo, wi, BxdfFlags::empty());
			if !f.is_black() && unoccluded(scene, dg.point, sample.light_point) {
				l += f.cmul(sample.radiance) * (wi.dot(dg.normal).abs() / sample.pdf);
			}
		}

		if ray.ray.depth + 1 < self.max_depth {
			l += specular_reflect(self, scene, &ray, &bsdf, &dg, rng, arena);
			l += specular_transmit(self, scene, &ray, &bsdf, &dg, rng, arena);
		}
		l
	}
}

/// Direct lighting via `LightStrategy`, with multiple importance sampling
/// between one light sample and one BSDF sample, plus recursive specular
/// branches.
pub struct DirectLightingIntegrator {
	pub max_depth: u32,
	pub strategy: LightStrategy,
}

impl Integrator for DirectLightingIntegrator {
	fn li(&self, scene: &Scene, ray: RayDifferential, rng: &mut Rng, arena: &Arena) -> Rgb {
		let Some((_, dg, instance)) = scene.intersect(ray.ray) else {
			return scene.environment;
		};

		let material = scene.material_for(instance);
		let bxdfs = bxdfs_for(material, arena);
		let bsdf = Bsdf::new(&dg, dg.normal, eta_of(material), &bxdfs);

		let wo = -ray.ray.dir;
		let mut l = emitted(scene, instance, &dg, wo);

		if !scene.lights.is_empty() {
			l += match self.strategy {
				LightStrategy::SampleAllUniform => uniform_sample_all_lights(scene, dg.point, dg.normal, wo, &bsdf, rng),
				LightStrategy::SampleOneUniform => uniform_sample_one_light(scene, dg.point, dg.normal, wo, &bsdf, rng),
			};
		}

		if ray.ray.depth + 1 < self.max_depth {
			l += specular_reflect(self, scene, &ray, &bsdf, &dg, rng, arena);
			l += specular_transmit(self, scene, &ray, &bsdf, &dg, rng, arena);
		}
		l
	}
}

/// Russian-roulette path tracer: adds emission only right after a camera ray
/// or a specular bounce (non-specular bounces already had their direct
/// lighting counted via `UniformSampleOneLight`, so adding `Le` there too
/// would double-count it), otherwise estimates direct lighting at every
/// bounce and randomly terminates once the throughput is small.
pub struct PathIntegrator {
	pub max_depth: u32,
}

impl Integrator for PathIntegrator {
	fn li(&self, scene: &Scene, ray: RayDifferential, rng: &mut Rng, arena: &Arena) -> Rgb {
		let mut beta = Rgb::WHITE;
		let mut l = Rgb::BLACK;
		let mut specular_bounce = true;
		let mut current_ray = ray;
		let mut bounce = 0u32;

		loop {
			let Some((_, dg, instance)) = scene.intersect(current_ray.ray) else {
				if specular_bounce {
					l += beta.cmul(scene.environment);
				}
				break;
			};

			let wo = -current_ray.ray.dir;

			if bounce == 0 || specular_bounce {
				l += beta.cmul(emitted(scene, instance, &dg, wo));
			}

			let material = scene.material_for(instance);
			let bxdfs = bxdfs_for(material, arena);
			let bsdf = Bsdf::new(&dg, dg.normal, eta_of(material), &bxdfs);

			l += beta.cmul(uniform_sample_one_light(scene, dg.point, dg.normal, wo, &bsdf, rng));

			let u_component = rng.next_f32();
			let u = (rng.next_f32(), rng.next_f32());
			let Some((wi, f, pdf, sampled_flags)) = bsdf.sample(wo, u_component, u, BxdfFlags::all()) else {
				break;
			};
			if f.is_black() || pdf == 0.0 {
				break;
			}

			specular_bounce = sampled_flags.contains(BxdfFlags::SPECULAR);
			beta = beta.cmul(f) * (wi.dot(dg.normal).abs() / pdf);

			let mut next_ray = Ray::new(dg.point, wi);
			next_ray.depth = current_ray.ray.depth + 1;
			current_ray = RayDifferential::new(next_ray);

			if bounce > 3 {
				let continue_probability = beta.luminance().min(0.5);
				if rng.next_f32() > continue_probability {
					break;
				}
				beta /= continue_probability;
			}

			bounce += 1;
			if bounce >= self.max_depth {
				break;
			}
		}

		l
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use geometry::shape::Sphere;
	use geometry::{Instance, Shape};
	use math::isometry::Isometry3;

	fn lit_sphere_scene() -> Scene {
		let sphere = Sphere::full(1.0);
		let instance = Instance::new(Shape::Sphere(sphere), Isometry3::identity());
		let material = Material::Matte { reflectance: Rgb::splat(0.8), sigma: 0.0 };
		let light = Light::Point { position: Vec3::new(0.0, 5.0, 0.0), intensity: Rgb::splat(50.0) };
		Scene::new(vec![instance], vec![material], vec![0], vec![light], Rgb::BLACK)
	}

	#[test]
	fn whitted_integrator_lights_a_visible_diffuse_sphere() {
		let scene = lit_sphere_scene();
		let integrator = WhittedIntegrator { max_depth: 2 };
		let arena = Arena::new();
		let mut rng = Rng::new(9);

		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let radiance = integrator.li(&scene, RayDifferential::new(ray), &mut rng, &arena);
		assert!(radiance.luminance() > 0.0);
	}

	#[test]
	fn direct_lighting_integrator_matches_whitted_on_a_diffuse_hit() {
		let scene = lit_sphere_scene();
		let integrator = DirectLightingIntegrator { max_depth: 2, strategy: LightStrategy::SampleAllUniform };
		let arena = Arena::new();
		let mut rng = Rng::new(11);

		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let radiance = integrator.li(&scene, RayDifferential::new(ray), &mut rng, &arena);
		assert!(radiance.luminance() > 0.0);
	}

	#[test]
	fn path_integrator_terminates_and_returns_finite_radiance() {
		let scene = lit_sphere_scene();
		let integrator = PathIntegrator { max_depth: 8 };
		let arena = Arena::new();
		let mut rng = Rng::new(13);

		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let radiance = integrator.li(&scene, RayDifferential::new(ray), &mut rng, &arena);
		assert!(radiance.is_finite());
	}

	#[test]
	fn ray_missing_everything_returns_the_environment_radiance() {
		let sphere = Sphere::full(1.0);
		let instance = Instance::new(Shape::Sphere(sphere), Isometry3::identity());
		let material = Material::Matte { reflectance: Rgb::splat(0.8), sigma: 0.0 };
		let scene = Scene::new(vec![instance], vec![material], vec![0], vec![], Rgb::splat(0.2));

		let integrator = WhittedIntegrator { max_depth: 2 };
		let arena = Arena::new();
		let mut rng = Rng::new(4);

		let ray = Ray::new(Vec3::new(10.0, 10.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let radiance = integrator.li(&scene, RayDifferential::new(ray), &mut rng, &arena);
		assert_eq!(radiance, Rgb::splat(0.2));
	}
}
