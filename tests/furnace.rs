//! Lambert furnace test: a fully diffuse (albedo 1) sphere sitting inside a
//! much larger sphere whose inner surface emits uniform radiance `L_e`
//! reflects back exactly `L_e`, since a Lambertian surface with albedo 1
//! reflects all incident uniform illumination.

use geometry::shape::Sphere;
use geometry::{Instance, Shape};
use math::isometry::Isometry3;
use math::{Arena, Rgb, Rng, Vec3};
use shading::Material;
use trace::{DirectLightingIntegrator, Integrator, Light, LightStrategy, Scene};

#[test]
fn diffuse_sphere_inside_a_uniform_emitter_reflects_the_emitted_radiance() {
	let enclosure = Instance { reverse_orientation: true, ..Instance::new(Shape::Sphere(Sphere::full(10.0)), Isometry3::identity()) };
	let probe = Instance::new(Shape::Sphere(Sphere::full(1.0)), Isometry3::identity());

	let radiance = 1.0f32;
	let materials = vec![Material::Matte { reflectance: Rgb::WHITE, sigma: 0.0 }, Material::Matte { reflectance: Rgb::WHITE, sigma: 0.0 }];
	let lights = vec![Light::Area { instance: 0, radiance: Rgb::splat(radiance), samples: 32 }];

	let scene = Scene::new(vec![enclosure, probe], materials, vec![0, 1], lights, Rgb::BLACK);

	let integrator = DirectLightingIntegrator { max_depth: 1, strategy: LightStrategy::SampleAllUniform };
	let arena = Arena::new();
	let mut rng = Rng::new(77);

	let ray = geometry::Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));

	let mut total = 0.0f32;
	let samples = 32;
	for _ in 0..samples {
		let radiance_sample = integrator.li(&scene, geometry::RayDifferential::new(ray), &mut rng, &arena);
		total += radiance_sample.luminance();
	}
	let average = total / samples as f32;

	assert!((average - radiance).abs() < 0.1, "furnace average {average} should be close to {radiance}");
}
