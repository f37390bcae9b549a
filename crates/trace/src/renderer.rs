//! Drives the sampling loop described in `SamplerRenderer::Render`/
//! `BlockRender`: a shared [`BlockGenerator`] hands non-overlapping blocks to
//! however many workers the caller wants, each worker cloning its own
//! sampler and arena and tracing one ray per camera sample.
//!
//! The renderer never owns a thread pool: it accepts a [`Scheduler`] handle
//! and asks it to run N jobs to completion, so callers choose sequential
//! execution, `std::thread::scope`, or anything else without this crate
//! depending on a specific concurrency stack.

use log::info;

use math::{Arena, Rgb, Rng, Vec2};

use crate::camera::PerspectiveCamera;
use crate::film::{BlockGenerator, Film, FilmBlock, GaussianFilter};
use crate::integrator::Integrator;
use crate::sampler::{CameraSample, Sampler};
use crate::scene::Scene;

const DEFAULT_BLOCK_SIZE: u32 = 64;

/// Runs `job(i)` for every `i in 0..n`, blocking until all have completed.
/// Implementations may run jobs sequentially or fan them out across
/// threads; the renderer itself never spawns anything on its own.
pub trait Scheduler: Sync {
	fn run(&self, n: usize, job: &(dyn Fn(usize) + Sync));
}

/// Runs every job on the calling thread, in order.
pub struct SequentialScheduler;

impl Scheduler for SequentialScheduler {
	fn run(&self, n: usize, job: &(dyn Fn(usize) + Sync)) {
		for i in 0..n {
			job(i);
		}
	}
}

/// Spawns one scoped thread per job and joins them all. Intended for
/// block-granularity parallelism, where `n` is the worker count, not the
/// sample count.
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
	fn run(&self, n: usize, job: &(dyn Fn(usize) + Sync)) {
		std::thread::scope(|scope| {
			for i in 0..n {
				scope.spawn(move || job(i));
			}
		});
	}
}

pub struct RenderSettings {
	pub block_size: u32,
	pub worker_count: usize,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self { block_size: DEFAULT_BLOCK_SIZE, worker_count: 1 }
	}
}

pub struct Renderer<'a> {
	sampler_prototype: Box<dyn Sampler>,
	camera: &'a PerspectiveCamera,
	integrator: &'a dyn Integrator,
	settings: RenderSettings,
}

impl<'a> Renderer<'a> {
	pub fn new(sampler_prototype: Box<dyn Sampler>, camera: &'a PerspectiveCamera, integrator: &'a dyn Integrator, settings: RenderSettings) -> Self {
		Self { sampler_prototype, camera, integrator, settings }
	}

	/// Renders `scene` into a film sized to the camera's raster window.
	/// Workers pull blocks from a shared generator until none remain, so the
	/// worker count need not divide the image evenly.
	pub fn render(&self, scene: &Scene, filter: GaussianFilter, scheduler: &dyn Scheduler) -> Film {
		let width = self.camera.width();
		let height = self.camera.height();

		let film = Film::new(width, height, filter);
		let block_generator = BlockGenerator::new(width, height, self.settings.block_size);

		let worker_count = self.settings.worker_count.max(1);
		scheduler.run(worker_count, &|worker| {
			let mut rng = Rng::new((worker as u32).wrapping_mul(0x9e37_79b9).wrapping_add(1));
			self.render_worker(scene, &film, &block_generator, &mut rng);
		});

		film
	}

	fn render_worker(&self, scene: &Scene, film: &Film, block_generator: &BlockGenerator, rng: &mut Rng) {
		let samples_per_pixel = self.sampler_prototype.samples_per_pixel().max(1) as usize;
		let inv_sqrt_spp = 1.0 / (samples_per_pixel as f32).sqrt();

		let mut buf: Vec<CameraSample> = (0..samples_per_pixel)
			.map(|_| CameraSample { image: Vec2::ZERO, lens: Vec2::ZERO, time: 0.0, samples_1d: Vec::new(), samples_2d: Vec::new() })
			.collect();

		while let Some(block) = block_generator.next() {
			let mut sampler = self.sampler_prototype.clone_for(block.x0, block.x1, block.y0, block.y1);
			let mut arena = Arena::new();

			loop {
				let n = sampler.get_more_samples(&mut buf, rng);
				if n == 0 {
					break;
				}

				for sample in &buf[..n] {
					let mut ray = self.camera.generate_ray_differential(sample.image);
					ray.scale(inv_sqrt_spp);

					let radiance = self.integrator.li(scene, ray, rng, &arena);
					if radiance.is_finite() {
						film.add_sample(sample.image, radiance);
					}
				}

				arena.free_all();
			}

			info!(target: "trace", "completed block ({}, {}) - ({}, {})", block.x0, block.y0, block.x1, block.y1);
			let _: &FilmBlock = &block;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::integrator::WhittedIntegrator;
	use crate::sampler::{SampleRequests, StratifiedSampler};
	use geometry::shape::Sphere;
	use geometry::{Instance, Shape};
	use math::isometry::Isometry3;
	use shading::Material;

	fn lit_sphere_scene() -> Scene {
		let sphere = Sphere::full(1.0);
		let instance = Instance::new(Shape::Sphere(sphere), Isometry3::identity());
		let material = Material::Matte { reflectance: Rgb::splat(0.8), sigma: 0.0 };
		let light = crate::light::Light::Point { position: math::Vec3::new(0.0, 5.0, 0.0), intensity: Rgb::splat(50.0) };
		Scene::new(vec![instance], vec![material], vec![0], vec![light], Rgb::BLACK)
	}

	#[test]
	fn rendering_a_lit_sphere_produces_non_black_pixels() {
		let scene = lit_sphere_scene();
		let camera = PerspectiveCamera::new(PerspectiveCamera::look_at(math::Vec3::new(0.0, 0.0, -5.0), math::Vec3::ZERO, math::Vec3::new(0.0, 1.0, 0.0)), 40.0, 16, 16);
		let integrator = WhittedIntegrator { max_depth: 2 };
		let sampler: Box<dyn Sampler> = Box::new(StratifiedSampler::new(0, 16, 0, 16, 1, 1, SampleRequests::default(), true));

		let renderer = Renderer::new(sampler, &camera, &integrator, RenderSettings { block_size: 8, worker_count: 1 });
		let film = renderer.render(&scene, GaussianFilter::default(), &SequentialScheduler);

		let resolved = film.resolve();
		assert!(resolved.iter().any(|c| c.luminance() > 0.0));
	}

	#[test]
	fn thread_scheduler_runs_every_job() {
		use std::sync::atomic::{AtomicUsize, Ordering};
		let counter = AtomicUsize::new(0);
		ThreadScheduler.run(4, &|_| {
			counter.fetch_add(1, Ordering::SeqCst);
		});
		assert_eq!(counter.load(Ordering::SeqCst), 4);
	}
}
