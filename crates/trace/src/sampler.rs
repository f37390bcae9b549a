//! Per-pixel sample generation: a `Sampler` hands the renderer a batch of
//! [`CameraSample`]s covering one pixel at a time, advancing in raster order
//! across its assigned sub-window.
//!
//! Grounded in `StratifiedSampler::GetMoreSamples`: stratify image/lens 2D
//! samples and a time 1D sample per pixel, offset the image samples by the
//! current pixel, shuffle lens/time so they don't correlate across pixels.

use math::sampling::{latin_hypercube, shuffle, stratified_sample_1d, stratified_sample_2d};
use math::{Rng, Vec2};

/// One camera sample: where on the image plane, where on the lens, when in
/// the shutter interval, plus any extra 1D/2D sample arrays an integrator
/// reserved at scene-load time (light and BSDF sampling draws).
#[derive(Clone, Debug)]
pub struct CameraSample {
	pub image: Vec2,
	pub lens: Vec2,
	pub time: f32,
	pub samples_1d: Vec<Vec<f32>>,
	pub samples_2d: Vec<Vec<(f32, f32)>>,
}

impl CameraSample {
	fn new(request_1d: &[usize], request_2d: &[usize]) -> Self {
		Self {
			image: Vec2::ZERO,
			lens: Vec2::ZERO,
			time: 0.0,
			samples_1d: request_1d.iter().map(|&n| vec![0.0; n]).collect(),
			samples_2d: request_2d.iter().map(|&n| vec![(0.0, 0.0); n]).collect(),
		}
	}
}

/// Requests an integrator makes at scene-load time for extra per-bounce
/// samples (light selection, BSDF sampling, ...), each request yielding a
/// fixed-size array inside every `CameraSample`.
#[derive(Clone, Default)]
pub struct SampleRequests {
	pub counts_1d: Vec<usize>,
	pub counts_2d: Vec<usize>,
}

pub trait Sampler: Send {
	/// Samples generated per pixel.
	fn samples_per_pixel(&self) -> u32;

	/// Fills `samples` with the next pixel's samples, returning how many were
	/// written (0 once the sub-window is exhausted).
	fn get_more_samples(&mut self, samples: &mut [CameraSample], rng: &mut Rng) -> usize;

	/// A thread-owned sampler over `[x0,x1) x [y0,y1)`, independent PRNG state
	/// seeded by the caller.
	fn clone_for(&self, x0: i32, x1: i32, y0: i32, y1: i32) -> Box<dyn Sampler>;
}

struct Window {
	x0: i32,
	x1: i32,
	y0: i32,
	y1: i32,
	cur_x: i32,
	cur_y: i32,
}

impl Window {
	fn new(x0: i32, x1: i32, y0: i32, y1: i32) -> Self {
		Self { x0, x1, y0, y1, cur_x: x0, cur_y: y0 }
	}

	fn done(&self) -> bool {
		self.cur_y >= self.y1
	}

	fn advance(&mut self) {
		self.cur_x += 1;
		if self.cur_x == self.x1 {
			self.cur_x = self.x0;
			self.cur_y += 1;
		}
	}
}

/// Stratifies image and lens samples over an `nx * ny` grid per pixel, plus a
/// stratified time sample, shuffling lens/time across the pixel's samples so
/// they don't pair up with the same image stratum every time.
pub struct StratifiedSampler {
	window: Window,
	samples_x: u32,
	samples_y: u32,
	requests: SampleRequests,
	jitter: bool,
}

impl StratifiedSampler {
	pub fn new(x0: i32, x1: i32, y0: i32, y1: i32, samples_x: u32, samples_y: u32, requests: SampleRequests, jitter: bool) -> Self {
		Self { window: Window::new(x0, x1, y0, y1), samples_x, samples_y, requests, jitter }
	}

	fn count(&self) -> usize {
		(self.samples_x * self.samples_y) as usize
	}
}

impl Sampler for StratifiedSampler {
	fn samples_per_pixel(&self) -> u32 {
		self.samples_x * self.samples_y
	}

	fn get_more_samples(&mut self, samples: &mut [CameraSample], rng: &mut Rng) -> usize {
		if self.window.done() {
			return 0;
		}

		let n = self.count();
		debug_assert!(samples.len() >= n);

		let mut image_buf = vec![(0.0f32, 0.0f32); n];
		let mut lens_buf = vec![(0.0f32, 0.0f32); n];
		let mut time_buf = vec![0.0f32; n];

		stratified_sample_2d(&mut image_buf, self.samples_x as usize, self.samples_y as usize, rng, self.jitter);
		stratified_sample_2d(&mut lens_buf, self.samples_x as usize, self.samples_y as usize, rng, self.jitter);
		stratified_sample_1d(&mut time_buf, n, rng, self.jitter);

		let mut lens_flat: Vec<f32> = lens_buf.iter().flat_map(|&(a, b)| [a, b]).collect();
		shuffle(&mut lens_flat, n, 2, rng);
		shuffle(&mut time_buf, n, 1, rng);

		for i in 0..n {
			let sample = CameraSample::new(&self.requests.counts_1d, &self.requests.counts_2d);
			let mut sample = sample;
			sample.image = Vec2::new(image_buf[i].0 + self.window.cur_x as f32, image_buf[i].1 + self.window.cur_y as f32);
			sample.lens = Vec2::new(lens_flat[i * 2], lens_flat[i * 2 + 1]);
			sample.time = time_buf[i];

			for arr in &mut sample.samples_1d {
				stratified_sample_1d(arr, arr.len(), rng, self.jitter);
			}
			for arr in &mut sample.samples_2d {
				stratified_sample_2d(arr, arr.len(), 1, rng, self.jitter);
			}

			samples[i] = sample;
		}

		self.window.advance();
		n
	}

	fn clone_for(&self, x0: i32, x1: i32, y0: i32, y1: i32) -> Box<dyn Sampler> {
		Box::new(StratifiedSampler::new(x0, x1, y0, y1, self.samples_x, self.samples_y, self.requests.clone(), self.jitter))
	}
}

/// Same per-pixel shape as [`StratifiedSampler`] but draws image/lens/time
/// jointly via Latin Hypercube Sampling rather than independent per-axis
/// stratification, trading worse 2D stratification for better coverage when
/// `samples_per_pixel` isn't a perfect grid.
pub struct LatinHypercubeSampler {
	window: Window,
	samples_per_pixel: u32,
	requests: SampleRequests,
}

impl LatinHypercubeSampler {
	pub fn new(x0: i32, x1: i32, y0: i32, y1: i32, samples_per_pixel: u32, requests: SampleRequests) -> Self {
		Self { window: Window::new(x0, x1, y0, y1), samples_per_pixel, requests }
	}
}

impl Sampler for LatinHypercubeSampler {
	fn samples_per_pixel(&self) -> u32 {
		self.samples_per_pixel
	}

	fn get_more_samples(&mut self, samples: &mut [CameraSample], rng: &mut Rng) -> usize {
		if self.window.done() {
			return 0;
		}

		let n = self.samples_per_pixel as usize;
		debug_assert!(samples.len() >= n);

		let mut image_buf = vec![0.0f32; n * 2];
		let mut lens_buf = vec![0.0f32; n * 2];
		let mut time_buf = vec![0.0f32; n];

		latin_hypercube(&mut image_buf, n, 2, rng);
		latin_hypercube(&mut lens_buf, n, 2, rng);
		latin_hypercube(&mut time_buf, n, 1, rng);

		for i in 0..n {
			let mut sample = CameraSample::new(&self.requests.counts_1d, &self.requests.counts_2d);
			sample.image = Vec2::new(image_buf[i * 2] + self.window.cur_x as f32, image_buf[i * 2 + 1] + self.window.cur_y as f32);
			sample.lens = Vec2::new(lens_buf[i * 2], lens_buf[i * 2 + 1]);
			sample.time = time_buf[i];

			for arr in &mut sample.samples_1d {
				latin_hypercube(arr, arr.len(), 1, rng);
			}
			for arr in &mut sample.samples_2d {
				let mut flat = vec![0.0f32; arr.len() * 2];
				latin_hypercube(&mut flat, arr.len(), 2, rng);
				for (dst, chunk) in arr.iter_mut().zip(flat.chunks_exact(2)) {
					*dst = (chunk[0], chunk[1]);
				}
			}

			samples[i] = sample;
		}

		self.window.advance();
		n
	}

	fn clone_for(&self, x0: i32, x1: i32, y0: i32, y1: i32) -> Box<dyn Sampler> {
		Box::new(LatinHypercubeSampler::new(x0, x1, y0, y1, self.samples_per_pixel, self.requests.clone()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stratified_sampler_yields_samples_per_pixel_count_then_advances() {
		let mut sampler = StratifiedSampler::new(0, 2, 0, 1, 2, 2, SampleRequests::default(), true);
		let mut rng = Rng::new(1);
		let mut buf: Vec<CameraSample> = (0..4).map(|_| CameraSample::new(&[], &[])).collect();

		let n = sampler.get_more_samples(&mut buf, &mut rng);
		assert_eq!(n, 4);
		for s in &buf {
			assert!(s.image.x >= 0.0 && s.image.x < 1.0);
		}

		let n2 = sampler.get_more_samples(&mut buf, &mut rng);
		assert_eq!(n2, 4);
		for s in &buf {
			assert!(s.image.x >= 1.0 && s.image.x < 2.0);
		}

		let n3 = sampler.get_more_samples(&mut buf, &mut rng);
		assert_eq!(n3, 0);
	}

	#[test]
	fn reserved_sample_arrays_are_populated_per_pixel() {
		let requests = SampleRequests { counts_1d: vec![3], counts_2d: vec![2] };
		let mut sampler = StratifiedSampler::new(0, 1, 0, 1, 1, 1, requests, true);
		let mut rng = Rng::new(2);
		let mut buf: Vec<CameraSample> = (0..1).map(|_| CameraSample::new(&[3], &[2])).collect();

		sampler.get_more_samples(&mut buf, &mut rng);
		assert_eq!(buf[0].samples_1d[0].len(), 3);
		assert_eq!(buf[0].samples_2d[0].len(), 2);
	}

	#[test]
	fn latin_hypercube_sampler_covers_the_same_pixel_grid() {
		let mut sampler = LatinHypercubeSampler::new(0, 1, 0, 1, 8, SampleRequests::default());
		let mut rng = Rng::new(5);
		let mut buf: Vec<CameraSample> = (0..8).map(|_| CameraSample::new(&[], &[])).collect();

		let n = sampler.get_more_samples(&mut buf, &mut rng);
		assert_eq!(n, 8);
		assert_eq!(sampler.get_more_samples(&mut buf, &mut rng), 0);
	}
}
