//! Sample accumulation: every traced sample is splatted through a
//! reconstruction filter into a shared pixel grid, then resolved to RGB and
//! exported as a PFM image.
//!
//! Grounded in `ImageFilm::AddSample`: precompute per-axis filter-table
//! offsets over the sample's support, then accumulate filtered XYZ plus
//! weight into every covered pixel.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use math::{Vec2, Xyz};

const FILTER_TABLE_SIZE: usize = 16;

/// Isotropic Gaussian reconstruction filter (pbrt-style: `exp(-alpha*d^2)`
/// minus the value at the filter edge so the tail goes to exactly zero).
pub struct GaussianFilter {
	pub radius: f32,
	alpha: f32,
	edge_value: f32,
	table: [f32; FILTER_TABLE_SIZE],
}

impl GaussianFilter {
	pub fn new(radius: f32, alpha: f32) -> Self {
		let edge_value = (-alpha * radius * radius).exp();
		let mut table = [0.0f32; FILTER_TABLE_SIZE];
		for (i, slot) in table.iter_mut().enumerate() {
			let d = (i as f32 + 0.5) / FILTER_TABLE_SIZE as f32 * radius;
			*slot = ((-alpha * d * d).exp() - edge_value).max(0.0);
		}
		Self { radius, alpha, edge_value, table }
	}

	fn weight(&self, dist: f32) -> f32 {
		let idx = ((dist.abs() / self.radius) * FILTER_TABLE_SIZE as f32).floor() as usize;
		self.table[idx.min(FILTER_TABLE_SIZE - 1)]
	}
}

impl Default for GaussianFilter {
	fn default() -> Self {
		Self::new(2.0, 2.0)
	}
}

/// One film pixel's running accumulation, updated with lock-free atomic adds
/// since a sample near a block boundary can touch a pixel owned by a
/// neighbouring in-flight block.
#[derive(Default)]
struct AtomicPixel {
	x: AtomicU32,
	y: AtomicU32,
	z: AtomicU32,
	weight: AtomicU32,
}

fn atomic_add_f32(slot: &AtomicU32, value: f32) {
	let mut current = slot.load(Ordering::Relaxed);
	loop {
		let new = f32::from_bits(current) + value;
		match slot.compare_exchange_weak(current, new.to_bits(), Ordering::Relaxed, Ordering::Relaxed) {
			Ok(_) => return,
			Err(actual) => current = actual,
		}
	}
}

impl AtomicPixel {
	fn add(&self, xyz: Xyz, weight: f32) {
		atomic_add_f32(&self.x, xyz.x * weight);
		atomic_add_f32(&self.y, xyz.y * weight);
		atomic_add_f32(&self.z, xyz.z * weight);
		atomic_add_f32(&self.weight, weight);
	}

	fn resolve(&self) -> math::Rgb {
		let weight = f32::from_bits(self.weight.load(Ordering::Relaxed));
		if weight <= 0.0 {
			return math::Rgb::BLACK;
		}
		let xyz = Xyz::new(
			f32::from_bits(self.x.load(Ordering::Relaxed)),
			f32::from_bits(self.y.load(Ordering::Relaxed)),
			f32::from_bits(self.z.load(Ordering::Relaxed)),
		);
		(xyz / weight).to_rgb()
	}
}

/// A rectangular region of the film assigned to one worker thread at a time;
/// samples are splatted against the film's shared pixel grid, clipped to
/// `[x0,x1) x [y0,y1)`.
pub struct FilmBlock {
	pub x0: i32,
	pub x1: i32,
	pub y0: i32,
	pub y1: i32,
}

impl FilmBlock {
	pub fn width(&self) -> i32 {
		self.x1 - self.x0
	}

	pub fn height(&self) -> i32 {
		self.y1 - self.y0
	}
}

pub struct Film {
	width: i32,
	height: i32,
	filter: GaussianFilter,
	pixels: Vec<AtomicPixel>,
}

impl Film {
	pub fn new(width: u32, height: u32, filter: GaussianFilter) -> Self {
		let (width, height) = (width as i32, height as i32);
		let mut pixels = Vec::with_capacity((width * height) as usize);
		pixels.resize_with((width * height) as usize, AtomicPixel::default);
		Self { width, height, filter, pixels }
	}

	fn pixel(&self, x: i32, y: i32) -> &AtomicPixel {
		debug_assert!(x >= 0 && x < self.width && y >= 0 && y < self.height);
		&self.pixels[(y * self.width + x) as usize]
	}

	/// Splats one sample's radiance `rgb` (already converted to XYZ) over the
	/// filter's support, clipped to the film bounds.
	pub fn add_sample(&self, image_sample: Vec2, rgb: math::Rgb) {
		let xyz = rgb.to_xyz();

		let dx = image_sample.x - 0.5;
		let dy = image_sample.y - 0.5;

		let x0 = (dx - self.filter.radius).ceil().max(0.0) as i32;
		let x1 = ((dx + self.filter.radius).floor() as i32).min(self.width - 1);
		let y0 = (dy - self.filter.radius).ceil().max(0.0) as i32;
		let y1 = ((dy + self.filter.radius).floor() as i32).min(self.height - 1);

		if x1 < x0 || y1 < y0 {
			return;
		}

		for y in y0..=y1 {
			let wy = self.filter.weight(y as f32 - dy);
			for x in x0..=x1 {
				let wx = self.filter.weight(x as f32 - dx);
				let weight = wx * wy;
				if weight > 0.0 {
					self.pixel(x, y).add(xyz, weight);
				}
			}
		}
	}

	/// Resolves the accumulated pixel grid (`xyz / weight_sum`, guarded
	/// against a zero weight) into top-to-bottom RGB scanlines.
	pub fn resolve(&self) -> Vec<math::Rgb> {
		(0..self.height).flat_map(|y| (0..self.width).map(move |x| (x, y))).map(|(x, y)| self.pixel(x, y).resolve()).collect()
	}

	/// Writes the film as a PFM image: ASCII header, then `f32` RGB triples
	/// in bottom-up row order (the format's convention; the caller's `y`
	/// addressing above is already top-to-bottom, so rows are reversed here).
	pub fn write_pfm<W: Write>(&self, mut writer: W) -> io::Result<()> {
		writeln!(writer, "PF")?;
		writeln!(writer, "{} {}", self.width, self.height)?;
		writeln!(writer, "-1.0")?;

		let resolved = self.resolve();
		for y in (0..self.height).rev() {
			for x in 0..self.width {
				let c = resolved[(y * self.width + x) as usize];
				for component in [c.r, c.g, c.b] {
					writer.write_all(&component.to_le_bytes())?;
				}
			}
		}
		Ok(())
	}
}

/// Hands out non-overlapping [`FilmBlock`]s in a centre-out spiral so
/// adjacent threads finish near each other, keeping the displayed image
/// converging evenly rather than scanning top-to-bottom.
pub struct BlockGenerator {
	width: i32,
	height: i32,
	block_size: i32,
	state: Mutex<SpiralState>,
}

struct SpiralState {
	cx: i32,
	cy: i32,
	dx: i32,
	dy: i32,
	steps_taken: i32,
	leg_len: i32,
	legs_at_len: i32,
	emitted: i32,
	total: i32,
}

impl BlockGenerator {
	pub fn new(width: u32, height: u32, block_size: u32) -> Self {
		let (width, height, block_size) = (width as i32, height as i32, block_size as i32);
		let blocks_x = (width + block_size - 1) / block_size;
		let blocks_y = (height + block_size - 1) / block_size;

		Self {
			width,
			height,
			block_size,
			state: Mutex::new(SpiralState {
				cx: blocks_x / 2,
				cy: blocks_y / 2,
				dx: 1,
				dy: 0,
				steps_taken: 0,
				leg_len: 1,
				legs_at_len: 0,
				emitted: 0,
				total: blocks_x * blocks_y,
			}),
		}
	}

	fn to_block(&self, bx: i32, by: i32) -> FilmBlock {
		let x0 = bx * self.block_size;
		let y0 = by * self.block_size;
		FilmBlock { x0, x1: (x0 + self.block_size).min(self.width), y0, y1: (y0 + self.block_size).min(self.height) }
	}

	/// Protected by an internal mutex; returns `None` once every block in the
	/// image has been handed out. Walks a square spiral centred on the block
	/// grid, skipping cells that fall outside it (the grid need not be
	/// square).
	pub fn next(&self) -> Option<FilmBlock> {
		let blocks_x = (self.width + self.block_size - 1) / self.block_size;
		let blocks_y = (self.height + self.block_size - 1) / self.block_size;

		let mut state = self.state.lock().unwrap();
		let max_steps = state.total.max(1) * 8 + 8;
		let mut steps = 0;

		loop {
			if state.emitted >= state.total || steps > max_steps {
				return None;
			}
			steps += 1;

			let (bx, by) = (state.cx, state.cy);
			let in_bounds = bx >= 0 && bx < blocks_x && by >= 0 && by < blocks_y;

			state.cx += state.dx;
			state.cy += state.dy;
			state.steps_taken += 1;
			if state.steps_taken == state.leg_len {
				state.steps_taken = 0;
				let (ndx, ndy) = (-state.dy, state.dx);
				state.dx = ndx;
				state.dy = ndy;
				state.legs_at_len += 1;
				if state.legs_at_len == 2 {
					state.legs_at_len = 0;
					state.leg_len += 1;
				}
			}

			if in_bounds {
				state.emitted += 1;
				return Some(self.to_block(bx, by));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_centered_sample_resolves_to_its_own_color() {
		let film = Film::new(4, 4, GaussianFilter::new(0.5, 2.0));
		film.add_sample(Vec2::new(2.5, 2.5), math::Rgb::new(1.0, 0.0, 0.0));
		let resolved = film.resolve();
		let pixel = resolved[2 * 4 + 2];
		assert!(pixel.r > 0.0);
	}

	#[test]
	fn unwritten_pixel_resolves_to_black() {
		let film = Film::new(2, 2, GaussianFilter::default());
		let resolved = film.resolve();
		assert!(resolved.iter().all(|c| c.is_black()));
	}

	#[test]
	fn pfm_header_matches_the_portable_float_map_format() {
		let film = Film::new(2, 2, GaussianFilter::default());
		let mut out = Vec::new();
		film.write_pfm(&mut out).unwrap();
		let header = String::from_utf8_lossy(&out[..8]);
		assert!(header.starts_with("PF\n2 2\n"));
	}

	#[test]
	fn block_generator_emits_every_block_exactly_once() {
		let gen = BlockGenerator::new(8, 8, 4);
		let mut seen = std::collections::HashSet::new();
		while let Some(block) = gen.next() {
			assert!(seen.insert((block.x0, block.y0)));
		}
		assert_eq!(seen.len(), 4);
	}
}
