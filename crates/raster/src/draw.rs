//! Ties the pipeline stages into the per-draw-call state machine: input
//! assembly -> VS -> clip -> project/cull -> bin -> tile raster (or
//! scanline fallback) -> PS -> depth/blend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::debug;
use math::{Rgb, Vec2};

use crate::bin::{bin_triangle, BinnedTriangle, TileOverlap, TILE_SIZE};
use crate::blend::BlendState;
use crate::clip::{clip_triangle, fan_triangulate};
use crate::depth::DepthState;
use crate::framebuffer::FrameBuffer;
use crate::project::{project_vertex, should_cull, signed_area, CullMode, Viewport, Winding};
use crate::scheduler::Scheduler;
use crate::vertex::{Vertex, VertexCache};

/// Result of the fragment stage: `None` means the fragment was discarded.
/// `Sync` so a `DrawState` can be shared across the binning/rasterization
/// threads in [`draw_parallel`].
pub type PixelShader<'a> = dyn Fn(&Vertex) -> Option<(math::Rgb, f32)> + Sync + 'a;

pub struct DrawState<'a> {
	pub winding: Winding,
	pub cull: CullMode,
	pub depth: DepthState,
	pub blend: BlendState,
	pub color_slot: usize,
	pub viewport: Viewport,
	pub vertex_shader: &'a (dyn Fn(u32) -> Vertex + Sync),
	pub pixel_shader: &'a PixelShader<'a>,
}

fn barycentric_vertex(tri: &BinnedTriangle, v0: &Vertex, v1: &Vertex, v2: &Vertex, x: i32, y: i32) -> Vertex {
	let px = x as f32 + 0.5;
	let py = y as f32 + 0.5;

	let (b0, b1, b2) = tri.barycentric(px, py);

	let inv_w = b0 * v0.clip_position.w + b1 * v1.clip_position.w + b2 * v2.clip_position.w;
	let z = b0 * v0.clip_position.z + b1 * v1.clip_position.z + b2 * v2.clip_position.z;

	let mut varyings = [0.0f32; crate::vertex::MAX_VARYINGS];
	for i in 0..v0.varying_count {
		let interpolated = b0 * v0.varyings[i] + b1 * v1.varyings[i] + b2 * v2.varyings[i];
		// undo the inv_w pre-multiplication done at projection time.
		varyings[i] = interpolated / inv_w;
	}

	Vertex { clip_position: math::Vec4::new(px, py, z, inv_w), varyings, varying_count: v0.varying_count }
}

fn shade_and_write(fb: &mut FrameBuffer, state: &DrawState, tri_vertex: &Vertex, x: i32, y: i32, z: f32) {
	let depth_pass = fb
		.depth_mut()
		.map(|d| {
			let stored = *d.pixels.get(x as usize, y as usize);
			let pass = state.depth.compare.passes(z, stored);
			if pass && state.depth.write_enable {
				*d.pixels.get_mut(x as usize, y as usize) = z;
			}
			pass
		})
		.unwrap_or(true);
	if !depth_pass {
		return;
	}

	let Some((color, alpha)) = (state.pixel_shader)(tri_vertex) else { return };

	if let Some(attachment) = fb.color_mut(state.color_slot) {
		let dst = *attachment.pixels.get(x as usize, y as usize);
		let (blended, _) = state.blend.blend(color, alpha, dst, 1.0);
		*attachment.pixels.get_mut(x as usize, y as usize) = blended;
	}
}

/// Rasterizes one already-binned triangle tile-by-tile: accepted tiles are
/// filled unconditionally, partial tiles fall back to a per-pixel inside
/// test.
fn rasterize_tiled(fb: &mut FrameBuffer, state: &DrawState, tri: &BinnedTriangle, v0: &Vertex, v1: &Vertex, v2: &Vertex) {
	for (tx, ty, overlap) in bin_triangle(tri) {
		let x0 = (tx * TILE_SIZE).max(tri.min_x);
		let y0 = (ty * TILE_SIZE).max(tri.min_y);
		let x1 = ((tx + 1) * TILE_SIZE).min(tri.max_x);
		let y1 = ((ty + 1) * TILE_SIZE).min(tri.max_y);

		for y in y0..y1 {
			for x in x0..x1 {
				if overlap == TileOverlap::Partial && !tri.covers_pixel(x, y) {
					continue;
				}
				let frag = barycentric_vertex(tri, v0, v1, v2, x, y);
				shade_and_write(fb, state, &frag, x, y, frag.clip_position.z);
			}
		}
	}
}

/// Non-tiled fallback: sorts by Y and sweeps scanlines directly, same
/// barycentric reconstruction as the tiled path. Used when the scene is too
/// sparse to justify per-tile binning overhead.
fn rasterize_scanline(fb: &mut FrameBuffer, state: &DrawState, tri: &BinnedTriangle, v0: &Vertex, v1: &Vertex, v2: &Vertex) {
	for y in tri.min_y..tri.max_y {
		for x in tri.min_x..tri.max_x {
			if !tri.covers_pixel(x, y) {
				continue;
			}
			let frag = barycentric_vertex(tri, v0, v1, v2, x, y);
			shade_and_write(fb, state, &frag, x, y, frag.clip_position.z);
		}
	}
}

/// Runs the full state machine for one indexed triangle list.
pub fn draw(fb: &mut FrameBuffer, state: &DrawState, indices: &[u32], tiled: bool) {
	debug_assert!(fb.is_bound(), "draw called on an unbound framebuffer");
	debug_assert_eq!(indices.len() % 3, 0);

	let mut cache = VertexCache::new();

	for tri_indices in indices.chunks_exact(3) {
		let v0 = cache.fetch(tri_indices[0], state.vertex_shader);
		let v1 = cache.fetch(tri_indices[1], state.vertex_shader);
		let v2 = cache.fetch(tri_indices[2], state.vertex_shader);

		let poly = clip_triangle(v0, v1, v2);
		if poly.is_empty() {
			continue;
		}

		for (i0, i1, i2) in fan_triangulate(&poly) {
			let pv0 = project_vertex(&poly[i0], &state.viewport);
			let pv1 = project_vertex(&poly[i1], &state.viewport);
			let pv2 = project_vertex(&poly[i2], &state.viewport);

			let p0 = Vec2::new(pv0.clip_position.x, pv0.clip_position.y);
			let p1 = Vec2::new(pv1.clip_position.x, pv1.clip_position.y);
			let p2 = Vec2::new(pv2.clip_position.x, pv2.clip_position.y);

			let area = signed_area(p0, p1, p2);
			if should_cull(area, state.winding, state.cull) {
				continue;
			}

			let Some(binned) = BinnedTriangle::new(p0, p1, p2, fb.width() as i32, fb.height() as i32) else {
				continue;
			};

			if tiled {
				rasterize_tiled(fb, state, &binned, &pv0, &pv1, &pv2);
			} else {
				rasterize_scanline(fb, state, &binned, &pv0, &pv1, &pv2);
			}
		}
	}
}

/// One already-binned, already-clipped triangle queued for a single tile.
struct BinnedItem {
	tri: BinnedTriangle,
	v0: Vertex,
	v1: Vertex,
	v2: Vertex,
	overlap: TileOverlap,
}

fn tile_counts(width: i32, height: i32) -> (i32, i32) {
	(((width + TILE_SIZE - 1) / TILE_SIZE).max(1), ((height + TILE_SIZE - 1) / TILE_SIZE).max(1))
}

/// Per-thread tables of per-tile queues. Each row is touched only by the
/// writer thread that owns it during binning ("writers never share a
/// queue"); by the time rasterization reads a tile it pulls from every
/// thread's row for that tile.
struct TileQueues {
	tiles_x: i32,
	rows: Vec<Mutex<Vec<Vec<BinnedItem>>>>,
}

impl TileQueues {
	fn new(thread_count: usize, tile_count: usize, tiles_x: i32) -> Self {
		let rows = (0..thread_count).map(|_| Mutex::new((0..tile_count).map(|_| Vec::new()).collect())).collect();
		Self { tiles_x, rows }
	}

	fn push(&self, thread: usize, tx: i32, ty: i32, item: BinnedItem) {
		let tile = (ty * self.tiles_x + tx) as usize;
		self.rows[thread].lock().unwrap()[tile].push(item);
	}

	/// Consumes the table; only valid once every writer thread has finished,
	/// i.e. after the binning `scheduler.run` call has returned.
	fn into_tile_rows(self) -> Vec<Vec<Vec<BinnedItem>>> {
		self.rows.into_iter().map(|row| row.into_inner().unwrap()).collect()
	}
}

/// Computes shaded fragments for one tile without touching the framebuffer,
/// so the pixel shader (the expensive part: texture lookups, BSDF
/// evaluation) runs unlocked and concurrently with every other tile.
fn collect_tile_fragments(state: &DrawState, tx: i32, ty: i32, items: &[&BinnedItem]) -> Vec<(i32, i32, f32, Option<(Rgb, f32)>)> {
	let mut fragments = Vec::new();

	for item in items {
		let x0 = (tx * TILE_SIZE).max(item.tri.min_x);
		let y0 = (ty * TILE_SIZE).max(item.tri.min_y);
		let x1 = ((tx + 1) * TILE_SIZE).min(item.tri.max_x);
		let y1 = ((ty + 1) * TILE_SIZE).min(item.tri.max_y);

		for y in y0..y1 {
			for x in x0..x1 {
				if item.overlap == TileOverlap::Partial && !item.tri.covers_pixel(x, y) {
					continue;
				}
				let frag = barycentric_vertex(&item.tri, &item.v0, &item.v1, &item.v2, x, y);
				let shaded = (state.pixel_shader)(&frag);
				fragments.push((x, y, frag.clip_position.z, shaded));
			}
		}
	}

	fragments
}

/// Applies a tile's already-shaded fragments: depth test, depth write, and
/// blend, in submission order. The only section that touches `fb`.
fn apply_tile_fragments(fb: &mut FrameBuffer, state: &DrawState, fragments: &[(i32, i32, f32, Option<(Rgb, f32)>)]) {
	for &(x, y, z, shaded) in fragments {
		let depth_pass = fb
			.depth_mut()
			.map(|d| {
				let stored = *d.pixels.get(x as usize, y as usize);
				let pass = state.depth.compare.passes(z, stored);
				if pass && state.depth.write_enable {
					*d.pixels.get_mut(x as usize, y as usize) = z;
				}
				pass
			})
			.unwrap_or(true);
		if !depth_pass {
			continue;
		}

		let Some((color, alpha)) = shaded else { continue };

		if let Some(attachment) = fb.color_mut(state.color_slot) {
			let dst = *attachment.pixels.get(x as usize, y as usize);
			let (blended, _) = state.blend.blend(color, alpha, dst, 1.0);
			*attachment.pixels.get_mut(x as usize, y as usize) = blended;
		}
	}
}

/// Multi-threaded variant of [`draw`]: a binning phase fans the triangle
/// list across `thread_count` writers, each with its own `VertexCache` and
/// its own row of per-tile queues, then a rasterization phase claims tiles
/// one at a time and shades their fragments concurrently before a short
/// locked flush into `fb`.
///
/// Tiles are disjoint pixel rectangles, so the flush lock never serializes
/// against correctness, only against other tiles' flushes; the pixel
/// shader itself always runs unlocked.
pub fn draw_parallel(fb: &mut FrameBuffer, state: &DrawState, indices: &[u32], scheduler: &dyn Scheduler, thread_count: usize) {
	debug_assert!(fb.is_bound(), "draw_parallel called on an unbound framebuffer");
	debug_assert_eq!(indices.len() % 3, 0);

	let triangle_count = indices.len() / 3;
	if triangle_count == 0 {
		return;
	}

	let thread_count = thread_count.max(1);
	let width = fb.width() as i32;
	let height = fb.height() as i32;
	let (tiles_x, tiles_y) = tile_counts(width, height);
	let tile_count = (tiles_x * tiles_y) as usize;

	debug!(target: "raster", "draw_parallel: {} triangles over {} tiles, {} threads", triangle_count, tile_count, thread_count);

	let queues = TileQueues::new(thread_count, tile_count, tiles_x);

	scheduler.run(thread_count, &|thread| {
		let mut cache = VertexCache::new();

		let mut tri = thread;
		while tri < triangle_count {
			let base = tri * 3;
			let tri_indices = &indices[base..base + 3];

			let v0 = cache.fetch(tri_indices[0], state.vertex_shader);
			let v1 = cache.fetch(tri_indices[1], state.vertex_shader);
			let v2 = cache.fetch(tri_indices[2], state.vertex_shader);

			let poly = clip_triangle(v0, v1, v2);
			if !poly.is_empty() {
				for (i0, i1, i2) in fan_triangulate(&poly) {
					let pv0 = project_vertex(&poly[i0], &state.viewport);
					let pv1 = project_vertex(&poly[i1], &state.viewport);
					let pv2 = project_vertex(&poly[i2], &state.viewport);

					let p0 = Vec2::new(pv0.clip_position.x, pv0.clip_position.y);
					let p1 = Vec2::new(pv1.clip_position.x, pv1.clip_position.y);
					let p2 = Vec2::new(pv2.clip_position.x, pv2.clip_position.y);

					let area = signed_area(p0, p1, p2);
					if should_cull(area, state.winding, state.cull) {
						continue;
					}

					let Some(tri) = BinnedTriangle::new(p0, p1, p2, width, height) else { continue };

					for (tx, ty, overlap) in bin_triangle(&tri) {
						queues.push(thread, tx, ty, BinnedItem { tri, v0: pv0, v1: pv1, v2: pv2, overlap });
					}
				}
			}

			tri += thread_count;
		}
	});

	let tile_rows = queues.into_tile_rows();
	let fb_mutex = Mutex::new(fb);
	let next_tile = AtomicUsize::new(0);
	let reader_count = thread_count.min(tile_count.max(1));

	scheduler.run(reader_count, &|_| loop {
		let tile = next_tile.fetch_add(1, Ordering::Relaxed);
		if tile >= tile_count {
			break;
		}

		let items: Vec<&BinnedItem> = tile_rows.iter().flat_map(|row| row[tile].iter()).collect();
		if items.is_empty() {
			continue;
		}

		let tx = tile as i32 % tiles_x;
		let ty = tile as i32 / tiles_x;

		let fragments = collect_tile_fragments(state, tx, ty, &items);

		let mut guard = fb_mutex.lock().unwrap();
		apply_tile_fragments(&mut **guard, state, &fragments);
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::blend::BlendState;
	use crate::depth::DepthState;
	use crate::framebuffer::{ColorAttachment, DepthAttachment};
	use math::{Rgb, Vec4};

	fn triangle_vertex_shader(positions: &'static [Vec4]) -> impl Fn(u32) -> Vertex {
		move |i| Vertex::new(positions[i as usize], &[1.0])
	}

	#[test]
	fn ccw_triangle_shades_pixels_under_back_cull() {
		static POSITIONS: [Vec4; 3] = [Vec4::new(-0.5, -0.5, 0.0, 1.0), Vec4::new(0.5, -0.5, 0.0, 1.0), Vec4::new(0.0, 0.5, 0.0, 1.0)];

		let mut fb = FrameBuffer::new(16, 16);
		fb.attach_color(0, ColorAttachment::new(16, 16));
		fb.attach_depth(DepthAttachment::new(16, 16));
		fb.on_bind();

		let vs = triangle_vertex_shader(&POSITIONS);
		let ps = |v: &Vertex| Some((Rgb::splat(v.varyings[0]), 1.0));

		let state = DrawState {
			winding: Winding::CounterClockwise,
			cull: CullMode::Back,
			depth: DepthState::default(),
			blend: BlendState::default(),
			color_slot: 0,
			viewport: Viewport { x: 0.0, y: 0.0, width: 16.0, height: 16.0 },
			vertex_shader: &vs,
			pixel_shader: &ps,
		};

		draw(&mut fb, &state, &[0, 1, 2], true);

		let shaded = (0..16).flat_map(|y| (0..16).map(move |x| (x, y))).filter(|&(x, y)| fb.color_mut(0).unwrap().pixels.get(x, y).r > 0.0).count();
		assert!(shaded > 0);

		fb.on_unbind();
	}

	#[test]
	fn flipping_winding_culls_every_pixel() {
		static POSITIONS: [Vec4; 3] = [Vec4::new(-0.5, -0.5, 0.0, 1.0), Vec4::new(0.5, -0.5, 0.0, 1.0), Vec4::new(0.0, 0.5, 0.0, 1.0)];

		let mut fb = FrameBuffer::new(16, 16);
		fb.attach_color(0, ColorAttachment::new(16, 16));
		fb.attach_depth(DepthAttachment::new(16, 16));
		fb.on_bind();

		let vs = triangle_vertex_shader(&POSITIONS);
		let ps = |v: &Vertex| Some((Rgb::splat(v.varyings[0]), 1.0));

		let state = DrawState {
			winding: Winding::Clockwise,
			cull: CullMode::Back,
			depth: DepthState::default(),
			blend: BlendState::default(),
			color_slot: 0,
			viewport: Viewport { x: 0.0, y: 0.0, width: 16.0, height: 16.0 },
			vertex_shader: &vs,
			pixel_shader: &ps,
		};

		draw(&mut fb, &state, &[0, 1, 2], true);

		let shaded = (0..16).flat_map(|y| (0..16).map(move |x| (x, y))).filter(|&(x, y)| fb.color_mut(0).unwrap().pixels.get(x, y).r > 0.0).count();
		assert_eq!(shaded, 0);

		fb.on_unbind();
	}

	fn two_tile_framebuffer() -> FrameBuffer {
		let mut fb = FrameBuffer::new(128, 128);
		fb.attach_color(0, ColorAttachment::new(128, 128));
		fb.attach_depth(DepthAttachment::new(128, 128));
		fb.on_bind();
		fb
	}

	fn covering_triangle_state<'a>(vs: &'a dyn Fn(u32) -> Vertex, ps: &'a PixelShader<'a>) -> DrawState<'a> {
		DrawState {
			winding: Winding::CounterClockwise,
			cull: CullMode::Back,
			depth: DepthState::default(),
			blend: BlendState::default(),
			color_slot: 0,
			viewport: Viewport { x: 0.0, y: 0.0, width: 128.0, height: 128.0 },
			vertex_shader: vs,
			pixel_shader: ps,
		}
	}

	#[test]
	fn draw_parallel_matches_sequential_draw_for_a_triangle_spanning_several_tiles() {
		static POSITIONS: [Vec4; 3] = [Vec4::new(-0.9, -0.9, 0.0, 1.0), Vec4::new(0.9, -0.9, 0.0, 1.0), Vec4::new(0.0, 0.9, 0.0, 1.0)];

		let vs = triangle_vertex_shader(&POSITIONS);
		let ps = |v: &Vertex| Some((Rgb::splat(v.varyings[0]), 1.0));

		let mut sequential = two_tile_framebuffer();
		draw(&mut sequential, &covering_triangle_state(&vs, &ps), &[0, 1, 2], true);

		let mut parallel = two_tile_framebuffer();
		draw_parallel(&mut parallel, &covering_triangle_state(&vs, &ps), &[0, 1, 2], &crate::scheduler::ThreadScheduler, 4);

		for y in 0..128 {
			for x in 0..128 {
				let a = sequential.color_mut(0).unwrap().pixels.get(x, y);
				let b = parallel.color_mut(0).unwrap().pixels.get(x, y);
				assert!((a.r - b.r).abs() < 1e-6 && (a.g - b.g).abs() < 1e-6 && (a.b - b.b).abs() < 1e-6, "mismatch at ({x}, {y})");
			}
		}

		sequential.on_unbind();
		parallel.on_unbind();
	}

	#[test]
	fn draw_parallel_culls_back_facing_triangles() {
		static POSITIONS: [Vec4; 3] = [Vec4::new(-0.9, -0.9, 0.0, 1.0), Vec4::new(0.9, -0.9, 0.0, 1.0), Vec4::new(0.0, 0.9, 0.0, 1.0)];

		let vs = triangle_vertex_shader(&POSITIONS);
		let ps = |v: &Vertex| Some((Rgb::splat(v.varyings[0]), 1.0));

		let mut fb = two_tile_framebuffer();
		let mut state = covering_triangle_state(&vs, &ps);
		state.winding = Winding::Clockwise;

		draw_parallel(&mut fb, &state, &[0, 1, 2], &crate::scheduler::SequentialScheduler, 4);

		let shaded = (0..128).flat_map(|y| (0..128).map(move |x| (x, y))).filter(|&(x, y)| fb.color_mut(0).unwrap().pixels.get(x, y).r > 0.0).count();
		assert_eq!(shaded, 0);

		fb.on_unbind();
	}
}
