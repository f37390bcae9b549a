//! Sutherland-Hodgman clipping of a single triangle against the `w=0` and
//! `z=w` clip-space planes, producing 0, 3, 4, or 5 vertices.

use smallvec::SmallVec;

use crate::vertex::Vertex;

/// Matches `stack_pool<Vertex,6>` from the original clipper: small triangles
/// stay on the stack, only pathological inputs spill to the heap.
pub type ClipPoly = SmallVec<[Vertex; 6]>;

fn near_distance(v: &Vertex) -> f32 {
	v.clip_position.w
}

fn far_distance(v: &Vertex) -> f32 {
	v.clip_position.w - v.clip_position.z
}

fn clip_against(poly: &ClipPoly, distance: impl Fn(&Vertex) -> f32) -> ClipPoly {
	let mut out = ClipPoly::new();
	if poly.is_empty() {
		return out;
	}

	for i in 0..poly.len() {
		let current = &poly[i];
		let previous = &poly[(i + poly.len() - 1) % poly.len()];

		let d_curr = distance(current);
		let d_prev = distance(previous);

		let curr_inside = d_curr >= 0.0;
		let prev_inside = d_prev >= 0.0;

		if curr_inside != prev_inside {
			let t = d_prev / (d_prev - d_curr);
			out.push(previous.lerp(current, t));
		}
		if curr_inside {
			out.push(*current);
		}
	}
	out
}

/// Clips a triangle against the near (`w=0`) then far (`z=w`) planes.
/// Returns an empty poly if the triangle is fully culled.
pub fn clip_triangle(v0: Vertex, v1: Vertex, v2: Vertex) -> ClipPoly {
	let mut poly: ClipPoly = SmallVec::new();
	poly.push(v0);
	poly.push(v1);
	poly.push(v2);

	let poly = clip_against(&poly, near_distance);
	if poly.is_empty() {
		return poly;
	}
	clip_against(&poly, far_distance)
}

/// Fans a clipped convex polygon into `(poly.len() - 2)` triangles, written
/// as index triples into `poly`.
pub fn fan_triangulate(poly: &ClipPoly) -> SmallVec<[(usize, usize, usize); 3]> {
	let mut tris = SmallVec::new();
	if poly.len() < 3 {
		return tris;
	}
	for i in 1..poly.len() - 1 {
		tris.push((0, i, i + 1));
	}
	tris
}

#[cfg(test)]
mod tests {
	use super::*;
	use math::Vec4;

	fn vertex_at(x: f32, y: f32, z: f32, w: f32) -> Vertex {
		Vertex::new(Vec4::new(x, y, z, w), &[])
	}

	#[test]
	fn fully_inside_triangle_survives_unclipped() {
		let poly = clip_triangle(vertex_at(-0.5, -0.5, 0.2, 1.0), vertex_at(0.5, -0.5, 0.2, 1.0), vertex_at(0.0, 0.5, 0.2, 1.0));
		assert_eq!(poly.len(), 3);
	}

	#[test]
	fn vertex_behind_near_plane_produces_a_quad() {
		// v1 has w < 0: fully behind the eye.
		let poly = clip_triangle(vertex_at(0.0, 0.0, 0.5, 1.0), vertex_at(0.0, 0.0, -0.5, -1.0), vertex_at(1.0, 0.0, 0.5, 1.0));
		assert_eq!(poly.len(), 4);
		for v in poly.iter() {
			assert!(v.clip_position.w >= -1e-5);
			assert!(v.clip_position.z <= v.clip_position.w + 1e-5);
		}
	}

	#[test]
	fn triangle_entirely_behind_eye_is_culled() {
		let poly = clip_triangle(vertex_at(0.0, 0.0, 0.0, -1.0), vertex_at(1.0, 0.0, 0.0, -1.0), vertex_at(0.0, 1.0, 0.0, -1.0));
		assert!(poly.is_empty());
	}

	#[test]
	fn fan_triangulate_covers_a_clipped_quad() {
		let poly = clip_triangle(vertex_at(0.0, 0.0, 0.5, 1.0), vertex_at(0.0, 0.0, -0.5, -1.0), vertex_at(1.0, 0.0, 0.5, 1.0));
		let tris = fan_triangulate(&poly);
		assert_eq!(tris.len(), poly.len() - 2);
	}
}
