//! Perspective divide, viewport transform, and back-face culling.

use math::{Vec2, Vec4};

use crate::vertex::Vertex;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Winding {
	CounterClockwise,
	Clockwise,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CullMode {
	None,
	Front,
	Back,
}

#[derive(Clone, Copy, Debug)]
pub struct Viewport {
	pub x: f32,
	pub y: f32,
	pub width: f32,
	pub height: f32,
}

/// Divides `xyz` by `w`, stores `invW` in the vertex's `w` slot, maps `xy`
/// into the viewport (top-left origin, y-down), and pre-multiplies every
/// varying by `invW` so interpolation across the triangle stays linear in
/// screen space.
pub fn project_vertex(v: &Vertex, viewport: &Viewport) -> Vertex {
	let inv_w = 1.0 / v.clip_position.w;
	let ndc_x = v.clip_position.x * inv_w;
	let ndc_y = v.clip_position.y * inv_w;
	let z = v.clip_position.z * inv_w;

	let screen_x = (ndc_x * 0.5 + 0.5) * viewport.width + viewport.x;
	let screen_y = (1.0 - (ndc_y * 0.5 + 0.5)) * viewport.height + viewport.y;

	let mut varyings = v.varyings;
	for slot in varyings.iter_mut().take(v.varying_count) {
		*slot *= inv_w;
	}

	Vertex { clip_position: Vec4::new(screen_x, screen_y, z, inv_w), varyings, varying_count: v.varying_count }
}

/// Twice the signed area of the screen-space triangle; positive for
/// counter-clockwise winding in a y-down coordinate system.
pub fn signed_area(v0: Vec2, v1: Vec2, v2: Vec2) -> f32 {
	(v1.x - v0.x) * (v2.y - v0.y) - (v1.y - v0.y) * (v2.x - v0.x)
}

fn is_front_facing(area: f32, winding: Winding) -> bool {
	match winding {
		Winding::CounterClockwise => area < 0.0,
		Winding::Clockwise => area > 0.0,
	}
}

/// `true` if the triangle should be discarded given `area`'s sign, the
/// declared front-face winding, and the active cull mode.
pub fn should_cull(area: f32, winding: Winding, cull: CullMode) -> bool {
	if area == 0.0 {
		return true;
	}
	let front_facing = is_front_facing(area, winding);
	match cull {
		CullMode::None => false,
		CullMode::Front => front_facing,
		CullMode::Back => !front_facing,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }
	}

	#[test]
	fn projected_center_vertex_lands_at_viewport_center() {
		let v = Vertex::new(Vec4::new(0.0, 0.0, 0.0, 1.0), &[1.0]);
		let p = project_vertex(&v, &viewport());
		assert!((p.clip_position.x - 50.0).abs() < 1e-5);
		assert!((p.clip_position.y - 50.0).abs() < 1e-5);
		assert!((p.clip_position.w - 1.0).abs() < 1e-6); // invW
	}

	#[test]
	fn varyings_are_premultiplied_by_inv_w() {
		let v = Vertex::new(Vec4::new(0.0, 0.0, 0.0, 2.0), &[10.0]);
		let p = project_vertex(&v, &viewport());
		assert!((p.varyings[0] - 5.0).abs() < 1e-5);
	}

	#[test]
	fn ccw_triangle_is_kept_under_back_cull_with_ccw_front_face() {
		let v0 = Vec2::new(0.0, 0.0);
		let v1 = Vec2::new(1.0, 0.0);
		let v2 = Vec2::new(0.0, 1.0);
		let area = signed_area(v0, v1, v2);
		assert!(!should_cull(area, Winding::CounterClockwise, CullMode::Back));
	}

	#[test]
	fn flipping_winding_convention_culls_the_same_triangle() {
		let v0 = Vec2::new(0.0, 0.0);
		let v1 = Vec2::new(1.0, 0.0);
		let v2 = Vec2::new(0.0, 1.0);
		let area = signed_area(v0, v1, v2);
		assert!(should_cull(area, Winding::Clockwise, CullMode::Back));
	}
}
