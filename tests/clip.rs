//! A triangle with one vertex behind the eye (`w<0`) clips against the
//! `w=0` plane to a quad; every surviving vertex satisfies `0 <= z <= w`.

use math::Vec4;
use raster::{clip_triangle, Vertex};

#[test]
fn triangle_straddling_the_near_plane_clips_to_four_vertices() {
	let v0 = Vertex::new(Vec4::new(0.0, 0.0, 0.5, 1.0), &[]);
	let v1 = Vertex::new(Vec4::new(0.0, 0.0, -0.5, -1.0), &[]);
	let v2 = Vertex::new(Vec4::new(1.0, 0.0, 0.5, 1.0), &[]);

	let poly = clip_triangle(v0, v1, v2);
	assert_eq!(poly.len(), 4);

	for v in poly.iter() {
		assert!(v.clip_position.w >= -1e-5);
		assert!(v.clip_position.z <= v.clip_position.w + 1e-5);
	}
}

#[test]
fn triangle_entirely_behind_the_eye_is_fully_culled() {
	let v0 = Vertex::new(Vec4::new(0.0, 0.0, 0.0, -1.0), &[]);
	let v1 = Vertex::new(Vec4::new(1.0, 0.0, 0.0, -1.0), &[]);
	let v2 = Vertex::new(Vec4::new(0.0, 1.0, 0.0, -1.0), &[]);

	assert!(clip_triangle(v0, v1, v2).is_empty());
}
