//! A KD-tree built over the 12 triangles of an axis-aligned unit cube finds
//! the correct face and hit distance for a ray fired straight through it.

use geometry::shape::intersect_triangle;
use geometry::KdTree;
use math::{Bounds3, Vec3};

#[test]
fn ray_through_a_unit_cube_hits_the_z_zero_face_at_t_one() {
	let mut builder = geometry::MeshBuilder::new();
	builder.reserve(8, 0, 6);

	let v0 = builder.add_vertex([0.0, 0.0, 0.0]);
	let v1 = builder.add_vertex([1.0, 0.0, 0.0]);
	let v2 = builder.add_vertex([1.0, 1.0, 0.0]);
	let v3 = builder.add_vertex([0.0, 1.0, 0.0]);
	let v4 = builder.add_vertex([0.0, 0.0, 1.0]);
	let v5 = builder.add_vertex([1.0, 0.0, 1.0]);
	let v6 = builder.add_vertex([1.0, 1.0, 1.0]);
	let v7 = builder.add_vertex([0.0, 1.0, 1.0]);

	builder.add_quad(v0, v1, v2, v3); // z=0
	builder.add_quad(v4, v7, v6, v5); // z=1
	builder.add_quad(v0, v3, v7, v4); // x=0
	builder.add_quad(v1, v5, v6, v2); // x=1
	builder.add_quad(v0, v4, v5, v1); // y=0
	builder.add_quad(v3, v2, v6, v7); // y=1

	let mesh = builder.build();
	assert_eq!(mesh.indices.len(), 12 * 3);

	let faces: Vec<[usize; 3]> = mesh.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
	let bounds: Vec<Bounds3> = faces
		.iter()
		.map(|f| {
			let b = Bounds3::from_point(mesh.vertices[f[0]].p);
			let b = b.union_point(mesh.vertices[f[1]].p);
			b.union_point(mesh.vertices[f[2]].p)
		})
		.collect();

	let tree = KdTree::build(&bounds);

	let origin = Vec3::new(0.5, 0.5, -1.0);
	let dir = Vec3::new(0.0, 0.0, 1.0);

	let mut best_t = f32::MAX;
	let hit = tree.intersect(origin, dir, 0.0, f32::MAX, |prim, t_min, t_max| {
		let face = &faces[prim as usize];
		let ray = geometry::Ray { origin, dir, t_min, t_max, depth: 0 };
		let (t, _) = intersect_triangle(&mesh, face, ray)?;
		best_t = best_t.min(t);
		Some(t)
	});

	assert!(hit);
	assert!((best_t - 1.0).abs() < 1e-4);
}
