//! Bundles the KD-tree, the instances and materials it indexes, the light
//! list, and an environment hook for rays that escape the scene entirely.
//!
//! Grounded in `Scene::Intersect`/`IntersectP`, which just forward to the
//! KD-tree; here the KD-tree is built over per-instance bounds (an instance
//! is this design's KD-tree primitive, same granularity the original's
//! `Scene` builds over).

use geometry::{DifferentialGeometry, Instance, KdTree, Ray};
use math::Rgb;
use shading::Material;

use crate::light::Light;

pub struct Scene {
	pub instances: Vec<Instance>,
	pub materials: Vec<Material>,
	/// `materials[instance_material[i]]` is the material of `instances[i]`.
	pub instance_material: Vec<usize>,
	pub lights: Vec<Light>,
	/// Radiance returned for rays that miss every instance; the supplemented
	/// infinite-light-on-miss hook, not an importance-sampled light.
	pub environment: Rgb,
	kdtree: KdTree,
}

impl Scene {
	pub fn new(instances: Vec<Instance>, materials: Vec<Material>, instance_material: Vec<usize>, lights: Vec<Light>, environment: Rgb) -> Self {
		debug_assert_eq!(instances.len(), instance_material.len());
		let bounds: Vec<math::Bounds3> = instances.iter().map(Instance::world_bound).collect();
		let kdtree = KdTree::build(&bounds);
		Self { instances, materials, instance_material, lights, environment, kdtree }
	}

	pub fn world_bound(&self) -> math::Bounds3 {
		self.kdtree.world_bound()
	}

	/// Nearest hit, if any: the hit distance, its differential geometry, and
	/// the index of the instance (and thus material) that was hit.
	pub fn intersect(&self, ray: Ray) -> Option<(f32, DifferentialGeometry, usize)> {
		let mut best: Option<(f32, DifferentialGeometry, usize)> = None;

		self.kdtree.intersect(ray.origin, ray.dir, ray.t_min, ray.t_max, |prim, t_min, t_max| {
			let mut bounded_ray = ray;
			bounded_ray.t_min = t_min;
			bounded_ray.t_max = t_max;

			let (t, dg) = self.instances[prim as usize].intersect(bounded_ray)?;
			best = Some((t, dg, prim as usize));
			Some(t)
		});

		best
	}

	/// Shadow-ray occlusion test; stops at the first hit, not necessarily the
	/// nearest one.
	pub fn intersect_p(&self, ray: Ray) -> bool {
		self.kdtree.intersect(ray.origin, ray.dir, ray.t_min, ray.t_max, |prim, t_min, t_max| {
			let mut bounded_ray = ray;
			bounded_ray.t_min = t_min;
			bounded_ray.t_max = t_max;
			self.instances[prim as usize].intersect(bounded_ray).map(|(t, _)| t)
		})
	}

	pub fn material_for(&self, instance: usize) -> &Material {
		&self.materials[self.instance_material[instance]]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use geometry::shape::Sphere;
	use geometry::Shape;
	use math::isometry::Isometry3;
	use math::Vec3;

	fn unit_sphere_scene() -> Scene {
		let sphere = Sphere::full(1.0);
		let instance = Instance::new(Shape::Sphere(sphere), Isometry3::identity());
		Scene::new(vec![instance], vec![Material::Mirror { reflectance: Rgb::WHITE }], vec![0], vec![], Rgb::BLACK)
	}

	#[test]
	fn ray_through_the_origin_hits_the_unit_sphere() {
		let scene = unit_sphere_scene();
		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let hit = scene.intersect(ray);
		assert!(hit.is_some());
		let (t, _, instance) = hit.unwrap();
		assert!((t - 4.0).abs() < 1e-4);
		assert_eq!(instance, 0);
	}

	#[test]
	fn ray_missing_the_sphere_reports_no_hit() {
		let scene = unit_sphere_scene();
		let ray = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		assert!(scene.intersect(ray).is_none());
		assert!(!scene.intersect_p(ray));
	}
}
