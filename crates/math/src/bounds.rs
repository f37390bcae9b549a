use super::{Vec3, Unit};

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3 {
	pub min: Vec3,
	pub max: Vec3,
}

impl Default for Bounds3 {
	fn default() -> Self {
		Self::EMPTY
	}
}

impl Bounds3 {
	pub const EMPTY: Self = Self {
		min: Vec3::new(f32::MAX, f32::MAX, f32::MAX),
		max: Vec3::new(f32::MIN, f32::MIN, f32::MIN),
	};

	pub const fn new(min: Vec3, max: Vec3) -> Self {
		Self { min, max }
	}

	pub fn from_point(p: Vec3) -> Self {
		Self { min: p, max: p }
	}

	pub fn union_point(&self, p: Vec3) -> Self {
		Self {
			min: Vec3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
			max: Vec3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
		}
	}

	pub fn union(&self, rhs: Self) -> Self {
		Self {
			min: Vec3::new(self.min.x.min(rhs.min.x), self.min.y.min(rhs.min.y), self.min.z.min(rhs.min.z)),
			max: Vec3::new(self.max.x.max(rhs.max.x), self.max.y.max(rhs.max.y), self.max.z.max(rhs.max.z)),
		}
	}

	pub fn overlaps(&self, rhs: Self) -> bool {
		self.min.x <= rhs.max.x && self.max.x >= rhs.min.x
			&& self.min.y <= rhs.max.y && self.max.y >= rhs.min.y
			&& self.min.z <= rhs.max.z && self.max.z >= rhs.min.z
	}

	pub fn contains(&self, p: Vec3) -> bool {
		p.x >= self.min.x && p.x <= self.max.x
			&& p.y >= self.min.y && p.y <= self.max.y
			&& p.z >= self.min.z && p.z <= self.max.z
	}

	pub fn diagonal(&self) -> Vec3 {
		self.max - self.min
	}

	pub fn surface_area(&self) -> f32 {
		let d = self.diagonal();
		if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
			return 0.0;
		}
		2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
	}

	pub fn centroid(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}

	/// Index of the axis along which the box is longest (0=x, 1=y, 2=z).
	pub fn max_extent(&self) -> usize {
		let d = self.diagonal();
		if d.x > d.y && d.x > d.z {
			0
		} else if d.y > d.z {
			1
		} else {
			2
		}
	}

	/// Ray/box intersection, returning the clipped `[t0, t1]` range if it overlaps `[t_min, t_max]`.
	pub fn intersect_p(&self, origin: Vec3, inv_dir: Vec3, t_min: f32, t_max: f32) -> Option<(f32, f32)> {
		let mut t0 = t_min;
		let mut t1 = t_max;

		for axis in 0..3 {
			let inv = inv_dir[axis];
			let mut t_near = (self.min[axis] - origin[axis]) * inv;
			let mut t_far = (self.max[axis] - origin[axis]) * inv;

			if t_near > t_far {
				std::mem::swap(&mut t_near, &mut t_far);
			}

			t0 = t0.max(t_near);
			t1 = t1.min(t_far);

			if t0 > t1 {
				return None;
			}
		}

		Some((t0, t1))
	}
}

/// A bounding sphere, used for light/primitive culling where an AABB would be looser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
	pub center: Vec3,
	pub radius: f32,
}

impl BoundingSphere {
	pub fn from_bounds(bounds: Bounds3) -> Self {
		let center = bounds.centroid();
		let radius = (bounds.max - center).length();
		Self { center, radius }
	}

	pub fn intersect_ray(&self, origin: Vec3, dir: Unit<Vec3>) -> Option<(f32, f32)> {
		let oc = origin - self.center;
		let b = oc.dot(*dir);
		let c = oc.dot(oc) - self.radius * self.radius;
		let disc = b * b - c;

		if disc < 0.0 {
			return None;
		}

		let sqrt_disc = disc.sqrt();
		Some((-b - sqrt_disc, -b + sqrt_disc))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn union_grows_to_contain_both() {
		let a = Bounds3::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
		let b = Bounds3::new(Vec3::new(2.0, -1.0, 0.5), Vec3::new(3.0, 0.5, 2.0));
		let u = a.union(b);

		assert_eq!(u.min, Vec3::new(0.0, -1.0, 0.0));
		assert_eq!(u.max, Vec3::new(3.0, 1.0, 2.0));
	}

	#[test]
	fn ray_hits_unit_cube() {
		let b = Bounds3::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
		let origin = Vec3::new(0.0, 0.0, -5.0);
		let inv_dir = Vec3::new(0.0, 0.0, 1.0);

		let hit = b.intersect_p(origin, inv_dir, 0.0, f32::MAX);
		assert!(hit.is_some());
		let (t0, t1) = hit.unwrap();
		assert!((t0 - 4.0).abs() < 1e-5);
		assert!((t1 - 6.0).abs() < 1e-5);
	}

	#[test]
	fn ray_misses_cube() {
		let b = Bounds3::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
		let origin = Vec3::new(5.0, 5.0, -5.0);
		let inv_dir = Vec3::new(0.0, 0.0, 1.0);

		assert!(b.intersect_p(origin, inv_dir, 0.0, f32::MAX).is_none());
	}
}
