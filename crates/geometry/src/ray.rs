use math::Vec3;

/// A ray parameterized as `o + t*d`, valid over `[t_min, t_max]`.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
	pub origin: Vec3,
	pub dir: Vec3,
	pub t_min: f32,
	pub t_max: f32,
	pub depth: u32,
}

impl Ray {
	pub fn new(origin: Vec3, dir: Vec3) -> Self {
		Self { origin, dir, t_min: 1e-4, t_max: f32::MAX, depth: 0 }
	}

	pub fn at(&self, t: f32) -> Vec3 {
		self.origin + self.dir * t
	}

	pub fn inv_dir(&self) -> Vec3 {
		Vec3::new(1.0 / self.dir.x, 1.0 / self.dir.y, 1.0 / self.dir.z)
	}
}

/// A ray bundled with the rays its neighboring pixels would have cast, used
/// to derive texture-space footprints for mip selection.
#[derive(Clone, Copy, Debug)]
pub struct RayDifferential {
	pub ray: Ray,
	pub rx_origin: Vec3,
	pub rx_dir: Vec3,
	pub ry_origin: Vec3,
	pub ry_dir: Vec3,
	pub has_differentials: bool,
}

impl RayDifferential {
	pub fn new(ray: Ray) -> Self {
		Self {
			ray,
			rx_origin: ray.origin,
			rx_dir: ray.dir,
			ry_origin: ray.origin,
			ry_dir: ray.dir,
			has_differentials: false,
		}
	}

	pub fn scale(&mut self, s: f32) {
		self.rx_origin = self.ray.origin + (self.rx_origin - self.ray.origin) * s;
		self.ry_origin = self.ray.origin + (self.ry_origin - self.ray.origin) * s;
		self.rx_dir = self.ray.dir + (self.rx_dir - self.ray.dir) * s;
		self.ry_dir = self.ray.dir + (self.ry_dir - self.ray.dir) * s;
	}
}
