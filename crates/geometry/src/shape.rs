//! Intersectable shapes in local object space, transformed to world space by
//! an owning [`Instance`]. Mirrors the original `Shape`/`DifferentialGeometry`
//! split: `intersect` fills in a fully differential hit record so shading and
//! texture filtering downstream never have to special-case which shape it came
//! from.

use math::isometry::Isometry3;
use math::sampling::{concentric_sample_disk, stratified_sample_2d};
use math::{Unit, Vec2, Vec3};

use crate::mesh::Mesh;
use crate::ray::Ray;

/// A fully-populated differential hit record, filled in world space.
#[derive(Clone, Copy, Debug)]
pub struct DifferentialGeometry {
	pub point: Vec3,
	pub normal: Vec3,
	pub uv: Vec2,
	pub dpdu: Vec3,
	pub dpdv: Vec3,
	pub dndu: Vec3,
	pub dndv: Vec3,
}

impl DifferentialGeometry {
	fn new(point: Vec3, dpdu: Vec3, dpdv: Vec3, dndu: Vec3, dndv: Vec3, uv: Vec2) -> Self {
		let normal = *dpdu.cross(dpdv).normalize();
		Self { point, normal, uv, dpdu, dpdv, dndu, dndv }
	}
}

/// A shape placed in the scene via a local-to-world isometry.
pub struct Instance {
	pub shape: Shape,
	pub local_to_world: Isometry3,
	pub reverse_orientation: bool,
}

impl Instance {
	pub fn new(shape: Shape, local_to_world: Isometry3) -> Self {
		Self { shape, local_to_world, reverse_orientation: false }
	}

	fn to_local(&self, ray: Ray) -> Ray {
		let inv = self.local_to_world.inv();
		Ray {
			origin: inv.transform(ray.origin),
			dir: inv.rotation * ray.dir,
			t_min: ray.t_min,
			t_max: ray.t_max,
			depth: ray.depth,
		}
	}

	pub fn world_bound(&self) -> math::Bounds3 {
		let local = self.shape.local_bound();
		let mut world = math::Bounds3::EMPTY;
		for i in 0..8 {
			let corner = Vec3::new(
				if i & 1 == 0 { local.min.x } else { local.max.x },
				if i & 2 == 0 { local.min.y } else { local.max.y },
				if i & 4 == 0 { local.min.z } else { local.max.z },
			);
			world = world.union_point(self.local_to_world.transform(corner));
		}
		world
	}

	pub fn intersect(&self, ray: Ray) -> Option<(f32, DifferentialGeometry)> {
		let local_ray = self.to_local(ray);
		let (t, mut dg) = self.shape.intersect(local_ray)?;

		dg.point = self.local_to_world.transform(dg.point);
		dg.dpdu = self.local_to_world.rotation * dg.dpdu;
		dg.dpdv = self.local_to_world.rotation * dg.dpdv;
		dg.dndu = self.local_to_world.rotation * dg.dndu;
		dg.dndv = self.local_to_world.rotation * dg.dndv;
		dg.normal = *(self.local_to_world.rotation * dg.normal).normalize();
		if self.reverse_orientation {
			dg.normal = -dg.normal;
		}

		Some((t, dg))
	}

	pub fn intersect_p(&self, ray: Ray) -> bool {
		self.intersect(ray).is_some()
	}

	pub fn area(&self) -> f32 {
		self.shape.area()
	}

	/// Samples a point on the shape, returning `(point, normal, pdf)` with
	/// `pdf` measured with respect to surface area.
	pub fn sample(&self, u: (f32, f32)) -> (Vec3, Vec3, f32) {
		let (p, n) = self.shape.sample(u);
		let mut n = *(self.local_to_world.rotation * n).normalize();
		if self.reverse_orientation {
			n = -n;
		}
		(self.local_to_world.transform(p), n, 1.0 / self.area().max(1e-7))
	}

	/// Samples a point on the shape visible from `pt`, with `pdf` measured
	/// with respect to solid angle at `pt`. Falls back to area sampling
	/// converted to solid angle when the shape has no specialized strategy.
	pub fn sample_from(&self, pt: Vec3, u: (f32, f32)) -> (Vec3, Vec3, f32) {
		if let Shape::Sphere(sphere) = &self.shape {
			let center = self.local_to_world.transform(Vec3::ZERO);
			let local_pt = self.local_to_world.inv().transform(pt);
			if let Some((p, n, pdf)) = sphere.sample_from(local_pt, u) {
				let mut n = *(self.local_to_world.rotation * n).normalize();
				if self.reverse_orientation {
					n = -n;
				}
				let _ = center;
				return (self.local_to_world.transform(p), n, pdf);
			}
		}

		let (p, n, area_pdf) = self.sample(u);
		let to_light = p - pt;
		let dist_sq = to_light.length_sq();
		if dist_sq < 1e-12 {
			return (p, n, 0.0);
		}
		let wi = *to_light.normalize();
		let cos_theta = n.dot(-wi).abs();
		if cos_theta < 1e-7 {
			return (p, n, 0.0);
		}
		(p, n, area_pdf * dist_sq / cos_theta)
	}

	pub fn pdf_from(&self, pt: Vec3, wi: Unit<Vec3>) -> f32 {
		if let Shape::Sphere(sphere) = &self.shape {
			let local_pt = self.local_to_world.inv().transform(pt);
			return sphere.pdf_from(local_pt);
		}

		let ray = Ray::new(pt, *wi);
		match self.intersect(ray) {
			Some((t, dg)) => {
				let dist_sq = (dg.point - pt).length_sq();
				let cos_theta = dg.normal.dot(-*wi).abs();
				if cos_theta < 1e-7 {
					0.0
				} else {
					let _ = t;
					dist_sq / (cos_theta * self.area().max(1e-7))
				}
			}
			None => 0.0,
		}
	}
}

pub enum Shape {
	Sphere(Sphere),
	Disk(Disk),
	Cylinder(Cylinder),
	Mesh(Mesh),
}

impl Shape {
	pub fn local_bound(&self) -> math::Bounds3 {
		match self {
			Shape::Sphere(s) => s.local_bound(),
			Shape::Disk(d) => d.local_bound(),
			Shape::Cylinder(c) => c.local_bound(),
			Shape::Mesh(m) => mesh_bound(m),
		}
	}

	pub fn area(&self) -> f32 {
		match self {
			Shape::Sphere(s) => s.area(),
			Shape::Disk(d) => d.area(),
			Shape::Cylinder(c) => c.area(),
			Shape::Mesh(m) => mesh_area(m),
		}
	}

	pub fn intersect(&self, ray: Ray) -> Option<(f32, DifferentialGeometry)> {
		match self {
			Shape::Sphere(s) => s.intersect(ray),
			Shape::Disk(d) => d.intersect(ray),
			Shape::Cylinder(c) => c.intersect(ray),
			Shape::Mesh(m) => mesh_intersect(m, ray),
		}
	}

	pub fn sample(&self, u: (f32, f32)) -> (Vec3, Vec3) {
		match self {
			Shape::Sphere(s) => s.sample(u),
			Shape::Disk(d) => d.sample(u),
			Shape::Cylinder(c) => c.sample(u),
			Shape::Mesh(m) => mesh_sample(m, u),
		}
	}
}

/// A sphere centered at the local origin, optionally clipped to a z range
/// and a maximum sweep angle, matching the quadric in the original renderer.
pub struct Sphere {
	pub radius: f32,
	pub z_min: f32,
	pub z_max: f32,
	pub phi_max: f32,
}

impl Sphere {
	pub fn full(radius: f32) -> Self {
		Self { radius, z_min: -radius, z_max: radius, phi_max: std::f32::consts::TAU }
	}

	fn local_bound(&self) -> math::Bounds3 {
		math::Bounds3::new(
			Vec3::new(-self.radius, -self.radius, self.z_min),
			Vec3::new(self.radius, self.radius, self.z_max),
		)
	}

	fn area(&self) -> f32 {
		self.phi_max * self.radius * (self.z_max - self.z_min)
	}

	fn intersect(&self, ray: Ray) -> Option<(f32, DifferentialGeometry)> {
		let a = ray.dir.dot(ray.dir);
		let b = 2.0 * ray.origin.dot(ray.dir);
		let c = ray.origin.dot(ray.origin) - self.radius * self.radius;

		let (t0, t1) = solve_quadratic(a, b, c)?;
		if t0 > ray.t_max || t1 < ray.t_min {
			return None;
		}

		let mut t_hit = if t0 >= ray.t_min { t0 } else { t1 };
		if t_hit > ray.t_max {
			return None;
		}

		let mut p_hit = ray.at(t_hit);
		if p_hit.x == 0.0 && p_hit.y == 0.0 {
			p_hit.x = 1e-5 * self.radius;
		}
		let mut phi = p_hit.y.atan2(p_hit.x);
		if phi < 0.0 {
			phi += std::f32::consts::TAU;
		}

		if p_hit.z < self.z_min || p_hit.z > self.z_max || phi > self.phi_max {
			if t_hit == t1 || t1 > ray.t_max {
				return None;
			}
			t_hit = t1;
			p_hit = ray.at(t_hit);
			if p_hit.x == 0.0 && p_hit.y == 0.0 {
				p_hit.x = 1e-5 * self.radius;
			}
			phi = p_hit.y.atan2(p_hit.x);
			if phi < 0.0 {
				phi += std::f32::consts::TAU;
			}
			if p_hit.z < self.z_min || p_hit.z > self.z_max || phi > self.phi_max {
				return None;
			}
		}

		let u = phi / self.phi_max;
		let theta = (p_hit.z / self.radius).clamp(-1.0, 1.0).acos();
		let theta_min = (self.z_max / self.radius).clamp(-1.0, 1.0).acos();
		let theta_max = (self.z_min / self.radius).clamp(-1.0, 1.0).acos();
		let v = (theta - theta_min) / (theta_max - theta_min);

		let z_radius = (p_hit.x * p_hit.x + p_hit.y * p_hit.y).sqrt();
		let (cos_phi, sin_phi) = if z_radius > 0.0 {
			(p_hit.x / z_radius, p_hit.y / z_radius)
		} else {
			(1.0, 0.0)
		};

		let dpdu = Vec3::new(-self.phi_max * p_hit.y, self.phi_max * p_hit.x, 0.0);
		let dpdv = (theta_max - theta_min)
			* Vec3::new(p_hit.z * cos_phi, p_hit.z * sin_phi, -self.radius * theta.sin());

		Some((t_hit, DifferentialGeometry::new(p_hit, dpdu, dpdv, Vec3::ZERO, Vec3::ZERO, Vec2::new(u, v))))
	}

	fn sample(&self, u: (f32, f32)) -> (Vec3, Vec3) {
		let dir = uniform_sample_sphere(u);
		let p = dir * self.radius;
		(p, dir)
	}

	/// Visible-cone sampling from an external point, per spec §4.4: when the
	/// point is inside the sphere this returns `None` so the caller falls
	/// back to uniform-sphere sampling.
	fn sample_from(&self, pt: Vec3, u: (f32, f32)) -> Option<(Vec3, Vec3, f32)> {
		let dist_sq = pt.length_sq();
		if dist_sq - self.radius * self.radius < 1e-4 {
			return None;
		}

		let wc = *(-pt).normalize();
		let (wc_x, wc_y) = coordinate_system(wc);
		let sin_theta_max2 = (self.radius * self.radius / dist_sq).min(1.0);
		let cos_theta_max = (1.0 - sin_theta_max2).max(0.0).sqrt();

		let dir = uniform_sample_cone(u, cos_theta_max, wc_x, wc_y, wc);
		let ray = Ray { origin: pt, dir, t_min: 1e-3, t_max: f32::MAX, depth: 0 };

		let (p, n) = match self.intersect(ray) {
			Some((t, dg)) => (ray.at(t), dg.normal),
			None => {
				let t = (-pt).dot(dir);
				let p = ray.at(t);
				(p, *p.normalize())
			}
		};

		Some((p, n, uniform_cone_pdf(cos_theta_max)))
	}

	fn pdf_from(&self, pt: Vec3) -> f32 {
		let dist_sq = pt.length_sq();
		if dist_sq - self.radius * self.radius < 1e-4 {
			return 1.0 / self.area().max(1e-7);
		}
		let sin_theta_max2 = (self.radius * self.radius / dist_sq).min(1.0);
		let cos_theta_max = (1.0 - sin_theta_max2).max(0.0).sqrt();
		uniform_cone_pdf(cos_theta_max)
	}
}

/// A disk in the local z=height plane, optionally an annulus and/or a
/// partial angular sweep.
pub struct Disk {
	pub height: f32,
	pub radius: f32,
	pub inner_radius: f32,
	pub phi_max: f32,
}

impl Disk {
	pub fn full(radius: f32) -> Self {
		Self { height: 0.0, radius, inner_radius: 0.0, phi_max: std::f32::consts::TAU }
	}

	fn local_bound(&self) -> math::Bounds3 {
		math::Bounds3::new(
			Vec3::new(-self.radius, -self.radius, self.height),
			Vec3::new(self.radius, self.radius, self.height),
		)
	}

	fn area(&self) -> f32 {
		self.phi_max * 0.5 * (self.radius * self.radius - self.inner_radius * self.inner_radius)
	}

	fn intersect(&self, ray: Ray) -> Option<(f32, DifferentialGeometry)> {
		if ray.dir.z.abs() < 1e-7 {
			return None;
		}
		let t_hit = (self.height - ray.origin.z) / ray.dir.z;
		if t_hit < ray.t_min || t_hit > ray.t_max {
			return None;
		}

		let p_hit = ray.at(t_hit);
		let dist_sq = p_hit.x * p_hit.x + p_hit.y * p_hit.y;
		if dist_sq > self.radius * self.radius || dist_sq < self.inner_radius * self.inner_radius {
			return None;
		}

		let mut phi = p_hit.y.atan2(p_hit.x);
		if phi < 0.0 {
			phi += std::f32::consts::TAU;
		}
		if phi > self.phi_max {
			return None;
		}

		let u = phi / self.phi_max;
		let one_minus_v = (dist_sq.sqrt() - self.inner_radius) / (self.radius - self.inner_radius);
		let v = 1.0 - one_minus_v;

		let dpdu = Vec3::new(-self.phi_max * p_hit.y, self.phi_max * p_hit.x, 0.0);
		let dpdv = Vec3::new(-p_hit.x, -p_hit.y, 0.0) * ((self.radius - self.inner_radius) / self.radius.max(1e-7));

		Some((t_hit, DifferentialGeometry::new(p_hit, dpdu, dpdv, Vec3::ZERO, Vec3::ZERO, Vec2::new(u, v))))
	}

	fn sample(&self, u: (f32, f32)) -> (Vec3, Vec3) {
		let (dx, dy) = concentric_sample_disk(u);
		let p = Vec3::new(dx * self.radius, dy * self.radius, self.height);
		(p, Vec3::new(0.0, 0.0, 1.0))
	}
}

/// A cylinder of infinite-thin shell centered on the local z axis.
pub struct Cylinder {
	pub radius: f32,
	pub z_min: f32,
	pub z_max: f32,
	pub phi_max: f32,
}

impl Cylinder {
	fn local_bound(&self) -> math::Bounds3 {
		math::Bounds3::new(
			Vec3::new(-self.radius, -self.radius, self.z_min),
			Vec3::new(self.radius, self.radius, self.z_max),
		)
	}

	fn area(&self) -> f32 {
		(self.z_max - self.z_min) * self.phi_max * self.radius
	}

	fn intersect(&self, ray: Ray) -> Option<(f32, DifferentialGeometry)> {
		let a = ray.dir.x * ray.dir.x + ray.dir.y * ray.dir.y;
		let b = 2.0 * (ray.dir.x * ray.origin.x + ray.dir.y * ray.origin.y);
		let c = ray.origin.x * ray.origin.x + ray.origin.y * ray.origin.y - self.radius * self.radius;

		let (t0, t1) = solve_quadratic(a, b, c)?;
		if t0 > ray.t_max || t1 < ray.t_min {
			return None;
		}

		let mut t_hit = if t0 >= ray.t_min { t0 } else { t1 };
		if t_hit > ray.t_max {
			return None;
		}

		let mut p_hit = ray.at(t_hit);
		let mut phi = p_hit.y.atan2(p_hit.x);
		if phi < 0.0 {
			phi += std::f32::consts::TAU;
		}

		if p_hit.z < self.z_min || p_hit.z > self.z_max || phi > self.phi_max {
			if t_hit == t1 {
				return None;
			}
			t_hit = t1;
			if t_hit > ray.t_max {
				return None;
			}
			p_hit = ray.at(t_hit);
			phi = p_hit.y.atan2(p_hit.x);
			if phi < 0.0 {
				phi += std::f32::consts::TAU;
			}
			if p_hit.z < self.z_min || p_hit.z > self.z_max || phi > self.phi_max {
				return None;
			}
		}

		let u = phi / self.phi_max;
		let v = (p_hit.z - self.z_min) / (self.z_max - self.z_min);

		let dpdu = Vec3::new(-self.phi_max * p_hit.y, self.phi_max * p_hit.x, 0.0);
		let dpdv = Vec3::new(0.0, 0.0, self.z_max - self.z_min);

		Some((t_hit, DifferentialGeometry::new(p_hit, dpdu, dpdv, Vec3::ZERO, Vec3::ZERO, Vec2::new(u, v))))
	}

	fn sample(&self, u: (f32, f32)) -> (Vec3, Vec3) {
		let z = self.z_min + u.0 * (self.z_max - self.z_min);
		let phi = u.1 * self.phi_max;
		let p = Vec3::new(self.radius * phi.cos(), self.radius * phi.sin(), z);
		let n = *Vec3::new(p.x, p.y, 0.0).normalize();
		(p, n)
	}
}

fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
	let disc = b * b - 4.0 * a * c;
	if disc < 0.0 {
		return None;
	}
	let root = disc.sqrt();
	let q = if b < 0.0 { -0.5 * (b - root) } else { -0.5 * (b + root) };
	let mut t0 = q / a;
	let mut t1 = c / q;
	if t0 > t1 {
		std::mem::swap(&mut t0, &mut t1);
	}
	Some((t0, t1))
}

fn coordinate_system(n: Vec3) -> (Vec3, Vec3) {
	let v2 = if n.x.abs() > n.y.abs() {
		Vec3::new(-n.z, 0.0, n.x) / (n.x * n.x + n.z * n.z).sqrt()
	} else {
		Vec3::new(0.0, n.z, -n.y) / (n.y * n.y + n.z * n.z).sqrt()
	};
	(v2, n.cross(v2))
}

fn uniform_sample_sphere(u: (f32, f32)) -> Vec3 {
	let z = 1.0 - 2.0 * u.0;
	let r = (1.0 - z * z).max(0.0).sqrt();
	let phi = std::f32::consts::TAU * u.1;
	Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

fn uniform_sample_cone(u: (f32, f32), cos_theta_max: f32, x: Vec3, y: Vec3, z: Vec3) -> Vec3 {
	let cos_theta = (1.0 - u.0) + u.0 * cos_theta_max;
	let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
	let phi = u.1 * std::f32::consts::TAU;
	x * (phi.cos() * sin_theta) + y * (phi.sin() * sin_theta) + z * cos_theta
}

fn uniform_cone_pdf(cos_theta_max: f32) -> f32 {
	1.0 / (std::f32::consts::TAU * (1.0 - cos_theta_max))
}

fn mesh_bound(mesh: &Mesh) -> math::Bounds3 {
	let mut b = math::Bounds3::EMPTY;
	for v in &mesh.vertices {
		b = b.union_point(v.p);
	}
	b
}

fn mesh_area(mesh: &Mesh) -> f32 {
	let mut area = 0.0;
	for face in mesh.indices.chunks_exact(3) {
		let (p0, p1, p2) = triangle_points(mesh, face);
		area += 0.5 * (p1 - p0).cross(p2 - p0).length();
	}
	area
}

fn triangle_points(mesh: &Mesh, face: &[usize]) -> (Vec3, Vec3, Vec3) {
	(mesh.vertices[face[0]].p, mesh.vertices[face[1]].p, mesh.vertices[face[2]].p)
}

/// Möller-Trumbore intersection against every triangle, keeping the closest
/// hit. Callers needing sub-linear lookup should route through a KD-tree
/// built over the mesh's triangles instead of calling this directly.
pub fn mesh_intersect(mesh: &Mesh, ray: Ray) -> Option<(f32, DifferentialGeometry)> {
	let mut closest: Option<(f32, DifferentialGeometry)> = None;
	let mut ray = ray;

	for face in mesh.indices.chunks_exact(3) {
		if let Some((t, dg)) = intersect_triangle(mesh, face, ray) {
			ray.t_max = t;
			closest = Some((t, dg));
		}
	}

	closest
}

pub fn intersect_triangle(mesh: &Mesh, face: &[usize], ray: Ray) -> Option<(f32, DifferentialGeometry)> {
	let (v0, v1, v2) = (&mesh.vertices[face[0]], &mesh.vertices[face[1]], &mesh.vertices[face[2]]);

	let e1 = v1.p - v0.p;
	let e2 = v2.p - v0.p;
	let pvec = ray.dir.cross(e2);
	let det = e1.dot(pvec);

	if det.abs() < 1e-9 {
		return None;
	}
	let inv_det = 1.0 / det;

	let tvec = ray.origin - v0.p;
	let bary_u = tvec.dot(pvec) * inv_det;
	if !(0.0..=1.0).contains(&bary_u) {
		return None;
	}

	let qvec = tvec.cross(e1);
	let bary_v = ray.dir.dot(qvec) * inv_det;
	if bary_v < 0.0 || bary_u + bary_v > 1.0 {
		return None;
	}

	let t = e2.dot(qvec) * inv_det;
	if t < ray.t_min || t > ray.t_max {
		return None;
	}

	let bary_w = 1.0 - bary_u - bary_v;
	let p = ray.at(t);
	let uv = v0.uv * bary_w + v1.uv * bary_u + v2.uv * bary_v;

	let duv02 = v0.uv - v2.uv;
	let duv12 = v1.uv - v2.uv;
	let det_uv = duv02.x * duv12.y - duv02.y * duv12.x;

	let (dpdu, dpdv) = if det_uv.abs() < 1e-9 {
		let n = e1.cross(e2);
		let (x, y) = coordinate_system(*n.normalize());
		(x, y)
	} else {
		let inv_det_uv = 1.0 / det_uv;
		let dp02 = v0.p - v2.p;
		let dp12 = v1.p - v2.p;
		(
			(dp02 * duv12.y - dp12 * duv02.y) * inv_det_uv,
			(dp12 * duv02.x - dp02 * duv12.x) * inv_det_uv,
		)
	};

	let geo_normal = *e1.cross(e2).normalize();
	let shading_normal = *(v0.n * bary_w + v1.n * bary_u + v2.n * bary_v).normalize();
	let shading_normal = if shading_normal.dot(geo_normal) < 0.0 { -shading_normal } else { shading_normal };

	let mut dg = DifferentialGeometry::new(p, dpdu, dpdv, Vec3::ZERO, Vec3::ZERO, uv);
	dg.normal = shading_normal;
	Some((t, dg))
}

fn mesh_sample(mesh: &Mesh, u: (f32, f32)) -> (Vec3, Vec3) {
	let areas: Vec<f32> = mesh
		.indices
		.chunks_exact(3)
		.map(|face| {
			let (p0, p1, p2) = triangle_points(mesh, face);
			0.5 * (p1 - p0).cross(p2 - p0).length()
		})
		.collect();

	let dist = math::Distribution1D::new(&areas);
	let (index, _, u_remapped) = dist.sample_discrete(u.0);
	let face = &mesh.indices[index * 3..index * 3 + 3];
	let (p0, p1, p2) = triangle_points(mesh, face);

	let (b0, b1) = uniform_sample_triangle((u_remapped, u.1));
	let p = p0 * b0 + p1 * b1 + p2 * (1.0 - b0 - b1);
	let n = *(p1 - p0).cross(p2 - p0).normalize();
	(p, n)
}

fn uniform_sample_triangle(u: (f32, f32)) -> (f32, f32) {
	let su0 = u.0.sqrt();
	(1.0 - su0, u.1 * su0)
}

/// Samples a triangle on `mesh` proportional to area, samples a uniform point
/// on it, then re-intersects every triangle along `pt -> sample` to find the
/// closest actually-visible hit — an intentional O(T) correctness quirk.
pub fn mesh_sample_from(mesh: &Mesh, pt: Vec3, u: (f32, f32)) -> Option<(Vec3, Vec3, f32)> {
	let (sampled_point, _n) = mesh_sample(mesh, u);
	let to_sample = sampled_point - pt;
	let dist = to_sample.length();
	if dist < 1e-7 {
		return None;
	}
	let dir = to_sample / dist;

	let ray = Ray { origin: pt, dir, t_min: 1e-4, t_max: dist * (1.0 + 1e-3), depth: 0 };
	let (t, dg) = mesh_intersect(mesh, ray)?;

	let dist_sq = t * t;
	let cos_theta = dg.normal.dot(-dir).abs();
	if cos_theta < 1e-7 {
		return None;
	}

	let area = mesh_area(mesh);
	let pdf = dist_sq / (cos_theta * area.max(1e-7));
	Some((dg.point, dg.normal, pdf))
}

/// Produces a deterministic stratified `(u,v)` grid, used by tests and by
/// light-sampling callers that want low-discrepancy coverage over a shape.
pub fn stratified_grid(nx: usize, ny: usize, seed: u32) -> Vec<(f32, f32)> {
	let mut rng = math::Rng::new(seed);
	let mut samples = vec![(0.0, 0.0); nx * ny];
	stratified_sample_2d(&mut samples, nx, ny, &mut rng, true);
	samples
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sphere_ray_through_center_hits_both_sides() {
		let sphere = Sphere::full(1.0);
		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let (t, dg) = sphere.intersect(ray).unwrap();
		assert!((t - 4.0).abs() < 1e-4);
		assert!((dg.point.z - (-1.0)).abs() < 1e-4);
	}

	#[test]
	fn sphere_area_matches_full_sphere_formula() {
		let sphere = Sphere::full(2.0);
		let expected = std::f32::consts::TAU * 2.0 * (2.0 - (-2.0));
		assert!((sphere.area() - expected).abs() < 1e-3);
	}

	#[test]
	fn triangle_intersection_respects_barycentric_bounds() {
		let mut mesh = Mesh::new();
		mesh.vertices = vec![
			crate::mesh::Vertex { p: Vec3::new(-1.0, -1.0, 0.0), n: Vec3::new(0.0, 0.0, 1.0), uv: Vec2::new(0.0, 0.0) },
			crate::mesh::Vertex { p: Vec3::new(1.0, -1.0, 0.0), n: Vec3::new(0.0, 0.0, 1.0), uv: Vec2::new(1.0, 0.0) },
			crate::mesh::Vertex { p: Vec3::new(0.0, 1.0, 0.0), n: Vec3::new(0.0, 0.0, 1.0), uv: Vec2::new(0.5, 1.0) },
		];
		mesh.indices = vec![0, 1, 2];

		let hit = mesh_intersect(&mesh, Ray::new(Vec3::new(0.0, -0.2, -5.0), Vec3::new(0.0, 0.0, 1.0)));
		assert!(hit.is_some());

		let miss = mesh_intersect(&mesh, Ray::new(Vec3::new(10.0, 10.0, -5.0), Vec3::new(0.0, 0.0, 1.0)));
		assert!(miss.is_none());
	}
}
