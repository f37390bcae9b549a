//! A left-handed perspective camera producing ray differentials for mip
//! selection, grounded in the original `PerspectiveCamera::GenerateRay` but
//! computing the raster-to-camera mapping analytically rather than through
//! an inverted projection matrix.

use geometry::{Ray, RayDifferential};
use math::isometry::Isometry3;
use math::{Vec2, Vec3};

pub struct PerspectiveCamera {
	camera_to_world: Isometry3,
	tan_half_fov: f32,
	aspect: f32,
	width: u32,
	height: u32,
}

impl PerspectiveCamera {
	/// `fov_degrees` is the vertical field of view; `camera_to_world`'s
	/// rotation basis is `(right, up, forward)` with `forward = normalize(target - eye)`.
	pub fn new(camera_to_world: Isometry3, fov_degrees: f32, width: u32, height: u32) -> Self {
		let tan_half_fov = (fov_degrees.to_radians() * 0.5).tan();
		let aspect = width as f32 / height as f32;
		Self { camera_to_world, tan_half_fov, aspect, width, height }
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	fn camera_space_dir(&self, px: f32, py: f32) -> Vec3 {
		let ndc_x = (px / self.width as f32) * 2.0 - 1.0;
		let ndc_y = 1.0 - (py / self.height as f32) * 2.0;
		Vec3::new(ndc_x * self.aspect * self.tan_half_fov, ndc_y * self.tan_half_fov, 1.0)
	}

	pub fn generate_ray(&self, raster_sample: Vec2) -> Ray {
		let dir_cam = self.camera_space_dir(raster_sample.x, raster_sample.y);
		let dir = *(self.camera_to_world.rotation * dir_cam).normalize();
		Ray::new(self.camera_to_world.translation, dir)
	}

	pub fn generate_ray_differential(&self, raster_sample: Vec2) -> RayDifferential {
		let ray = self.generate_ray(raster_sample);

		let dx_cam = self.camera_space_dir(raster_sample.x + 1.0, raster_sample.y);
		let dy_cam = self.camera_space_dir(raster_sample.x, raster_sample.y + 1.0);

		RayDifferential {
			ray,
			rx_origin: ray.origin,
			rx_dir: *(self.camera_to_world.rotation * dx_cam).normalize(),
			ry_origin: ray.origin,
			ry_dir: *(self.camera_to_world.rotation * dy_cam).normalize(),
			has_differentials: true,
		}
	}

	/// Builds `camera_to_world` from eye/target/up, left-handed convention:
	/// basis `(right, up, forward)` with `forward = normalize(target - eye)`.
	pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Isometry3 {
		let forward = *(target - eye).normalize();
		let right = *up.cross(forward).normalize();
		let true_up = forward.cross(right);

		Isometry3 { translation: eye, rotation: quaternion_from_basis(right, true_up, forward) }
	}
}

/// Shepperd's method: recovers the unit quaternion for the rotation matrix
/// whose columns are `right, up, forward`.
fn quaternion_from_basis(right: Vec3, up: Vec3, forward: Vec3) -> math::UnitQuaternion {
	let (m00, m10, m20) = (right.x, right.y, right.z);
	let (m01, m11, m21) = (up.x, up.y, up.z);
	let (m02, m12, m22) = (forward.x, forward.y, forward.z);

	let trace = m00 + m11 + m22;
	let q = if trace > 0.0 {
		let s = (trace + 1.0).sqrt() * 2.0;
		math::Quaternion::from_parts(0.25 * s, Vec3::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s))
	} else if m00 > m11 && m00 > m22 {
		let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
		math::Quaternion::from_parts((m21 - m12) / s, Vec3::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s))
	} else if m11 > m22 {
		let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
		math::Quaternion::from_parts((m02 - m20) / s, Vec3::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s))
	} else {
		let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
		math::Quaternion::from_parts((m10 - m01) / s, Vec3::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s))
	};

	q.normalize()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn center_of_raster_points_straight_down_forward() {
		let c2w = Isometry3::identity();
		let camera = PerspectiveCamera::new(c2w, 60.0, 64, 64);
		let ray = camera.generate_ray(Vec2::new(32.0, 32.0));
		assert!((ray.dir.x).abs() < 1e-4);
		assert!((ray.dir.y).abs() < 1e-4);
		assert!((ray.dir.z - 1.0).abs() < 1e-4);
	}

	#[test]
	fn ray_differentials_diverge_from_the_center_ray() {
		let c2w = Isometry3::identity();
		let camera = PerspectiveCamera::new(c2w, 60.0, 64, 64);
		let rd = camera.generate_ray_differential(Vec2::new(32.0, 32.0));
		assert!(rd.has_differentials);
		assert!((rd.rx_dir - rd.ray.dir).length_sq() > 0.0);
	}

	#[test]
	fn look_at_forward_matches_eye_to_target_direction() {
		let eye = Vec3::new(0.0, 0.0, -5.0);
		let target = Vec3::ZERO;
		let c2w = PerspectiveCamera::look_at(eye, target, Vec3::new(0.0, 1.0, 0.0));
		let camera = PerspectiveCamera::new(c2w, 60.0, 64, 64);
		let ray = camera.generate_ray(Vec2::new(32.0, 32.0));
		assert!((ray.dir.z - 1.0).abs() < 1e-3);
	}
}
