use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub};

/// Linear RGB color, no alpha.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
	pub r: f32,
	pub g: f32,
	pub b: f32,
}

impl Rgb {
	pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };
	pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };

	pub const fn new(r: f32, g: f32, b: f32) -> Self {
		Self { r, g, b }
	}

	pub const fn splat(v: f32) -> Self {
		Self { r: v, g: v, b: v }
	}

	pub fn is_black(&self) -> bool {
		self.r == 0.0 && self.g == 0.0 && self.b == 0.0
	}

	/// Relative luminance under the Rec. 709 primaries.
	pub fn luminance(&self) -> f32 {
		0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
	}

	pub fn sqrt(&self) -> Self {
		Self::new(self.r.sqrt(), self.g.sqrt(), self.b.sqrt())
	}

	pub fn clamp(&self, min: f32, max: f32) -> Self {
		Self::new(self.r.clamp(min, max), self.g.clamp(min, max), self.b.clamp(min, max))
	}

	pub fn max_component(&self) -> f32 {
		self.r.max(self.g).max(self.b)
	}

	/// Component-wise multiplication.
	pub fn cmul(&self, rhs: Self) -> Self {
		Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
	}

	pub fn to_xyz(&self) -> Xyz {
		Xyz {
			x: 0.412453 * self.r + 0.357580 * self.g + 0.180423 * self.b,
			y: 0.212671 * self.r + 0.715160 * self.g + 0.072169 * self.b,
			z: 0.019334 * self.r + 0.119193 * self.g + 0.950227 * self.b,
		}
	}

	pub fn is_finite(&self) -> bool {
		self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
	}
}

impl Add for Rgb {
	type Output = Self;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
	}
}

impl AddAssign for Rgb {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

impl Sub for Rgb {
	type Output = Self;
	fn sub(self, rhs: Self) -> Self {
		Self::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
	}
}

impl Mul<f32> for Rgb {
	type Output = Self;
	fn mul(self, rhs: f32) -> Self {
		Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
	}
}

impl MulAssign<f32> for Rgb {
	fn mul_assign(&mut self, rhs: f32) {
		*self = *self * rhs;
	}
}

impl Div<f32> for Rgb {
	type Output = Self;
	fn div(self, rhs: f32) -> Self {
		Self::new(self.r / rhs, self.g / rhs, self.b / rhs)
	}
}

impl DivAssign<f32> for Rgb {
	fn div_assign(&mut self, rhs: f32) {
		*self = *self / rhs;
	}
}

/// CIE 1931 XYZ tristimulus value, used as the film accumulation space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Xyz {
	pub x: f32,
	pub y: f32,
	pub z: f32,
}

impl Xyz {
	pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

	pub const fn new(x: f32, y: f32, z: f32) -> Self {
		Self { x, y, z }
	}

	pub fn to_rgb(&self) -> Rgb {
		Rgb {
			r: 3.240479 * self.x - 1.537150 * self.y - 0.498535 * self.z,
			g: -0.969256 * self.x + 1.875991 * self.y + 0.041556 * self.z,
			b: 0.055648 * self.x - 0.204043 * self.y + 1.057311 * self.z,
		}
	}
}

impl Add for Xyz {
	type Output = Self;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl AddAssign for Xyz {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

impl Mul<f32> for Xyz {
	type Output = Self;
	fn mul(self, rhs: f32) -> Self {
		Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

impl Div<f32> for Xyz {
	type Output = Self;
	fn div(self, rhs: f32) -> Self {
		Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rgb_xyz_round_trip() {
		let rgb = Rgb::new(0.3, 0.6, 0.1);
		let back = rgb.to_xyz().to_rgb();

		assert!((rgb.r - back.r).abs() < 1e-5);
		assert!((rgb.g - back.g).abs() < 1e-5);
		assert!((rgb.b - back.b).abs() < 1e-5);
	}

	#[test]
	fn luminance_of_white_is_one() {
		assert!((Rgb::WHITE.luminance() - 1.0).abs() < 1e-5);
	}
}
