//! A mipmapped, bilinearly-filtered texture over `Rgb` texels, addressed by
//! a per-axis wrap policy. Mip levels are pre-baked at construction by
//! repeated 2x2 box downsampling, never regenerated at lookup time.

pub mod io;

use math::blocked_array::BlockedArray;
use math::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
	Wrap,
	Mirror,
	Clamp,
	BorderZero,
	BorderOne,
}

pub struct Texture {
	levels: Vec<BlockedArray<Rgb, 2>>,
	address_u: AddressMode,
	address_v: AddressMode,
}

impl Texture {
	pub fn from_row_major(width: usize, height: usize, texels: &[Rgb], address_u: AddressMode, address_v: AddressMode) -> Self {
		let mut levels = vec![BlockedArray::from_row_major(width, height, texels)];

		let (mut w, mut h) = (width, height);
		while w > 1 || h > 1 {
			let prev = levels.last().unwrap();
			let nw = (w / 2).max(1);
			let nh = (h / 2).max(1);

			let mut next = BlockedArray::<Rgb, 2>::new(nw, nh);
			for y in 0..nh {
				for x in 0..nw {
					let x0 = (2 * x).min(w - 1);
					let x1 = (2 * x + 1).min(w - 1);
					let y0 = (2 * y).min(h - 1);
					let y1 = (2 * y + 1).min(h - 1);

					let sum = *prev.get(x0, y0) + *prev.get(x1, y0) + *prev.get(x0, y1) + *prev.get(x1, y1);
					*next.get_mut(x, y) = sum * 0.25;
				}
			}

			levels.push(next);
			w = nw;
			h = nh;
		}

		Self { levels, address_u, address_v }
	}

	/// Builds a texture from mip levels already baked elsewhere (e.g. read
	/// from a file), ordered from the base level down to 1x1, rather than
	/// downsampling a single base level at construction.
	pub fn from_mip_chain(levels: Vec<(usize, usize, Vec<Rgb>)>, address_u: AddressMode, address_v: AddressMode) -> Self {
		let levels = levels.into_iter().map(|(w, h, texels)| BlockedArray::from_row_major(w, h, &texels)).collect();
		Self { levels, address_u, address_v }
	}

	pub fn mip_count(&self) -> usize {
		self.levels.len()
	}

	fn address(mode: AddressMode, mut i: i64, res: usize) -> Option<usize> {
		let res = res as i64;
		match mode {
			AddressMode::Wrap => Some((i.rem_euclid(res)) as usize),
			AddressMode::Mirror => {
				let period = 2 * res;
				i = i.rem_euclid(period);
				Some(if i < res { i as usize } else { (period - i - 1) as usize })
			}
			AddressMode::Clamp => Some(i.clamp(0, res - 1) as usize),
			AddressMode::BorderZero | AddressMode::BorderOne => {
				if i < 0 || i >= res {
					None
				} else {
					Some(i as usize)
				}
			}
		}
	}

	fn border_value(mode: AddressMode) -> Rgb {
		match mode {
			AddressMode::BorderOne => Rgb::WHITE,
			_ => Rgb::BLACK,
		}
	}

	fn texel(&self, level: usize, x: i64, y: i64) -> Rgb {
		let array = &self.levels[level];

		let ux = Self::address(self.address_u, x, array.u_size());
		let uy = Self::address(self.address_v, y, array.v_size());

		match (ux, uy) {
			(Some(ux), Some(uy)) => *array.get(ux, uy),
			_ => Self::border_value(self.address_u),
		}
	}

	fn bilinear(&self, level: usize, u: f32, v: f32) -> Rgb {
		let array = &self.levels[level];
		let su = u * array.u_size() as f32 - 0.5;
		let sv = v * array.v_size() as f32 - 0.5;

		let x0 = su.floor();
		let y0 = sv.floor();
		let dx = su - x0;
		let dy = sv - y0;

		let c00 = self.texel(level, x0 as i64, y0 as i64);
		let c10 = self.texel(level, x0 as i64 + 1, y0 as i64);
		let c01 = self.texel(level, x0 as i64, y0 as i64 + 1);
		let c11 = self.texel(level, x0 as i64 + 1, y0 as i64 + 1);

		(c00 * (1.0 - dx) + c10 * dx) * (1.0 - dy) + (c01 * (1.0 - dx) + c11 * dx) * dy
	}

	/// Samples with trilinear filtering between the two mip levels bracketing
	/// `width` (a texel-footprint-in-pixels estimate from ray differentials).
	pub fn sample(&self, u: f32, v: f32, width: f32) -> Rgb {
		let max_level = (self.levels.len() - 1) as f32;
		let level = (max_level + width.max(1e-8).log2()).clamp(0.0, max_level);

		let lo = level.floor() as usize;
		let hi = (lo + 1).min(self.levels.len() - 1);
		let t = level - lo as f32;

		self.bilinear(lo, u, v) * (1.0 - t) + self.bilinear(hi, u, v) * t
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constant_texture_samples_to_the_same_color_everywhere() {
		let texels = vec![Rgb::new(0.2, 0.4, 0.6); 16];
		let tex = Texture::from_row_major(4, 4, &texels, AddressMode::Wrap, AddressMode::Wrap);

		let c = tex.sample(0.73, 0.12, 0.0);
		assert!((c.r - 0.2).abs() < 1e-4);
		assert!((c.g - 0.4).abs() < 1e-4);
		assert!((c.b - 0.6).abs() < 1e-4);
	}

	#[test]
	fn mip_chain_terminates_at_one_by_one() {
		let texels = vec![Rgb::BLACK; 64];
		let tex = Texture::from_row_major(8, 8, &texels, AddressMode::Clamp, AddressMode::Clamp);
		assert_eq!(tex.mip_count(), 4);
	}

	#[test]
	fn wrap_address_mode_is_periodic() {
		assert_eq!(Texture::address(AddressMode::Wrap, -1, 4), Some(3));
		assert_eq!(Texture::address(AddressMode::Wrap, 4, 4), Some(0));
	}
}
