//! Parses the little-endian texture binary format: a header of four `u32`s
//! (`width, height, mip_count, total_texel_count`) followed by that many RGB
//! float triples, the base level first and each subsequent mip level at half
//! the resolution (floored, never below 1x1).

use super::{AddressMode, Texture};
use math::Rgb;

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureIoError {
	#[error("failed to read texture file: {0}")]
	Io(#[from] std::io::Error),
	#[error("header claims {mip_count} mip levels totalling {declared} texels, but the level dimensions sum to {computed}")]
	TexelCountMismatch { mip_count: u32, declared: u32, computed: u32 },
}

fn mip_dims(mut width: usize, mut height: usize, mip_count: usize) -> Vec<(usize, usize)> {
	let mut dims = Vec::with_capacity(mip_count);
	for _ in 0..mip_count {
		dims.push((width, height));
		width = (width / 2).max(1);
		height = (height / 2).max(1);
	}
	dims
}

fn parse_binary(data: &[u8], address_u: AddressMode, address_v: AddressMode) -> Result<Texture, TextureIoError> {
	let mut cursor = Cursor::new(data);

	let width = cursor.read_u32::<LittleEndian>()? as usize;
	let height = cursor.read_u32::<LittleEndian>()? as usize;
	let mip_count = cursor.read_u32::<LittleEndian>()? as usize;
	let total_texel_count = cursor.read_u32::<LittleEndian>()?;

	let dims = mip_dims(width, height, mip_count);
	let computed: usize = dims.iter().map(|(w, h)| w * h).sum();
	if computed as u32 != total_texel_count {
		return Err(TextureIoError::TexelCountMismatch { mip_count: mip_count as u32, declared: total_texel_count, computed: computed as u32 });
	}

	let mut levels = Vec::with_capacity(mip_count);
	for (w, h) in dims {
		let mut texels = Vec::with_capacity(w * h);
		for _ in 0..w * h {
			let r = cursor.read_f32::<LittleEndian>()?;
			let g = cursor.read_f32::<LittleEndian>()?;
			let b = cursor.read_f32::<LittleEndian>()?;
			texels.push(Rgb::new(r, g, b));
		}
		levels.push((w, h, texels));
	}

	Ok(Texture::from_mip_chain(levels, address_u, address_v))
}

pub fn load_texture(path: &str, address_u: AddressMode, address_v: AddressMode) -> Result<Texture, TextureIoError> {
	let data = std::fs::read(path)?;
	parse_binary(&data, address_u, address_v)
}

#[cfg(test)]
mod tests {
	use super::*;
	use byteorder::WriteBytesExt;

	fn write_texture(width: u32, height: u32, mip_count: u32, total_texel_count: u32) -> Vec<u8> {
		let mut buf = Vec::new();
		buf.write_u32::<LittleEndian>(width).unwrap();
		buf.write_u32::<LittleEndian>(height).unwrap();
		buf.write_u32::<LittleEndian>(mip_count).unwrap();
		buf.write_u32::<LittleEndian>(total_texel_count).unwrap();

		for _ in 0..total_texel_count {
			buf.write_f32::<LittleEndian>(0.25).unwrap();
			buf.write_f32::<LittleEndian>(0.5).unwrap();
			buf.write_f32::<LittleEndian>(0.75).unwrap();
		}

		buf
	}

	#[test]
	fn parses_a_full_mip_chain() {
		// 4x4 -> 2x2 -> 1x1: 16 + 4 + 1 = 21 texels.
		let data = write_texture(4, 4, 3, 21);
		let tex = parse_binary(&data, AddressMode::Clamp, AddressMode::Clamp).unwrap();

		assert_eq!(tex.mip_count(), 3);
		let c = tex.sample(0.5, 0.5, 0.0);
		assert!((c.r - 0.25).abs() < 1e-4);
		assert!((c.g - 0.5).abs() < 1e-4);
		assert!((c.b - 0.75).abs() < 1e-4);
	}

	#[test]
	fn mismatched_texel_count_is_rejected() {
		let data = write_texture(4, 4, 3, 999);
		assert!(matches!(parse_binary(&data, AddressMode::Clamp, AddressMode::Clamp), Err(TextureIoError::TexelCountMismatch { .. })));
	}

	#[test]
	fn truncated_file_is_an_io_error() {
		let data = write_texture(4, 4, 3, 21);
		let truncated = &data[..data.len() - 10];
		assert!(matches!(parse_binary(truncated, AddressMode::Clamp, AddressMode::Clamp), Err(TextureIoError::Io(_))));
	}
}
