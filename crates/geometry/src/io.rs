//! Parses the little-endian mesh binary format: a header of three `u32`s
//! (`num_indices, num_vertices, has_tangent`), the index array, then
//! structure-of-arrays `positions`/`normals`/`texcoords` (2 floats per
//! vertex) and, only when `has_tangent != 0`, a trailing `tangents` array.

use super::mesh::{Mesh, Vertex};
use math::{Vec2, Vec3};

use std::io::{Cursor, Read};
use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshIoError {
	#[error("failed to read mesh file: {0}")]
	Io(#[from] std::io::Error),
}

fn read_vec3s(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<Vec3>, MeshIoError> {
	let mut out = Vec::with_capacity(count);
	for _ in 0..count {
		let x = cursor.read_f32::<LittleEndian>()?;
		let y = cursor.read_f32::<LittleEndian>()?;
		let z = cursor.read_f32::<LittleEndian>()?;
		out.push(Vec3::new(x, y, z));
	}
	Ok(out)
}

fn parse_binary(data: &[u8]) -> Result<Mesh, MeshIoError> {
	let mut cursor = Cursor::new(data);

	let num_indices = cursor.read_u32::<LittleEndian>()? as usize;
	let num_vertices = cursor.read_u32::<LittleEndian>()? as usize;
	let has_tangent = cursor.read_u32::<LittleEndian>()? != 0;

	let mut indices = Vec::with_capacity(num_indices);
	for _ in 0..num_indices {
		indices.push(cursor.read_u32::<LittleEndian>()? as usize);
	}

	let positions = read_vec3s(&mut cursor, num_vertices)?;
	let normals = read_vec3s(&mut cursor, num_vertices)?;

	let mut texcoords = Vec::with_capacity(num_vertices);
	for _ in 0..num_vertices {
		let u = cursor.read_f32::<LittleEndian>()?;
		let v = cursor.read_f32::<LittleEndian>()?;
		texcoords.push(Vec2::new(u, v));
	}

	let tangents = if has_tangent { read_vec3s(&mut cursor, num_vertices)? } else { Vec::new() };

	let vertices = (0..num_vertices)
		.map(|i| Vertex { p: positions[i], n: normals[i], uv: texcoords[i] })
		.collect();

	Ok(Mesh { vertices, indices, tangents })
}

pub fn load_mesh(path: &str) -> Result<Mesh, MeshIoError> {
	let data = std::fs::read(path)?;
	parse_binary(&data)
}

#[cfg(test)]
mod tests {
	use super::*;
	use byteorder::WriteBytesExt;

	fn write_triangle(has_tangent: bool) -> Vec<u8> {
		let mut buf = Vec::new();
		buf.write_u32::<LittleEndian>(3).unwrap();
		buf.write_u32::<LittleEndian>(3).unwrap();
		buf.write_u32::<LittleEndian>(has_tangent as u32).unwrap();

		for i in [0u32, 1, 2] {
			buf.write_u32::<LittleEndian>(i).unwrap();
		}

		let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
		for p in positions {
			for c in p {
				buf.write_f32::<LittleEndian>(c).unwrap();
			}
		}

		for _ in 0..3 {
			for c in [0.0f32, 0.0, 1.0] {
				buf.write_f32::<LittleEndian>(c).unwrap();
			}
		}

		for uv in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]] {
			for c in uv {
				buf.write_f32::<LittleEndian>(c).unwrap();
			}
		}

		if has_tangent {
			for _ in 0..3 {
				for c in [1.0f32, 0.0, 0.0] {
					buf.write_f32::<LittleEndian>(c).unwrap();
				}
			}
		}

		buf
	}

	#[test]
	fn parses_a_single_triangle_without_tangents() {
		let data = write_triangle(false);
		let mesh = parse_binary(&data).unwrap();

		assert_eq!(mesh.vertices.len(), 3);
		assert_eq!(mesh.indices, vec![0, 1, 2]);
		assert!(mesh.tangents.is_empty());
		assert_eq!(mesh.vertices[1].p, Vec3::new(1.0, 0.0, 0.0));
		assert_eq!(mesh.vertices[2].uv, Vec2::new(1.0, 1.0));
	}

	#[test]
	fn parses_tangents_when_the_header_flag_is_set() {
		let data = write_triangle(true);
		let mesh = parse_binary(&data).unwrap();

		assert_eq!(mesh.tangents.len(), 3);
		assert_eq!(mesh.tangents[0], Vec3::new(1.0, 0.0, 0.0));
	}

	#[test]
	fn truncated_file_is_an_io_error() {
		let data = write_triangle(false);
		let truncated = &data[..data.len() - 10];

		assert!(matches!(parse_binary(truncated), Err(MeshIoError::Io(_))));
	}
}
