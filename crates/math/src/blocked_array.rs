//! A 2D array stored in small square blocks rather than row-major order, to
//! keep texture lookups and mip generation cache-friendly under bilinear
//! filtering's 2x2-neighborhood access pattern.

/// `LOG_BLOCK` is the base-2 log of the block's side length (e.g. `2` gives 4x4 blocks).
#[derive(Clone, Debug)]
pub struct BlockedArray<T, const LOG_BLOCK: usize> {
	data: Vec<T>,
	u_res: usize,
	v_res: usize,
	u_blocks: usize,
}

impl<T: Copy + Default, const LOG_BLOCK: usize> BlockedArray<T, LOG_BLOCK> {
	const BLOCK_SIZE: usize = 1 << LOG_BLOCK;

	pub fn new(u_res: usize, v_res: usize) -> Self {
		Self::filled(u_res, v_res, T::default())
	}

	pub fn filled(u_res: usize, v_res: usize, value: T) -> Self {
		let u_blocks = Self::round_up(u_res) >> LOG_BLOCK;
		let v_blocks = Self::round_up(v_res) >> LOG_BLOCK;
		let count = (u_blocks << LOG_BLOCK) * (v_blocks << LOG_BLOCK);

		Self {
			data: vec![value; count],
			u_res,
			v_res,
			u_blocks,
		}
	}

	pub fn from_row_major(u_res: usize, v_res: usize, values: &[T]) -> Self {
		assert_eq!(values.len(), u_res * v_res);

		let mut array = Self::new(u_res, v_res);
		for v in 0..v_res {
			for u in 0..u_res {
				*array.get_mut(u, v) = values[v * u_res + u];
			}
		}
		array
	}

	fn round_up(x: usize) -> usize {
		(x + Self::BLOCK_SIZE - 1) & !(Self::BLOCK_SIZE - 1)
	}

	fn block(a: usize) -> usize {
		a >> LOG_BLOCK
	}

	fn offset(a: usize) -> usize {
		a & (Self::BLOCK_SIZE - 1)
	}

	pub fn u_size(&self) -> usize {
		self.u_res
	}

	pub fn v_size(&self) -> usize {
		self.v_res
	}

	fn index(&self, u: usize, v: usize) -> usize {
		let (bu, bv) = (Self::block(u), Self::block(v));
		let (ou, ov) = (Self::offset(u), Self::offset(v));

		let block_index = (self.u_blocks * bv + bu) << (2 * LOG_BLOCK);
		let within_block = (ov << LOG_BLOCK) + ou;

		block_index + within_block
	}

	pub fn get(&self, u: usize, v: usize) -> &T {
		debug_assert!(u < self.u_res && v < self.v_res);
		&self.data[self.index(u, v)]
	}

	pub fn get_mut(&mut self, u: usize, v: usize) -> &mut T {
		debug_assert!(u < self.u_res && v < self.v_res);
		let i = self.index(u, v);
		&mut self.data[i]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_every_cell() {
		let mut a: BlockedArray<i32, 2> = BlockedArray::new(17, 9);

		for v in 0..9 {
			for u in 0..17 {
				*a.get_mut(u, v) = (v * 17 + u) as i32;
			}
		}

		for v in 0..9 {
			for u in 0..17 {
				assert_eq!(*a.get(u, v), (v * 17 + u) as i32);
			}
		}
	}

	#[test]
	fn from_row_major_matches_direct_fill() {
		let values: Vec<i32> = (0..30).collect();
		let a = BlockedArray::<i32, 1>::from_row_major(6, 5, &values);

		for v in 0..5 {
			for u in 0..6 {
				assert_eq!(*a.get(u, v), values[v * 6 + u]);
			}
		}
	}
}
