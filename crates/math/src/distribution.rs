//! Piecewise-constant 1D/2D distributions with O(log n) inverse-CDF sampling,
//! used to importance-sample lights, environment maps, and BSDF lobes.

/// A piecewise-constant 1D probability distribution built from a function
/// sampled at `n` points.
#[derive(Clone, Debug)]
pub struct Distribution1D {
	func: Vec<f32>,
	cdf: Vec<f32>,
	func_int: f32,
}

impl Distribution1D {
	pub fn new(func: &[f32]) -> Self {
		let n = func.len();
		let mut cdf = vec![0.0f32; n + 1];

		for i in 1..=n {
			cdf[i] = cdf[i - 1] + func[i - 1] / n as f32;
		}

		let func_int = cdf[n];
		if func_int == 0.0 {
			for i in 1..=n {
				cdf[i] = i as f32 / n as f32;
			}
		} else {
			for i in 1..=n {
				cdf[i] /= func_int;
			}
		}

		Self { func: func.to_vec(), cdf, func_int }
	}

	pub fn count(&self) -> usize {
		self.func.len()
	}

	pub fn integral(&self) -> f32 {
		self.func_int
	}

	/// Samples a continuous value in `[0, 1)` proportional to the underlying
	/// step function, returning `(value, pdf, offset)`.
	pub fn sample_continuous(&self, u: f32) -> (f32, f32, usize) {
		let offset = find_interval(&self.cdf, u);

		let mut du = u - self.cdf[offset];
		let span = self.cdf[offset + 1] - self.cdf[offset];
		if span > 0.0 {
			du /= span;
		}

		let pdf = if self.func_int > 0.0 {
			self.func[offset] / self.func_int
		} else {
			0.0
		};

		let value = (offset as f32 + du) / self.count() as f32;
		(value, pdf, offset)
	}

	/// Samples one of the `n` discrete bins with probability proportional to
	/// its function value, returning `(index, pdf, remapped_u)`.
	pub fn sample_discrete(&self, u: f32) -> (usize, f32, f32) {
		let offset = find_interval(&self.cdf, u);
		let pdf = if self.func_int > 0.0 {
			self.func[offset] / (self.func_int * self.count() as f32)
		} else {
			0.0
		};

		let span = self.cdf[offset + 1] - self.cdf[offset];
		let u_remapped = if span > 0.0 { (u - self.cdf[offset]) / span } else { 0.0 };

		(offset, pdf, u_remapped)
	}

	pub fn discrete_pdf(&self, index: usize) -> f32 {
		if self.func_int > 0.0 {
			self.func[index] / (self.func_int * self.count() as f32)
		} else {
			0.0
		}
	}
}

/// Binary search for the interval `[i, i+1)` in a monotone array such that
/// `cdf[i] <= u < cdf[i+1]`, clamped into range.
fn find_interval(cdf: &[f32], u: f32) -> usize {
	let mut lo = 0usize;
	let mut hi = cdf.len() - 1;

	while lo + 1 < hi {
		let mid = (lo + hi) / 2;
		if cdf[mid] <= u {
			lo = mid;
		} else {
			hi = mid;
		}
	}

	lo.min(cdf.len() - 2)
}

/// A piecewise-constant 2D distribution over `[0,1]^2`, built as a set of
/// conditional 1D distributions (one per row) plus a marginal over rows.
#[derive(Clone, Debug)]
pub struct Distribution2D {
	conditional: Vec<Distribution1D>,
	marginal: Distribution1D,
}

impl Distribution2D {
	/// `func` is row-major, `nu` columns by `nv` rows.
	pub fn new(func: &[f32], nu: usize, nv: usize) -> Self {
		assert_eq!(func.len(), nu * nv);

		let mut conditional = Vec::with_capacity(nv);
		let mut marginal_func = Vec::with_capacity(nv);

		for v in 0..nv {
			let row = &func[v * nu..(v + 1) * nu];
			let dist = Distribution1D::new(row);
			marginal_func.push(dist.integral());
			conditional.push(dist);
		}

		let marginal = Distribution1D::new(&marginal_func);

		Self { conditional, marginal }
	}

	/// Samples a point in `[0,1]^2`, returning `(point, pdf)`.
	pub fn sample_continuous(&self, u: (f32, f32)) -> ((f32, f32), f32) {
		let (d1, pdf_v, v_offset) = self.marginal.sample_continuous(u.1);
		let (d0, pdf_u, _) = self.conditional[v_offset].sample_continuous(u.0);

		(((d0, d1)), pdf_u * pdf_v)
	}

	pub fn pdf(&self, p: (f32, f32)) -> f32 {
		let nu = self.conditional[0].count();
		let nv = self.conditional.len();

		let iu = ((p.0 * nu as f32) as usize).min(nu - 1);
		let iv = ((p.1 * nv as f32) as usize).min(nv - 1);

		if self.marginal.integral() > 0.0 {
			self.conditional[iv].func[iu] / self.marginal.integral()
		} else {
			0.0
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cdf_is_monotone_nondecreasing() {
		let dist = Distribution1D::new(&[1.0, 3.0, 0.5, 2.0]);
		for w in dist.cdf.windows(2) {
			assert!(w[1] >= w[0]);
		}
		assert!((dist.cdf[0] - 0.0).abs() < 1e-6);
		assert!((dist.cdf[dist.cdf.len() - 1] - 1.0).abs() < 1e-6);
	}

	#[test]
	fn discrete_sampling_favours_larger_weights() {
		let dist = Distribution1D::new(&[1.0, 100.0, 1.0]);
		let mut counts = [0u32; 3];

		for i in 0..3000u32 {
			let u = (i as f32 + 0.5) / 3000.0;
			let (index, _, _) = dist.sample_discrete(u);
			counts[index] += 1;
		}

		assert!(counts[1] > counts[0] * 5);
		assert!(counts[1] > counts[2] * 5);
	}

	#[test]
	fn uniform_function_has_uniform_pdf() {
		let dist = Distribution1D::new(&[2.0, 2.0, 2.0, 2.0]);
		let (_, pdf, _) = dist.sample_continuous(0.1);
		assert!((pdf - 1.0).abs() < 1e-5);
	}

	#[test]
	fn distribution_2d_pdf_matches_uniform_function() {
		let func = vec![1.0f32; 16];
		let dist = Distribution2D::new(&func, 4, 4);
		let (_, pdf) = dist.sample_continuous((0.3, 0.7));
		assert!((pdf - 1.0).abs() < 1e-5);
	}
}
