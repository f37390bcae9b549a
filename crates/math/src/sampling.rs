//! Pattern generators that fill a caller-provided buffer with jittered sample
//! points, used by `Sampler` implementations to decorrelate pixel samples.

use crate::rng::Rng;

/// Fills `samples` with `n` stratified 1D samples in `[0, 1)`, one per cell.
pub fn stratified_sample_1d(samples: &mut [f32], n: usize, rng: &mut Rng, jitter: bool) {
	let inv_n = 1.0 / n as f32;
	for (i, slot) in samples.iter_mut().take(n).enumerate() {
		let delta = if jitter { rng.next_f32() } else { 0.5 };
		*slot = ((i as f32 + delta) * inv_n).min(1.0 - f32::EPSILON);
	}
}

/// Fills `samples` (laid out as `nx * ny` pairs) with stratified 2D samples,
/// one per cell of an `nx` by `ny` grid.
pub fn stratified_sample_2d(samples: &mut [(f32, f32)], nx: usize, ny: usize, rng: &mut Rng, jitter: bool) {
	let (dx, dy) = (1.0 / nx as f32, 1.0 / ny as f32);

	let mut i = 0;
	for y in 0..ny {
		for x in 0..nx {
			let (jx, jy) = if jitter { (rng.next_f32(), rng.next_f32()) } else { (0.5, 0.5) };
			samples[i] = (
				((x as f32 + jx) * dx).min(1.0 - f32::EPSILON),
				((y as f32 + jy) * dy).min(1.0 - f32::EPSILON),
			);
			i += 1;
		}
	}
}

/// Latin Hypercube Sampling: `n` points, each coordinate independently
/// stratified into `n` bins and then shuffled across dimensions, so the
/// marginal distribution along every axis is well-stratified even though the
/// full `n`-dimensional point set is not.
pub fn latin_hypercube(samples: &mut [f32], n: usize, dims: usize, rng: &mut Rng) {
	let inv_n = 1.0 / n as f32;

	for i in 0..n {
		for d in 0..dims {
			samples[i * dims + d] = ((i as f32 + rng.next_f32()) * inv_n).min(1.0 - f32::EPSILON);
		}
	}

	for d in 0..dims {
		for i in (1..n).rev() {
			let other = rng.next_u32_below(i as u32 + 1) as usize;
			samples.swap(i * dims + d, other * dims + d);
		}
	}
}

/// Fisher-Yates shuffle of `n` `dims`-wide blocks within a flat buffer.
pub fn shuffle(samples: &mut [f32], n: usize, dims: usize, rng: &mut Rng) {
	for i in (1..n).rev() {
		let other = rng.next_u32_below(i as u32 + 1) as usize;
		for d in 0..dims {
			samples.swap(i * dims + d, other * dims + d);
		}
	}
}

/// Concentric disk mapping of a uniform `[0,1)^2` sample to a unit disk
/// (Shirley & Chiu), used to importance-sample cosine-weighted hemispheres.
pub fn concentric_sample_disk(u: (f32, f32)) -> (f32, f32) {
	let ox = 2.0 * u.0 - 1.0;
	let oy = 2.0 * u.1 - 1.0;

	if ox == 0.0 && oy == 0.0 {
		return (0.0, 0.0);
	}

	let (r, theta) = if ox.abs() > oy.abs() {
		(ox, std::f32::consts::FRAC_PI_4 * (oy / ox))
	} else {
		(oy, std::f32::consts::FRAC_PI_2 - std::f32::consts::FRAC_PI_4 * (ox / oy))
	};

	(r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted hemisphere sample over the positive-z hemisphere, returned
/// with its pdf `cos(theta) / pi`.
pub fn cosine_sample_hemisphere(u: (f32, f32)) -> (crate::Vec3, f32) {
	let (x, y) = concentric_sample_disk(u);
	let z = (1.0 - x * x - y * y).max(0.0).sqrt();
	(crate::Vec3::new(x, y, z), z * std::f32::consts::FRAC_1_PI)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stratified_1d_covers_every_cell() {
		let mut rng = Rng::new(7);
		let mut samples = vec![0.0f32; 8];
		stratified_sample_1d(&mut samples, 8, &mut rng, true);

		let mut sorted = samples.clone();
		sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
		for (i, &v) in sorted.iter().enumerate() {
			assert!(v >= i as f32 / 8.0 && v < (i as f32 + 1.0) / 8.0);
		}
	}

	#[test]
	fn latin_hypercube_is_stratified_per_axis() {
		let mut rng = Rng::new(3);
		let n = 16;
		let mut samples = vec![0.0f32; n * 2];
		latin_hypercube(&mut samples, n, 2, &mut rng);

		for d in 0..2 {
			let mut col: Vec<f32> = (0..n).map(|i| samples[i * 2 + d]).collect();
			col.sort_by(|a, b| a.partial_cmp(b).unwrap());
			for (i, &v) in col.iter().enumerate() {
				assert!(v >= i as f32 / n as f32 && v < (i as f32 + 1.0) / n as f32);
			}
		}
	}

	#[test]
	fn cosine_hemisphere_sample_has_positive_z() {
		let (dir, pdf) = cosine_sample_hemisphere((0.3, 0.8));
		assert!(dir.z >= 0.0);
		assert!(pdf > 0.0);
	}
}
