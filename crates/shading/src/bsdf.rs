//! The BSDF rotates world-space directions into the shading-local frame and
//! dispatches to a small arena-allocated set of BxDF lobes.

use geometry::shape::DifferentialGeometry;
use math::{Rgb, Vec3};

use crate::bxdf::{same_hemisphere, Bxdf, BxdfFlags};

pub const MAX_BXDFS: usize = 8;

/// An orthonormal right-handed frame plus a small fixed set of lobes. `eta`
/// is the relative index of refraction of the medium beneath the surface,
/// used by specular-transmission callers that need the opposite-side IOR.
pub struct Bsdf<'a> {
	pub geom_normal: Vec3,
	pub shading_normal: Vec3,
	pub tangent: Vec3,
	pub binormal: Vec3,
	pub eta: f32,
	bxdfs: &'a [&'a dyn Bxdf],
}

impl<'a> Bsdf<'a> {
	pub fn new(dg: &DifferentialGeometry, geom_normal: Vec3, eta: f32, bxdfs: &'a [&'a dyn Bxdf]) -> Self {
		debug_assert!(bxdfs.len() <= MAX_BXDFS);

		let shading_normal = dg.normal;
		let tangent = *dg.dpdu.normalize();
		let binormal = shading_normal.cross(tangent);

		Self { geom_normal, shading_normal, tangent, binormal, eta, bxdfs }
	}

	fn world_to_local(&self, v: Vec3) -> Vec3 {
		Vec3::new(v.dot(self.tangent), v.dot(self.binormal), v.dot(self.shading_normal))
	}

	fn local_to_world(&self, v: Vec3) -> Vec3 {
		self.tangent * v.x + self.binormal * v.y + self.shading_normal * v.z
	}

	fn matching(&self, flags: BxdfFlags) -> impl Iterator<Item = &&dyn Bxdf> {
		self.bxdfs.iter().filter(move |b| b.flags().contains(flags) || flags.is_empty())
	}

	pub fn num_components(&self, flags: BxdfFlags) -> usize {
		self.bxdfs.iter().filter(|b| flags.is_empty() || b.flags().intersects(flags)).count()
	}

	pub fn eval(&self, wo_world: Vec3, wi_world: Vec3, flags: BxdfFlags) -> Rgb {
		let wo = self.world_to_local(wo_world);
		let wi = self.world_to_local(wi_world);

		if wo.z == 0.0 {
			return Rgb::BLACK;
		}

		let reflect = wi_world.dot(self.geom_normal) * wo_world.dot(self.geom_normal) > 0.0;

		let mut f = Rgb::BLACK;
		for bxdf in self.bxdfs.iter().filter(|b| flags.is_empty() || b.flags().intersects(flags)) {
			let matches_side = (reflect && bxdf.flags().contains(BxdfFlags::REFLECTION))
				|| (!reflect && bxdf.flags().contains(BxdfFlags::TRANSMISSION));
			if matches_side {
				f += bxdf.eval(wo, wi);
			}
		}
		f
	}

	pub fn pdf(&self, wo_world: Vec3, wi_world: Vec3, flags: BxdfFlags) -> f32 {
		if self.bxdfs.is_empty() {
			return 0.0;
		}
		let wo = self.world_to_local(wo_world);
		let wi = self.world_to_local(wi_world);

		let matching: Vec<_> = self.matching(flags).collect();
		if matching.is_empty() {
			return 0.0;
		}

		let sum: f32 = matching.iter().map(|b| b.pdf(wo, wi)).sum();
		sum / matching.len() as f32
	}

	/// Samples one matching component, returning `(wi_world, f, pdf, sampled_flags)`.
	pub fn sample(&self, wo_world: Vec3, u_component: f32, u: (f32, f32), flags: BxdfFlags) -> Option<(Vec3, Rgb, f32, BxdfFlags)> {
		let matching: Vec<&&dyn Bxdf> = self.matching(flags).collect();
		if matching.is_empty() {
			return None;
		}

		let n = matching.len();
		let comp = ((u_component * n as f32) as usize).min(n - 1);
		let chosen = matching[comp];

		let wo = self.world_to_local(wo_world);
		if wo.z == 0.0 {
			return None;
		}

		let (wi, f, pdf) = chosen.sample(wo, u);
		if pdf == 0.0 {
			return None;
		}

		let sampled_flags = chosen.flags();
		let wi_world = self.local_to_world(wi);

		let mut final_pdf = pdf;
		let mut final_f = f;

		if !sampled_flags.contains(BxdfFlags::SPECULAR) {
			if n > 1 {
				final_pdf = matching.iter().map(|b| b.pdf(wo, wi)).sum::<f32>() / n as f32;
			}

			let reflect = wi_world.dot(self.geom_normal) * wo_world.dot(self.geom_normal) > 0.0;
			final_f = Rgb::BLACK;
			for bxdf in matching.iter() {
				let matches_side = (reflect && bxdf.flags().contains(BxdfFlags::REFLECTION))
					|| (!reflect && bxdf.flags().contains(BxdfFlags::TRANSMISSION));
				if matches_side {
					final_f += bxdf.eval(wo, wi);
				}
			}
		}

		Some((wi_world, final_f, final_pdf, sampled_flags))
	}
}

pub fn power_heuristic(nf: u32, f_pdf: f32, ng: u32, g_pdf: f32) -> f32 {
	let f = nf as f32 * f_pdf;
	let g = ng as f32 * g_pdf;
	if f == 0.0 && g == 0.0 {
		return 0.0;
	}
	(f * f) / (f * f + g * g)
}
