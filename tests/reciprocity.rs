//! Torrance-Sparrow reciprocity: `f(wo,wi)*cos(theta_i)` equals
//! `f(wi,wo)*cos(theta_o)` for directions on the same side of the surface.

use math::{Rng, Vec3};
use shading::bxdf::cos_theta;
use shading::{Bxdf, FresnelNoOp};

#[test]
fn brdf_times_cosine_is_symmetric_under_direction_swap() {
	let bxdf = shading::bxdf::TorranceSparrow { reflectance: math::Rgb::WHITE, exponent: 30.0, fresnel: FresnelNoOp };
	let mut rng = Rng::new(42);

	for _ in 0..32 {
		let wo = Vec3::new(rng.next_f32() * 2.0 - 1.0, rng.next_f32() * 2.0 - 1.0, rng.next_f32().abs().max(0.05));
		let wi = Vec3::new(rng.next_f32() * 2.0 - 1.0, rng.next_f32() * 2.0 - 1.0, rng.next_f32().abs().max(0.05));

		let f_oi = bxdf.eval(wo, wi);
		let f_io = bxdf.eval(wi, wo);

		let lhs = f_oi.r * cos_theta(wi).abs();
		let rhs = f_io.r * cos_theta(wo).abs();

		assert!((lhs - rhs).abs() < 1e-5, "reciprocity broke: {lhs} vs {rhs}");
	}
}
