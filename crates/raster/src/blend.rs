//! Per-attachment alpha blending.

use math::Rgb;

bitflags::bitflags! {
	#[derive(Clone, Copy, PartialEq, Eq, Debug)]
	pub struct ColorWriteMask: u8 {
		const RED   = 1 << 0;
		const GREEN = 1 << 1;
		const BLUE  = 1 << 2;
		const ALPHA = 1 << 3;
		const ALL   = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendFactor {
	Zero,
	One,
	SrcColor,
	InvSrcColor,
	DstColor,
	InvDstColor,
	SrcAlpha,
	InvSrcAlpha,
	DstAlpha,
	InvDstAlpha,
	SrcAlphaSaturate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendOp {
	Add,
	Subtract,
	ReverseSubtract,
	Min,
	Max,
}

impl BlendOp {
	fn apply(self, src: f32, dst: f32) -> f32 {
		match self {
			BlendOp::Add => src + dst,
			BlendOp::Subtract => src - dst,
			BlendOp::ReverseSubtract => dst - src,
			BlendOp::Min => src.min(dst),
			BlendOp::Max => src.max(dst),
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct BlendState {
	pub enable: bool,
	pub src_rgb: BlendFactor,
	pub dst_rgb: BlendFactor,
	pub op_rgb: BlendOp,
	pub src_alpha: BlendFactor,
	pub dst_alpha: BlendFactor,
	pub op_alpha: BlendOp,
	pub write_mask: ColorWriteMask,
}

impl Default for BlendState {
	fn default() -> Self {
		Self {
			enable: false,
			src_rgb: BlendFactor::One,
			dst_rgb: BlendFactor::Zero,
			op_rgb: BlendOp::Add,
			src_alpha: BlendFactor::One,
			dst_alpha: BlendFactor::Zero,
			op_alpha: BlendOp::Add,
			write_mask: ColorWriteMask::ALL,
		}
	}
}

fn factor_rgb(factor: BlendFactor, src: Rgb, src_a: f32, dst: Rgb, dst_a: f32) -> Rgb {
	match factor {
		BlendFactor::Zero => Rgb::BLACK,
		BlendFactor::One => Rgb::WHITE,
		BlendFactor::SrcColor => src,
		BlendFactor::InvSrcColor => Rgb::WHITE - src,
		BlendFactor::DstColor => dst,
		BlendFactor::InvDstColor => Rgb::WHITE - dst,
		BlendFactor::SrcAlpha => Rgb::splat(src_a),
		BlendFactor::InvSrcAlpha => Rgb::splat(1.0 - src_a),
		BlendFactor::DstAlpha => Rgb::splat(dst_a),
		BlendFactor::InvDstAlpha => Rgb::splat(1.0 - dst_a),
		BlendFactor::SrcAlphaSaturate => Rgb::splat(src_a.min(1.0 - dst_a)),
	}
}

fn factor_alpha(factor: BlendFactor, src_a: f32, dst_a: f32) -> f32 {
	match factor {
		BlendFactor::Zero => 0.0,
		BlendFactor::One => 1.0,
		BlendFactor::SrcColor | BlendFactor::SrcAlpha => src_a,
		BlendFactor::InvSrcColor | BlendFactor::InvSrcAlpha => 1.0 - src_a,
		BlendFactor::DstColor | BlendFactor::DstAlpha => dst_a,
		BlendFactor::InvDstColor | BlendFactor::InvDstAlpha => 1.0 - dst_a,
		BlendFactor::SrcAlphaSaturate => src_a.min(1.0 - dst_a),
	}
}

impl BlendState {
	/// Blends `(src, src_a)` over `(dst, dst_a)`, returning `(rgb, alpha)`.
	/// When disabled, `src` passes through unmodified.
	pub fn blend(&self, src: Rgb, src_a: f32, dst: Rgb, dst_a: f32) -> (Rgb, f32) {
		if !self.enable {
			return (src, src_a);
		}

		let fs_rgb = factor_rgb(self.src_rgb, src, src_a, dst, dst_a);
		let fd_rgb = factor_rgb(self.dst_rgb, src, src_a, dst, dst_a);
		let rgb = Rgb::new(
			self.op_rgb.apply(src.r * fs_rgb.r, dst.r * fd_rgb.r),
			self.op_rgb.apply(src.g * fs_rgb.g, dst.g * fd_rgb.g),
			self.op_rgb.apply(src.b * fs_rgb.b, dst.b * fd_rgb.b),
		);

		let fs_a = factor_alpha(self.src_alpha, src_a, dst_a);
		let fd_a = factor_alpha(self.dst_alpha, src_a, dst_a);
		let alpha = self.op_alpha.apply(src_a * fs_a, dst_a * fd_a);

		(rgb, alpha)
	}
}
