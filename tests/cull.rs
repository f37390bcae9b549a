//! A CCW triangle rasterizes under back-face culling with front=CCW;
//! flipping the declared winding to clockwise culls every pixel.

use math::{Rgb, Vec4};
use raster::{draw, ColorAttachment, CullMode, DepthAttachment, DepthState, DrawState, FrameBuffer, Vertex, Viewport, Winding};

static POSITIONS: [Vec4; 3] = [Vec4::new(-0.5, -0.5, 0.0, 1.0), Vec4::new(0.5, -0.5, 0.0, 1.0), Vec4::new(0.0, 0.5, 0.0, 1.0)];

fn vertex_shader(i: u32) -> Vertex {
	Vertex::new(POSITIONS[i as usize], &[1.0])
}

fn pixel_shader(v: &Vertex) -> Option<(Rgb, f32)> {
	Some((Rgb::splat(v.varyings[0]), 1.0))
}

fn shaded_pixel_count(winding: Winding) -> usize {
	let mut fb = FrameBuffer::new(16, 16);
	fb.attach_color(0, ColorAttachment::new(16, 16));
	fb.attach_depth(DepthAttachment::new(16, 16));
	fb.on_bind();

	let state = DrawState {
		winding,
		cull: CullMode::Back,
		depth: DepthState::default(),
		blend: raster::BlendState::default(),
		color_slot: 0,
		viewport: Viewport { x: 0.0, y: 0.0, width: 16.0, height: 16.0 },
		vertex_shader: &vertex_shader,
		pixel_shader: &pixel_shader,
	};

	draw(&mut fb, &state, &[0, 1, 2], true);

	let count = (0..16).flat_map(|y| (0..16).map(move |x| (x, y))).filter(|&(x, y)| fb.color_mut(0).unwrap().pixels.get(x, y).r > 0.0).count();

	fb.on_unbind();
	count
}

#[test]
fn ccw_triangle_with_ccw_front_face_rasterizes() {
	assert!(shaded_pixel_count(Winding::CounterClockwise) > 0);
}

#[test]
fn flipping_front_face_to_clockwise_culls_the_same_triangle() {
	assert_eq!(shaded_pixel_count(Winding::Clockwise), 0);
}
