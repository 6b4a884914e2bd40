use std::env::args;
use std::fs::write;
use png::Encoder;
use png::ColorType::Rgba;
use png::BitDepth::Eight;
use radiant::*;
use radiant::rendering::{rasterize, Viewport};
use std::time::Instant;
use rgb::FromSlice;

fn main() {
	env_logger::init();

	let prefix = args().last().unwrap();
	let svg_name = format!("{}.svg", &prefix);
	let png_name = format!("{}.png", &prefix);

	let source = std::fs::read_to_string(&svg_name).unwrap();
	let mut icon = SvgPrimitive::default();
	icon.set(&source).unwrap();
	icon.update();
	println!("{} renderables", icon.children().len());

	let (w, h) = (300, 300);
	let size = icon.size();
	let scale = (w as f32 / size.x).min(h as f32 / size.y);
	let viewport = Viewport {
		origin: Couple::zero(),
		scale: Couple::new(scale, scale),
	};

	let length = w * h;
	let mut canvas :Vec<u8> = vec![0; length * 4];
	let mut mask = vec![0; length];

	let runs = 10;
	let now = Instant::now();
	for _ in 0..runs {
		rasterize::<6>(icon.children(), viewport, canvas.as_rgba_mut(), &mut mask, w, h, w, true);
	}
	println!("rendered {} times in {}ms.", runs, now.elapsed().as_millis());

	let mut png_buf = Vec::new();
	{
		let mut encoder = Encoder::new(&mut png_buf, w as u32, h as u32);
		encoder.set_color(Rgba);
		encoder.set_depth(Eight);
		let mut writer = encoder.write_header().unwrap();
		writer.write_image_data(&canvas).unwrap();
	}
	write(&png_name, &png_buf).unwrap();
}
