use std::cell::Cell;
use std::env::args;
use std::fs::write;
use std::rc::Rc;
use png::Encoder;
use png::ColorType::Rgba;
use png::BitDepth::Eight;
use radiant::*;
use radiant::radial::MenuConfig;
use radiant::rendering::{rasterize, Viewport};
use rgb::FromSlice;

const ICON: &str = r#"<svg width="24" height="24" viewBox="0 0 24 24">
	<circle cx="12" cy="12" r="10" fill="none" stroke="white" stroke-width="2"/>
	<path d="M8 12 L11 15 L16 9" fill="none" stroke="white" stroke-width="2"/>
</svg>"#;

fn main() {
	env_logger::init();

	let items = 6;
	let mut menu = RadialMenu::new(MenuConfig::default());
	menu.set_num_items(items);

	let commits = Rc::new(Cell::new(0));
	for i in 0..items {
		let counter = commits.clone();
		let item = menu.item_mut(i).unwrap();
		item.set_icon(SvgPrimitive::new(ICON));
		item.set_icon_placement(0.02, Default::default());
		item.set_callback(move || {
			counter.set(counter.get() + 1);
			println!("item {} activated", i);
		});
	}

	// cursor spirals out then back in, twice around
	let frames = 600;
	let dt = 1.0 / 60.0;
	for frame in 0..frames {
		let t = frame as f32 / frames as f32;
		let angle = t * std::f32::consts::TAU * 2.0;
		let distance = 1.0 + (t * std::f32::consts::PI * 8.0).sin().abs() * 1.2;
		let cursor = computing::cartesian(angle, distance);
		let result = menu.update_items_from_cursor(cursor, dt);
		if let Some(i) = result.committed {
			println!("frame {}: item {} committed at {:.3}", frame, i, result.activation);
		}
	}
	println!("{} commits", commits.get());

	let prefix = args().nth(1).unwrap_or(String::from("menu"));
	let png_name = format!("{}.png", &prefix);
	let (w, h) = (300, 300);
	let length = w * h;
	let mut canvas :Vec<u8> = vec![0; length * 4];
	let mut mask = vec![0; length];

	let children = menu.geometry(16);
	let viewport = Viewport::centered(w, h, 5.0);
	rasterize::<4>(&children, viewport, canvas.as_rgba_mut(), &mut mask, w, h, w, true);

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
