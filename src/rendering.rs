//! Software preview of renderables, for tests and demos.
//!
//! Fills are scan-converted triangle by triangle; strokes go through a
//! wizdraw coverage mask.

use crate::computing::{Couple, Float};
use crate::geometry::Color;
use crate::shape::{DrawMode, Renderable};

use wizdraw::stroke;

use vek::vec::Vec2;

use rgb::RGBA8;

/// Maps scene units to pixels: `pixel = origin + p * scale`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub origin: Couple,
    pub scale: Couple,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Couple::zero(),
            scale: Couple::one(),
        }
    }
}

impl Viewport {
    /// Centered on the canvas, y up, `units` scene units across the smaller side
    pub fn centered(w: usize, h: usize, units: Float) -> Self {
        let s = (w.min(h) as Float) / units;
        Self {
            origin: Couple::new(w as Float * 0.5, h as Float * 0.5),
            scale: Couple::new(s, -s),
        }
    }

    pub fn to_pixel(&self, p: Couple) -> Couple {
        self.origin + p * self.scale
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    p: [Couple; 3],
    // edge vectors divided by the doubled area
    v: [Couple; 2],
}

impl Triangle {
    fn new(p: [Couple; 3]) -> Option<Self> {
        let v0 = p[1] - p[0];
        let v1 = p[2] - p[0];
        let cross = v0.x * v1.y - v1.x * v0.y;
        if cross.abs() < Float::EPSILON {
            return None;
        }
        let den = 1.0 / cross;
        Some(Self { p, v: [v0 * den, v1 * den] })
    }

    fn contains(&self, pt: Couple) -> bool {
        let d = pt - self.p[0];
        let v = d.x * self.v[1].y - d.y * self.v[1].x;
        let w = d.y * self.v[0].x - d.x * self.v[0].y;
        let u = 1.0 - v - w;
        u >= 0.0 && v >= 0.0 && w >= 0.0
    }

    fn bounds(&self, w: usize, h: usize) -> (usize, usize, usize, usize) {
        let clamp = |v: Float, max: usize| (v.max(0.0) as usize).min(max);
        let xs = self.p.map(|p| p.x);
        let ys = self.p.map(|p| p.y);
        let min_x = clamp(xs.iter().copied().fold(Float::INFINITY, Float::min).floor(), w);
        let max_x = clamp(xs.iter().copied().fold(Float::NEG_INFINITY, Float::max).ceil() + 1.0, w);
        let min_y = clamp(ys.iter().copied().fold(Float::INFINITY, Float::min).floor(), h);
        let max_y = clamp(ys.iter().copied().fold(Float::NEG_INFINITY, Float::max).ceil() + 1.0, h);
        (min_x, max_x, min_y, max_y)
    }
}

fn to_rgba8(c: Color) -> RGBA8 {
    let q = |v: Float| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBA8::new(q(c.r), q(c.g), q(c.b), q(c.a))
}

/// Clears the `w × h` rectangle of `dst` then draws `children` in order.
///
/// `mask` must hold `w * h` bytes; `stride` is the row pitch of `dst` in pixels.
pub fn rasterize<const SSAA: usize>(
    children: &[Renderable],
    viewport: Viewport,
    dst: &mut [RGBA8],
    mask: &mut [u8],
    w: usize,
    h: usize,
    stride: usize,
    alpha_blend: bool,
) {
    let mut i = 0;
    for _ in 0..h {
        dst[i..][..w].fill(RGBA8::new(0, 0, 0, 0));
        i += stride;
    }

    let mask_size = Vec2::new(w, h);

    for child in children {
        let shape = child.shape();
        let color = to_rgba8(shape.diffuse_color());
        if color.a == 0 {
            continue;
        }
        let points: Vec<Couple> = shape.outline().map(|p| viewport.to_pixel(p)).collect();

        match shape.draw_mode() {
            DrawMode::Triangles => {
                for t in points.chunks_exact(3) {
                    let Some(triangle) = Triangle::new([t[0], t[1], t[2]]) else {
                        continue;
                    };
                    let (x0, x1, y0, y1) = triangle.bounds(w, h);
                    for y in y0..y1 {
                        for x in x0..x1 {
                            let center = Couple::new(x as Float + 0.5, y as Float + 0.5);
                            if triangle.contains(center) {
                                blend_pixel(&mut dst[y * stride + x], color, 255, alpha_blend);
                            }
                        }
                    }
                }
            }
            mode => {
                let mut path = points;
                if mode == DrawMode::LineLoop {
                    if let Some(first) = path.first().copied() {
                        path.push(first);
                    }
                }
                if path.len() < 2 {
                    continue;
                }

                mask.fill(0);
                stroke::<SSAA>(&path, mask, mask_size, 1.0);

                let mut mask = mask.iter();
                let mut line = 0;
                for _ in 0..h {
                    for x in 0..w {
                        let q = mask.next().copied().unwrap_or(0);
                        if q != 0 {
                            blend_pixel(&mut dst[line + x], color, q, alpha_blend);
                        }
                    }
                    line += stride;
                }
            }
        }
    }
}

#[inline(always)]
pub fn blend_pixel(dst_pixel: &mut RGBA8, src_pixel: RGBA8, mask_alpha: u8, alpha_blend_dst: bool) {
    if src_pixel.a == 255 && mask_alpha == 255 {
        *dst_pixel = src_pixel;
        return;
    }

    let src_alpha = ((src_pixel.a as u32) * (mask_alpha as u32)) / 255;
    let u8_max = u8::MAX as u32;
    let dst_alpha = u8_max - src_alpha;

    let mix = |src: u8, dst: &mut u8| {
        let src_scaled = (src as u32) * src_alpha;
        *dst = match alpha_blend_dst {
            true => ((src_scaled + (*dst as u32) * dst_alpha) / u8_max) as u8,
            false => (src_scaled / u8_max) as u8,
        };
    };

    mix(src_pixel.r, &mut dst_pixel.r);
    mix(src_pixel.g, &mut dst_pixel.g);
    mix(src_pixel.b, &mut dst_pixel.b);
    // coverage accumulates
    dst_pixel.a = match alpha_blend_dst {
        true => (src_alpha + (dst_pixel.a as u32) * dst_alpha / u8_max).min(u8_max) as u8,
        false => src_alpha as u8,
    };
}
