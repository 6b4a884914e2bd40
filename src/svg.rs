//! SVG documents reduced to shapes made of cubic Bezier paths.
//!
//! Only what icons need is understood: basic shapes, path data, group
//! inheritance, transforms and solid paints. Anything else is skipped.

use crate::computing::{Bezier, Couple, Float, Triple};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use svgtypes::{Length, LengthUnit, PointsParser, SimplePathSegment, SimplifyingPathParser};

use rgb::{RGBA, RGBA8};
use vek::Mat3;

use core::str::{from_utf8, FromStr};

pub const DPI: Float = 96.0;

/// Circle approximation constant for quarter arcs
const KAPPA: Float = 0.552_284_8;

use SvgError::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SvgError {
    /// the XML itself is malformed
    Xml,
    /// a name or value is not valid UTF-8
    Encoding,
    /// no `<svg>` element was found
    NoRoot,
    /// the document ended inside an element
    UnclosedElement,
}

pub type SvgResult<T> = Result<T, SvgError>;

/// `0xAABBGGRR`: red in the low byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const BLACK: Self = Self(0xFF00_0000);

    pub fn from_rgba8(c: RGBA8) -> Self {
        Self((c.r as u32) | (c.g as u32) << 8 | (c.b as u32) << 16 | (c.a as u32) << 24)
    }

    pub fn rgba8(self) -> RGBA8 {
        let [r, g, b, a] = self.0.to_le_bytes();
        RGBA8::new(r, g, b, a)
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | (alpha as u32) << 24)
    }

    /// Normalized channels, alpha scaled by `opacity`
    pub fn to_color(self, opacity: Float) -> RGBA<Float> {
        let c = self.rgba8();
        let n = |v: u8| v as Float / 255.0;
        RGBA::new(n(c.r), n(c.g), n(c.b), n(c.a) * opacity)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Paint {
    None,
    Color(PackedColor),
    /// `url(#…)` references; never drawn
    Gradient,
}

impl Paint {
    pub fn color(&self) -> Option<PackedColor> {
        match self {
            Paint::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// A run of cubic segments: `1 + 3k` points.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    pub points: Vec<Couple>,
    pub closed: bool,
}

impl SvgPath {
    pub fn segments(&self) -> impl Iterator<Item = Bezier> + '_ {
        self.points
            .windows(4)
            .step_by(3)
            .map(|p| Bezier::new(p[0], p[1], p[2], p[3]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgShape {
    pub id: Option<String>,
    pub fill: Paint,
    pub stroke: Paint,
    pub opacity: Float,
    pub stroke_width: Float,
    pub paths: Vec<SvgPath>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgImage {
    pub width: Float,
    pub height: Float,
    pub shapes: Vec<SvgShape>,
}

#[derive(Debug, Clone)]
struct Attributes {
    transform: Mat3<Float>,
    fill: Paint,
    fill_opacity: Float,
    stroke: Paint,
    stroke_opacity: Float,
    stroke_width: Float,
    opacity: Float,
    current_color: PackedColor,
    visible: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            transform: Mat3::identity(),
            fill: Paint::Color(PackedColor::BLACK),
            fill_opacity: 1.0,
            stroke: Paint::None,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            opacity: 1.0,
            current_color: PackedColor::BLACK,
            visible: true,
        }
    }
}

impl Attributes {
    fn apply(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key {
            "fill" => self.fill = self.paint(value, self.fill),
            "stroke" => self.stroke = self.paint(value, self.stroke),
            "fill-opacity" => self.fill_opacity = number(value).unwrap_or(self.fill_opacity),
            "stroke-opacity" => self.stroke_opacity = number(value).unwrap_or(self.stroke_opacity),
            "opacity" => self.opacity = number(value).unwrap_or(self.opacity),
            "stroke-width" => self.stroke_width = length(value).unwrap_or(self.stroke_width),
            "display" => self.visible = value != "none",
            "color" => {
                if let Ok(c) = svgtypes::Color::from_str(value) {
                    self.current_color = packed(c);
                }
            }
            "transform" => match svgtypes::Transform::from_str(value) {
                Ok(t) => {
                    let local = Mat3::from_row_arrays([
                        [t.a as Float, t.c as Float, t.e as Float],
                        [t.b as Float, t.d as Float, t.f as Float],
                        [0.0, 0.0, 1.0],
                    ]);
                    self.transform = self.transform * local;
                }
                Err(e) => log::warn!("ignoring transform {:?}: {}", value, e),
            },
            "style" => {
                for declaration in value.split(';') {
                    if let Some((k, v)) = declaration.split_once(':') {
                        self.apply(k.trim(), v);
                    }
                }
            }
            _ => (),
        }
    }

    fn paint(&self, value: &str, inherited: Paint) -> Paint {
        match svgtypes::Paint::from_str(value) {
            Ok(svgtypes::Paint::None) => Paint::None,
            Ok(svgtypes::Paint::Color(c)) => Paint::Color(packed(c)),
            Ok(svgtypes::Paint::CurrentColor) => Paint::Color(self.current_color),
            Ok(svgtypes::Paint::Inherit) => inherited,
            Ok(svgtypes::Paint::FuncIRI(..)) => Paint::Gradient,
            Ok(_) => Paint::None,
            Err(e) => {
                log::warn!("ignoring paint {:?}: {}", value, e);
                inherited
            }
        }
    }

    fn transform_point(&self, p: Couple) -> Couple {
        let v = self.transform * Triple::new(p.x, p.y, 1.0);
        Couple::new(v.x, v.y)
    }

    /// Average scale, applied to stroke widths
    fn scale(&self) -> Float {
        let m = self.transform.into_row_arrays();
        (m[0][0] * m[1][1] - m[0][1] * m[1][0]).abs().sqrt()
    }
}

fn packed(c: svgtypes::Color) -> PackedColor {
    PackedColor::from_rgba8(RGBA8::new(c.red, c.green, c.blue, c.alpha))
}

fn number(value: &str) -> Option<Float> {
    svgtypes::Number::from_str(value).ok().map(|n| n.0 as Float)
}

/// User units; percentages are not resolved
fn length(value: &str) -> Option<Float> {
    let Length { number, unit } = Length::from_str(value).ok()?;
    let factor = match unit {
        LengthUnit::None | LengthUnit::Px => 1.0,
        LengthUnit::Pt => DPI / 72.0,
        LengthUnit::Pc => DPI / 6.0,
        LengthUnit::Mm => DPI / 25.4,
        LengthUnit::Cm => DPI / 2.54,
        LengthUnit::In => DPI,
        LengthUnit::Em => 16.0,
        LengthUnit::Ex => 8.0,
        LengthUnit::Percent => return None,
    };
    Some(number as Float * factor)
}

/// Collects cubic chains, one per sub-path.
#[derive(Default)]
struct PathBuilder {
    current: Vec<Couple>,
    paths: Vec<SvgPath>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Couple) {
        self.flush(false);
        self.current.push(p);
    }

    fn last(&self) -> Option<Couple> {
        self.current.last().copied()
    }

    fn push(&mut self, bezier: Bezier) {
        self.current.extend_from_slice(&bezier.b[1..]);
    }

    fn line_to(&mut self, p: Couple) {
        if let Some(from) = self.last() {
            self.push(Bezier::line(from, p));
        }
    }

    fn quad_to(&mut self, ctrl: Couple, p: Couple) {
        if let Some(from) = self.last() {
            self.push(Bezier::quadratic(from, ctrl, p));
        }
    }

    fn cubic_to(&mut self, c0: Couple, c1: Couple, p: Couple) {
        if let Some(from) = self.last() {
            self.push(Bezier::new(from, c0, c1, p));
        }
    }

    fn close(&mut self) {
        if let (Some(first), Some(last)) = (self.current.first().copied(), self.last()) {
            if first != last {
                self.line_to(first);
            }
        }
        self.flush(true);
    }

    fn flush(&mut self, closed: bool) {
        let points = core::mem::take(&mut self.current);
        if points.len() >= 4 {
            self.paths.push(SvgPath { points, closed });
        }
    }

    fn finish(mut self, attributes: &Attributes) -> Vec<SvgPath> {
        self.flush(false);
        for path in &mut self.paths {
            for p in &mut path.points {
                *p = attributes.transform_point(*p);
            }
        }
        self.paths
    }

    /// Four quarter arcs, counterclockwise in y-up terms
    fn ellipse(&mut self, c: Couple, rx: Float, ry: Float) {
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        let p = |x: Float, y: Float| Couple::new(c.x + x, c.y + y);
        self.move_to(p(rx, 0.0));
        self.cubic_to(p(rx, ky), p(kx, ry), p(0.0, ry));
        self.cubic_to(p(-kx, ry), p(-rx, ky), p(-rx, 0.0));
        self.cubic_to(p(-rx, -ky), p(-kx, -ry), p(0.0, -ry));
        self.cubic_to(p(kx, -ry), p(rx, -ky), p(rx, 0.0));
        self.close();
    }

    fn rect(&mut self, x: Float, y: Float, w: Float, h: Float, rx: Float, ry: Float) {
        let p = Couple::new;
        if rx <= 0.0 || ry <= 0.0 {
            self.move_to(p(x, y));
            self.line_to(p(x + w, y));
            self.line_to(p(x + w, y + h));
            self.line_to(p(x, y + h));
        } else {
            let (kx, ky) = (rx * (1.0 - KAPPA), ry * (1.0 - KAPPA));
            self.move_to(p(x + rx, y));
            self.line_to(p(x + w - rx, y));
            self.cubic_to(p(x + w - kx, y), p(x + w, y + ky), p(x + w, y + ry));
            self.line_to(p(x + w, y + h - ry));
            self.cubic_to(p(x + w, y + h - ky), p(x + w - kx, y + h), p(x + w - rx, y + h));
            self.line_to(p(x + rx, y + h));
            self.cubic_to(p(x + kx, y + h), p(x, y + h - ky), p(x, y + h - ry));
            self.line_to(p(x, y + ry));
            self.cubic_to(p(x, y + ky), p(x + kx, y), p(x + rx, y));
        }
        self.close();
    }

    fn path_data(&mut self, data: &str) {
        for segment in SimplifyingPathParser::from(data) {
            let segment = match segment {
                Ok(segment) => segment,
                Err(e) => {
                    // what was parsed so far is kept
                    log::warn!("path data error: {}", e);
                    break;
                }
            };
            let p = |x: f64, y: f64| Couple::new(x as Float, y as Float);
            match segment {
                SimplePathSegment::MoveTo { x, y } => self.move_to(p(x, y)),
                SimplePathSegment::LineTo { x, y } => self.line_to(p(x, y)),
                SimplePathSegment::Quadratic { x1, y1, x, y } => self.quad_to(p(x1, y1), p(x, y)),
                SimplePathSegment::CurveTo { x1, y1, x2, y2, x, y } => {
                    self.cubic_to(p(x1, y1), p(x2, y2), p(x, y))
                }
                SimplePathSegment::ClosePath => self.close(),
            }
        }
    }

    fn points(&mut self, data: &str, closed: bool) {
        let mut points = PointsParser::from(data).map(|(x, y)| Couple::new(x as Float, y as Float));
        if let Some(first) = points.next() {
            self.move_to(first);
            points.for_each(|p| self.line_to(p));
        }
        match closed {
            true => self.close(),
            false => self.flush(false),
        }
    }
}

fn element_name(e: &BytesStart) -> SvgResult<String> {
    let name = e.local_name();
    Ok(from_utf8(name.as_ref()).map_err(|_| Encoding)?.to_owned())
}

fn element_attributes(e: &BytesStart) -> SvgResult<Vec<(String, String)>> {
    let mut list = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|_| Xml)?;
        let key = from_utf8(attr.key.local_name().as_ref()).map_err(|_| Encoding)?.to_owned();
        let value = attr.unescape_value().map_err(|_| Xml)?.into_owned();
        list.push((key, value));
    }
    Ok(list)
}

/// Elements whose content never renders directly
fn is_skipped(name: &str) -> bool {
    matches!(
        name,
        "defs" | "clipPath" | "mask" | "symbol" | "pattern" | "linearGradient" | "radialGradient"
            | "marker" | "style" | "title" | "desc" | "metadata"
    )
}

struct Parser {
    stack: Vec<Attributes>,
    skip_depth: usize,
    root_seen: bool,
    image: SvgImage,
}

impl Parser {
    fn top(&self) -> Attributes {
        self.stack.last().cloned().unwrap_or_default()
    }

    fn element(&mut self, e: &BytesStart, has_children: bool) -> SvgResult<()> {
        let name = element_name(e)?;

        if self.skip_depth > 0 || is_skipped(&name) {
            if has_children {
                self.skip_depth += 1;
            }
            return Ok(());
        }

        let raw = element_attributes(e)?;
        let get = |key: &str| raw.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let num = |key: &str| get(key).and_then(length).unwrap_or(0.0);

        let mut attributes = self.top();
        if name == "svg" && !self.root_seen {
            self.root_seen = true;
            self.root(&mut attributes, &get);
        }

        // presentation attributes first, then inline style wins
        for (key, value) in raw.iter().filter(|(k, _)| k != "style") {
            attributes.apply(key, value);
        }
        if let Some(style) = get("style") {
            attributes.apply("style", style);
        }

        let mut builder = PathBuilder::default();
        match name.as_str() {
            "path" => builder.path_data(get("d").unwrap_or("")),
            "rect" => {
                let (w, h) = (num("width"), num("height"));
                let (rx, ry) = match (get("rx").and_then(length), get("ry").and_then(length)) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (None, None) => (0.0, 0.0),
                };
                if w > 0.0 && h > 0.0 {
                    builder.rect(num("x"), num("y"), w, h, rx.min(w / 2.0), ry.min(h / 2.0));
                }
            }
            "circle" => {
                let r = num("r");
                if r > 0.0 {
                    builder.ellipse(Couple::new(num("cx"), num("cy")), r, r);
                }
            }
            "ellipse" => {
                let (rx, ry) = (num("rx"), num("ry"));
                if rx > 0.0 && ry > 0.0 {
                    builder.ellipse(Couple::new(num("cx"), num("cy")), rx, ry);
                }
            }
            "line" => {
                builder.move_to(Couple::new(num("x1"), num("y1")));
                builder.line_to(Couple::new(num("x2"), num("y2")));
            }
            "polyline" => builder.points(get("points").unwrap_or(""), false),
            "polygon" => builder.points(get("points").unwrap_or(""), true),
            _ => (),
        }

        let paths = builder.finish(&attributes);
        if !paths.is_empty() && attributes.visible {
            self.image.shapes.push(SvgShape {
                id: get("id").map(str::to_owned),
                fill: paint_with_opacity(attributes.fill, attributes.fill_opacity),
                stroke: paint_with_opacity(attributes.stroke, attributes.stroke_opacity),
                opacity: attributes.opacity,
                stroke_width: attributes.stroke_width * attributes.scale(),
                paths,
            });
        }

        if has_children {
            self.stack.push(attributes);
        }
        Ok(())
    }

    fn root<'a>(&mut self, attributes: &mut Attributes, get: &impl Fn(&str) -> Option<&'a str>) {
        let view_box = get("viewBox").and_then(|v| svgtypes::ViewBox::from_str(v).ok());
        let width = get("width").and_then(length);
        let height = get("height").and_then(length);

        match view_box {
            Some(vb) => {
                let (vx, vy, vw, vh) = (vb.x as Float, vb.y as Float, vb.w as Float, vb.h as Float);
                let w = width.unwrap_or(vw);
                let h = height.unwrap_or(vh);
                // xMidYMid meet
                let s = (w / vw).min(h / vh);
                let tx = (w - vw * s) * 0.5 - vx * s;
                let ty = (h - vh * s) * 0.5 - vy * s;
                attributes.transform = Mat3::from_row_arrays([[s, 0.0, tx], [0.0, s, ty], [0.0, 0.0, 1.0]]);
                self.image.width = w;
                self.image.height = h;
            }
            None => {
                self.image.width = width.unwrap_or(0.0);
                self.image.height = height.unwrap_or(0.0);
            }
        }
    }

    fn end(&mut self) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
        } else {
            self.stack.pop();
        }
    }
}

fn paint_with_opacity(paint: Paint, opacity: Float) -> Paint {
    match paint {
        Paint::Color(c) => {
            let alpha = (c.alpha() as Float * opacity.clamp(0.0, 1.0)).round() as u8;
            Paint::Color(c.with_alpha(alpha))
        }
        other => other,
    }
}

/// Parses a whole document.
pub fn parse_svg(source: &str) -> SvgResult<SvgImage> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut parser = Parser {
        stack: Vec::new(),
        skip_depth: 0,
        root_seen: false,
        image: SvgImage::default(),
    };

    let mut buffer = Vec::new();
    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => parser.element(e, true)?,
            Ok(Event::Empty(ref e)) => parser.element(e, false)?,
            Ok(Event::End(_)) => parser.end(),
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("malformed svg at byte {}: {}", reader.buffer_position(), e);
                return Err(Xml);
            }
            _ => (),
        }
        buffer.clear();
    }

    if !parser.root_seen {
        return Err(NoRoot);
    }
    if !parser.stack.is_empty() || parser.skip_depth > 0 {
        return Err(UnclosedElement);
    }

    log::debug!("parsed svg: {} shapes", parser.image.shapes.len());
    Ok(parser.image)
}
