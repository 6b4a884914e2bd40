//! SVG shapes turned into fill meshes and stroke lines.

use crate::computing::{flatten, Couple, Float};
use crate::geometry::{ClearOption, Color, IndexedMesh, PrimitiveGeometry, VertexAttributes};
use crate::partition::{triangulate_ec, Orientation, Polygon, TessellationResult};
use crate::svg::{parse_svg, PackedColor, Paint, SvgImage, SvgResult, SvgShape};

/// Flatness tolerance used for SVG paths
pub const SVG_TOLERANCE: Float = 0.5;

/// Opacities and widths at or below this draw nothing
pub const EPSILON: Float = Float::EPSILON;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    LineStrip,
    LineLoop,
}

/// Uploaded geometry with a flat diffuse color.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericShape {
    geometry: PrimitiveGeometry,
    draw_mode: DrawMode,
    diffuse_color: Color,
    ambient_factor: Float,
}

impl GenericShape {
    pub fn new(mut geometry: PrimitiveGeometry, draw_mode: DrawMode, diffuse_color: Color) -> Self {
        geometry.paint(diffuse_color);
        geometry.upload(ClearOption::KeepIntermediateData);
        Self {
            geometry,
            draw_mode,
            diffuse_color,
            ambient_factor: 1.0,
        }
    }

    pub fn geometry(&self) -> &PrimitiveGeometry {
        &self.geometry
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn diffuse_color(&self) -> Color {
        self.diffuse_color
    }

    pub fn ambient_factor(&self) -> Float {
        self.ambient_factor
    }

    pub fn set_ambient_factor(&mut self, ambient_factor: Float) {
        self.ambient_factor = ambient_factor;
    }

    /// Vertices in submission order, on the z = 0 plane
    pub fn outline(&self) -> impl Iterator<Item = Couple> + '_ {
        self.geometry.vertices().iter().map(|v| Couple::new(v.position.x, v.position.y))
    }

    pub fn mesh(&self) -> Option<&IndexedMesh> {
        self.geometry.uploaded()
    }

    /// Same primitive with every planar position passed through `f`
    pub fn map_points(&self, f: impl Fn(Couple) -> Couple) -> Self {
        let mut geometry = PrimitiveGeometry::new();
        geometry.vertices_mut().extend(self.outline().map(|p| VertexAttributes::planar(f(p))));
        Self {
            ambient_factor: self.ambient_factor,
            ..Self::new(geometry, self.draw_mode, self.diffuse_color)
        }
    }
}

/// What an [`SvgPrimitive`] hands to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    /// triangles, drawn first
    Fill(GenericShape),
    /// line strip or loop, drawn over the fill
    Stroke(GenericShape),
}

impl Renderable {
    pub fn shape(&self) -> &GenericShape {
        match self {
            Renderable::Fill(s) => s,
            Renderable::Stroke(s) => s,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, Renderable::Fill(_))
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.shape().draw_mode()
    }

    pub fn color(&self) -> Color {
        self.shape().diffuse_color()
    }

    pub fn vertex_count(&self) -> usize {
        self.shape().geometry().vertices().len()
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Renderable::Fill(s) => s.geometry().triangle_count(),
            Renderable::Stroke(_) => 0,
        }
    }

    pub fn map_points(&self, f: impl Fn(Couple) -> Couple) -> Self {
        match self {
            Renderable::Fill(s) => Renderable::Fill(s.map_points(f)),
            Renderable::Stroke(s) => Renderable::Stroke(s.map_points(f)),
        }
    }
}

/// Line strip (or loop when `closed`) through flattened points.
///
/// Widths under one pixel fade the line instead of thinning it.
pub fn build_stroke(
    points: &[Couple],
    closed: bool,
    color: PackedColor,
    opacity: Float,
    stroke_width: Float,
) -> Option<Renderable> {
    let simulated_width = stroke_width.min(1.0);
    let color = color.to_color(opacity * simulated_width);
    if points.len() < 2 || color.a <= EPSILON {
        return None;
    }

    let mut geometry = PrimitiveGeometry::new();
    geometry.vertices_mut().extend(points.iter().map(|p| VertexAttributes::planar(*p)));

    let mode = match closed {
        true => DrawMode::LineLoop,
        false => DrawMode::LineStrip,
    };
    Some(Renderable::Stroke(GenericShape::new(geometry, mode, color)))
}

/// Triangulated contours, flat shaded facing +Z.
pub fn build_fill(polygons: &[Polygon], color: PackedColor, opacity: Float) -> TessellationResult<Renderable> {
    let triangles = triangulate_ec(polygons)?;

    let mut geometry = PrimitiveGeometry::new();
    for [a, b, c] in triangles {
        geometry.push_tri(VertexAttributes::planar(a), VertexAttributes::planar(b), VertexAttributes::planar(c));
    }
    Ok(Renderable::Fill(GenericShape::new(geometry, DrawMode::Triangles, color.to_color(opacity))))
}

fn should_fill(shape: &SvgShape) -> Option<PackedColor> {
    shape.fill.color().filter(|c| c.alpha() != 0)
}

fn should_stroke(shape: &SvgShape) -> Option<PackedColor> {
    let fill_compatible = matches!(shape.fill, Paint::Color(_) | Paint::None);
    shape
        .stroke
        .color()
        .filter(|c| c.alpha() != 0 && shape.stroke_width > EPSILON && fill_compatible)
}

/// Fill (if any) followed by one stroke per path.
pub fn shape_children(shape: &SvgShape, tolerance: Float) -> TessellationResult<Vec<Renderable>> {
    let fill = should_fill(shape);
    let stroke = should_stroke(shape);
    let mut children = Vec::new();

    if (fill.is_none() && stroke.is_none()) || shape.opacity <= EPSILON {
        return Ok(children);
    }

    let mut polygons = Vec::new();
    let mut strokes = Vec::new();
    let last = shape.paths.len().saturating_sub(1);

    for (i, path) in shape.paths.iter().enumerate() {
        let points = flatten(&path.points, tolerance).into_points();

        if fill.is_some() && points.len() >= 3 {
            let mut polygon = Polygon::new(points.clone());
            // only the last path is the outer contour
            match i < last {
                true => {
                    polygon.set_hole(true);
                    polygon.set_orientation(Orientation::Clockwise);
                }
                false => polygon.set_orientation(Orientation::CounterClockwise),
            }
            if polygon.orientation() != Orientation::Degenerate {
                polygons.push(polygon);
            }
        }

        if let Some(color) = stroke {
            strokes.extend(build_stroke(&points, path.closed, color, shape.opacity, shape.stroke_width));
        }
    }

    if let (Some(color), false) = (fill, polygons.is_empty()) {
        children.push(build_fill(&polygons, color, shape.opacity)?);
    }
    children.append(&mut strokes);

    Ok(children)
}

/// An SVG document and the renderables generated from it.
///
/// Children are rebuilt lazily: [`SvgPrimitive::set`] marks them stale and
/// [`SvgPrimitive::update`] regenerates them when needed.
#[derive(Debug, Clone, Default)]
pub struct SvgPrimitive {
    image: Option<SvgImage>,
    children: Vec<Renderable>,
    recompute: bool,
}

impl SvgPrimitive {
    pub fn new(svg: &str) -> Self {
        let mut primitive = Self::default();
        // a bad document leaves the primitive empty
        if !svg.is_empty() && primitive.set(svg).is_err() {
            log::debug!("svg primitive created without an image");
        }
        primitive
    }

    pub fn from_image(image: SvgImage) -> Self {
        Self {
            image: Some(image),
            children: Vec::new(),
            recompute: true,
        }
    }

    /// Replaces the document; on error there is nothing left to draw.
    pub fn set(&mut self, svg: &str) -> SvgResult<()> {
        self.children.clear();
        self.image = None;
        self.recompute = false;

        let image = match parse_svg(svg) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("could not parse svg: {:?}", e);
                return Err(e);
            }
        };

        self.image = Some(image);
        self.recompute = true;
        Ok(())
    }

    pub fn image(&self) -> Option<&SvgImage> {
        self.image.as_ref()
    }

    /// Document size in user units
    pub fn size(&self) -> Couple {
        match &self.image {
            Some(image) => Couple::new(image.width, image.height),
            None => Couple::zero(),
        }
    }

    pub fn needs_rebuild(&self) -> bool {
        self.recompute
    }

    /// Rebuilds the children if the document changed; returns whether it did.
    pub fn update(&mut self) -> bool {
        let stale = self.recompute;
        if stale {
            self.rebuild();
        }
        stale
    }

    pub fn rebuild(&mut self) {
        self.recompute = false;
        self.children.clear();

        let Some(image) = &self.image else {
            return;
        };

        for (i, shape) in image.shapes.iter().enumerate() {
            match shape_children(shape, SVG_TOLERANCE) {
                Ok(mut children) => self.children.append(&mut children),
                Err(e) => log::warn!("skipping shape {} ({:?}): {:?}", i, shape.id, e),
            }
        }

        log::debug!("svg rebuilt: {} children", self.children.len());
    }

    pub fn children(&self) -> &[Renderable] {
        &self.children
    }
}
