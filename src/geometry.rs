//! CPU-side vertex data, ready to be handed to a graphics device.
//!
//! Geometry is accumulated as a flat list of vertices (three per triangle
//! for meshes, one per point for lines) and turned into an indexed buffer
//! by [`PrimitiveGeometry::upload`], once per change.

use crate::computing::{cartesian, Couple, Float, Triple, C_ZERO};

use rgb::RGBA;

use std::collections::HashMap;
use core::f32::consts::TAU;

pub type Color = RGBA<Float>;

pub const WHITE: Color = RGBA::new(1.0, 1.0, 1.0, 1.0);
pub const UNIT_Z: Triple = Triple::new(0.0, 0.0, 1.0);

/// Floats per vertex in [`PrimitiveGeometry::interleaved`]
pub const FLOATS_PER_VERTEX: usize = 12;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexAttributes {
    pub position: Triple,
    pub normal: Triple,
    pub tex_coord: Couple,
    pub color: Color,
}

impl VertexAttributes {
    pub fn new(position: Triple, normal: Triple) -> Self {
        Self {
            position,
            normal,
            tex_coord: C_ZERO,
            color: WHITE,
        }
    }

    /// A vertex on the z = 0 plane, facing +Z
    pub fn planar(p: Couple) -> Self {
        Self::new(Triple::new(p.x, p.y, 0.0), UNIT_Z)
    }

    pub fn with_tex_coord(mut self, tex_coord: Couple) -> Self {
        self.tex_coord = tex_coord;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    fn flat(&self) -> [Float; FLOATS_PER_VERTEX] {
        let (p, n, t, c) = (self.position, self.normal, self.tex_coord, self.color);
        [p.x, p.y, p.z, n.x, n.y, n.z, t.x, t.y, c.r, c.g, c.b, c.a]
    }

    fn key(&self) -> [u32; FLOATS_PER_VERTEX] {
        self.flat().map(|f| f.to_bits())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClearOption {
    KeepIntermediateData,
    ClearIntermediateData,
}

/// Deduplicated vertices and the indices drawing them in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<VertexAttributes>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    /// Interleaved position, normal, tex_coord, color
    pub fn interleaved(&self) -> Vec<Float> {
        let mut buffer = Vec::with_capacity(self.vertices.len() * FLOATS_PER_VERTEX);
        for v in &self.vertices {
            buffer.extend_from_slice(&v.flat());
        }
        buffer
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveGeometry {
    vertices: Vec<VertexAttributes>,
    uploaded: Option<IndexedMesh>,
}

impl PrimitiveGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[VertexAttributes] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut Vec<VertexAttributes> {
        &mut self.vertices
    }

    pub fn push_tri(&mut self, p0: VertexAttributes, p1: VertexAttributes, p2: VertexAttributes) {
        self.vertices.extend_from_slice(&[p0, p1, p2]);
    }

    /// Counterclockwise quad as two triangles
    pub fn push_quad(
        &mut self,
        p0: VertexAttributes,
        p1: VertexAttributes,
        p2: VertexAttributes,
        p3: VertexAttributes,
    ) {
        self.push_tri(p0, p1, p2);
        self.push_tri(p0, p2, p3);
    }

    pub fn paint(&mut self, color: Color) {
        self.vertices.iter_mut().for_each(|v| v.color = color);
    }

    pub fn translate(&mut self, offset: Triple) {
        self.vertices.iter_mut().for_each(|v| v.position += offset);
    }

    /// Builds the index buffer, replacing any previous upload.
    pub fn upload(&mut self, clear_option: ClearOption) -> &IndexedMesh {
        let mut mesh = IndexedMesh::default();
        let mut map = HashMap::with_capacity(self.vertices.len());
        mesh.indices.reserve(self.vertices.len());

        for v in &self.vertices {
            let next = mesh.vertices.len() as u32;
            let index = *map.entry(v.key()).or_insert_with(|| {
                mesh.vertices.push(*v);
                next
            });
            mesh.indices.push(index);
        }

        log::debug!("uploaded {} vertices as {} unique", mesh.indices.len(), mesh.vertices.len());

        if clear_option == ClearOption::ClearIntermediateData {
            self.vertices = Vec::new();
        }

        self.uploaded.insert(mesh)
    }

    pub fn uploaded(&self) -> Option<&IndexedMesh> {
        self.uploaded.as_ref()
    }

    pub fn clean_up_buffers(&mut self) {
        self.uploaded = None;
    }

    pub fn index_count(&self) -> usize {
        match &self.uploaded {
            Some(mesh) => mesh.indices.len(),
            None => self.vertices.len(),
        }
    }

    /// Meaningful for triangle lists only
    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    pub fn unit_square() -> Self {
        let corner = |x: Float, y: Float| {
            VertexAttributes::new(Triple::new(x, y, 0.0), UNIT_Z)
                .with_tex_coord(Couple::new(x + 0.5, y + 0.5))
        };
        let mut geometry = Self::new();
        geometry.push_quad(corner(-0.5, -0.5), corner(0.5, -0.5), corner(0.5, 0.5), corner(-0.5, 0.5));
        geometry
    }

    pub fn unit_disk(resolution: usize) -> Self {
        Self::partial_disk(0.0, 1.0, 0.0, TAU, resolution)
    }

    /// Ring sector between two radii and two angles (radians).
    pub fn partial_disk(
        inner: Float,
        outer: Float,
        start: Float,
        end: Float,
        resolution: usize,
    ) -> Self {
        let mut geometry = Self::new();
        let steps = resolution.max(1);
        let step = (end - start) / steps as Float;
        let vertex = |angle: Float, radius: Float| {
            let p = cartesian(angle, radius);
            VertexAttributes::planar(p).with_tex_coord(Couple::new(angle, radius))
        };

        for i in 0..steps {
            let a0 = start + step * i as Float;
            let a1 = a0 + step;
            if inner > 0.0 {
                geometry.push_quad(vertex(a0, inner), vertex(a0, outer), vertex(a1, outer), vertex(a1, inner));
            } else {
                geometry.push_tri(vertex(a0, 0.0), vertex(a0, outer), vertex(a1, outer));
            }
        }
        geometry
    }
}
