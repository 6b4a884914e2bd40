//! Polygon partitioning: outer contours with holes into triangles.
//!
//! Holes are bridged into the outer contour they sit in and the result is
//! ear-clipped. Every produced triangle winds counterclockwise.

use crate::computing::{signed_area, Couple, Float};

use earcutr::earcut;

/// Below this absolute area a contour encloses nothing.
pub const AREA_EPSILON: Float = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Degenerate,
}

use TessellationError::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TessellationError {
    /// a contour has fewer than three points or no area
    DegenerateContour,
    /// no non-hole contour was supplied
    NoOuterContour,
    /// a hole lies outside of every outer contour
    UnassignedHole,
    /// the ear clipper gave up
    Triangulation,
    /// the ear clipper succeeded but produced no triangle
    EmptyResult,
}

pub type TessellationResult<T> = Result<T, TessellationError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Couple>,
    hole: bool,
}

impl Polygon {
    pub fn new(points: Vec<Couple>) -> Self {
        Self { points, hole: false }
    }

    pub fn points(&self) -> &[Couple] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_hole(&self) -> bool {
        self.hole
    }

    pub fn set_hole(&mut self, hole: bool) {
        self.hole = hole;
    }

    pub fn area(&self) -> Float {
        signed_area(&self.points)
    }

    pub fn orientation(&self) -> Orientation {
        let area = self.area();
        if area > AREA_EPSILON {
            Orientation::CounterClockwise
        } else if area < -AREA_EPSILON {
            Orientation::Clockwise
        } else {
            Orientation::Degenerate
        }
    }

    /// Reverses the point order if the polygon winds the other way.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        let current = self.orientation();
        if current != Orientation::Degenerate
            && orientation != Orientation::Degenerate
            && current != orientation
        {
            self.points.reverse();
        }
    }

    /// Even-odd ray casting
    pub fn contains(&self, p: Couple) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Ear-clipping triangulation of a set of outer contours and holes.
///
/// Each hole is attached to the first outer contour containing it.
pub fn triangulate_ec(polygons: &[Polygon]) -> TessellationResult<Vec<[Couple; 3]>> {
    let mut outers = Vec::new();
    let mut holes = Vec::new();
    for polygon in polygons {
        if polygon.len() < 3 || polygon.orientation() == Orientation::Degenerate {
            return Err(DegenerateContour);
        }
        match polygon.is_hole() {
            true => holes.push(polygon),
            false => outers.push(polygon),
        }
    }

    if outers.is_empty() {
        return Err(NoOuterContour);
    }

    let mut groups: Vec<Vec<&Polygon>> = outers.iter().map(|_| Vec::new()).collect();
    for hole in holes {
        let probe = hole.points[0];
        let owner = outers.iter().position(|outer| outer.contains(probe));
        groups[owner.ok_or(UnassignedHole)?].push(hole);
    }

    let mut triangles = Vec::new();
    for (outer, holes) in outers.iter().zip(groups.iter()) {
        triangulate_group(outer, holes, &mut triangles)?;
    }

    match triangles.is_empty() {
        true => Err(EmptyResult),
        false => Ok(triangles),
    }
}

fn triangulate_group(
    outer: &Polygon,
    holes: &[&Polygon],
    triangles: &mut Vec<[Couple; 3]>,
) -> TessellationResult<()> {
    let mut ring = Vec::with_capacity(outer.len() + holes.iter().map(|h| h.len()).sum::<usize>());
    let mut hole_starts = Vec::with_capacity(holes.len());

    let mut outer = outer.clone();
    outer.set_orientation(Orientation::CounterClockwise);
    ring.extend_from_slice(outer.points());

    for hole in holes {
        let mut hole = (*hole).clone();
        hole.set_orientation(Orientation::Clockwise);
        hole_starts.push(ring.len());
        ring.extend_from_slice(hole.points());
    }

    let mut coords = Vec::with_capacity(ring.len() * 2);
    for p in &ring {
        coords.push(p.x as f64);
        coords.push(p.y as f64);
    }

    let indices = earcut(&coords, &hole_starts, 2).map_err(|_| Triangulation)?;
    if indices.len() % 3 != 0 {
        return Err(Triangulation);
    }

    for t in indices.chunks_exact(3) {
        let mut triangle = [ring[t[0]], ring[t[1]], ring[t[2]]];
        if signed_area(&triangle) < 0.0 {
            triangle.swap(1, 2);
        }
        triangles.push(triangle);
    }

    Ok(())
}
