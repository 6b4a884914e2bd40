use core::f32::consts::TAU;

pub type Float = f32;
pub type Couple = vek::vec::repr_c::vec2::Vec2<Float>;
pub type Triple = vek::vec::repr_c::vec3::Vec3<Float>;
pub const C_ZERO: Couple = Couple::new(0.0, 0.0);

/// Default flatness tolerance of a [`Curve`]
pub const DEFAULT_TOLERANCE: Float = 1.0;

/// Past this depth a segment is accepted as flat, whatever its shape.
pub const MAX_SUBDIVISION_DEPTH: usize = 16;

/// Cartesian to polar: `(angle, distance)`, angle in `]-π, π]`
pub fn polar(a: Couple) -> (Float, Float) {
    (a.y.atan2(a.x), (a.x * a.x + a.y * a.y).sqrt())
}

/// Polar to cartesian
pub fn cartesian(angle: Float, distance: Float) -> Couple {
    let (sin, cos) = angle.sin_cos();
    Couple::new(cos * distance, sin * distance)
}

/// Wraps an angle into `[0, 2π[`
pub fn normalize_angle(angle: Float) -> Float {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU itself
    match wrapped < TAU {
        true => wrapped,
        false => 0.0,
    }
}

/// Smallest absolute difference between two angles, in `[0, π]`
pub fn angular_distance(a: Float, b: Float) -> Float {
    let d = normalize_angle(a - b);
    d.min(TAU - d)
}

/// Shoelace formula; positive for counterclockwise point orders.
pub fn signed_area(points: &[Couple]) -> Float {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice * 0.5
}

/// A cubic Bezier segment: start, two controls, end.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bezier {
    pub b: [Couple; 4],
}

impl Bezier {
    pub const fn new(p0: Couple, p1: Couple, p2: Couple, p3: Couple) -> Self {
        Self { b: [p0, p1, p2, p3] }
    }

    /// Straight segment expressed as a cubic (controls at thirds)
    pub fn line(from: Couple, to: Couple) -> Self {
        let d = (to - from) / 3.0;
        Self::new(from, from + d, to - d, to)
    }

    /// Degree elevation of a quadratic segment
    pub fn quadratic(from: Couple, ctrl: Couple, to: Couple) -> Self {
        let c0 = from + (ctrl - from) * (2.0 / 3.0);
        let c1 = to + (ctrl - to) * (2.0 / 3.0);
        Self::new(from, c0, c1, to)
    }

    pub fn eval(&self, t: Float) -> Couple {
        let [p0, p1, p2, p3] = self.b;
        let mt = 1.0 - t;
        p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
    }

    /// de Casteljau split at t = 0.5
    pub fn subdivide(&self) -> (Bezier, Bezier) {
        let [p0, p1, p2, p3] = self.b;
        let middle = (p1 + p2) * 0.5;
        let l1 = (p0 + p1) * 0.5;
        let r2 = (p2 + p3) * 0.5;
        let l2 = (l1 + middle) * 0.5;
        let r1 = (middle + r2) * 0.5;
        let split = (l2 + r1) * 0.5;
        (Bezier::new(p0, l1, l2, split), Bezier::new(split, r1, r2, p3))
    }

    /// Roger Willcocks' flatness criterion, squared and scaled by 16.
    pub fn flatness(&self) -> Float {
        let [p0, p1, p2, p3] = self.b;
        let u = p1 * 3.0 - p0 * 2.0 - p3;
        let v = p2 * 3.0 - p3 * 2.0 - p0;
        let uu = u * u;
        let vv = v * v;
        uu.x.max(vv.x) + uu.y.max(vv.y)
    }
}

/// Adaptive polyline approximation of a chain of cubic segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    threshold: Float,
    points: Vec<Couple>,
}

impl Default for Curve {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl Curve {
    pub fn new(tolerance: Float) -> Self {
        Self {
            threshold: 16.0 * tolerance * tolerance,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[Couple] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Couple> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn append(&mut self, bezier: &Bezier) {
        self.append_at(bezier, 0);
    }

    fn append_at(&mut self, bezier: &Bezier, depth: usize) {
        if depth >= MAX_SUBDIVISION_DEPTH || bezier.flatness() < self.threshold {
            self.push_flat(bezier);
        } else {
            let (left, right) = bezier.subdivide();
            self.append_at(&left, depth + 1);
            self.append_at(&right, depth + 1);
        }
    }

    fn push_flat(&mut self, bezier: &Bezier) {
        let first = match self.points.first() {
            Some(first) => *first,
            None => {
                self.points.push(bezier.b[0]);
                bezier.b[0]
            }
        };

        let end = bezier.b[3];
        let d = end - first;
        if d.x.abs() < Float::EPSILON && d.y.abs() < Float::EPSILON {
            return;
        }
        self.points.push(end);
    }
}

/// Flattens a cubic chain (`1 + 3k` points, as stored in SVG paths)
pub fn flatten(points: &[Couple], tolerance: Float) -> Curve {
    let mut curve = Curve::new(tolerance);
    let mut i = 0;
    while i + 3 < points.len() {
        curve.append(&Bezier::new(points[i], points[i + 1], points[i + 2], points[i + 3]));
        i += 3;
    }
    curve
}
