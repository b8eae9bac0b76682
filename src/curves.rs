//! Geometry primitives: 2D vectors, rectangles, quadratic Béziers, and
//! cubic-to-quadratic approximation.
//!
//! Everything downstream of outline extraction speaks quadratics only, so
//! this module is also where cubic segments get lowered. Coordinates are
//! unscaled font units throughout.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D point or direction in font units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
        a + (b - a) * t
    }

    /// The exact midpoint of two points.
    pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
        Vec2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// An axis-aligned rectangle, `min` inclusive through `max` inclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    /// Whether `p` lies in the rectangle, boundary included.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow the rectangle to cover `p`.
    pub fn extend(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }
}

/// A quadratic Bézier `B(t) = (1−t)²·e0 + 2(1−t)t·c + t²·e1`, `t ∈ [0,1]`.
///
/// Straight segments are carried as quadratics whose control point is the
/// midpoint of the endpoints, so one curve type covers a whole outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadratic {
    pub e0: Vec2,
    pub c: Vec2,
    pub e1: Vec2,
}

/// Coefficients below this are treated as vanishing when solving per-axis
/// quadratics. Font-unit magnitudes are in the hundreds to thousands, so
/// this only catches genuinely degenerate (linear or constant) components.
const COEFF_EPSILON: f32 = 1e-6;

impl Quadratic {
    pub const fn new(e0: Vec2, c: Vec2, e1: Vec2) -> Self {
        Self { e0, c, e1 }
    }

    /// A straight segment from `a` to `b` in quadratic form.
    pub fn line(a: Vec2, b: Vec2) -> Self {
        Self::new(a, Vec2::midpoint(a, b), b)
    }

    pub fn eval(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        self.e0 * (u * u) + self.c * (2.0 * u * t) + self.e1 * (t * t)
    }

    /// First derivative at `t` (the tangent direction, unnormalized).
    pub fn derivative(&self, t: f32) -> Vec2 {
        (self.c - self.e0) * (2.0 * (1.0 - t)) + (self.e1 - self.c) * (2.0 * t)
    }

    pub fn translate(&self, d: Vec2) -> Self {
        Self::new(self.e0 + d, self.c + d, self.e1 + d)
    }

    /// Exact axis-aligned bounding box. Extrema occur at the endpoints and
    /// wherever a derivative component vanishes, at
    /// `t = (e0 − c) / (e0 − 2c + e1)` per axis.
    pub fn bounding_box(&self) -> Rect {
        let mut rect = Rect::new(self.e0, self.e0);
        rect.extend(self.e1);

        let denom_x = self.e0.x - 2.0 * self.c.x + self.e1.x;
        if denom_x.abs() > COEFF_EPSILON {
            let t = (self.e0.x - self.c.x) / denom_x;
            if t > 0.0 && t < 1.0 {
                rect.extend(self.eval(t));
            }
        }
        let denom_y = self.e0.y - 2.0 * self.c.y + self.e1.y;
        if denom_y.abs() > COEFF_EPSILON {
            let t = (self.e0.y - self.c.y) / denom_y;
            if t > 0.0 && t < 1.0 {
                rect.extend(self.eval(t));
            }
        }
        rect
    }

    /// Parameter values where the curve's y component equals `y`.
    ///
    /// Writes up to two real roots into `out` and returns how many. Roots
    /// are not clamped to `[0, 1]`; callers filter for their convention.
    pub fn solve_y(&self, y: f32, out: &mut [f32; 2]) -> usize {
        solve_component(
            self.e0.y - 2.0 * self.c.y + self.e1.y,
            2.0 * (self.c.y - self.e0.y),
            self.e0.y - y,
            out,
        )
    }

    /// Parameter values where the curve's x component equals `x`.
    pub fn solve_x(&self, x: f32, out: &mut [f32; 2]) -> usize {
        solve_component(
            self.e0.x - 2.0 * self.c.x + self.e1.x,
            2.0 * (self.c.x - self.e0.x),
            self.e0.x - x,
            out,
        )
    }
}

/// Real roots of `a·t² + b·t + c = 0`, degenerating to the linear and
/// constant cases as coefficients vanish.
fn solve_component(a: f32, b: f32, c: f32, out: &mut [f32; 2]) -> usize {
    if a.abs() < COEFF_EPSILON {
        if b.abs() < COEFF_EPSILON {
            return 0;
        }
        out[0] = -c / b;
        return 1;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return 0;
    }
    let sq = disc.sqrt();
    out[0] = (-b - sq) / (2.0 * a);
    out[1] = (-b + sq) / (2.0 * a);
    2
}

/// Recursion cap for cubic subdivision; at the cap the current quadratic is
/// emitted regardless of the error estimate.
const MAX_SUBDIV_DEPTH: u32 = 10;

/// Sup-norm error bound coefficient for the shoulder-average quadratic:
/// `√3 / 36` of the cubic's third finite difference.
const APPROX_ERR_COEFF: f32 = 0.048_112_52;

/// Approximate the cubic `(p0, p1, p2, p3)` by quadratics appended to `out`.
///
/// The concatenation starts at `p0`, ends at `p3`, shares endpoints exactly
/// between pieces, and stays within `tolerance` of the cubic in sup norm
/// (up to the recursion cap). Each candidate quadratic keeps the cubic's
/// endpoints and averages the two shoulder controls `(3p1 − p0)/2` and
/// `(3p2 − p3)/2`; when the third-difference error estimate is too large the
/// cubic is split at `t = 0.5` by de Casteljau and both halves recurse.
pub fn cubic_to_quadratics(
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    tolerance: f32,
    out: &mut Vec<Quadratic>,
) {
    subdivide(p0, p1, p2, p3, tolerance, 0, out);
}

fn subdivide(
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    tolerance: f32,
    depth: u32,
    out: &mut Vec<Quadratic>,
) {
    let err = (p3 - p2 * 3.0 + p1 * 3.0 - p0).norm() * APPROX_ERR_COEFF;
    if err <= tolerance || depth >= MAX_SUBDIV_DEPTH {
        let c = ((p1 * 3.0 - p0) + (p2 * 3.0 - p3)) * 0.25;
        out.push(Quadratic::new(p0, c, p3));
        return;
    }

    let p01 = Vec2::midpoint(p0, p1);
    let p12 = Vec2::midpoint(p1, p2);
    let p23 = Vec2::midpoint(p2, p3);
    let p012 = Vec2::midpoint(p01, p12);
    let p123 = Vec2::midpoint(p12, p23);
    let p0123 = Vec2::midpoint(p012, p123);

    subdivide(p0, p01, p012, p0123, tolerance, depth + 1, out);
    subdivide(p0123, p123, p23, p3, tolerance, depth + 1, out);
}
