// src/geometry.rs

//! Small planar geometry shared by the polygon, hatch and focus modules.

use serde::{Deserialize, Serialize};

/// Tolerance used by the segment intersection tests.
pub const SEGMENT_EPSILON: f64 = 1e-6;

/// A point in pixel space (design or device pixels depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn translate(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// True when both coordinates differ by at most `eps`.
    pub fn approx_eq(self, other: Point, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Axis-aligned rectangle. Constructed through [`Rect::new`], which normalizes
/// negative extents so that `w` and `h` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
        let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn has_area(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Grows the rectangle by `pad` on every side.
    pub fn inflate(&self, pad: f64) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.w + 2.0 * pad, self.h + 2.0 * pad)
    }
}

fn orient(p: Point, q: Point, r: Point) -> f64 {
    (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
}

fn on_segment(p: Point, q: Point, r: Point, eps: f64) -> bool {
    p.x.min(q.x) - eps <= r.x
        && r.x <= p.x.max(q.x) + eps
        && p.y.min(q.y) - eps <= r.y
        && r.y <= p.y.max(q.y) + eps
}

/// Segment/segment intersection using orientation signs, including touching
/// endpoints and collinear overlap.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let eps = SEGMENT_EPSILON;
    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    let straddles = |u: f64, v: f64| (u > eps && v < -eps) || (u < -eps && v > eps);
    if straddles(o1, o2) && straddles(o3, o4) {
        return true;
    }

    (o1.abs() <= eps && on_segment(a1, a2, b1, eps))
        || (o2.abs() <= eps && on_segment(a1, a2, b2, eps))
        || (o3.abs() <= eps && on_segment(b1, b2, a1, eps))
        || (o4.abs() <= eps && on_segment(b1, b2, a2, eps))
}
