// src/hatch.rs

//! Hatch (pattern) fill by clipping parallel lines against a polygon.
//!
//! Lines run along `d = (cos θ, sin θ)` and are indexed by their offset `k` along the
//! normal `n = (−sin θ, cos θ)`. Each line is intersected with every polygon edge, the
//! points are sorted along `d` and paired `(p0, p1), (p2, p3), …`.
//!
//! Pairing is only correct when every line crosses the boundary an even number of
//! times, which holds for convex shapes. A line through a reflex vertex of a concave
//! polygon can leave the last point unpaired.

use crate::geometry::{Point, Rect};
use std::collections::HashSet;

pub type Segment = (Point, Point);

const TOUCH_EPSILON: f64 = 1e-9;
const DEGENERATE_EPSILON: f64 = 1e-6;
const MIN_SPACING: f64 = 1e-6;
const DEDUPE_SCALE: f64 = 1e6;

/// Drops points that coincide after rounding to six decimals, keeping first occurrences.
fn dedupe_points(points: Vec<Point>) -> Vec<Point> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .into_iter()
        .filter(|p| {
            let key = (
                (p.x * DEDUPE_SCALE).round() as i64,
                (p.y * DEDUPE_SCALE).round() as i64,
            );
            seen.insert(key)
        })
        .collect()
}

/// Intersections of the line `{p : p·normal = k}` with the polygon's edges.
///
/// Edge endpoints lying on the line are included as-is, and an edge lying on the
/// line contributes both endpoints.
pub fn line_polygon_intersections(vertices: &[Point], normal: Point, k: f64) -> Vec<Point> {
    let n = vertices.len();
    let mut points = Vec::new();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let da = a.dot(normal) - k;
        let db = b.dot(normal) - k;

        let a_on = da.abs() <= TOUCH_EPSILON;
        let b_on = db.abs() <= TOUCH_EPSILON;
        if a_on && b_on {
            points.push(a);
            points.push(b);
        } else if a_on {
            points.push(a);
        } else if b_on {
            points.push(b);
        } else if da * db < 0.0 {
            let t = da / (da - db);
            points.push(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
        }
    }
    dedupe_points(points)
}

/// Hatch segments filling `vertices` (device pixels).
///
/// The first line sits at `floor((k_min − offset)/spacing)·spacing + offset` and lines
/// repeat every `spacing` up to `k_max`. Fewer than three vertices produce nothing.
pub fn hatch_segments(vertices: &[Point], spacing: f64, angle_deg: f64, offset: f64) -> Vec<Segment> {
    hatch_segments_in_band(vertices, spacing, angle_deg, offset, None)
}

/// Like [`hatch_segments`], but only emits lines that can touch `visible` grown by
/// `margin`. Lines stay on the same lattice, so the result is the visible subset of the
/// unbounded fill and its cost follows the visible area, not the polygon size.
pub fn hatch_segments_within(
    vertices: &[Point],
    spacing: f64,
    angle_deg: f64,
    offset: f64,
    visible: Rect,
    margin: f64,
) -> Vec<Segment> {
    let normal = hatch_normal(angle_deg);
    let v = visible.inflate(margin.max(0.0));
    let corners = [
        Point::new(v.x, v.y),
        Point::new(v.x + v.w, v.y),
        Point::new(v.x, v.y + v.h),
        Point::new(v.x + v.w, v.y + v.h),
    ];
    let band = corners
        .iter()
        .map(|c| c.dot(normal))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), k| (lo.min(k), hi.max(k)));
    hatch_segments_in_band(vertices, spacing, angle_deg, offset, Some(band))
}

fn hatch_normal(angle_deg: f64) -> Point {
    let (sin_t, cos_t) = angle_deg.to_radians().sin_cos();
    Point::new(-sin_t, cos_t)
}

fn hatch_segments_in_band(
    vertices: &[Point],
    spacing: f64,
    angle_deg: f64,
    offset: f64,
    band: Option<(f64, f64)>,
) -> Vec<Segment> {
    if vertices.len() < 3 {
        return Vec::new();
    }

    let (sin_t, cos_t) = angle_deg.to_radians().sin_cos();
    let direction = Point::new(cos_t, sin_t);
    let normal = Point::new(-sin_t, cos_t);

    let (k_min, k_max) = vertices
        .iter()
        .map(|v| v.dot(normal))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), k| (lo.min(k), hi.max(k)));
    let (k_lo, k_hi) = match band {
        Some((lo, hi)) => (k_min.max(lo), k_max.min(hi)),
        None => (k_min, k_max),
    };
    if !(k_lo.is_finite() && k_hi.is_finite()) || k_lo > k_hi {
        return Vec::new();
    }

    let spacing = spacing.max(MIN_SPACING);
    let first = ((k_lo - offset) / spacing).floor();
    let slack = spacing * 1e-6 + TOUCH_EPSILON;

    let mut segments = Vec::new();
    for i in 0u64.. {
        let k = (first + i as f64) * spacing + offset;
        if k > k_hi + slack {
            break;
        }
        let mut points = line_polygon_intersections(vertices, normal, k);
        if points.len() >= 2 {
            points.sort_by(|p, q| p.dot(direction).total_cmp(&q.dot(direction)));
            for pair in points.chunks_exact(2) {
                let (p1, p2) = (pair[0], pair[1]);
                if p1.approx_eq(p2, DEGENERATE_EPSILON) {
                    continue;
                }
                segments.push((p1, p2));
            }
        }
    }
    segments
}
