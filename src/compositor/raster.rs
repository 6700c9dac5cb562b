// src/compositor/raster.rs

//! Scan conversion for overlay geometry: even-odd polygon fill sampled at pixel centres,
//! Bresenham lines, and thick lines built from square stamps.

use super::Framebuffer;
use crate::color::Rgba;
use crate::geometry::Point;

/// Fills a polygon with the even-odd rule. A pixel is inside when its centre is.
pub fn fill_polygon(fb: &mut Framebuffer, vertices: &[Point], color: Rgba) {
    if vertices.len() < 3 {
        return;
    }
    let (min_y, max_y) = vertices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v.y), hi.max(v.y)));
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }
    let y_start = (min_y.floor() as i64).max(0);
    let y_end = (max_y.ceil() as i64).min(fb.height() as i64);

    let width = fb.width() as f64;
    let n = vertices.len();
    let mut crossings: Vec<f64> = Vec::with_capacity(n);
    for y in y_start..y_end {
        let yc = y as f64 + 0.5;
        crossings.clear();
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            if (a.y <= yc) != (b.y <= yc) {
                crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);
        for span in crossings.chunks_exact(2) {
            let x0 = (span[0] - 0.5).ceil().clamp(0.0, width) as i64;
            let x1 = (span[1] - 0.5).ceil().clamp(0.0, width) as i64;
            if x1 > x0 {
                fb.fill_rect(x0, y, x1 - x0, 1, color);
            }
        }
    }
}

/// One-pixel Bresenham line between rounded endpoints, clipped to the framebuffer.
pub fn draw_line(fb: &mut Framebuffer, p1: Point, p2: Point, color: Rgba) {
    draw_thick_line(fb, p1, p2, 1, color);
}

const OUT_LEFT: u8 = 1;
const OUT_RIGHT: u8 = 2;
const OUT_ABOVE: u8 = 4;
const OUT_BELOW: u8 = 8;

/// Axis-aligned clip box in device pixels.
#[derive(Debug, Clone, Copy)]
struct ClipBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl ClipBox {
    fn outcode(&self, p: Point) -> u8 {
        let mut code = 0;
        if p.x < self.x_min {
            code |= OUT_LEFT;
        } else if p.x > self.x_max {
            code |= OUT_RIGHT;
        }
        if p.y < self.y_min {
            code |= OUT_ABOVE;
        } else if p.y > self.y_max {
            code |= OUT_BELOW;
        }
        code
    }
}

/// Clips `a–b` to the box (Cohen–Sutherland). The clipped coordinate is snapped onto
/// the box edge, so endpoints far outside keep their precision. `None` when the segment
/// misses the box.
fn clip_segment(mut a: Point, mut b: Point, clip: ClipBox) -> Option<(Point, Point)> {
    // Each pass moves one endpoint onto an edge; four per endpoint at most.
    for _ in 0..8 {
        let (code_a, code_b) = (clip.outcode(a), clip.outcode(b));
        if code_a | code_b == 0 {
            let finite = a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite();
            return finite.then_some((a, b));
        }
        if code_a & code_b != 0 {
            return None;
        }
        let out = if code_a != 0 { code_a } else { code_b };
        let (from, to) = if code_a != 0 { (a, b) } else { (b, a) };
        // Interpolate from the endpoint that stays put.
        let moved = if out & OUT_ABOVE != 0 {
            let t = (clip.y_min - to.y) / (from.y - to.y);
            Point::new(to.x + t * (from.x - to.x), clip.y_min)
        } else if out & OUT_BELOW != 0 {
            let t = (clip.y_max - to.y) / (from.y - to.y);
            Point::new(to.x + t * (from.x - to.x), clip.y_max)
        } else if out & OUT_LEFT != 0 {
            let t = (clip.x_min - to.x) / (from.x - to.x);
            Point::new(clip.x_min, to.y + t * (from.y - to.y))
        } else {
            let t = (clip.x_max - to.x) / (from.x - to.x);
            Point::new(clip.x_max, to.y + t * (from.y - to.y))
        };
        if code_a != 0 {
            a = moved;
        } else {
            b = moved;
        }
    }
    None
}

/// Bresenham line stamping a `thickness × thickness` square centred on every step.
///
/// The segment is first clipped to the framebuffer grown by the stamp size, so the
/// stepping cost is bounded by the framebuffer and never by the segment length.
pub fn draw_thick_line(fb: &mut Framebuffer, p1: Point, p2: Point, thickness: i64, color: Rgba) {
    if !(p1.x.is_finite() && p1.y.is_finite() && p2.x.is_finite() && p2.y.is_finite()) {
        return;
    }
    let t = thickness.clamp(1, fb.width().max(fb.height()) as i64 + 1);
    let half = t / 2;
    let margin = (t + 1) as f64;
    let clip = ClipBox {
        x_min: -margin,
        y_min: -margin,
        x_max: fb.width() as f64 + margin,
        y_max: fb.height() as f64 + margin,
    };
    let Some((p1, p2)) = clip_segment(p1, p2, clip) else {
        return;
    };
    let (mut x, mut y) = (p1.x.round() as i64, p1.y.round() as i64);
    let (x1, y1) = (p2.x.round() as i64, p2.y.round() as i64);

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        fb.fill_rect(x - half, y - half, t, t, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Closed outline through `vertices`.
pub fn stroke_polygon(fb: &mut Framebuffer, vertices: &[Point], color: Rgba) {
    let n = vertices.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        draw_line(fb, vertices[i], vertices[(i + 1) % n], color);
    }
}
