//! Hatch fills: geometric properties over randomized convex shapes, and the composited
//! result of a pattern fill through the engine.

mod support;

use approx::assert_relative_eq;
use phosphor::engine::PatternOptions;
use phosphor::hatch::hatch_segments;
use phosphor::{ColorIndex, FrameCapture, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use support::{block_engine, pixels_of, plain_display};
use test_log::test;

const EPS: f64 = 1e-6;

fn regular_polygon(center: Point, radius: f64, sides: usize, phase: f64) -> Vec<Point> {
    (0..sides)
        .map(|i| {
            let a = phase + i as f64 * std::f64::consts::TAU / sides as f64;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// True when `p` is inside or on the boundary of a counter-clockwise convex polygon.
fn inside_convex(vertices: &[Point], p: Point) -> bool {
    let n = vertices.len();
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x) >= -EPS
    })
}

// =============================================================================
// Randomized geometry
// =============================================================================

#[test]
fn segments_stay_inside_convex_shapes() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let center = Point::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
        let radius = rng.gen_range(1.0..40.0);
        let sides = rng.gen_range(3..9);
        let phase = rng.gen_range(0.0..std::f64::consts::TAU);
        let poly = regular_polygon(center, radius, sides, phase);

        let spacing = rng.gen_range(0.5..10.0);
        let angle: f64 = rng.gen_range(-180.0..180.0);
        let offset = rng.gen_range(-5.0..5.0);
        let direction = Point::new(angle.to_radians().cos(), angle.to_radians().sin());

        for (p1, p2) in hatch_segments(&poly, spacing, angle, offset) {
            assert!(inside_convex(&poly, p1), "{:?} outside {:?}", p1, poly);
            assert!(inside_convex(&poly, p2), "{:?} outside {:?}", p2, poly);
            // Endpoints are ordered along the hatch direction.
            let along = (p2.x - p1.x) * direction.x + (p2.y - p1.y) * direction.y;
            assert!(along > 0.0);
            let across = (p2.x - p1.x) * direction.y - (p2.y - p1.y) * direction.x;
            assert!(across.abs() < 1e-6 * (1.0 + along));
        }
    }
}

#[test]
fn adjacent_lines_are_one_spacing_apart() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let poly = regular_polygon(Point::new(0.0, 0.0), rng.gen_range(10.0..30.0), 6, 0.3);
        let spacing = rng.gen_range(1.0..5.0);
        let angle: f64 = rng.gen_range(0.0..180.0);
        let normal = Point::new(-angle.to_radians().sin(), angle.to_radians().cos());

        let ks: Vec<f64> = hatch_segments(&poly, spacing, angle, 0.0)
            .iter()
            .map(|(p1, _)| p1.dot(normal))
            .collect();
        for pair in ks.windows(2) {
            assert!((pair[1] - pair[0] - spacing).abs() < 1e-6, "{:?}", pair);
        }
    }
}

// =============================================================================
// Through the engine
// =============================================================================

#[test]
fn pattern_rect_composites_evenly_spaced_rows() {
    let mut engine = block_engine(plain_display(10, 4));
    let mut sink = FrameCapture::new();
    let options = PatternOptions {
        spacing: Some(4.0),
        angle_deg: Some(0.0),
        offset: Some(0.0),
        ..PatternOptions::default()
    };

    engine.begin_frame();
    assert!(engine.draw_pattern_rect(ColorIndex::AMBER, 0.0, 0.0, 12.0, 12.0, &options));
    engine.finish_frame(&mut sink).unwrap();

    let amber = engine.palette().resolve(ColorIndex::AMBER);
    let pixels = pixels_of(sink.last.as_ref().unwrap(), amber);
    let mut rows: Vec<usize> = pixels.iter().map(|&(_, y)| y).collect();
    rows.dedup();
    assert_eq!(rows, vec![0, 4, 8, 12]);
    assert_eq!(pixels.len(), 4 * 13);
}

#[test]
fn pattern_offset_shifts_lines() {
    let mut engine = block_engine(plain_display(10, 4));
    let options = PatternOptions {
        spacing: Some(4.0),
        angle_deg: Some(0.0),
        offset: Some(2.0),
        ..PatternOptions::default()
    };
    engine.draw_pattern_rect(ColorIndex::AMBER, 0.0, 0.0, 12.0, 12.0, &options);
    let lines = &engine.pending_overlays().lines;
    assert_eq!(lines.len(), 3);
    for (line, y) in lines.iter().zip([2.0, 6.0, 10.0]) {
        assert_relative_eq!(line.p1.y, y, epsilon = 1e-9);
        assert_relative_eq!(line.p2.y, y, epsilon = 1e-9);
    }
}
