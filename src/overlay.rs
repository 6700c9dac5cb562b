// src/overlay.rs

//! Per-frame vector overlay commands.
//!
//! Draw calls append to three ordered lists. The compositor drains them once per frame
//! in a fixed category order (filled polygons, then lines, then super text); within a
//! category, call order is paint order.

use crate::color::ColorIndex;
use crate::geometry::Point;
use crate::rasterizer::glyph_cache::CoverageBitmap;
use log::trace;
use std::rc::Rc;

/// A stroked line in device pixels. `thickness` is in design units and is multiplied
/// by the pixel scale at composite time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOverlay {
    pub p1: Point,
    pub p2: Point,
    pub color: ColorIndex,
    pub thickness: f64,
}

/// A filled polygon in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonOverlay {
    pub vertices: Vec<Point>,
    pub color: ColorIndex,
}

/// One glyph of super-scaled text. Every lit bitmap pixel becomes a square of
/// `round(scale · pixel_scale)` device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperTextOverlay {
    pub x: i64,
    pub y: i64,
    pub bitmap: Rc<CoverageBitmap>,
    pub color: ColorIndex,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    Line(LineOverlay),
    FilledPolygon(PolygonOverlay),
    SuperText(SuperTextOverlay),
}

/// The drained contents of an `OverlayQueue`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    pub filled_polygons: Vec<PolygonOverlay>,
    pub lines: Vec<LineOverlay>,
    pub super_text: Vec<SuperTextOverlay>,
}

impl OverlayFrame {
    pub fn is_empty(&self) -> bool {
        self.filled_polygons.is_empty() && self.lines.is_empty() && self.super_text.is_empty()
    }

    /// Total number of commands across all categories.
    pub fn len(&self) -> usize {
        self.filled_polygons.len() + self.lines.len() + self.super_text.len()
    }
}

#[derive(Debug, Default)]
pub struct OverlayQueue {
    frame: OverlayFrame,
}

impl OverlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: OverlayCommand) {
        trace!("OverlayQueue: push {:?}", command);
        match command {
            OverlayCommand::Line(line) => self.frame.lines.push(line),
            OverlayCommand::FilledPolygon(poly) => self.frame.filled_polygons.push(poly),
            OverlayCommand::SuperText(text) => self.frame.super_text.push(text),
        }
    }

    pub fn push_line(&mut self, p1: Point, p2: Point, color: ColorIndex, thickness: f64) {
        self.push(OverlayCommand::Line(LineOverlay {
            p1,
            p2,
            color,
            thickness,
        }));
    }

    /// Pushes the closed outline of `vertices` as lines.
    pub fn push_outline(&mut self, vertices: &[Point], color: ColorIndex, thickness: f64) {
        let n = vertices.len();
        for i in 0..n {
            self.push_line(vertices[i], vertices[(i + 1) % n], color, thickness);
        }
    }

    pub fn push_filled(&mut self, vertices: Vec<Point>, color: ColorIndex) {
        self.push(OverlayCommand::FilledPolygon(PolygonOverlay { vertices, color }));
    }

    /// Discards everything queued this frame.
    pub fn clear(&mut self) {
        self.frame = OverlayFrame::default();
    }

    /// Hands the queued commands over and leaves the queue empty.
    pub fn take(&mut self) -> OverlayFrame {
        std::mem::take(&mut self.frame)
    }

    pub fn pending(&self) -> &OverlayFrame {
        &self.frame
    }
}
