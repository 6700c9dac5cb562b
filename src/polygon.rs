// src/polygon.rs

//! Named polygon library and origin-anchored transforms.
//!
//! Shapes are stored in design pixels together with the font height they were authored
//! against. They are only converted to device pixels at draw time, so a shape keeps its
//! proportion to the text whenever the cell height changes.

use crate::geometry::Point;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyShape {
    pub vertices: Vec<Point>,
    pub base_font_height: f64,
}

/// Either a registered shape name or a temporary vertex list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeRef<'a> {
    Named(&'a str),
    Inline(&'a [Point]),
}

impl<'a> From<&'a str> for ShapeRef<'a> {
    fn from(name: &'a str) -> Self {
        ShapeRef::Named(name)
    }
}

impl<'a> From<&'a [Point]> for ShapeRef<'a> {
    fn from(vertices: &'a [Point]) -> Self {
        ShapeRef::Inline(vertices)
    }
}

/// Vertices plus the font height they scale against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedShape<'a> {
    pub vertices: &'a [Point],
    pub base_font_height: f64,
}

/// Anisotropic scale followed by rotation, both around `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle_deg: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            scale_x: 1.0,
            scale_y: 1.0,
            angle_deg: 0.0,
        }
    }
}

impl Transform {
    pub fn scale(scale_x: f64, scale_y: f64) -> Self {
        Transform {
            scale_x,
            scale_y,
            ..Transform::default()
        }
    }

    pub fn uniform(scale: f64) -> Self {
        Self::scale(scale, scale)
    }

    pub fn rotation(angle_deg: f64) -> Self {
        Transform {
            angle_deg,
            ..Transform::default()
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        let (sin_t, cos_t) = self.angle_deg.to_radians().sin_cos();
        let xs = p.x * self.scale_x;
        let ys = p.y * self.scale_y;
        Point::new(xs * cos_t - ys * sin_t, xs * sin_t + ys * cos_t)
    }
}

pub fn transform_vertices(vertices: &[Point], transform: &Transform) -> Vec<Point> {
    vertices.iter().map(|&p| transform.apply(p)).collect()
}

/// Zero, negative and non-finite base heights fall back to 1.
fn sane_base(base_font_height: f64) -> f64 {
    if base_font_height.is_finite() && base_font_height > 0.0 {
        base_font_height
    } else {
        1.0
    }
}

/// Scales design-pixel vertices by `cur_h / base_h · pixel_scale` and translates them
/// to `origin` (device pixels).
pub fn scale_to_device(
    vertices: &[Point],
    base_font_height: f64,
    cell_height: f64,
    pixel_scale: f64,
    origin: Point,
) -> Vec<Point> {
    let factor = design_scale(base_font_height, cell_height) * pixel_scale;
    vertices
        .iter()
        .map(|p| Point::new(origin.x + p.x * factor, origin.y + p.y * factor))
        .collect()
}

/// Ratio of the current cell height to a shape's base font height.
pub fn design_scale(base_font_height: f64, cell_height: f64) -> f64 {
    cell_height.max(1.0) / sane_base(base_font_height)
}

#[derive(Debug, Clone, Default)]
pub struct PolygonRegistry {
    shapes: HashMap<String, PolyShape>,
}

impl PolygonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores (or replaces) a named shape.
    pub fn register(&mut self, name: &str, vertices: &[Point], base_font_height: f64) {
        trace!(
            "PolygonRegistry: register '{}' ({} vertices, base {})",
            name,
            vertices.len(),
            base_font_height
        );
        self.shapes.insert(
            name.to_string(),
            PolyShape {
                vertices: vertices.to_vec(),
                base_font_height: sane_base(base_font_height),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&PolyShape> {
        self.shapes.get(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.shapes.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Looks up a shape reference. Inline vertices take `inline_base` as their base
    /// height. Unknown names resolve to `None`.
    pub fn resolve<'a>(&'a self, shape: ShapeRef<'a>, inline_base: f64) -> Option<ResolvedShape<'a>> {
        match shape {
            ShapeRef::Named(name) => self.shapes.get(name).map(|s| ResolvedShape {
                vertices: &s.vertices,
                base_font_height: s.base_font_height,
            }),
            ShapeRef::Inline(vertices) => Some(ResolvedShape {
                vertices,
                base_font_height: sane_base(inline_base),
            }),
        }
    }

    pub fn transform(&self, shape: ShapeRef<'_>, transform: &Transform) -> Option<Vec<Point>> {
        self.resolve(shape, 1.0)
            .map(|resolved| transform_vertices(resolved.vertices, transform))
    }

    pub fn rescale(&self, shape: ShapeRef<'_>, scale_x: f64, scale_y: f64) -> Option<Vec<Point>> {
        self.transform(shape, &Transform::scale(scale_x, scale_y))
    }

    pub fn rotate(&self, shape: ShapeRef<'_>, angle_deg: f64) -> Option<Vec<Point>> {
        self.transform(shape, &Transform::rotation(angle_deg))
    }

    /// Registers a transformed copy of `source` under `name`.
    ///
    /// The base height defaults to the source's (or `inline_base` for inline vertices).
    /// Returns `false` when `source` names an unknown shape.
    pub fn register_transformed(
        &mut self,
        name: &str,
        source: ShapeRef<'_>,
        transform: &Transform,
        base_font_height: Option<f64>,
        inline_base: f64,
    ) -> bool {
        let Some(resolved) = self.resolve(source, inline_base) else {
            debug!("PolygonRegistry: unknown source shape for '{}'", name);
            return false;
        };
        let vertices = transform_vertices(resolved.vertices, transform);
        let base = base_font_height.unwrap_or(resolved.base_font_height);
        self.register(name, &vertices, base);
        true
    }
}
