// src/coords.rs

//! Grid cell ⇄ device pixel mapping.
//!
//! Cell origins sit half a spacing gap to the left of (and above) the glyph box, so a
//! grid coordinate addresses the middle of the gutter between two glyphs. All pixel
//! values are device pixels, i.e. already multiplied by `pixel_scale`.

use crate::config::DisplayConfig;
use crate::geometry::{Point, Rect};

/// Pure mapping between grid coordinates and device pixels for one `DisplayConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    display: DisplayConfig,
}

impl CoordinateMapper {
    /// Builds a mapper from a configuration; the configuration is sanitized first.
    pub fn from_config(display: &DisplayConfig) -> Self {
        Self {
            display: display.sanitized(),
        }
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn scale(&self) -> f64 {
        self.display.pixel_scale as f64
    }

    /// Horizontal distance between two cell origins.
    pub fn pitch_x(&self) -> f64 {
        (self.display.cell_width + self.display.spacing_x) as f64 * self.scale()
    }

    /// Vertical distance between two row origins.
    pub fn pitch_y(&self) -> f64 {
        (self.display.cell_height + self.display.spacing_y) as f64 * self.scale()
    }

    fn padding_px(&self) -> f64 {
        self.display.padding as f64 * self.scale()
    }

    fn half_gap_x(&self) -> f64 {
        0.5 * self.display.spacing_x as f64 * self.scale()
    }

    fn half_gap_y(&self) -> f64 {
        0.5 * self.display.spacing_y as f64 * self.scale()
    }

    pub fn grid_to_px(&self, gx: f64, gy: f64) -> Point {
        self.grid_to_px_offset(gx, gy, 0.0, 0.0)
    }

    /// Grid position plus an offset given in design pixels (scaled by `pixel_scale`).
    pub fn grid_to_px_offset(&self, gx: f64, gy: f64, ox: f64, oy: f64) -> Point {
        Point::new(
            self.gx(gx) + ox * self.scale(),
            self.gy(gy) + oy * self.scale(),
        )
    }

    /// Exact inverse of [`grid_to_px`](Self::grid_to_px).
    pub fn px_to_grid(&self, px: f64, py: f64) -> Point {
        Point::new(self.px(px), self.py(py))
    }

    /// Grid column to absolute pixel x.
    pub fn gx(&self, grid_x: f64) -> f64 {
        self.padding_px() + grid_x * self.pitch_x() - self.half_gap_x()
    }

    /// Grid row to absolute pixel y.
    pub fn gy(&self, grid_y: f64) -> f64 {
        self.padding_px() + grid_y * self.pitch_y() - self.half_gap_y()
    }

    /// Pixel x to fractional grid column.
    pub fn px(&self, pixel_x: f64) -> f64 {
        (pixel_x - self.padding_px() + self.half_gap_x()) / self.pitch_x()
    }

    /// Pixel y to fractional grid row.
    pub fn py(&self, pixel_y: f64) -> f64 {
        (pixel_y - self.padding_px() + self.half_gap_y()) / self.pitch_y()
    }

    /// Pixel rectangle covering `gw × gh` cells, grown by `pad` design pixels per side.
    pub fn grid_rect_to_px(&self, gx: f64, gy: f64, gw: f64, gh: f64, pad: f64) -> Rect {
        let p1 = self.grid_to_px_offset(gx, gy, -pad, -pad);
        let p2 = self.grid_to_px_offset(gx + gw, gy + gh, pad, pad);
        Rect::new(p1.x, p1.y, p2.x - p1.x, p2.y - p1.y)
    }

    /// Top-left device pixel of the glyph box for a cell. Used by the compositor.
    pub fn cell_origin_px(&self, col: usize, row: usize) -> (i64, i64) {
        let x = self.padding_px() + col as f64 * self.pitch_x();
        let y = self.padding_px() + row as f64 * self.pitch_y();
        (x as i64, y as i64)
    }

    /// Full framebuffer size for the configured grid.
    pub fn window_size_px(&self) -> (usize, usize) {
        let pad = self.padding_px() * 2.0;
        let w = pad + self.display.cols as f64 * self.pitch_x();
        let h = pad + self.display.rows as f64 * self.pitch_y();
        (w as usize, h as usize)
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}
