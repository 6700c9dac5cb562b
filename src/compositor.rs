// src/compositor.rs

//! Final image assembly.
//!
//! The compositor turns one frame of engine state into RGBA pixels, painting in a fixed
//! order: background, filled polygons, glyph cells, stroked lines, super text. Later
//! layers overwrite earlier ones; there is no blending. The finished `Framebuffer` is
//! handed to a `PixelSink`, which owns presentation (window blit, file dump, test
//! capture).

mod raster;

pub use raster::{draw_line, draw_thick_line, fill_polygon, stroke_polygon};

use crate::color::{Palette, Rgba};
use crate::coords::CoordinateMapper;
use crate::overlay::OverlayFrame;
use crate::screen::{CoverageBuffer, ScreenBuffer};
use anyhow::Result;
use log::{debug, trace};

/// Tightly packed RGBA8 pixels, row-major, no stride padding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocates when the size changed; contents are undefined afterwards.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            debug!("Framebuffer: resize {}x{} -> {}x{}", self.width, self.height, width, height);
            *self = Framebuffer::new(width, height);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Rgba::new(p[0], p[1], p[2], p[3]))
    }

    pub fn fill(&mut self, color: Rgba) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Fills a rectangle, clipped to the framebuffer. Empty or fully outside rectangles
    /// are ignored.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i64);
        let y1 = y.saturating_add(h).min(self.height as i64);
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let bytes = color.to_bytes();
        let (x0, x1) = (x0 as usize, x1 as usize);
        for row in y0 as usize..y1 as usize {
            let start = (row * self.width + x0) * 4;
            let end = (row * self.width + x1) * 4;
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&bytes);
            }
        }
    }
}

/// Receives finished frames.
pub trait PixelSink {
    fn present(&mut self, frame: &Framebuffer) -> Result<()>;
}

/// A sink that keeps a copy of the last presented frame.
#[derive(Debug, Default)]
pub struct FrameCapture {
    pub presented: usize,
    pub last: Option<Framebuffer>,
}

impl FrameCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PixelSink for FrameCapture {
    fn present(&mut self, frame: &Framebuffer) -> Result<()> {
        self.presented += 1;
        match &mut self.last {
            Some(last) => last.clone_from(frame),
            None => self.last = Some(frame.clone()),
        }
        Ok(())
    }
}

/// Everything one composite pass reads.
pub struct CompositeInputs<'a> {
    pub mapper: &'a CoordinateMapper,
    pub palette: &'a Palette,
    /// Clear color when layout mode is off.
    pub background: Rgba,
    pub screen: &'a ScreenBuffer,
    /// Glyph coverage already stamped for `screen`.
    pub coverage: &'a CoverageBuffer,
    pub overlays: &'a OverlayFrame,
}

#[derive(Debug, Default)]
pub struct Compositor {
    framebuffer: Framebuffer,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Paints one frame and returns the result.
    pub fn compose(&mut self, inputs: &CompositeInputs<'_>) -> &Framebuffer {
        let (width, height) = inputs.mapper.window_size_px();
        self.framebuffer.resize(width, height);
        let fb = &mut self.framebuffer;
        let palette = inputs.palette;
        let scale = inputs.mapper.display().pixel_scale.max(1) as i64;

        let layout = palette.layout_mode();
        fb.fill(if layout.enabled {
            layout.background
        } else {
            inputs.background
        });

        for poly in &inputs.overlays.filled_polygons {
            let color = palette.resolve(poly.color);
            fill_polygon(fb, &poly.vertices, color);
            stroke_polygon(fb, &poly.vertices, color);
        }

        let mut glyph_cells = 0usize;
        for cell in inputs.screen.render_cells() {
            let color = palette.resolve(cell.color);
            let (ox, oy) = inputs.mapper.cell_origin_px(cell.col, cell.row);
            for (px, py) in inputs.coverage.lit_in_block(cell.col, cell.row, cell.span()) {
                fb.fill_rect(ox + px as i64 * scale, oy + py as i64 * scale, scale, scale, color);
            }
            glyph_cells += 1;
        }

        for line in &inputs.overlays.lines {
            let thickness = ((line.thickness * scale as f64).round() as i64).max(1);
            draw_thick_line(fb, line.p1, line.p2, thickness, palette.resolve(line.color));
        }

        for text in &inputs.overlays.super_text {
            let block = ((text.scale * scale as f64).round() as i64).max(1);
            let color = palette.resolve(text.color);
            for (px, py) in text.bitmap.lit_pixels() {
                fb.fill_rect(
                    text.x + px as i64 * block,
                    text.y + py as i64 * block,
                    block,
                    block,
                    color,
                );
            }
        }

        trace!(
            "Compositor: {}x{} frame, {} polygons, {} glyph cells, {} lines, {} super glyphs",
            width,
            height,
            inputs.overlays.filled_polygons.len(),
            glyph_cells,
            inputs.overlays.lines.len(),
            inputs.overlays.super_text.len()
        );
        &self.framebuffer
    }
}

#[cfg(test)]
mod tests;
