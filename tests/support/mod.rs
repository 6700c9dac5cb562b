//! Shared fixtures for the integration tests.
//!
//! `BlockFontDriver` stands in for a real font backend: every visible character renders
//! as a solid block that exactly fills its cell, so composited frames can be checked
//! pixel by pixel without font files.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use phosphor::config::{Config, DisplayConfig};
use phosphor::rasterizer::{AlphaBitmap, FontDriver};
use phosphor::{Engine, Framebuffer, Rgba, API_LEVEL};

pub const NARROW_FONT: &str = "block";
pub const WIDE_FONT: &str = "block-wide";

#[derive(Debug, Clone)]
pub struct BlockFontDriver {
    pub cell_w: usize,
    pub cell_h: usize,
}

impl FontDriver for BlockFontDriver {
    type Font = String;
    type GlyphId = char;

    fn load_font(&self, name: &str, _size_px: f64) -> Result<Self::Font> {
        match name {
            NARROW_FONT | WIDE_FONT => Ok(name.to_string()),
            other => Err(anyhow!("BlockFontDriver: unknown font '{}'", other)),
        }
    }

    fn find_glyph(&self, _font: &Self::Font, ch: char) -> Option<Self::GlyphId> {
        Some(ch)
    }

    fn find_fallback_font(&self, ch: char) -> Result<Self::Font> {
        Err(anyhow!("BlockFontDriver: no fallback for '{}'", ch))
    }

    fn rasterize_glyph(&self, font: &Self::Font, glyph_id: Self::GlyphId) -> AlphaBitmap {
        if glyph_id.is_whitespace() {
            return AlphaBitmap::default();
        }
        let w = if font == WIDE_FONT {
            self.cell_w * 2
        } else {
            self.cell_w
        };
        AlphaBitmap::new(w, self.cell_h, vec![255; w * self.cell_h])
    }
}

/// `cols × rows` grid of 4×8 cells without spacing, padding or scaling.
pub fn plain_display(cols: u32, rows: u32) -> DisplayConfig {
    DisplayConfig {
        rows,
        cols,
        cell_width: 4,
        cell_height: 8,
        spacing_x: 0,
        spacing_y: 0,
        padding: 0,
        pixel_scale: 1,
    }
}

pub fn block_config(display: DisplayConfig) -> Config {
    let mut config = Config {
        display,
        ..Config::default()
    };
    config.appearance.font.narrow = NARROW_FONT.to_string();
    config.appearance.font.wide = Some(WIDE_FONT.to_string());
    config
}

/// An engine over `display` rendering with `BlockFontDriver`.
pub fn block_engine(display: DisplayConfig) -> Engine<BlockFontDriver> {
    let driver = BlockFontDriver {
        cell_w: display.cell_width as usize,
        cell_h: display.cell_height as usize,
    };
    Engine::with_driver(driver, block_config(display), API_LEVEL)
        .expect("block engine should build")
}

/// Device pixels of `frame` that match `color`, row-major.
pub fn pixels_of(frame: &Framebuffer, color: Rgba) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            if frame.pixel(x, y) == Some(color) {
                out.push((x, y));
            }
        }
    }
    out
}

/// Bounding box `(x0, y0, x1, y1)` (inclusive) of the pixels matching `color`.
pub fn bounds_of(frame: &Framebuffer, color: Rgba) -> Option<(usize, usize, usize, usize)> {
    let pixels = pixels_of(frame, color);
    let first = pixels.first()?;
    Some(pixels.iter().fold(
        (first.0, first.1, first.0, first.1),
        |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
    ))
}
