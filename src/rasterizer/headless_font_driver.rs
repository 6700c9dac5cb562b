//! Headless font driver: every glyph resolves, none has coverage.

use crate::rasterizer::font_driver::{AlphaBitmap, FontDriver};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
pub struct HeadlessFontDriver;

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self
    }
}

impl FontDriver for HeadlessFontDriver {
    type Font = ();
    type GlyphId = u32;

    fn load_font(&self, _name: &str, _size_px: f64) -> Result<Self::Font> {
        Ok(())
    }

    fn find_glyph(&self, _font: &Self::Font, ch: char) -> Option<Self::GlyphId> {
        Some(ch as u32)
    }

    fn find_fallback_font(&self, _ch: char) -> Result<Self::Font> {
        Ok(())
    }

    fn rasterize_glyph(&self, _font: &Self::Font, _glyph_id: Self::GlyphId) -> AlphaBitmap {
        // Zero-sized render: the glyph cache stores it as blank.
        AlphaBitmap::default()
    }
}
