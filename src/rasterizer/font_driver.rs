//! Font loading and glyph rasterization primitives.
//!
//! This module defines the `FontDriver` trait, the seam to whatever text-shaping or
//! rasterization service actually owns font files. The engine never parses fonts
//! itself; it only asks a driver for coverage.

use anyhow::Result;

/// An 8-bit alpha render of one glyph at the font's natural size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlphaBitmap {
    pub width: usize,
    pub height: usize,
    /// Row-major coverage, `width * height` bytes.
    pub alpha: Vec<u8>,
}

impl AlphaBitmap {
    pub fn new(width: usize, height: usize, alpha: Vec<u8>) -> Self {
        debug_assert_eq!(alpha.len(), width * height);
        Self {
            width,
            height,
            alpha,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.alpha.get(y * self.width + x).copied().unwrap_or(0)
    }
}

/// Font driver trait.
///
/// Implementors provide thin wrappers around a font backend, handling:
/// - Font loading by name and size
/// - Glyph lookup for characters
/// - Fallback font queries
/// - Glyph rasterization to an alpha bitmap
///
/// The `FontManager` uses this trait to implement shared caching and fallback logic.
pub trait FontDriver {
    /// Backend font handle type.
    type Font: Clone;

    /// Backend glyph ID type.
    type GlyphId: Copy;

    /// Load a font by name and pixel size.
    ///
    /// # Returns
    /// Backend font handle, or error if the font cannot be loaded
    fn load_font(&self, name: &str, size_px: f64) -> Result<Self::Font>;

    /// Find a glyph for the given character in the specified font.
    ///
    /// # Returns
    /// Some(glyph_id) if the font contains this character, None otherwise
    fn find_glyph(&self, font: &Self::Font, ch: char) -> Option<Self::GlyphId>;

    /// Query the backend for a fallback font that contains the given character.
    fn find_fallback_font(&self, ch: char) -> Result<Self::Font>;

    /// Rasterize a glyph at the font's natural size.
    ///
    /// The result is not fitted to any cell; `GlyphRasterCache` scales and centers it.
    /// A zero-sized bitmap means the glyph has no visible coverage.
    fn rasterize_glyph(&self, font: &Self::Font, glyph_id: Self::GlyphId) -> AlphaBitmap;
}
