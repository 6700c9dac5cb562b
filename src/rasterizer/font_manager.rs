//! Shared font management and fallback logic.
//!
//! The `FontManager` resolves characters to fonts using a `FontDriver` for primitives.
//! Narrow and wide glyphs have separate primary fonts; the wide font defaults to the
//! narrow one when none is configured.

use super::font_driver::{AlphaBitmap, FontDriver};
use anyhow::{Context, Result};
use log::*;
use std::collections::HashMap;

/// Font IDs for primary fonts
const NARROW_FONT_ID: usize = 0;
const WIDE_FONT_ID: usize = 1;
const FALLBACK_FONT_ID_START: usize = 2;

/// A resolved glyph with its font ID and backend glyph ID
#[derive(Debug, Clone, Copy)]
pub struct ResolvedGlyph<G> {
    /// Index into primary_fonts or fallback_fonts
    pub font_id: usize,
    /// Backend glyph ID
    pub glyph_id: G,
}

/// Font manager with shared caching and fallback logic.
///
/// Implements:
/// - Font fallback (primary → cached fallbacks → driver query)
/// - Glyph-id caching (HashMap of char+width class → font_id+glyph_id)
/// - Font identity strings used to key rendered bitmaps
#[derive(Debug)]
pub struct FontManager<D: FontDriver> {
    driver: D,

    /// Primary fonts: [narrow, wide]
    primary_fonts: [D::Font; 2],

    /// `name@size` for each primary font.
    identities: [String; 2],

    size_px: f64,

    /// Fallback fonts discovered through the driver
    fallback_fonts: Vec<D::Font>,

    /// Glyph cache: (char, wide) → (font_id, glyph_id)
    glyph_cache: HashMap<(char, bool), (usize, D::GlyphId)>,
}

impl<D: FontDriver> FontManager<D> {
    /// Create a new font manager.
    ///
    /// # Arguments
    /// * `driver` - Font driver
    /// * `narrow_name` - Font for narrow glyphs
    /// * `wide_name` - Font for double-width glyphs; `None` reuses the narrow font
    /// * `size_px` - Font size in pixels
    pub fn new(driver: D, narrow_name: &str, wide_name: Option<&str>, size_px: f64) -> Result<Self> {
        let (primary_fonts, identities) =
            Self::load_primaries(&driver, narrow_name, wide_name, size_px)?;
        Ok(Self {
            driver,
            primary_fonts,
            identities,
            size_px,
            fallback_fonts: Vec::new(),
            glyph_cache: HashMap::new(),
        })
    }

    /// Replaces the primary fonts (e.g. after the cell height changed) and forgets every
    /// cached fallback font and glyph id. On error the previous fonts stay active.
    pub fn reload(&mut self, narrow_name: &str, wide_name: Option<&str>, size_px: f64) -> Result<()> {
        let (primary_fonts, identities) =
            Self::load_primaries(&self.driver, narrow_name, wide_name, size_px)?;
        self.primary_fonts = primary_fonts;
        self.identities = identities;
        self.size_px = size_px;
        self.fallback_fonts.clear();
        self.glyph_cache.clear();
        Ok(())
    }

    fn load_primaries(
        driver: &D,
        narrow_name: &str,
        wide_name: Option<&str>,
        size_px: f64,
    ) -> Result<([D::Font; 2], [String; 2])> {
        info!("FontManager: Loading primary fonts at {} px", size_px);

        let narrow = driver
            .load_font(narrow_name, size_px)
            .with_context(|| format!("Failed to load narrow font '{}'", narrow_name))?;

        let (wide, wide_identity_name) = match wide_name {
            Some(name) => (
                driver
                    .load_font(name, size_px)
                    .with_context(|| format!("Failed to load wide font '{}'", name))?,
                name,
            ),
            None => (narrow.clone(), narrow_name),
        };

        info!("FontManager: Primary fonts loaded successfully");

        Ok((
            [narrow, wide],
            [
                format!("{}@{}", narrow_name, size_px),
                format!("{}@{}", wide_identity_name, size_px),
            ],
        ))
    }

    pub fn size_px(&self) -> f64 {
        self.size_px
    }

    /// Get a glyph for the given character and width class.
    ///
    /// 1. Check glyph cache
    /// 2. Try the primary font for the width class
    /// 3. Try cached fallback fonts
    /// 4. Query the driver for a new fallback font
    pub fn get_glyph(&mut self, ch: char, wide: bool) -> Option<ResolvedGlyph<D::GlyphId>> {
        if let Some(&(font_id, glyph_id)) = self.glyph_cache.get(&(ch, wide)) {
            trace!("FontManager: Cache hit for '{}' (U+{:X})", ch, ch as u32);
            return Some(ResolvedGlyph { font_id, glyph_id });
        }

        let primary_idx = Self::primary_font_index(wide);
        if let Some(glyph_id) = self.driver.find_glyph(&self.primary_fonts[primary_idx], ch) {
            debug!(
                "FontManager: Found '{}' (U+{:X}) in primary font {}",
                ch, ch as u32, primary_idx
            );
            self.glyph_cache.insert((ch, wide), (primary_idx, glyph_id));
            return Some(ResolvedGlyph {
                font_id: primary_idx,
                glyph_id,
            });
        }

        for (idx, font) in self.fallback_fonts.iter().enumerate() {
            if let Some(glyph_id) = self.driver.find_glyph(font, ch) {
                let font_id = FALLBACK_FONT_ID_START + idx;
                debug!(
                    "FontManager: Found '{}' (U+{:X}) in cached fallback font {}",
                    ch, ch as u32, font_id
                );
                self.glyph_cache.insert((ch, wide), (font_id, glyph_id));
                return Some(ResolvedGlyph { font_id, glyph_id });
            }
        }

        trace!(
            "FontManager: Querying driver for fallback font for '{}' (U+{:X})",
            ch,
            ch as u32
        );

        if let Ok(fallback_font) = self.driver.find_fallback_font(ch) {
            if let Some(glyph_id) = self.driver.find_glyph(&fallback_font, ch) {
                let font_id = FALLBACK_FONT_ID_START + self.fallback_fonts.len();
                info!(
                    "FontManager: Found '{}' (U+{:X}) in new fallback font {} (caching)",
                    ch, ch as u32, font_id
                );
                self.fallback_fonts.push(fallback_font);
                self.glyph_cache.insert((ch, wide), (font_id, glyph_id));
                return Some(ResolvedGlyph { font_id, glyph_id });
            }
        }

        warn!(
            "FontManager: Could not find glyph for '{}' (U+{:X}) in any font",
            ch, ch as u32
        );
        None
    }

    /// Resolves and renders a glyph at natural size. `None` when no font covers it.
    pub fn rasterize(&mut self, ch: char, wide: bool) -> Option<AlphaBitmap> {
        let resolved = self.get_glyph(ch, wide)?;
        let font = self.get_font(resolved.font_id);
        Some(self.driver.rasterize_glyph(font, resolved.glyph_id))
    }

    /// Get the font at the given font_id. Panics on an id this manager never issued.
    pub fn get_font(&self, font_id: usize) -> &D::Font {
        if font_id < FALLBACK_FONT_ID_START {
            &self.primary_fonts[font_id]
        } else {
            &self.fallback_fonts[font_id - FALLBACK_FONT_ID_START]
        }
    }

    /// Identity of the primary font used for a width class, `name@size`.
    pub fn font_identity(&self, wide: bool) -> &str {
        &self.identities[Self::primary_font_index(wide)]
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn primary_font_index(wide: bool) -> usize {
        if wide {
            WIDE_FONT_ID
        } else {
            NARROW_FONT_ID
        }
    }
}
