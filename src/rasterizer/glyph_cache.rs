//! Cell-fitted monochrome glyph bitmaps.
//!
//! A driver render is fitted into a `cell_h × span_w` box (span is one or two cells):
//! scaled down by nearest-neighbour sampling when it is too large, never scaled up,
//! then centered. Coverage is `alpha > 0`.

use super::font_driver::{AlphaBitmap, FontDriver};
use super::font_manager::FontManager;
use log::{debug, trace};
use std::collections::HashMap;
use std::rc::Rc;

/// A 1-bit coverage bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageBitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl CoverageBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, lit: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = lit;
        }
    }

    /// `(x, y)` of every lit pixel, row-major.
    pub fn lit_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &lit)| lit)
            .map(move |(i, _)| (i % w, i / w))
    }

    pub fn lit_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

/// Fits a natural-size render into a `span_w × cell_h` box. `None` for an empty render.
pub fn fit_to_cell(src: &AlphaBitmap, span_w: usize, cell_h: usize) -> Option<CoverageBitmap> {
    if src.is_empty() {
        return None;
    }
    let (w, h) = (src.width, src.height);
    let scale = (span_w as f64 / w as f64)
        .min(cell_h as f64 / h as f64)
        .min(1.0);

    let (new_w, new_h) = if scale < 1.0 {
        (
            ((w as f64 * scale).round() as usize).max(1),
            ((h as f64 * scale).round() as usize).max(1),
        )
    } else {
        (w, h)
    };
    let x_step = w as f64 / new_w as f64;
    let y_step = h as f64 / new_h as f64;

    let y0 = cell_h.saturating_sub(new_h) / 2;
    let x0 = span_w.saturating_sub(new_w) / 2;

    let mut out = CoverageBitmap::new(span_w, cell_h);
    for dy in 0..new_h {
        let sy = ((dy as f64 * y_step) as usize).min(h - 1);
        for dx in 0..new_w {
            let sx = ((dx as f64 * x_step) as usize).min(w - 1);
            if src.at(sx, sy) > 0 {
                out.set(x0 + dx, y0 + dy, true);
            }
        }
    }
    Some(out)
}

/// A key for caching fitted glyphs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GlyphKey {
    ch: char,
    wide: bool,
    cell_h: usize,
    cell_w: usize,
    font: String,
}

/// Fitted-bitmap cache keyed by character, width class, cell geometry and font identity.
///
/// Entries for an old geometry or font are never hit again once the key changes;
/// `clear` drops them.
#[derive(Debug, Default)]
pub struct GlyphRasterCache {
    entries: HashMap<GlyphKey, Option<Rc<CoverageBitmap>>>,
    hits: u64,
    misses: u64,
}

impl GlyphRasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bitmap for `ch`, sized `cell_h × cell_w` (or `2·cell_w` when `wide`).
    /// Glyphs with no coverage yield `None` and are cached as such.
    pub fn get<D: FontDriver>(
        &mut self,
        ch: char,
        wide: bool,
        cell_h: usize,
        cell_w: usize,
        fonts: &mut FontManager<D>,
    ) -> Option<Rc<CoverageBitmap>> {
        let key = GlyphKey {
            ch,
            wide,
            cell_h,
            cell_w,
            font: fonts.font_identity(wide).to_string(),
        };
        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            return entry.clone();
        }
        self.misses += 1;

        let span_w = if wide { cell_w * 2 } else { cell_w };
        let bitmap = fonts
            .rasterize(ch, wide)
            .and_then(|render| fit_to_cell(&render, span_w, cell_h))
            .map(Rc::new);
        trace!(
            "GlyphRasterCache: miss for '{}' wide={} {}x{} -> {}",
            ch,
            wide,
            span_w,
            cell_h,
            if bitmap.is_some() { "bitmap" } else { "blank" }
        );
        self.entries.insert(key, bitmap.clone());
        bitmap
    }

    pub fn clear(&mut self) {
        debug!("GlyphRasterCache: clearing {} entries", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
