//! Glyph rasterization for the character grid.
//!
//! ```text
//! char + width class  →  [FontManager / FontDriver]  →  AlphaBitmap (natural size)
//!                     →  [GlyphRasterCache]          →  CoverageBitmap (cell fitted)
//! ```
//!
//! The driver is the only part that touches real fonts. Everything above it is
//! backend-agnostic and cached.

pub mod font_driver;
pub mod font_manager;
pub mod glyph_cache;
pub mod headless_font_driver;

pub use font_driver::{AlphaBitmap, FontDriver};
pub use font_manager::{FontManager, ResolvedGlyph};
pub use glyph_cache::{fit_to_cell, CoverageBitmap, GlyphRasterCache};
pub use headless_font_driver::HeadlessFontDriver;
