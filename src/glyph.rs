// src/glyph.rs

//! Defines the `Cell` type stored in the screen buffer and the wide-glyph
//! classification helpers.
//!
//! A double-width glyph occupies its own cell plus a continuation cell holding
//! [`WIDE_CONTINUATION`]. The continuation cell is never drawn.

use crate::color::ColorIndex;
use unicode_width::UnicodeWidthChar;

/// Placeholder stored in the right half of a wide glyph.
pub const WIDE_CONTINUATION: char = '\u{FFF9}';

/// A single character cell on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The character displayed in the cell.
    pub c: char,
    /// Palette index the glyph is painted with.
    pub color: ColorIndex,
}

/// Default cell: a space in palette slot 0.
pub const DEFAULT_CELL: Cell = Cell {
    c: ' ',
    color: ColorIndex(0),
};

impl Default for Cell {
    fn default() -> Self {
        DEFAULT_CELL
    }
}

impl Cell {
    pub const fn new(c: char, color: ColorIndex) -> Self {
        Self { c, color }
    }

    pub fn is_continuation(&self) -> bool {
        self.c == WIDE_CONTINUATION
    }

    pub fn is_wide(&self) -> bool {
        is_wide_char(self.c)
    }
}

/// True for East Asian Wide and Fullwidth characters.
pub fn is_wide_char(c: char) -> bool {
    c != WIDE_CONTINUATION && UnicodeWidthChar::width(c) == Some(2)
}

/// Width in grid cells a character advances by (1 or 2).
pub fn char_cells(c: char) -> usize {
    if is_wide_char(c) {
        2
    } else {
        1
    }
}

/// First character of `s`, or a space for an empty string.
pub fn normalize_cell_char(s: &str) -> char {
    s.chars().next().unwrap_or(' ')
}
