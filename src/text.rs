// src/text.rs

//! Text measurement, truncation and alignment in grid cells.
//!
//! Widths count cells, not characters: wide glyphs take two. The continuation marker is
//! treated as a space wherever it appears in input text.

use crate::glyph::{char_cells, is_wide_char, WIDE_CONTINUATION};
use serde::{Deserialize, Serialize};

/// Run direction of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Placement of content inside a larger span, on either axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Left or top.
    #[default]
    Start,
    Center,
    /// Right or bottom.
    End,
}

impl Align {
    /// Accepts `left/top/center/middle/right/bottom`, case-insensitively.
    /// Anything else is `Start`.
    pub fn parse(s: &str) -> Align {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "middle" => Align::Center,
            "right" | "bottom" | "end" => Align::End,
            _ => Align::Start,
        }
    }
}

fn clean(c: char) -> char {
    if c == WIDE_CONTINUATION {
        ' '
    } else {
        c
    }
}

/// Splits on `\n`. Empty text has no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').collect()
}

pub fn measure_line_cells(line: &str) -> usize {
    line.chars().map(|c| char_cells(clean(c))).sum()
}

/// Width and height in cells of a (possibly multi-line) text block.
///
/// Horizontal: widest line by `1 + (lines-1)·step` rows.
/// Vertical: every line is a column (two cells wide if it holds a wide glyph); height is
/// the tallest column.
pub fn measure_text_cells(text: &str, orientation: Orientation, line_step: usize) -> (usize, usize) {
    let step = line_step.max(1);
    let lines = split_lines(text);
    if lines.is_empty() {
        return (0, 0);
    }
    match orientation {
        Orientation::Vertical => {
            let width = lines.iter().map(|l| column_width(l)).sum();
            let height = lines
                .iter()
                .map(|l| match l.chars().count() {
                    0 => 0,
                    n => 1 + (n - 1) * step,
                })
                .max()
                .unwrap_or(0);
            (width, height)
        }
        Orientation::Horizontal => {
            let width = lines.iter().map(|l| measure_line_cells(l)).max().unwrap_or(0);
            (width, 1 + (lines.len() - 1) * step)
        }
    }
}

/// Cells a vertical column of `line` needs.
pub fn column_width(line: &str) -> usize {
    if line.chars().any(|c| is_wide_char(clean(c))) {
        2
    } else {
        1
    }
}

/// Keeps the longest prefix fitting in `max_cells`.
///
/// A wide glyph with only one cell left is still kept (and ends the line); the screen
/// buffer then draws it narrow if it hits the grid edge.
pub fn truncate_line_to_cells(line: &str, max_cells: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in line.chars().map(clean) {
        if used >= max_cells {
            break;
        }
        out.push(c);
        used += char_cells(c);
    }
    out
}

/// Keeps as many characters as fit in `max_rows` rows at `line_step` rows per character.
pub fn truncate_vertical(line: &str, max_rows: usize, line_step: usize) -> String {
    if max_rows == 0 {
        return String::new();
    }
    let max_chars = 1 + (max_rows - 1) / line_step.max(1);
    line.chars().take(max_chars).collect()
}

/// Start coordinate of content of `size` inside `span` beginning at `start`.
/// Content that does not fit, or is empty, starts at `start`.
pub fn align_start(start: i64, span: i64, size: i64, align: Align) -> i64 {
    if size <= 0 || size >= span {
        return start;
    }
    match align {
        Align::Start => start,
        Align::Center => start + (span - size) / 2,
        Align::End => start + (span - size),
    }
}
