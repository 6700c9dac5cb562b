// src/screen.rs

//! The retained character grid and its raw coverage buffer.
//!
//! `ScreenBuffer` owns `rows × cols` [`Cell`]s. Every write keeps the wide-glyph pairing
//! intact: a [`WIDE_CONTINUATION`] cell exists exactly when its left neighbour holds a wide
//! glyph (a wide glyph in the last column has no room for its marker and is drawn narrow).
//! Writes outside the grid are silently ignored and reported through a `bool`.

use crate::color::ColorIndex;
use crate::glyph::{is_wide_char, Cell, DEFAULT_CELL, WIDE_CONTINUATION};
use crate::rasterizer::glyph_cache::CoverageBitmap;
use log::{debug, trace};
use std::rc::Rc;

/// A cell the compositor has to draw: not blank and not a continuation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCell {
    pub col: usize,
    pub row: usize,
    pub c: char,
    /// True when the glyph spans this cell and the next one.
    pub wide: bool,
    pub color: ColorIndex,
}

impl RenderCell {
    /// Number of grid columns covered (1 or 2).
    pub fn span(&self) -> usize {
        if self.wide {
            2
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenBuffer {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl ScreenBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        debug!("ScreenBuffer: allocating {}x{} cells", cols, rows);
        Self {
            rows,
            cols,
            cells: vec![DEFAULT_CELL; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, x: isize, y: isize) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.cols || y >= self.rows {
            return None;
        }
        Some(y * self.cols + x)
    }

    pub fn get(&self, x: isize, y: isize) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    fn put(&mut self, x: usize, y: usize, cell: Cell) {
        let i = y * self.cols + x;
        self.cells[i] = cell;
    }

    /// Breaks any wide pairing that cell `(x, y)` takes part in.
    ///
    /// On a marker both halves become blank. On a wide glyph only the marker to its
    /// right is blanked; the glyph itself is about to be overwritten by the caller.
    fn clear_wide_neighbors(&mut self, x: usize, y: usize) {
        let here = self.cells[y * self.cols + x];
        if here.is_continuation() {
            if x > 0 && self.cells[y * self.cols + x - 1].is_wide() {
                self.put(x - 1, y, DEFAULT_CELL);
            }
            self.put(x, y, DEFAULT_CELL);
            return;
        }
        if here.is_wide()
            && x + 1 < self.cols
            && self.cells[y * self.cols + x + 1].is_continuation()
        {
            self.put(x + 1, y, DEFAULT_CELL);
        }
    }

    /// Writes one glyph with wide-pairing maintenance. Coordinates must be in range.
    /// Returns the number of columns consumed.
    fn write_glyph(&mut self, x: usize, y: usize, c: char, color: ColorIndex) -> usize {
        let c = if c == WIDE_CONTINUATION { ' ' } else { c };
        self.clear_wide_neighbors(x, y);
        if is_wide_char(c) && x + 1 < self.cols {
            self.clear_wide_neighbors(x + 1, y);
            self.put(x, y, Cell::new(c, color));
            self.put(x + 1, y, Cell::new(WIDE_CONTINUATION, color));
            2
        } else {
            self.put(x, y, Cell::new(c, color));
            1
        }
    }

    /// Writes a single glyph. Out-of-range coordinates are a no-op returning `false`.
    pub fn set_cell(&mut self, x: isize, y: isize, c: char, color: ColorIndex) -> bool {
        if self.index(x, y).is_none() {
            trace!("ScreenBuffer: set_cell({}, {}) out of range", x, y);
            return false;
        }
        self.write_glyph(x as usize, y as usize, c, color);
        true
    }

    /// Writes a horizontal run starting at `(x, y)`. Wide glyphs advance two columns and
    /// the run stops at the first column outside the grid.
    ///
    /// Returns `false` only when the row itself is out of range.
    pub fn write_text(&mut self, x: isize, y: isize, color: ColorIndex, text: &str) -> bool {
        if y < 0 || y as usize >= self.rows {
            return false;
        }
        let y = y as usize;
        let mut col = x;
        for c in text.chars() {
            if col < 0 || col as usize >= self.cols {
                break;
            }
            col += self.write_glyph(col as usize, y, c, color) as isize;
        }
        true
    }

    /// Writes a vertical run down column `x`, stepping `line_step` rows per glyph.
    ///
    /// Returns `false` only when the column itself is out of range.
    pub fn write_text_vertical(
        &mut self,
        x: isize,
        y: isize,
        color: ColorIndex,
        text: &str,
        line_step: usize,
    ) -> bool {
        if x < 0 || x as usize >= self.cols {
            return false;
        }
        let x = x as usize;
        let step = line_step.max(1) as isize;
        let mut row = y;
        for c in text.chars() {
            if row < 0 || row as usize >= self.rows {
                break;
            }
            self.write_glyph(x, row as usize, c, color);
            row += step;
        }
        true
    }

    /// Fills the whole grid. Wide fill characters are stored as spaces.
    pub fn clear(&mut self, c: char, color: ColorIndex) {
        let cell = Cell::new(fill_char(c), color);
        self.cells.fill(cell);
    }

    pub fn clear_row(&mut self, y: isize, c: char, color: ColorIndex) -> bool {
        if y < 0 || y as usize >= self.rows {
            return false;
        }
        let start = y as usize * self.cols;
        let cell = Cell::new(fill_char(c), color);
        self.cells[start..start + self.cols].fill(cell);
        true
    }

    /// Overwrites one cell with a narrow glyph, breaking any pairing it was part of.
    pub fn clear_cell(&mut self, x: isize, y: isize, c: char, color: ColorIndex) -> bool {
        if self.index(x, y).is_none() {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        self.clear_wide_neighbors(x, y);
        self.put(x, y, Cell::new(fill_char(c), color));
        true
    }

    /// Recolors a cell, and its partner if it is half of a wide glyph.
    pub fn set_color(&mut self, x: isize, y: isize, color: ColorIndex) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        self.cells[i].color = color;
        let (x, y) = (x as usize, y as usize);
        if self.cells[i].is_continuation() && x > 0 {
            self.cells[i - 1].color = color;
        } else if self.span_at(x, y) == 2 {
            self.cells[i + 1].color = color;
        }
        true
    }

    /// 2 when `(x, y)` holds a wide glyph followed by its marker, else 1.
    pub fn span_at(&self, x: usize, y: usize) -> usize {
        if x + 1 >= self.cols || y >= self.rows {
            return 1;
        }
        let i = y * self.cols + x;
        if self.cells[i].is_wide() && self.cells[i + 1].is_continuation() {
            2
        } else {
            1
        }
    }

    /// The visible text of a row, continuation markers omitted.
    pub fn row_text(&self, y: usize) -> Option<String> {
        if y >= self.rows {
            return None;
        }
        let start = y * self.cols;
        Some(
            self.cells[start..start + self.cols]
                .iter()
                .filter(|cell| !cell.is_continuation())
                .map(|cell| cell.c)
                .collect(),
        )
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Every cell that produces visible output, in row-major order.
    pub fn render_cells(&self) -> impl Iterator<Item = RenderCell> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).filter_map(move |col| {
                let cell = self.cells[row * self.cols + col];
                if cell.is_continuation() || cell.c == ' ' {
                    return None;
                }
                Some(RenderCell {
                    col,
                    row,
                    c: cell.c,
                    wide: self.span_at(col, row) == 2,
                    color: cell.color,
                })
            })
        })
    }

    /// Stamps glyph bitmaps into `coverage`, one `cell_w × cell_h` block per cell.
    ///
    /// `lookup(c, wide)` supplies the bitmap; `None` leaves the block blank.
    pub fn rasterize_into<F>(&self, coverage: &mut CoverageBuffer, mut lookup: F)
    where
        F: FnMut(char, bool) -> Option<Rc<CoverageBitmap>>,
    {
        coverage.reset();
        for cell in self.render_cells() {
            if let Some(bitmap) = lookup(cell.c, cell.wide) {
                coverage.stamp(cell.row * coverage.cell_h, cell.col * coverage.cell_w, &bitmap);
            }
        }
    }
}

fn fill_char(c: char) -> char {
    if c == WIDE_CONTINUATION || is_wide_char(c) {
        ' '
    } else {
        c
    }
}

/// Raw glyph coverage for the whole grid, `rows·cell_h × cols·cell_w`, without spacing
/// or padding. The compositor places each cell's block at its pixel origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageBuffer {
    width: usize,
    height: usize,
    cell_w: usize,
    cell_h: usize,
    data: Vec<bool>,
}

impl CoverageBuffer {
    pub fn for_grid(rows: usize, cols: usize, cell_w: usize, cell_h: usize) -> Self {
        let width = cols * cell_w;
        let height = rows * cell_h;
        Self {
            width,
            height,
            cell_w,
            cell_h,
            data: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> (usize, usize) {
        (self.cell_w, self.cell_h)
    }

    pub fn reset(&mut self) {
        self.data.fill(false);
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    /// Copies a bitmap with its top-left at `(y0, x0)`, clipped to the buffer.
    fn stamp(&mut self, y0: usize, x0: usize, bitmap: &CoverageBitmap) {
        for (bx, by) in bitmap.lit_pixels() {
            let (x, y) = (x0 + bx, y0 + by);
            if x < self.width && y < self.height {
                self.data[y * self.width + x] = true;
            }
        }
    }

    /// Lit pixels of the block starting at `cell` spanning `span` cells, as offsets
    /// relative to the block origin.
    pub fn lit_in_block(
        &self,
        col: usize,
        row: usize,
        span: usize,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let x0 = col * self.cell_w;
        let y0 = row * self.cell_h;
        let block_w = (self.cell_w * span).min(self.width.saturating_sub(x0));
        let block_h = self.cell_h.min(self.height.saturating_sub(y0));
        (0..block_h).flat_map(move |py| {
            (0..block_w).filter_map(move |px| self.get(x0 + px, y0 + py).then_some((px, py)))
        })
    }

    pub fn lit_count(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }
}

#[cfg(test)]
mod tests;
