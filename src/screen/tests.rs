// src/screen/tests.rs

use super::*;
use crate::glyph::WIDE_CONTINUATION;
use rand::{rngs::StdRng, Rng, SeedableRng};
use test_log::test;

const C1: ColorIndex = ColorIndex(1);
const C2: ColorIndex = ColorIndex(2);

// --- Test Helpers ---

/// Checks that every marker has a wide glyph on its left and every wide glyph that is
/// not in the last column has a marker on its right.
fn assert_pairing_invariant(screen: &ScreenBuffer) {
    for y in 0..screen.rows() as isize {
        for x in 0..screen.cols() as isize {
            let cell = screen.get(x, y).copied().unwrap();
            if cell.is_continuation() {
                let left = screen.get(x - 1, y).copied();
                assert!(
                    left.map(|l| l.is_wide()).unwrap_or(false),
                    "orphan marker at ({}, {})",
                    x,
                    y
                );
            }
            if cell.is_wide() && (x as usize) + 1 < screen.cols() {
                let right = screen.get(x + 1, y).copied().unwrap();
                assert!(right.is_continuation(), "wide glyph without marker at ({}, {})", x, y);
            }
        }
    }
}

fn block_bitmap(w: usize, h: usize) -> Rc<CoverageBitmap> {
    let mut bmp = CoverageBitmap::new(w, h);
    for y in 0..h {
        for x in 0..w {
            bmp.set(x, y, true);
        }
    }
    Rc::new(bmp)
}

// --- Cell Writes ---

#[test]
fn basic_grid_write() {
    let mut screen = ScreenBuffer::new(5, 5);
    assert!(screen.set_cell(2, 2, 'A', C1));
    for y in 0..5 {
        for x in 0..5 {
            let cell = *screen.get(x, y).unwrap();
            if (x, y) == (2, 2) {
                assert_eq!(cell, Cell::new('A', C1));
            } else {
                assert_eq!(cell, DEFAULT_CELL);
            }
        }
    }
}

#[test]
fn out_of_range_writes_are_ignored() {
    let mut screen = ScreenBuffer::new(3, 3);
    assert!(!screen.set_cell(-1, 0, 'A', C1));
    assert!(!screen.set_cell(0, 3, 'A', C1));
    assert!(!screen.set_cell(3, 0, 'A', C1));
    assert!(screen.cells().iter().all(|c| *c == DEFAULT_CELL));
}

#[test]
fn wide_glyph_writes_marker() {
    let mut screen = ScreenBuffer::new(1, 4);
    screen.set_cell(1, 0, '漢', C1);
    assert_eq!(screen.get(1, 0).unwrap().c, '漢');
    assert_eq!(*screen.get(2, 0).unwrap(), Cell::new(WIDE_CONTINUATION, C1));
    assert_eq!(screen.span_at(1, 0), 2);
    assert_eq!(screen.row_text(0).unwrap(), " 漢 ");
}

#[test]
fn wide_glyph_in_last_column_is_written_narrow() {
    let mut screen = ScreenBuffer::new(1, 3);
    screen.set_cell(2, 0, '漢', C1);
    assert_eq!(screen.get(2, 0).unwrap().c, '漢');
    assert_eq!(screen.span_at(2, 0), 1);
    assert!(!screen.render_cells().any(|c| c.wide));
}

#[test]
fn narrow_write_over_marker_clears_wide_origin() {
    let mut screen = ScreenBuffer::new(1, 4);
    screen.set_cell(0, 0, '漢', C1);
    screen.set_cell(1, 0, 'x', C2);
    assert_eq!(*screen.get(0, 0).unwrap(), DEFAULT_CELL);
    assert_eq!(*screen.get(1, 0).unwrap(), Cell::new('x', C2));
    assert_pairing_invariant(&screen);
}

#[test]
fn narrow_write_over_wide_origin_clears_marker() {
    let mut screen = ScreenBuffer::new(1, 4);
    screen.set_cell(0, 0, '漢', C1);
    screen.set_cell(0, 0, 'x', C2);
    assert_eq!(*screen.get(1, 0).unwrap(), DEFAULT_CELL);
    assert_pairing_invariant(&screen);
}

#[test]
fn wide_write_breaks_pairing_on_the_right() {
    let mut screen = ScreenBuffer::new(1, 5);
    screen.set_cell(2, 0, '漢', C1);
    screen.set_cell(1, 0, '字', C2);
    assert_eq!(screen.get(1, 0).unwrap().c, '字');
    assert!(screen.get(2, 0).unwrap().is_continuation());
    // The old marker at column 3 lost its origin and was blanked.
    assert_eq!(*screen.get(3, 0).unwrap(), DEFAULT_CELL);
    assert_pairing_invariant(&screen);
}

#[test]
fn writing_the_marker_writes_a_space() {
    let mut screen = ScreenBuffer::new(1, 2);
    screen.set_cell(0, 0, WIDE_CONTINUATION, C1);
    assert_eq!(*screen.get(0, 0).unwrap(), Cell::new(' ', C1));
}

// --- Text Runs ---

#[test]
fn write_text_advances_two_columns_for_wide() {
    let mut screen = ScreenBuffer::new(1, 6);
    assert!(screen.write_text(0, 0, C1, "a漢b"));
    assert_eq!(screen.row_text(0).unwrap(), "a漢b  ");
    assert!(screen.get(2, 0).unwrap().is_continuation());
    assert_eq!(screen.get(3, 0).unwrap().c, 'b');
}

#[test]
fn write_text_truncates_at_right_edge() {
    let mut screen = ScreenBuffer::new(2, 3);
    assert!(screen.write_text(1, 1, C1, "hello"));
    assert_eq!(screen.row_text(1).unwrap(), " he");
    assert!(!screen.write_text(0, 5, C1, "x"));
}

#[test]
fn vertical_text_steps_rows() {
    let mut screen = ScreenBuffer::new(5, 3);
    assert!(screen.write_text_vertical(1, 0, C1, "abc", 2));
    assert_eq!(screen.get(1, 0).unwrap().c, 'a');
    assert_eq!(screen.get(1, 2).unwrap().c, 'b');
    assert_eq!(screen.get(1, 4).unwrap().c, 'c');
    assert!(!screen.write_text_vertical(7, 0, C1, "a", 1));
}

// --- Clearing ---

#[test]
fn clear_fills_and_normalizes_wide_fill() {
    let mut screen = ScreenBuffer::new(2, 2);
    screen.clear('.', C2);
    assert!(screen.cells().iter().all(|c| *c == Cell::new('.', C2)));
    screen.clear('漢', C1);
    assert!(screen.cells().iter().all(|c| *c == Cell::new(' ', C1)));
}

#[test]
fn clear_row_and_cell_respect_bounds() {
    let mut screen = ScreenBuffer::new(2, 4);
    screen.write_text(0, 0, C1, "漢字");
    assert!(screen.clear_row(1, '-', C2));
    assert!(!screen.clear_row(2, '-', C2));
    assert_eq!(screen.row_text(1).unwrap(), "----");
    assert!(screen.clear_cell(1, 0, 'z', C2));
    assert!(!screen.clear_cell(4, 0, 'z', C2));
    assert_eq!(screen.row_text(0).unwrap(), " z字");
    assert_pairing_invariant(&screen);
}

#[test]
fn set_color_recolors_both_halves() {
    let mut screen = ScreenBuffer::new(1, 3);
    screen.set_cell(0, 0, '漢', C1);
    assert!(screen.set_color(1, 0, C2));
    assert_eq!(screen.get(0, 0).unwrap().color, C2);
    assert_eq!(screen.get(1, 0).unwrap().color, C2);
    assert!(!screen.set_color(5, 0, C2));
}

// --- Invariant Property ---

#[test]
fn random_writes_preserve_pairing() {
    let glyphs = ['a', 'Z', ' ', '漢', '字', 'ア', WIDE_CONTINUATION];
    let mut rng = StdRng::seed_from_u64(42);
    let mut screen = ScreenBuffer::new(4, 7);
    for _ in 0..2000 {
        let x = rng.gen_range(-1..9);
        let y = rng.gen_range(-1..5);
        let c = glyphs[rng.gen_range(0..glyphs.len())];
        match rng.gen_range(0..5) {
            0 => {
                screen.write_text(x, y, C1, "漢a字");
            }
            1 => {
                screen.write_text_vertical(x, y, C1, "字ア", 1);
            }
            2 => {
                screen.clear_cell(x, y, c, C2);
            }
            _ => {
                screen.set_cell(x, y, c, C1);
            }
        }
        assert_pairing_invariant(&screen);
    }
}

// --- Coverage ---

#[test]
fn rasterize_skips_blank_and_markers() {
    let mut screen = ScreenBuffer::new(2, 4);
    screen.set_cell(0, 0, 'A', C1);
    screen.set_cell(1, 1, '漢', C1);
    let mut coverage = CoverageBuffer::for_grid(2, 4, 3, 5);
    let mut requests = Vec::new();
    screen.rasterize_into(&mut coverage, |c, wide| {
        requests.push((c, wide));
        Some(block_bitmap(if wide { 6 } else { 3 }, 5))
    });
    assert_eq!(requests, vec![('A', false), ('漢', true)]);
    assert_eq!(coverage.lit_count(), 15 + 30);
    assert!(coverage.get(0, 0));
    assert!(!coverage.get(3, 0));
    assert!(coverage.get(3, 5));
    assert!(coverage.get(8, 9));
    assert_eq!(coverage.lit_in_block(1, 1, 2).count(), 30);
}

#[test]
fn missing_bitmap_renders_blank() {
    let mut screen = ScreenBuffer::new(1, 1);
    screen.set_cell(0, 0, 'A', C1);
    let mut coverage = CoverageBuffer::for_grid(1, 1, 4, 4);
    screen.rasterize_into(&mut coverage, |_, _| None);
    assert_eq!(coverage.lit_count(), 0);
}
