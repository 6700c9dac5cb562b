// src/compositor/tests.rs

use super::*;
use crate::color::ColorIndex;
use crate::config::DisplayConfig;
use crate::geometry::Point;
use crate::overlay::{OverlayCommand, OverlayQueue, SuperTextOverlay};
use crate::rasterizer::CoverageBitmap;
use std::rc::Rc;
use test_log::test;

const BG: Rgba = Rgba::opaque(1, 2, 3);

// --- Test Helpers ---

fn display(rows: u32, cols: u32, cell: u32, padding: u32, scale: u32) -> DisplayConfig {
    DisplayConfig {
        rows,
        cols,
        cell_width: cell,
        cell_height: cell,
        spacing_x: 0,
        spacing_y: 0,
        padding,
        pixel_scale: scale,
    }
}

fn bitmap(w: usize, h: usize, lit: &[(usize, usize)]) -> Rc<CoverageBitmap> {
    let mut bmp = CoverageBitmap::new(w, h);
    for &(x, y) in lit {
        bmp.set(x, y, true);
    }
    Rc::new(bmp)
}

/// Composites `screen` (stamping every glyph with `glyph`) plus `overlays`.
fn compose(
    config: &DisplayConfig,
    palette: &Palette,
    screen: &ScreenBuffer,
    glyph: Option<Rc<CoverageBitmap>>,
    overlays: OverlayQueue,
) -> Framebuffer {
    let mut overlays = overlays;
    let mapper = CoordinateMapper::from_config(config);
    let d = mapper.display();
    let mut coverage = CoverageBuffer::for_grid(
        screen.rows(),
        screen.cols(),
        d.cell_width as usize,
        d.cell_height as usize,
    );
    screen.rasterize_into(&mut coverage, |_, _| glyph.clone());
    let frame = overlays.take();
    let inputs = CompositeInputs {
        mapper: &mapper,
        palette,
        background: BG,
        screen,
        coverage: &coverage,
        overlays: &frame,
    };
    let mut compositor = Compositor::new();
    compositor.compose(&inputs).clone()
}

// --- Framebuffer ---

#[test]
fn fill_rect_clips_to_bounds() {
    let mut fb = Framebuffer::new(4, 3);
    fb.fill(BG);
    let red = Rgba::opaque(255, 0, 0);
    fb.fill_rect(-2, -2, 4, 4, red);
    fb.fill_rect(3, 2, 10, 10, red);
    fb.fill_rect(1, 1, 0, 5, red);
    assert_eq!(fb.pixel(0, 0), Some(red));
    assert_eq!(fb.pixel(1, 1), Some(red));
    assert_eq!(fb.pixel(2, 1), Some(BG));
    assert_eq!(fb.pixel(3, 2), Some(red));
    assert_eq!(fb.pixel(4, 0), None);
    assert_eq!(fb.pixels().len(), 4 * 3 * 4);
}

#[test]
fn capture_sink_keeps_last_frame() {
    let mut sink = FrameCapture::new();
    let mut fb = Framebuffer::new(2, 2);
    fb.fill(BG);
    sink.present(&fb).unwrap();
    fb.fill(Rgba::opaque(9, 9, 9));
    sink.present(&fb).unwrap();
    assert_eq!(sink.presented, 2);
    assert_eq!(sink.last.unwrap().pixel(1, 1), Some(Rgba::opaque(9, 9, 9)));
}

// --- Composition ---

#[test]
fn background_follows_layout_mode() {
    let config = display(2, 3, 2, 1, 1);
    let screen = ScreenBuffer::new(2, 3);
    let mut palette = Palette::default();

    let fb = compose(&config, &palette, &screen, None, OverlayQueue::new());
    assert_eq!((fb.width(), fb.height()), (8, 6));
    assert_eq!(fb.pixel(0, 0), Some(BG));

    let mut mode = palette.layout_mode();
    mode.enabled = true;
    palette.set_layout_mode(mode);
    let fb = compose(&config, &palette, &screen, None, OverlayQueue::new());
    assert_eq!(fb.pixel(7, 5), Some(mode.background));
}

#[test]
fn glyph_pixels_land_in_their_cell_box() {
    let config = display(2, 3, 2, 1, 1);
    let palette = Palette::default();
    let white = palette.resolve(ColorIndex::WHITE);
    let mut screen = ScreenBuffer::new(2, 3);
    screen.set_cell(1, 0, 'A', ColorIndex::WHITE);

    let fb = compose(&config, &palette, &screen, Some(bitmap(2, 2, &[(0, 0), (1, 0), (0, 1), (1, 1)])), OverlayQueue::new());
    // Cell (1, 0) starts at padding + 1 pitch = (3, 1).
    for (x, y) in [(3, 1), (4, 1), (3, 2), (4, 2)] {
        assert_eq!(fb.pixel(x, y), Some(white), "({}, {})", x, y);
    }
    assert_eq!(fb.pixel(1, 1), Some(BG));
    assert_eq!(fb.pixel(5, 1), Some(BG));
}

#[test]
fn glyph_pixels_scale_to_squares() {
    let config = display(1, 1, 2, 0, 2);
    let palette = Palette::default();
    let white = palette.resolve(ColorIndex::WHITE);
    let mut screen = ScreenBuffer::new(1, 1);
    screen.set_cell(0, 0, 'x', ColorIndex::WHITE);

    let fb = compose(&config, &palette, &screen, Some(bitmap(2, 2, &[(1, 1)])), OverlayQueue::new());
    assert_eq!((fb.width(), fb.height()), (4, 4));
    for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
        assert_eq!(fb.pixel(x, y), Some(white));
    }
    assert_eq!(fb.pixel(1, 1), Some(BG));
}

#[test]
fn layers_paint_in_fixed_order() {
    let config = display(1, 1, 4, 0, 1);
    let palette = Palette::default();
    let green = palette.resolve(ColorIndex::CRT_GREEN);
    let white = palette.resolve(ColorIndex::WHITE);
    let amber = palette.resolve(ColorIndex::AMBER);
    let cyan = palette.resolve(ColorIndex::CRT_CYAN);

    let mut screen = ScreenBuffer::new(1, 1);
    screen.set_cell(0, 0, 'A', ColorIndex::WHITE);
    let left_half: Vec<(usize, usize)> = (0..4).flat_map(|y| (0..2).map(move |x| (x, y))).collect();

    // Queued in reverse paint order; the compositor reorders by category.
    let mut queue = OverlayQueue::new();
    queue.push(OverlayCommand::SuperText(SuperTextOverlay {
        x: 3,
        y: 0,
        bitmap: bitmap(1, 1, &[(0, 0)]),
        color: ColorIndex::CRT_CYAN,
        scale: 1.0,
    }));
    queue.push_line(Point::new(0.0, 2.0), Point::new(3.0, 2.0), ColorIndex::AMBER, 1.0);
    queue.push_filled(
        vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ],
        ColorIndex::CRT_GREEN,
    );

    let fb = compose(&config, &palette, &screen, Some(bitmap(4, 4, &left_half)), queue);
    assert_eq!(fb.pixel(3, 3), Some(green));
    assert_eq!(fb.pixel(3, 1), Some(green));
    assert_eq!(fb.pixel(0, 0), Some(white));
    assert_eq!(fb.pixel(0, 2), Some(amber));
    assert_eq!(fb.pixel(3, 2), Some(amber));
    assert_eq!(fb.pixel(3, 0), Some(cyan));
}

#[test]
fn super_text_block_size_rounds_scale() {
    let config = display(1, 2, 4, 0, 1);
    let palette = Palette::default();
    let white = palette.resolve(ColorIndex::WHITE);
    let screen = ScreenBuffer::new(1, 2);

    let mut queue = OverlayQueue::new();
    queue.push(OverlayCommand::SuperText(SuperTextOverlay {
        x: 0,
        y: 0,
        bitmap: bitmap(2, 1, &[(1, 0)]),
        color: ColorIndex::WHITE,
        scale: 1.5,
    }));
    let fb = compose(&config, &palette, &screen, None, queue);
    assert_eq!(fb.pixel(1, 0), Some(BG));
    for (x, y) in [(2, 0), (3, 0), (2, 1), (3, 1)] {
        assert_eq!(fb.pixel(x, y), Some(white));
    }
    assert_eq!(fb.pixel(4, 0), Some(BG));
}

#[test]
fn thin_lines_are_at_least_one_pixel() {
    let config = display(1, 2, 4, 0, 2);
    let palette = Palette::default();
    let amber = palette.resolve(ColorIndex::AMBER);
    let screen = ScreenBuffer::new(1, 2);

    let mut queue = OverlayQueue::new();
    queue.push_line(Point::new(0.0, 3.0), Point::new(15.0, 3.0), ColorIndex::AMBER, 0.1);
    let fb = compose(&config, &palette, &screen, None, queue);
    assert_eq!(fb.pixel(7, 3), Some(amber));
    assert_eq!(fb.pixel(7, 2), Some(BG));
    assert_eq!(fb.pixel(7, 4), Some(BG));
}
