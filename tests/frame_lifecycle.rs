//! Frame lifecycle tests: draw calls through `finish_frame` down to composited pixels.

mod support;

use phosphor::compositor::PixelSink;
use phosphor::engine::{AniOptions, ShapeOptions, SuperTextOptions};
use phosphor::{ColorIndex, Config, DisplayConfig, Engine, FrameCapture, API_LEVEL};
use support::{block_engine, bounds_of, pixels_of, plain_display};
use test_log::test;

// =============================================================================
// Grid rendering
// =============================================================================

#[test]
fn wide_glyph_covers_two_cells() {
    let mut engine = block_engine(plain_display(4, 2));
    let mut sink = FrameCapture::new();
    engine.begin_frame();
    engine.draw_text(0, 0, ColorIndex::WHITE, "漢A");
    engine.finish_frame(&mut sink).unwrap();

    let frame = sink.last.as_ref().unwrap();
    let white = engine.palette().resolve(ColorIndex::WHITE);
    assert_eq!(bounds_of(frame, white), Some((0, 0, 11, 7)));
    assert_eq!(pixels_of(frame, white).len(), 12 * 8);
    assert_eq!(frame.pixel(12, 0), Some(engine.config().appearance.background));
}

#[test]
fn padding_spacing_and_scale_place_cells() {
    let display = DisplayConfig {
        rows: 2,
        cols: 3,
        cell_width: 4,
        cell_height: 8,
        spacing_x: 1,
        spacing_y: 1,
        padding: 2,
        pixel_scale: 2,
    };
    let mut engine = block_engine(display);
    assert_eq!(engine.window_size_px(), (38, 44));

    let mut sink = FrameCapture::new();
    engine.begin_frame();
    engine.draw_cell(1, 1, 'A', ColorIndex::AMBER);
    engine.finish_frame(&mut sink).unwrap();

    let frame = sink.last.as_ref().unwrap();
    assert_eq!((frame.width(), frame.height()), (38, 44));
    let amber = engine.palette().resolve(ColorIndex::AMBER);
    // padding 2·2 + one pitch of (4 + 1)·2 across, (8 + 1)·2 down.
    assert_eq!(bounds_of(frame, amber), Some((14, 22, 21, 37)));
}

#[test]
fn sweep_recolors_rendered_glyphs() {
    let mut engine = block_engine(plain_display(4, 1));
    let mut sink = FrameCapture::new();
    assert_eq!(engine.begin_frame(), 1);
    engine.draw_text(0, 0, ColorIndex::WHITE, "AAAA");
    engine.sweep(0, 0, 3, ColorIndex::CRT_GREEN, ColorIndex::AMBER);
    engine.finish_frame(&mut sink).unwrap();

    let frame = sink.last.as_ref().unwrap();
    let green = engine.palette().resolve(ColorIndex::CRT_GREEN);
    let amber = engine.palette().resolve(ColorIndex::AMBER);
    // Frame 1 shifts the two-color ramp by one step.
    assert_eq!(frame.pixel(0, 0), Some(amber));
    assert_eq!(frame.pixel(4, 0), Some(green));
    assert_eq!(frame.pixel(8, 0), Some(amber));
    assert_eq!(frame.pixel(12, 0), Some(green));
}

#[test]
fn animation_advances_with_frames() {
    let mut engine = block_engine(plain_display(2, 1));
    let mut sink = FrameCapture::new();
    let colors = [ColorIndex::AMBER, ColorIndex::CRT_CYAN];
    let frames = ["A", " "];

    engine.begin_frame();
    engine.animated_char(0, 0, &colors, &frames, &AniOptions::default());
    engine.finish_frame(&mut sink).unwrap();
    let bg = engine.config().appearance.background;
    let frame = sink.last.as_ref().unwrap();
    assert_eq!(pixels_of(frame, bg).len(), 8 * 8);

    engine.begin_frame();
    engine.animated_char(0, 0, &colors, &frames, &AniOptions::default());
    engine.finish_frame(&mut sink).unwrap();
    let amber = engine.palette().resolve(ColorIndex::AMBER);
    let frame = sink.last.as_ref().unwrap();
    assert_eq!(bounds_of(frame, amber), Some((0, 0, 3, 7)));
    assert_eq!(sink.presented, 2);
}

// =============================================================================
// Overlays
// =============================================================================

#[test]
fn overlays_last_one_frame() {
    let mut engine = block_engine(plain_display(10, 4));
    let mut sink = FrameCapture::new();
    let amber = engine.palette().resolve(ColorIndex::AMBER);

    engine.begin_frame();
    engine.draw_rect(ColorIndex::AMBER, 8.0, 8.0, 4.0, 4.0, &ShapeOptions::filled());
    engine.finish_frame(&mut sink).unwrap();
    assert_eq!(bounds_of(sink.last.as_ref().unwrap(), amber), Some((8, 8, 12, 12)));

    engine.begin_frame();
    engine.finish_frame(&mut sink).unwrap();
    assert!(pixels_of(sink.last.as_ref().unwrap(), amber).is_empty());
}

#[test]
fn super_text_renders_enlarged_blocks() {
    let mut engine = block_engine(plain_display(10, 4));
    let mut sink = FrameCapture::new();
    engine.begin_frame();
    engine.draw_super_text(2.0, 4.0, ColorIndex::WHITE, "A", &SuperTextOptions::scaled(2));
    engine.finish_frame(&mut sink).unwrap();

    let white = engine.palette().resolve(ColorIndex::WHITE);
    let frame = sink.last.as_ref().unwrap();
    assert_eq!(bounds_of(frame, white), Some((2, 4, 9, 19)));
    assert_eq!(pixels_of(frame, white).len(), 8 * 16);
}

#[test]
fn layout_mode_flattens_colors() {
    let mut engine = block_engine(plain_display(4, 2));
    let mut mode = engine.layout_mode();
    mode.enabled = true;
    engine.set_layout_mode(mode);

    let mut sink = FrameCapture::new();
    engine.begin_frame();
    engine.draw_text(0, 0, ColorIndex::AMBER, "A");
    engine.draw_rect(ColorIndex::CRT_CYAN, 8.0, 8.0, 4.0, 4.0, &ShapeOptions::filled());
    engine.finish_frame(&mut sink).unwrap();

    let frame = sink.last.as_ref().unwrap();
    let fg = pixels_of(frame, mode.foreground).len();
    let bg = pixels_of(frame, mode.background).len();
    assert_eq!(fg + bg, frame.width() * frame.height());
    assert!(fg >= 4 * 8 + 4 * 4);
}

// =============================================================================
// Configuration & sinks
// =============================================================================

#[test]
fn engine_builds_from_json_config() {
    let json = r#"{
        "display": {
            "rows": 2, "cols": 5, "cell_width": 4, "cell_height": 8,
            "spacing_x": 0, "spacing_y": 0, "padding": 1, "pixel_scale": 1
        },
        "draw": { "rect": { "filled": false, "thickness": 2.0 } }
    }"#;
    let config = Config::from_json_str(json).unwrap();
    let mut engine = Engine::new(config, API_LEVEL).unwrap();
    assert_eq!(engine.window_size_px(), (22, 18));

    engine.draw_rect(ColorIndex::WHITE, 0.0, 0.0, 4.0, 4.0, &ShapeOptions::default());
    let lines = &engine.pending_overlays().lines;
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.thickness == 2.0));
}

#[test]
fn frames_present_through_trait_objects() {
    let mut engine = block_engine(plain_display(2, 2));
    let mut capture = FrameCapture::new();
    {
        let sink: &mut dyn PixelSink = &mut capture;
        engine.begin_frame();
        engine.finish_frame(&mut *sink).unwrap();
        engine.begin_frame();
        engine.finish_frame(&mut *sink).unwrap();
    }
    assert_eq!(capture.presented, 2);
    assert_eq!(engine.frame(), 2);
}
