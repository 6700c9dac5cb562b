// src/engine.rs

//! The engine context.
//!
//! An `Engine` owns everything one display needs: configuration, the character grid,
//! per-frame overlay queues, the focus graph, the polygon library, the glyph cache and
//! the compositor. Callers drive it once per frame:
//!
//! ```text
//! begin_frame()  →  draw_* / focus calls  →  finish_frame(sink)
//! ```
//!
//! Every drawing call clamps or ignores out-of-range input and reports it through its
//! return value; only construction, reconfiguration and presentation can fail.
//!
//! An engine is single-threaded by construction: the glyph cache shares bitmaps through
//! `Rc`, so the type is neither `Send` nor `Sync`.

mod offsets;
mod options;

pub use offsets::{DynamicOffsets, DEFAULT_CHANNEL};
pub use options::{
    AniOptions, BoxOptions, FrameOptions, PatternOptions, ShapeOptions, SuperTextMode,
    SuperTextOptions, TextBoxOptions,
};

use crate::color::{ColorIndex, LayoutMode, Palette};
use crate::compositor::{CompositeInputs, Compositor, Framebuffer, PixelSink};
use crate::config::{Config, DisplayConfig, DrawDefaults, FontConfig};
use crate::coords::CoordinateMapper;
use crate::focus::{Direction, FocusGraph, FocusNodeUpdate, NodeOptions};
use crate::geometry::{Point, Rect};
use crate::glyph::{is_wide_char, WIDE_CONTINUATION};
use crate::hatch::hatch_segments_within;
use crate::overlay::{OverlayCommand, OverlayFrame, OverlayQueue, SuperTextOverlay};
use crate::polygon::{design_scale, scale_to_device, PolygonRegistry, ShapeRef, Transform};
use crate::rasterizer::{FontDriver, FontManager, GlyphRasterCache, HeadlessFontDriver};
use crate::screen::{CoverageBuffer, ScreenBuffer};
use crate::text::{
    align_start, column_width, measure_line_cells, measure_text_cells, split_lines,
    truncate_line_to_cells, truncate_vertical, Orientation,
};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use serde::Serialize;
use thiserror::Error;

pub const ENGINE_NAME: &str = "phosphor";
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Version of the primitive drawing/focus surface. Bumped on breaking changes.
pub const API_LEVEL: u32 = 1;
pub const DEPENDENCY_MODEL: &str = "standalone";

/// Super-text anchors are clamped to `±ANCHOR_LIMIT_PX` before integer layout.
const ANCHOR_LIMIT_PX: f64 = 1e15;

/// Cell size of `SuperTextMode::Fixed5x7`.
const FIXED_CELL: (usize, usize) = (5, 7);

/// Largest framebuffer side the engine will allocate, in device pixels.
pub const MAX_SURFACE_PX: usize = 16_384;
/// Largest framebuffer area, in device pixels: one 8K UHD surface (about 127 MiB RGBA).
pub const MAX_SURFACE_AREA_PX: usize = 7_680 * 4_320;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{engine} API level {available} is lower than required {required}")]
    ApiLevel {
        engine: &'static str,
        available: u32,
        required: u32,
    },
    #[error("invalid display geometry: {0}")]
    InvalidGeometry(String),
}

/// Machine-readable description of this engine build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineManifest {
    pub name: &'static str,
    pub version: &'static str,
    pub api_level: u32,
    pub dependency_model: &'static str,
}

pub fn manifest() -> EngineManifest {
    EngineManifest {
        name: ENGINE_NAME,
        version: ENGINE_VERSION,
        api_level: API_LEVEL,
        dependency_model: DEPENDENCY_MODEL,
    }
}

/// Fails when a caller needs a newer primitive surface than this build provides.
pub fn require_api_level(required: u32) -> std::result::Result<(), EngineError> {
    if API_LEVEL < required {
        return Err(EngineError::ApiLevel {
            engine: ENGINE_NAME,
            available: API_LEVEL,
            required,
        });
    }
    Ok(())
}

/// Sanitizes a display configuration and rejects grids whose framebuffer would exceed
/// `MAX_SURFACE_PX` on either side or `MAX_SURFACE_AREA_PX` in total.
fn checked_display(display: &DisplayConfig) -> std::result::Result<DisplayConfig, EngineError> {
    let d = display.sanitized();
    let (w, h) = CoordinateMapper::from_config(&d).window_size_px();
    if w > MAX_SURFACE_PX || h > MAX_SURFACE_PX {
        return Err(EngineError::InvalidGeometry(format!(
            "{}x{} px surface exceeds {} px per side",
            w, h, MAX_SURFACE_PX
        )));
    }
    if w * h > MAX_SURFACE_AREA_PX {
        return Err(EngineError::InvalidGeometry(format!(
            "{}x{} px surface exceeds {} px in total",
            w, h, MAX_SURFACE_AREA_PX
        )));
    }
    Ok(d)
}

fn font_size(font: &FontConfig, display: &DisplayConfig) -> f64 {
    font.size_px.unwrap_or(display.cell_height as f64)
}

pub struct Engine<D: FontDriver = HeadlessFontDriver> {
    config: Config,
    mapper: CoordinateMapper,
    palette: Palette,
    screen: ScreenBuffer,
    coverage: CoverageBuffer,
    fonts: FontManager<D>,
    glyphs: GlyphRasterCache,
    shapes: PolygonRegistry,
    overlays: OverlayQueue,
    focus: FocusGraph,
    compositor: Compositor,
    offsets: DynamicOffsets,
    frame: u64,
}

impl Engine<HeadlessFontDriver> {
    /// An engine whose glyphs all render blank. Overlays and focus work as usual.
    pub fn new(config: Config, required_api_level: u32) -> Result<Self> {
        Self::with_driver(HeadlessFontDriver::new(), config, required_api_level)
    }
}

impl<D: FontDriver> Engine<D> {
    pub fn with_driver(driver: D, config: Config, required_api_level: u32) -> Result<Self> {
        require_api_level(required_api_level)?;
        let mut config = config;
        config.display = checked_display(&config.display)?;
        let display = config.display;

        let font = &config.appearance.font;
        let fonts = FontManager::new(
            driver,
            &font.narrow,
            font.wide.as_deref(),
            font_size(font, &display),
        )
        .context("Failed to initialise engine fonts")?;

        let mut palette = Palette::default();
        palette.set_layout_mode(config.appearance.layout_mode);

        let (rows, cols) = (display.rows as usize, display.cols as usize);
        info!(
            "Engine: {} v{} (API {}) with {}x{} grid",
            ENGINE_NAME, ENGINE_VERSION, API_LEVEL, cols, rows
        );

        Ok(Engine {
            mapper: CoordinateMapper::from_config(&display),
            screen: ScreenBuffer::new(rows, cols),
            coverage: CoverageBuffer::for_grid(
                rows,
                cols,
                display.cell_width as usize,
                display.cell_height as usize,
            ),
            config,
            palette,
            fonts,
            glyphs: GlyphRasterCache::new(),
            shapes: PolygonRegistry::new(),
            overlays: OverlayQueue::new(),
            focus: FocusGraph::new(),
            compositor: Compositor::new(),
            offsets: DynamicOffsets::new(),
            frame: 0,
        })
    }

    // --- Manifest & configuration ---

    pub fn manifest(&self) -> EngineManifest {
        manifest()
    }

    pub fn require_api_level(&self, required: u32) -> Result<()> {
        require_api_level(required)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn window_size_px(&self) -> (usize, usize) {
        self.mapper.window_size_px()
    }

    /// Applies a new grid geometry. The screen is reallocated (blank), the glyph cache
    /// is dropped and fonts are reloaded when their size follows the cell height.
    /// Focus nodes, shapes and offsets are kept.
    pub fn configure(&mut self, display: DisplayConfig) -> Result<()> {
        let display = checked_display(&display)?;
        let old_size = font_size(&self.config.appearance.font, &self.config.display);
        let new_size = font_size(&self.config.appearance.font, &display);
        if new_size != old_size {
            let font = &self.config.appearance.font;
            self.fonts
                .reload(&font.narrow, font.wide.as_deref(), new_size)
                .context("Failed to reload fonts for the new cell size")?;
        }

        let (rows, cols) = (display.rows as usize, display.cols as usize);
        debug!("Engine: configure {:?}", display);
        self.config.display = display;
        self.mapper = CoordinateMapper::from_config(&display);
        self.screen = ScreenBuffer::new(rows, cols);
        self.coverage = CoverageBuffer::for_grid(
            rows,
            cols,
            display.cell_width as usize,
            display.cell_height as usize,
        );
        self.glyphs.clear();
        Ok(())
    }

    /// Switches fonts. The glyph cache is dropped; on error the old fonts stay.
    pub fn set_fonts(&mut self, font: FontConfig) -> Result<()> {
        let size = font_size(&font, &self.config.display);
        self.fonts
            .reload(&font.narrow, font.wide.as_deref(), size)
            .context("Failed to switch engine fonts")?;
        self.config.appearance.font = font;
        self.glyphs.clear();
        Ok(())
    }

    pub fn fonts(&self) -> &FontManager<D> {
        &self.fonts
    }

    pub fn glyph_cache(&self) -> &GlyphRasterCache {
        &self.glyphs
    }

    // --- Palette, layout mode & draw defaults ---

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    /// Palette index for a color name, `White` when the name is unknown.
    pub fn color(&self, name: &str) -> ColorIndex {
        self.palette.named(name)
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.palette.layout_mode()
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.palette.set_layout_mode(mode);
        self.config.appearance.layout_mode = mode;
    }

    pub fn draw_defaults(&self) -> &DrawDefaults {
        &self.config.draw
    }

    pub fn set_draw_defaults(&mut self, defaults: DrawDefaults) {
        self.config.draw = defaults;
    }

    pub fn reset_draw_defaults(&mut self) {
        self.config.draw = DrawDefaults::default();
    }

    // --- Coordinates ---

    pub fn grid_to_px(&self, gx: f64, gy: f64) -> Point {
        self.mapper.grid_to_px(gx, gy)
    }

    pub fn grid_to_px_offset(&self, gx: f64, gy: f64, ox: f64, oy: f64) -> Point {
        self.mapper.grid_to_px_offset(gx, gy, ox, oy)
    }

    pub fn px_to_grid(&self, px: f64, py: f64) -> Point {
        self.mapper.px_to_grid(px, py)
    }

    pub fn gx(&self, grid_x: f64) -> f64 {
        self.mapper.gx(grid_x)
    }

    pub fn gy(&self, grid_y: f64) -> f64 {
        self.mapper.gy(grid_y)
    }

    pub fn px(&self, pixel_x: f64) -> f64 {
        self.mapper.px(pixel_x)
    }

    pub fn py(&self, pixel_y: f64) -> f64 {
        self.mapper.py(pixel_y)
    }

    pub fn grid_rect_to_px(&self, gx: f64, gy: f64, gw: f64, gh: f64, pad: f64) -> Rect {
        self.mapper.grid_rect_to_px(gx, gy, gw, gh, pad)
    }

    fn cell_height(&self) -> f64 {
        self.config.display.cell_height as f64
    }

    fn pixel_scale(&self) -> f64 {
        self.mapper.scale()
    }

    // --- Grid drawing ---

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn draw_cell(&mut self, x: isize, y: isize, c: char, color: ColorIndex) -> bool {
        self.screen.set_cell(x, y, c, color)
    }

    pub fn draw_text(&mut self, x: isize, y: isize, color: ColorIndex, text: &str) -> bool {
        self.screen.write_text(x, y, color, text)
    }

    pub fn draw_text_vertical(
        &mut self,
        x: isize,
        y: isize,
        color: ColorIndex,
        text: &str,
        line_step: usize,
    ) -> bool {
        self.screen.write_text_vertical(x, y, color, text, line_step)
    }

    /// Lays out `text` inside the `gw × gh` cell box at `(gx, gy)`: aligned, truncated
    /// to the box width (horizontal) or height (vertical), and clipped to the box rows.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text_box(
        &mut self,
        gx: isize,
        gy: isize,
        gw: usize,
        gh: usize,
        color: ColorIndex,
        text: &str,
        options: &TextBoxOptions,
    ) -> bool {
        let lines = split_lines(text);
        if lines.is_empty() {
            return false;
        }
        let step = options.line_step.max(1);
        let (text_w, text_h) = measure_text_cells(text, options.orientation, step);
        let start_x = align_start(gx as i64, gw as i64, text_w as i64, options.align_h) as isize;
        let start_y = align_start(gy as i64, gh as i64, text_h as i64, options.align_v) as isize;

        match options.orientation {
            Orientation::Vertical => {
                let mut x = start_x;
                for line in lines {
                    let clipped = truncate_vertical(line, gh, step);
                    self.screen.write_text_vertical(x, start_y, color, &clipped, step);
                    x += column_width(line) as isize;
                }
            }
            Orientation::Horizontal => {
                for (idx, line) in lines.iter().enumerate() {
                    let y = start_y + (idx * step) as isize;
                    if y >= gy + gh as isize {
                        break;
                    }
                    let clipped = truncate_line_to_cells(line, gw);
                    self.screen.write_text(start_x, y, color, &clipped);
                }
            }
        }
        true
    }

    pub fn clear_screen(&mut self, c: char, color: ColorIndex) {
        self.screen.clear(c, color);
    }

    pub fn clear_row(&mut self, y: isize, c: char, color: ColorIndex) -> bool {
        self.screen.clear_row(y, c, color)
    }

    pub fn clear_cell(&mut self, x: isize, y: isize, c: char, color: ColorIndex) -> bool {
        self.screen.clear_cell(x, y, c, color)
    }

    /// Writes one frame of a cycling animation at `(x, y)`.
    ///
    /// The frame shown is `round((frame + local + global) / slowdown)` and the color
    /// `round((frame + global) / slowdown)`, both modulo their list length.
    pub fn animated_char(
        &mut self,
        x: isize,
        y: isize,
        colors: &[ColorIndex],
        frames: &[&str],
        options: &AniOptions,
    ) -> bool {
        if colors.is_empty() || frames.is_empty() {
            return false;
        }
        let defaults = self.config.draw.ani;
        let local = options.local_offset.unwrap_or(defaults.local_offset);
        let global = options.global_offset.unwrap_or(defaults.global_offset);
        let slowdown = options.slowdown.unwrap_or(defaults.slowdown).max(1) as f64;

        let frame = self.frame as i64;
        let pick = |offset: i64, len: usize| -> usize {
            let step = ((frame + offset) as f64 / slowdown).round_ties_even() as i64;
            step.rem_euclid(len as i64) as usize
        };
        let color = colors[pick(global, colors.len())];
        let glyphs = frames[pick(local + global, frames.len())];
        self.screen.write_text(x, y, color, glyphs)
    }

    /// Recolors `row` from `col1` to `col2` (inclusive, either direction) with a color
    /// ramp that cycles through `start..=end` as the frame counter advances.
    pub fn sweep(
        &mut self,
        row: isize,
        col1: isize,
        col2: isize,
        start: ColorIndex,
        end: ColorIndex,
    ) -> bool {
        if row < 0 || row as usize >= self.screen.rows() {
            return false;
        }
        let (lo, hi) = if end.0 < start.0 {
            (end.0, start.0)
        } else {
            (start.0, end.0)
        };
        let cycle = (hi - lo) as u64 + 1;
        let last = self.screen.cols() as isize - 1;
        let c1 = col1.clamp(0, last);
        let c2 = col2.clamp(0, last);
        let dir = if c1 > c2 { -1 } else { 1 };
        let len = (c2 - c1).unsigned_abs() + 1;
        for i in 0..len {
            let color = ColorIndex(((self.frame + i as u64) % cycle) as u8 + lo);
            self.screen.set_color(c1 + i as isize * dir, row, color);
        }
        true
    }

    // --- Vector drawing ---

    pub fn pending_overlays(&self) -> &OverlayFrame {
        self.overlays.pending()
    }

    /// Discards overlays queued so far this frame.
    pub fn reset_overlays(&mut self) {
        self.overlays.clear();
    }

    /// Resolves a shape to device-pixel vertices anchored at `origin`.
    ///
    /// Named shapes scale against their registered base height unless `base_override`
    /// is set; inline vertices scale against `base_override` or the current cell
    /// height. Returns the vertices and the base height used.
    fn place_shape(
        &self,
        shape: ShapeRef<'_>,
        base_override: Option<f64>,
        origin: Point,
    ) -> Option<(Vec<Point>, f64)> {
        let cell_h = self.cell_height();
        let resolved = self
            .shapes
            .resolve(shape, base_override.unwrap_or(cell_h))?;
        let base = match shape {
            ShapeRef::Named(_) => base_override.unwrap_or(resolved.base_font_height),
            ShapeRef::Inline(_) => resolved.base_font_height,
        };
        let vertices = scale_to_device(resolved.vertices, base, cell_h, self.pixel_scale(), origin);
        Some((vertices, base))
    }

    /// Queues a polygon, filled or as a closed outline. Unknown shape names and shapes
    /// with fewer than three vertices are ignored (`false`).
    pub fn draw_polygon(
        &mut self,
        shape: ShapeRef<'_>,
        color: ColorIndex,
        x_px: f64,
        y_px: f64,
        options: &ShapeOptions,
    ) -> bool {
        let defaults = self.config.draw.poly;
        self.queue_shape(
            shape,
            color,
            Point::new(x_px, y_px),
            options,
            defaults.filled,
            defaults.thickness,
            defaults.base_font_height,
        )
    }

    /// Queues a `w × h` rectangle (design pixels) with its top-left at `(x_px, y_px)`.
    pub fn draw_rect(
        &mut self,
        color: ColorIndex,
        x_px: f64,
        y_px: f64,
        w: f64,
        h: f64,
        options: &ShapeOptions,
    ) -> bool {
        let defaults = self.config.draw.rect;
        let vertices = rect_vertices(w, h);
        self.queue_shape(
            ShapeRef::Inline(&vertices),
            color,
            Point::new(x_px, y_px),
            options,
            defaults.filled,
            defaults.thickness,
            defaults.base_font_height,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn queue_shape(
        &mut self,
        shape: ShapeRef<'_>,
        color: ColorIndex,
        origin: Point,
        options: &ShapeOptions,
        default_filled: bool,
        default_thickness: f64,
        default_base: Option<f64>,
    ) -> bool {
        let base_override = options.base_font_height.or(default_base);
        let Some((vertices, _)) = self.place_shape(shape, base_override, origin) else {
            debug!("Engine: unknown polygon {:?}", shape);
            return false;
        };
        if vertices.len() < 3 {
            trace!("Engine: ignoring polygon with {} vertices", vertices.len());
            return false;
        }
        if options.filled.unwrap_or(default_filled) {
            self.overlays.push_filled(vertices, color);
        } else {
            let thickness = options.thickness.unwrap_or(default_thickness);
            self.overlays.push_outline(&vertices, color, thickness);
        }
        true
    }

    /// Fills a shape with hatch lines. Spacing, offset and thickness scale with the
    /// shape like its vertices do.
    pub fn draw_pattern_polygon(
        &mut self,
        shape: ShapeRef<'_>,
        color: ColorIndex,
        x_px: f64,
        y_px: f64,
        options: &PatternOptions,
    ) -> bool {
        let defaults = self.config.draw.pattern;
        let base_override = options.base_font_height.or(defaults.base_font_height);
        let origin = Point::new(x_px, y_px);
        let Some((vertices, base)) = self.place_shape(shape, base_override, origin) else {
            debug!("Engine: unknown pattern polygon {:?}", shape);
            return false;
        };
        if vertices.len() < 3 {
            return false;
        }

        let design = design_scale(base, self.cell_height());
        let device = design * self.pixel_scale();
        let spacing = (options.spacing.unwrap_or(defaults.spacing) * device).max(1.0);
        let thickness = (options.thickness.unwrap_or(defaults.thickness) * design).max(0.1);
        let offset = options.offset.unwrap_or(defaults.offset) * device;
        let angle = options.angle_deg.unwrap_or(defaults.angle_deg);

        let (w, h) = self.mapper.window_size_px();
        let visible = Rect::new(0.0, 0.0, w as f64, h as f64);
        let margin = thickness * self.pixel_scale() + 2.0;
        let segments = hatch_segments_within(&vertices, spacing, angle, offset, visible, margin);
        trace!("Engine: pattern fill with {} segments", segments.len());
        for (p1, p2) in segments {
            self.overlays.push_line(p1, p2, color, thickness);
        }
        true
    }

    pub fn draw_pattern_rect(
        &mut self,
        color: ColorIndex,
        x_px: f64,
        y_px: f64,
        w: f64,
        h: f64,
        options: &PatternOptions,
    ) -> bool {
        let vertices = rect_vertices(w, h);
        self.draw_pattern_polygon(ShapeRef::Inline(&vertices), color, x_px, y_px, options)
    }

    /// Outlines the grid rectangle `gw × gh` at `(gx, gy)`, grown by the padding.
    pub fn draw_box(
        &mut self,
        gx: f64,
        gy: f64,
        gw: f64,
        gh: f64,
        color: ColorIndex,
        options: &BoxOptions,
    ) -> bool {
        let defaults = self.config.draw.box_;
        let pad = options.padding.unwrap_or(defaults.padding);
        let thickness = options.thickness.unwrap_or(defaults.thickness);
        let top_left = self.grid_to_px_offset(gx, gy, -pad, -pad);
        let top_right = self.grid_to_px_offset(gx + gw, gy, pad, -pad);
        let bottom_left = self.grid_to_px_offset(gx, gy + gh, -pad, pad);
        let bottom_right = self.grid_to_px_offset(gx + gw, gy + gh, pad, pad);
        self.overlays.push_line(top_left, top_right, color, thickness);
        self.overlays.push_line(bottom_left, bottom_right, color, thickness);
        self.overlays.push_line(top_left, bottom_left, color, thickness);
        self.overlays.push_line(top_right, bottom_right, color, thickness);
        true
    }

    /// Queues text drawn with enlarged glyph pixels at an absolute pixel position.
    ///
    /// With a box, the block is aligned inside it and truncated to whole cells and
    /// lines that fit. Returns `false` for empty text.
    pub fn draw_super_text(
        &mut self,
        x_px: f64,
        y_px: f64,
        color: ColorIndex,
        text: &str,
        options: &SuperTextOptions,
    ) -> bool {
        if text.is_empty() {
            return false;
        }
        let display = self.config.display;
        let ((cell_w, cell_h), scale) = match options.mode {
            SuperTextMode::Fixed5x7 => (FIXED_CELL, 1),
            SuperTextMode::Cell => (
                (display.cell_width as usize, display.cell_height as usize),
                options.scale.max(1),
            ),
        };
        let s = display.pixel_scale.max(1) as i64 * scale as i64;
        let cell_w_px = cell_w as i64 * s;
        let cell_h_px = cell_h as i64 * s;
        let step = options.line_step.max(1) as i64;

        let mut lines = split_lines(text)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let widest = lines.iter().map(|l| measure_line_cells(l)).max().unwrap_or(0) as i64;
        let text_w = widest * cell_w_px;
        let text_h = cell_h_px + (lines.len() as i64 - 1) * step * cell_h_px;

        let mut x = clamp_anchor(x_px);
        let mut y = clamp_anchor(y_px);
        if let Some(box_w) = options.box_w {
            let box_w = box_w.clamp(0.0, ANCHOR_LIMIT_PX) as i64;
            x = align_start(x, box_w, text_w, options.align_h);
            let max_cells = (box_w / cell_w_px.max(1)).max(0) as usize;
            lines = lines
                .iter()
                .map(|l| truncate_line_to_cells(l, max_cells))
                .collect();
        }
        if let Some(box_h) = options.box_h {
            let box_h = box_h.clamp(0.0, ANCHOR_LIMIT_PX) as i64;
            y = align_start(y, box_h, text_h, options.align_v);
            let fit = 1 + (box_h - cell_h_px).div_euclid(step * cell_h_px);
            lines.truncate(fit.max(0) as usize);
        }

        for (idx, line) in lines.iter().enumerate() {
            let line_y = y + idx as i64 * step * cell_h_px;
            let mut col_offset = 0i64;
            for c in line.chars() {
                let c = if c == WIDE_CONTINUATION { ' ' } else { c };
                let wide = is_wide_char(c);
                if let Some(bitmap) = self.glyphs.get(c, wide, cell_h, cell_w, &mut self.fonts) {
                    self.overlays.push(OverlayCommand::SuperText(SuperTextOverlay {
                        x: x + col_offset,
                        y: line_y,
                        bitmap,
                        color,
                        scale: scale as f64,
                    }));
                }
                col_offset += cell_w_px * if wide { 2 } else { 1 };
            }
        }
        true
    }

    // --- Shapes ---

    pub fn polygons(&self) -> &PolygonRegistry {
        &self.shapes
    }

    /// Registers a named shape. The base font height defaults to the current cell height.
    pub fn register_polygon(&mut self, name: &str, vertices: &[Point], base_font_height: Option<f64>) {
        let base = base_font_height.unwrap_or(self.cell_height());
        self.shapes.register(name, vertices, base);
    }

    pub fn register_polygon_transformed(
        &mut self,
        name: &str,
        source: ShapeRef<'_>,
        transform: &Transform,
        base_font_height: Option<f64>,
    ) -> bool {
        let inline_base = self.cell_height();
        self.shapes
            .register_transformed(name, source, transform, base_font_height, inline_base)
    }

    pub fn transform_polygon(&self, shape: ShapeRef<'_>, transform: &Transform) -> Option<Vec<Point>> {
        self.shapes.transform(shape, transform)
    }

    pub fn rescale_polygon(&self, shape: ShapeRef<'_>, scale_x: f64, scale_y: f64) -> Option<Vec<Point>> {
        self.shapes.rescale(shape, scale_x, scale_y)
    }

    pub fn rotate_polygon(&self, shape: ShapeRef<'_>, angle_deg: f64) -> Option<Vec<Point>> {
        self.shapes.rotate(shape, angle_deg)
    }

    // --- Frame lifecycle ---

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the frame counter by `step` (at least 1).
    pub fn next_frame(&mut self, step: u64) -> u64 {
        self.frame += step.max(1);
        self.frame
    }

    /// Advances the frame, drops last frame's overlays and blanks the screen.
    pub fn begin_frame(&mut self) -> u64 {
        self.begin_frame_with(&FrameOptions::default())
    }

    pub fn begin_frame_with(&mut self, options: &FrameOptions) -> u64 {
        if options.advance_frame {
            self.next_frame(1);
        }
        if options.reset_overlays {
            self.overlays.clear();
        }
        self.screen.clear(options.clear_char, options.clear_color);
        trace!("Engine: begin frame {}", self.frame);
        self.frame
    }

    /// Rasterizes the grid, composites it with this frame's overlays and hands the image
    /// to `sink`. The overlay queue is drained whether or not presentation succeeds.
    pub fn finish_frame<S: PixelSink + ?Sized>(&mut self, sink: &mut S) -> Result<u64> {
        let cell_w = self.config.display.cell_width as usize;
        let cell_h = self.config.display.cell_height as usize;
        self.screen.rasterize_into(&mut self.coverage, |c, wide| {
            self.glyphs.get(c, wide, cell_h, cell_w, &mut self.fonts)
        });

        let overlays = self.overlays.take();
        let inputs = CompositeInputs {
            mapper: &self.mapper,
            palette: &self.palette,
            background: self.config.appearance.background,
            screen: &self.screen,
            coverage: &self.coverage,
            overlays: &overlays,
        };
        let image = self.compositor.compose(&inputs);
        sink.present(image)
            .with_context(|| format!("Failed to present frame {}", self.frame))?;
        Ok(self.frame)
    }

    /// The image produced by the last `finish_frame`.
    pub fn framebuffer(&self) -> &Framebuffer {
        self.compositor.framebuffer()
    }

    // --- Dynamic offsets ---

    pub fn dynamic_offsets(&self) -> &DynamicOffsets {
        &self.offsets
    }

    pub fn dynamic_offset(&self, channel: &str) -> f64 {
        self.offsets.get(channel)
    }

    pub fn set_dynamic_offset(&mut self, channel: &str, value: f64, wrap: Option<f64>) -> f64 {
        self.offsets.set(channel, value, wrap)
    }

    pub fn step_dynamic_offset(&mut self, channel: &str, speed: f64, wrap: Option<f64>) -> f64 {
        self.offsets.step(channel, speed, wrap)
    }

    pub fn reset_dynamic_offsets(&mut self, channel: Option<&str>) {
        self.offsets.reset(channel);
    }

    // --- Focus ---

    pub fn focus_graph(&self) -> &FocusGraph {
        &self.focus
    }

    pub fn focus_graph_mut(&mut self) -> &mut FocusGraph {
        &mut self.focus
    }

    pub fn add_focus_node(&mut self, id: &str, rect: Rect, options: NodeOptions) -> bool {
        self.focus.add_node(id, rect, options)
    }

    pub fn update_focus_node(&mut self, id: &str, update: FocusNodeUpdate) -> bool {
        self.focus.update_node(id, update)
    }

    pub fn remove_focus_node(&mut self, id: &str) -> bool {
        self.focus.remove_node(id)
    }

    pub fn set_focus(&mut self, id: &str, activate_scope: bool) -> bool {
        self.focus.set_focus(id, activate_scope)
    }

    pub fn get_focus(&self) -> Option<&str> {
        self.focus.focus()
    }

    pub fn move_focus(&mut self, direction: Direction) -> Option<&str> {
        self.focus.move_focus(direction)
    }

    pub fn add_blocker(&mut self, id: &str, p1: Point, p2: Point, scope: &str, enabled: bool) -> bool {
        self.focus.add_blocker(id, p1, p2, scope, enabled)
    }

    pub fn remove_blocker(&mut self, id: &str) -> bool {
        self.focus.remove_blocker(id)
    }

    pub fn set_active_scope(&mut self, scope: &str, pick_first: bool) -> &str {
        self.focus.set_active_scope(scope, pick_first)
    }

    pub fn get_active_scope(&self) -> &str {
        self.focus.active_scope()
    }

    /// Outlines a focus node (the current one when `id` is `None`), grown by `padding`
    /// device pixels. Missing or unfocusable nodes draw nothing.
    pub fn draw_focus_frame(
        &mut self,
        color: ColorIndex,
        id: Option<&str>,
        padding: f64,
        thickness: f64,
    ) -> bool {
        let Some(id) = id.or(self.focus.focus()) else {
            return false;
        };
        let Some(node) = self.focus.node(id).filter(|n| n.is_focusable()) else {
            return false;
        };
        let r = node.rect.inflate(padding);
        let corners = [
            Point::new(r.x, r.y),
            Point::new(r.x + r.w, r.y),
            Point::new(r.x + r.w, r.y + r.h),
            Point::new(r.x, r.y + r.h),
        ];
        self.overlays.push_outline(&corners, color, thickness);
        true
    }

    /// Queues every enabled blocker of `scope` (default: the active scope) as a line.
    /// Returns how many were drawn.
    pub fn draw_focus_blockers(&mut self, color: ColorIndex, scope: Option<&str>, thickness: f64) -> usize {
        let scope = scope.unwrap_or(self.focus.active_scope()).to_string();
        let mut count = 0;
        for blocker in self.focus.blockers(Some(scope.as_str())) {
            if blocker.enabled {
                self.overlays.push_line(blocker.p1, blocker.p2, color, thickness);
                count += 1;
            }
        }
        count
    }
}

/// Rounds a pixel anchor and keeps it far enough from the `i64` limits that glyph
/// offsets added to it cannot overflow. NaN becomes 0.
fn clamp_anchor(v: f64) -> i64 {
    v.round().clamp(-ANCHOR_LIMIT_PX, ANCHOR_LIMIT_PX) as i64
}

fn rect_vertices(w: f64, h: f64) -> [Point; 4] {
    [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ]
}
