// src/engine/options.rs

//! Per-call overrides for drawing calls. A `None` field falls back to the engine's
//! draw defaults for that category.

use crate::color::ColorIndex;
use crate::text::{Align, Orientation};

/// Overrides for `draw_polygon` and `draw_rect`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeOptions {
    pub filled: Option<bool>,
    pub thickness: Option<f64>,
    /// Font height the vertices were authored against.
    pub base_font_height: Option<f64>,
}

impl ShapeOptions {
    pub fn outline(thickness: f64) -> Self {
        ShapeOptions {
            filled: Some(false),
            thickness: Some(thickness),
            base_font_height: None,
        }
    }

    pub fn filled() -> Self {
        ShapeOptions {
            filled: Some(true),
            ..ShapeOptions::default()
        }
    }
}

/// Overrides for the hatch-fill calls. Spacing, thickness and offset are in design pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PatternOptions {
    pub spacing: Option<f64>,
    pub angle_deg: Option<f64>,
    pub thickness: Option<f64>,
    pub offset: Option<f64>,
    pub base_font_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxOptions {
    /// Design pixels added around the grid rectangle.
    pub padding: Option<f64>,
    pub thickness: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AniOptions {
    pub local_offset: Option<i64>,
    pub global_offset: Option<i64>,
    pub slowdown: Option<u32>,
}

/// Glyph cell used by super text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuperTextMode {
    /// The configured cell size, multiplied by `scale`.
    #[default]
    Cell,
    /// A fixed 5×7 cell at scale 1.
    Fixed5x7,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTextOptions {
    /// Integer multiple of the cell size; 0 is treated as 1.
    pub scale: u32,
    pub mode: SuperTextMode,
    pub align_h: Align,
    pub align_v: Align,
    /// Device-pixel box the text is aligned in and truncated to.
    pub box_w: Option<f64>,
    pub box_h: Option<f64>,
    pub line_step: usize,
}

impl Default for SuperTextOptions {
    fn default() -> Self {
        SuperTextOptions {
            scale: 1,
            mode: SuperTextMode::Cell,
            align_h: Align::Start,
            align_v: Align::Start,
            box_w: None,
            box_h: None,
            line_step: 1,
        }
    }
}

impl SuperTextOptions {
    pub fn scaled(scale: u32) -> Self {
        SuperTextOptions {
            scale,
            ..SuperTextOptions::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBoxOptions {
    pub align_h: Align,
    pub align_v: Align,
    pub orientation: Orientation,
    pub line_step: usize,
}

impl Default for TextBoxOptions {
    fn default() -> Self {
        TextBoxOptions {
            align_h: Align::Start,
            align_v: Align::Start,
            orientation: Orientation::Horizontal,
            line_step: 1,
        }
    }
}

/// What `begin_frame_with` does before drawing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    pub clear_char: char,
    pub clear_color: ColorIndex,
    pub reset_overlays: bool,
    pub advance_frame: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        FrameOptions {
            clear_char: ' ',
            clear_color: ColorIndex(0),
            reset_overlays: true,
            advance_frame: true,
        }
    }
}
