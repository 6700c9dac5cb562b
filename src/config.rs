// src/config.rs

//! Configuration structures for the engine.
//!
//! Everything deserializes from JSON with `#[serde(default)]` on every struct, so a
//! partial document only overrides the fields it names. Values are never rejected for
//! being out of range: `DisplayConfig::sanitized` clamps them to safe minimums instead.

use crate::color::{LayoutMode, Rgba};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

// --- Top-Level Configuration Structure ---

/// Root configuration for an engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Grid geometry.
    pub display: DisplayConfig,
    /// Background, fonts and layout-mode colors.
    pub appearance: AppearanceConfig,
    /// Per-category defaults for drawing calls.
    pub draw: DrawDefaults,
}

impl Config {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).context("Failed to parse engine configuration JSON")?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        info!("Config: loaded {}", path.display());
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize engine configuration")
    }
}

// --- Display Configuration ---

/// Grid geometry: the only values the coordinate mapper and screen buffer depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub rows: u32,
    pub cols: u32,
    /// Glyph cell width in design pixels.
    pub cell_width: u32,
    /// Glyph cell height in design pixels. Also the "current font height" that
    /// polygon shapes scale against.
    pub cell_height: u32,
    /// Horizontal gap between cells.
    pub spacing_x: u32,
    /// Vertical gap between rows.
    pub spacing_y: u32,
    /// Outer border on every side.
    pub padding: u32,
    /// Integer device-pixel multiplier.
    pub pixel_scale: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            rows: 40,
            cols: 80,
            cell_width: 8,
            cell_height: 16,
            spacing_x: 1,
            spacing_y: 1,
            padding: 10,
            pixel_scale: 1,
        }
    }
}

impl DisplayConfig {
    /// Returns a copy with rows, columns, cell dimensions and pixel scale clamped to at least 1.
    pub fn sanitized(&self) -> Self {
        let clamped = DisplayConfig {
            rows: self.rows.max(1),
            cols: self.cols.max(1),
            cell_width: self.cell_width.max(1),
            cell_height: self.cell_height.max(1),
            spacing_x: self.spacing_x,
            spacing_y: self.spacing_y,
            padding: self.padding,
            pixel_scale: self.pixel_scale.max(1),
        };
        if clamped != *self {
            warn!("DisplayConfig: clamped {:?} to {:?}", self, clamped);
        }
        clamped
    }
}

// --- Appearance Configuration ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Window clear color.
    pub background: Rgba,
    pub font: FontConfig,
    pub layout_mode: LayoutMode,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            background: Rgba::opaque(10, 10, 10),
            font: FontConfig::default(),
            layout_mode: LayoutMode::default(),
        }
    }
}

/// Font selection handed to the `FontDriver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font used for narrow glyphs.
    pub narrow: String,
    /// Font used for double-width glyphs. Falls back to `narrow`.
    pub wide: Option<String>,
    /// Render size in pixels. Defaults to the cell height.
    pub size_px: Option<f64>,
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            narrow: "monospace".to_string(),
            wide: None,
            size_px: None,
        }
    }
}

// --- Draw Defaults ---

/// Defaults for every drawing category. Per-call option structs override individual
/// fields by setting them to `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DrawDefaults {
    pub poly: ShapeDefaults,
    pub rect: ShapeDefaults,
    pub pattern: PatternDefaults,
    #[serde(rename = "box")]
    pub box_: BoxDefaults,
    pub ani: AniDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDefaults {
    pub filled: bool,
    pub thickness: f64,
    /// Reference font height for inline vertices. `None` means the current cell height.
    pub base_font_height: Option<f64>,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        ShapeDefaults {
            filled: true,
            thickness: 1.0,
            base_font_height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternDefaults {
    pub spacing: f64,
    pub angle_deg: f64,
    pub thickness: f64,
    pub offset: f64,
    pub base_font_height: Option<f64>,
}

impl Default for PatternDefaults {
    fn default() -> Self {
        PatternDefaults {
            spacing: 4.0,
            angle_deg: 45.0,
            thickness: 1.0,
            offset: 0.0,
            base_font_height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDefaults {
    pub padding: f64,
    pub thickness: f64,
}

impl Default for BoxDefaults {
    fn default() -> Self {
        BoxDefaults {
            padding: 0.0,
            thickness: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AniDefaults {
    pub local_offset: i64,
    pub global_offset: i64,
    pub slowdown: u32,
}

impl Default for AniDefaults {
    fn default() -> Self {
        AniDefaults {
            local_offset: 0,
            global_offset: 0,
            slowdown: 1,
        }
    }
}
