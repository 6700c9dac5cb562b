//! Phosphor library crate.
//!
//! A character-grid compositor for retro instrument dashboards: a palette-indexed text
//! grid, per-frame vector overlays (polygons, hatch fills, lines, enlarged text) and a
//! spatial focus graph, composited into an RGBA framebuffer once per frame.
//!
//! The [`Engine`] is the entry point. Fonts are reached through the
//! [`FontDriver`](rasterizer::FontDriver) trait and finished frames leave through a
//! [`PixelSink`](compositor::PixelSink); the crate itself owns no window or font files.

pub mod color;
pub mod compositor;
pub mod config;
pub mod coords;
pub mod engine;
pub mod focus;
pub mod geometry;
pub mod glyph;
pub mod hatch;
pub mod overlay;
pub mod polygon;
pub mod rasterizer;
pub mod screen;
pub mod text;

pub use color::{ColorIndex, LayoutMode, Palette, Rgba};
pub use compositor::{FrameCapture, Framebuffer, PixelSink};
pub use config::{Config, DisplayConfig};
pub use engine::{manifest, require_api_level, Engine, EngineError, EngineManifest, API_LEVEL};
pub use focus::{Direction, FocusGraph, NodeOptions};
pub use geometry::{Point, Rect};
pub use polygon::{ShapeRef, Transform};
