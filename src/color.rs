// src/color.rs

//! Color identity (`ColorIndex`) and the 256-entry HSV palette it resolves through.
//!
//! Cells and overlays only ever carry a `ColorIndex`. The final RGB value is looked up
//! in the `Palette` at composite time, which keeps palette remapping (themes, layout
//! mode) a pure data-table change.

use log::{debug, trace};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index into the 256-entry palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorIndex(pub u8);

impl ColorIndex {
    pub const CRT_GREEN: ColorIndex = ColorIndex(201);
    pub const AMBER: ColorIndex = ColorIndex(202);
    pub const CRT_CYAN: ColorIndex = ColorIndex(203);
    /// Fallback for unknown palette names.
    pub const WHITE: ColorIndex = ColorIndex(204);
    pub const BLACK: ColorIndex = ColorIndex(205);
}

impl From<u8> for ColorIndex {
    fn from(idx: u8) -> Self {
        ColorIndex(idx)
    }
}

/// RGBA color in 32-bit format (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to RGBA byte array
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Converts HSV (all components in `0.0..=1.0`) to RGB bytes, truncating each channel.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgba {
    let to_byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
    if s == 0.0 {
        let c = to_byte(v);
        return Rgba::opaque(c, c, c);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgba::opaque(to_byte(r), to_byte(g), to_byte(b))
}

/// One palette slot: HSV components plus a lookup name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
    pub name: String,
}

impl PaletteEntry {
    pub fn new(hue: f64, saturation: f64, value: f64, name: impl Into<String>) -> Self {
        Self {
            hue,
            saturation,
            value,
            name: name.into(),
        }
    }
}

/// Fixed colors used while layout mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMode {
    pub enabled: bool,
    pub background: Rgba,
    pub foreground: Rgba,
}

impl Default for LayoutMode {
    fn default() -> Self {
        LayoutMode {
            enabled: false,
            background: Rgba::opaque(200, 190, 180),
            foreground: Rgba::opaque(130, 159, 23),
        }
    }
}

static DEFAULT_PALETTE: Lazy<Palette> = Lazy::new(|| Palette::from_entries(default_entries()));

/// Rounds to two decimals, as the blink ramps are specified.
fn ramp_value(step: usize) -> f64 {
    ((1.0 - step as f64 / 15.0) * 100.0).round() / 100.0
}

fn default_entries() -> Vec<PaletteEntry> {
    let mut entries = Vec::with_capacity(256);
    // Three 16-step blink ramps: green, cyan, amber.
    for (base, hue) in [(0usize, 0.3), (16, 0.5), (32, 0.1)] {
        for step in 0..16 {
            entries.push(PaletteEntry::new(hue, 1.0, ramp_value(step), format!("blink{}", base + step)));
        }
    }
    for i in 48..200 {
        entries.push(PaletteEntry::new(1.0, 1.0, 1.0, format!("res{}", i)));
    }
    for i in 200..256 {
        entries.push(PaletteEntry::new(1.0, 1.0, 1.0, format!("stat{}", i)));
    }

    let named = [
        (201, 0.3, 1.0, 0.9, "CRT_Green"),
        (202, 0.14, 1.0, 0.9, "Electroluminescent_Amber"),
        (203, 0.5, 1.0, 0.8, "CRT_Cyan"),
        (204, 0.0, 0.0, 1.0, "White"),
        (205, 0.0, 0.0, 0.0, "Black"),
        (211, 0.92, 1.0, 1.0, "neon_pink"),
        (212, 0.58, 1.0, 1.0, "neon_blue"),
        (213, 0.3, 1.0, 1.0, "neon_green"),
        (214, 0.08, 1.0, 1.0, "neon_yellow"),
        (215, 0.8, 1.0, 1.0, "neon_violet"),
    ];
    for (idx, h, s, v, name) in named {
        entries[idx] = PaletteEntry::new(h, s, v, name);
    }
    entries
}

/// The 256-slot palette with its derived RGB table and name index.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    rgb: Vec<Rgba>,
    names: HashMap<String, ColorIndex>,
    layout_mode: LayoutMode,
}

impl Default for Palette {
    fn default() -> Self {
        DEFAULT_PALETTE.clone()
    }
}

impl Palette {
    fn from_entries(entries: Vec<PaletteEntry>) -> Self {
        let mut palette = Palette {
            entries,
            rgb: Vec::new(),
            names: HashMap::new(),
            layout_mode: LayoutMode::default(),
        };
        palette.refresh();
        palette
    }

    /// Rebuilds the RGB table and the name index from the HSV entries.
    fn refresh(&mut self) {
        self.rgb = self
            .entries
            .iter()
            .map(|e| hsv_to_rgb(e.hue, e.saturation, e.value))
            .collect();
        self.names = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), ColorIndex(i as u8)))
            .collect();
        debug!("Palette: refreshed {} entries", self.entries.len());
    }

    pub fn entry(&self, idx: ColorIndex) -> &PaletteEntry {
        &self.entries[idx.0 as usize]
    }

    /// Replaces one slot and rebuilds the lookup tables.
    pub fn set_entry(&mut self, idx: ColorIndex, entry: PaletteEntry) {
        trace!("Palette: slot {} -> {:?}", idx.0, entry);
        self.entries[idx.0 as usize] = entry;
        self.refresh();
    }

    pub fn lookup(&self, name: &str) -> Option<ColorIndex> {
        self.names.get(name).copied()
    }

    /// Name lookup falling back to `White` for unknown names.
    pub fn named(&self, name: &str) -> ColorIndex {
        self.lookup(name).unwrap_or(ColorIndex::WHITE)
    }

    /// The palette color, ignoring layout mode.
    pub fn rgb(&self, idx: ColorIndex) -> Rgba {
        self.rgb[idx.0 as usize]
    }

    /// The color a cell or overlay is actually painted with.
    pub fn resolve(&self, idx: ColorIndex) -> Rgba {
        if self.layout_mode.enabled {
            return self.layout_mode.foreground;
        }
        self.rgb(idx)
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.layout_mode = mode;
    }
}
