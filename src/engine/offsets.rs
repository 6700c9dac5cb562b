// src/engine/offsets.rs

//! Named scalar channels for scrolling and animation offsets.

use log::trace;
use std::collections::HashMap;

pub const DEFAULT_CHANNEL: &str = "default";

/// Float values keyed by channel name. The `default` channel always exists.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicOffsets {
    channels: HashMap<String, f64>,
}

impl Default for DynamicOffsets {
    fn default() -> Self {
        let mut channels = HashMap::new();
        channels.insert(DEFAULT_CHANNEL.to_string(), 0.0);
        DynamicOffsets { channels }
    }
}

impl DynamicOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, 0 for a channel that was never set.
    pub fn get(&self, channel: &str) -> f64 {
        self.channels.get(channel).copied().unwrap_or(0.0)
    }

    /// Stores `value`, reduced into `[0, wrap)` when `wrap` is positive.
    pub fn set(&mut self, channel: &str, value: f64, wrap: Option<f64>) -> f64 {
        let value = match wrap {
            Some(w) if w > 0.0 => value.rem_euclid(w),
            _ => value,
        };
        trace!("DynamicOffsets: '{}' = {}", channel, value);
        self.channels.insert(channel.to_string(), value);
        value
    }

    /// Adds `speed` to the channel and returns the new value.
    pub fn step(&mut self, channel: &str, speed: f64, wrap: Option<f64>) -> f64 {
        let current = self.get(channel);
        self.set(channel, current + speed, wrap)
    }

    /// Resets one channel (or all of them with `None`) to the defaults.
    pub fn reset(&mut self, channel: Option<&str>) {
        match channel {
            None => *self = DynamicOffsets::default(),
            Some(DEFAULT_CHANNEL) => {
                self.channels.insert(DEFAULT_CHANNEL.to_string(), 0.0);
            }
            Some(name) => {
                self.channels.remove(name);
            }
        }
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_wraps_into_range() {
        let mut offsets = DynamicOffsets::new();
        assert_relative_eq!(offsets.set("scroll", 12.5, Some(10.0)), 2.5);
        assert_relative_eq!(offsets.set("scroll", -1.0, Some(10.0)), 9.0);
        assert_relative_eq!(offsets.set("scroll", -1.0, Some(0.0)), -1.0);
        assert_relative_eq!(offsets.set("scroll", 42.0, None), 42.0);
    }

    #[test]
    fn step_accumulates() {
        let mut offsets = DynamicOffsets::new();
        offsets.step("x", 3.0, None);
        offsets.step("x", 3.0, Some(5.0));
        assert_relative_eq!(offsets.get("x"), 1.0);
        assert_relative_eq!(offsets.get("never"), 0.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut offsets = DynamicOffsets::new();
        offsets.set(DEFAULT_CHANNEL, 4.0, None);
        offsets.set("a", 1.0, None);
        offsets.set("b", 2.0, None);

        offsets.reset(Some("a"));
        assert!(!offsets.contains("a"));
        offsets.reset(Some(DEFAULT_CHANNEL));
        assert_relative_eq!(offsets.get(DEFAULT_CHANNEL), 0.0);
        assert!(offsets.contains(DEFAULT_CHANNEL));

        offsets.reset(None);
        assert!(!offsets.contains("b"));
        assert!(offsets.contains(DEFAULT_CHANNEL));
    }
}
