//! Configuration system.
//!
//! Loads engine configuration from JSON strings/files.

use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::physics::PhysicsConfig;

/// Root engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window title.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Render on a second task instead of after every update.
    #[serde(default)]
    pub multithreaded: bool,
    /// Enables debug-only rendering (physics shapes).
    #[serde(default)]
    pub debug: bool,
    /// Fixed physics rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Upper bound on fixed steps per frame; time beyond it is discarded.
    #[serde(default = "default_max_steps")]
    pub max_steps_per_frame: u32,
    /// Pause between frames of the render task.
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
    /// Visual units per physics unit.
    #[serde(default = "default_pixels_per_meter")]
    pub pixels_per_meter: f32,
    #[serde(default)]
    pub physics: PhysicsConfig,
}

fn default_title() -> String {
    "tempo".to_string()
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_tick_hz() -> u32 {
    60
}

fn default_max_steps() -> u32 {
    5
}

fn default_render_interval_ms() -> u64 {
    3
}

fn default_pixels_per_meter() -> f32 {
    100.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            multithreaded: false,
            debug: false,
            tick_hz: default_tick_hz(),
            max_steps_per_frame: default_max_steps(),
            render_interval_ms: default_render_interval_ms(),
            pixels_per_meter: default_pixels_per_meter(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = Self::from_json_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        info!(path = %path.display(), "Loaded engine config");
        Ok(cfg)
    }

    /// Length of one fixed step in seconds.
    pub fn fixed_step(&self) -> f64 {
        1.0 / f64::from(self.tick_hz)
    }

    /// Rejects values the loop cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.tick_hz > 0, "tick_hz must be positive");
        ensure!(
            self.max_steps_per_frame > 0,
            "max_steps_per_frame must be positive"
        );
        ensure!(
            self.pixels_per_meter.is_finite() && self.pixels_per_meter > 0.0,
            "pixels_per_meter must be a positive finite number, got {}",
            self.pixels_per_meter
        );
        ensure!(
            self.physics.gravity.is_finite(),
            "gravity must be finite"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = EngineConfig::from_json_str(r#"{ "multithreaded": true }"#).unwrap();
        assert!(cfg.multithreaded);
        assert_eq!(cfg.tick_hz, 60);
        assert_eq!(cfg.max_steps_per_frame, 5);
        assert_eq!(cfg.physics.velocity_iterations, 8);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_scale() {
        let cfg = EngineConfig {
            pixels_per_meter: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig {
            tick_hz: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
