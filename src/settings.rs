//! Tuning for the effect registry and character locomotion
//!
//! Loaded from a JSON file; every field falls back to its default when absent.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters for sizing an effect to its target's footprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeParams {
    /// Scale applied to the average horizontal extent
    pub multiplier: f32,
    /// Smallest effect size
    pub min_size: f32,
    /// Largest effect size
    pub max_size: f32,
    /// Added to the computed effect position
    pub offset: Vec3,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            min_size: 0.1,
            max_size: 15.0,
            offset: Vec3::ZERO,
        }
    }
}

impl ResizeParams {
    /// Default sizing with a position offset
    pub fn with_offset(offset: Vec3) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Non-negative sizes with `min_size <= max_size`
    pub fn clamped(mut self) -> Self {
        self.multiplier = self.multiplier.max(0.0);
        self.min_size = self.min_size.max(0.0);
        self.max_size = self.max_size.max(self.min_size);
        self
    }
}

/// Ripple effect tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Seconds between color rotations (shared by every target)
    pub color_switch_interval: f32,
    /// Size multiplier for primary (player) targets
    pub primary_size_factor: f32,
    /// Sizing used for non-primary targets
    pub resize: ResizeParams,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            color_switch_interval: 0.5,
            primary_size_factor: 7.0,
            resize: ResizeParams::default(),
        }
    }
}

impl EffectSettings {
    /// Bring values into their supported ranges
    pub fn clamped(mut self) -> Self {
        self.color_switch_interval = self.color_switch_interval.max(0.0);
        self.primary_size_factor = self.primary_size_factor.max(0.0);
        self.resize = self.resize.clamped();
        self
    }
}

/// Upper bound for `LocomotionSettings::blink_cycles`
pub const MAX_BLINK_CYCLES: u32 = 100;

/// Character locomotion tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionSettings {
    // === Movement ===
    /// Base horizontal speed (units/s)
    pub movement_speed: f32,
    /// Extra displacement per second applied while running
    pub run_multiplier: f32,
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    /// Peak height of a jump
    pub jump_height: f32,

    // === Facing ===
    /// Time to turn toward a new movement direction
    pub smooth_time: f32,
    /// Added to the computed heading (degrees) to match the model's forward axis
    pub heading_offset: f32,

    // === Animation ===
    /// Rate the run layer weight eases toward its target (per second)
    pub run_transition_speed: f32,

    // === Stability ===
    /// Directions sampled around the character
    pub stability_samples: u32,
    /// Sample distance as a multiple of the character radius
    pub check_distance_factor: f32,

    // === Recovery ===
    /// Seconds spent travelling back to the last stable position
    pub recovery_window: f32,
    /// Hide/show cycles while recovering
    pub blink_cycles: u32,
    /// Seconds per hide or show phase
    pub blink_interval: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            movement_speed: 5.0,
            run_multiplier: 5.0,
            gravity: -9.81,
            jump_height: 1.5,
            smooth_time: 0.1,
            heading_offset: 0.0,
            run_transition_speed: 3.0,
            stability_samples: 20,
            check_distance_factor: 10.0,
            recovery_window: 1.0,
            blink_cycles: 5,
            blink_interval: 0.1,
        }
    }
}

impl LocomotionSettings {
    /// Bring values into their supported ranges
    pub fn clamped(mut self) -> Self {
        self.movement_speed = self.movement_speed.clamp(1.0, 20.0);
        self.run_multiplier = self.run_multiplier.clamp(1.0, 20.0);
        self.jump_height = self.jump_height.clamp(0.0, 3.0);
        self.smooth_time = self.smooth_time.clamp(0.0, 0.1);
        self.stability_samples = self.stability_samples.max(1);
        self.recovery_window = self.recovery_window.max(0.0);
        self.blink_cycles = self.blink_cycles.min(MAX_BLINK_CYCLES);
        self.blink_interval = self.blink_interval.max(0.0);
        self
    }

    /// Initial vertical velocity that reaches `jump_height` under `gravity`
    pub fn jump_velocity(&self) -> f32 {
        (self.jump_height * -2.0 * self.gravity).max(0.0).sqrt()
    }
}

/// All tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub effects: EffectSettings,
    pub locomotion: LocomotionSettings,
}

/// Failure to load settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// File could not be read
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    /// File was not valid settings JSON
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Settings {
    /// Parse settings from JSON, clamping out-of-range values
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.effects = settings.effects.clamped();
        settings.locomotion = settings.locomotion.clamped();
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{e} ({}), using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "locomotion": { "jump_height": 2.0 } }"#).unwrap();
        assert_eq!(settings.locomotion.jump_height, 2.0);
        assert_eq!(settings.locomotion.stability_samples, 20);
        assert_eq!(settings.effects, EffectSettings::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings =
            Settings::from_json(r#"{ "locomotion": { "movement_speed": 50.0, "jump_height": -1.0 } }"#)
                .unwrap();
        assert_eq!(settings.locomotion.movement_speed, 20.0);
        assert_eq!(settings.locomotion.jump_height, 0.0);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
        assert!(err.to_string().starts_with("invalid settings JSON: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load("/nonexistent/ripple-stride.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
        assert!(err.to_string().starts_with("failed to read settings: "));
    }

    #[test]
    fn test_blink_cycles_are_bounded() {
        let settings = Settings::from_json(r#"{ "locomotion": { "blink_cycles": 4294967295 } }"#).unwrap();
        assert_eq!(settings.locomotion.blink_cycles, MAX_BLINK_CYCLES);
    }

    #[test]
    fn test_effect_values_are_clamped() {
        let settings = Settings::from_json(
            r#"{ "effects": { "color_switch_interval": -1.0,
                 "resize": { "multiplier": -2.0, "min_size": 5.0, "max_size": 1.0 } } }"#,
        )
        .unwrap();
        let effects = settings.effects;
        assert_eq!(effects.color_switch_interval, 0.0);
        assert_eq!(effects.resize.multiplier, 0.0);
        assert_eq!(effects.resize.min_size, 5.0);
        assert_eq!(effects.resize.max_size, 5.0);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load_or_default("/nonexistent/ripple-stride.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_jump_velocity() {
        let loco = LocomotionSettings {
            jump_height: 2.0,
            gravity: -9.81,
            ..Default::default()
        };
        assert!((loco.jump_velocity() - 6.264).abs() < 1e-3);
    }
}
