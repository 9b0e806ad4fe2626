//! Tunable parameters of a game session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse game configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value was outside its accepted range.
    #[error("invalid game configuration: {0}")]
    Invalid(String),
}

/// Knobs controlling grid geometry, motion and item generation.
///
/// Every field has a default, so a TOML document only needs to name the
/// values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a cell in pixels.
    pub square_size: u32,
    /// Pixels a settling item falls per tick.
    pub fall_step: f32,
    /// Pixels a spray particle travels per tick.
    pub spray_speed: f32,
    /// Seed of the item generator.
    pub seed: u64,
    /// Probability that a generated item is a preservative.
    pub preservative_ratio: f64,
    /// Fall speed of the first controlled pair, in pixels per tick.
    pub base_fall_speed: f32,
    /// Fall speed added for every spawned pair.
    pub fall_acceleration: f32,
    /// Upper bound of the controlled pair's fall speed.
    pub max_fall_speed: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: 8,
            rows: 12,
            square_size: 32,
            fall_step: 8.0,
            spray_speed: 3.0,
            seed: 0x6d69_6b61_6e00_0001,
            preservative_ratio: 0.1,
            base_fall_speed: 2.0,
            fall_acceleration: 0.05,
            max_fall_speed: 16.0,
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the ranges the grid constructor does not cover.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns < 2 || self.rows < 2 {
            return Err(ConfigError::Invalid(format!(
                "the grid must be at least 2x2 to hold a pair (got {}x{})",
                self.columns, self.rows
            )));
        }
        if !(0.0..=1.0).contains(&self.preservative_ratio) {
            return Err(ConfigError::Invalid(format!(
                "preservative_ratio must lie in [0, 1] (got {})",
                self.preservative_ratio
            )));
        }
        for (name, value) in [
            ("fall_step", self.fall_step),
            ("spray_speed", self.spray_speed),
            ("base_fall_speed", self.base_fall_speed),
            ("max_fall_speed", self.max_fall_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive (got {value})"
                )));
            }
        }
        if !self.fall_acceleration.is_finite() || self.fall_acceleration < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fall_acceleration must not be negative (got {})",
                self.fall_acceleration
            )));
        }
        Ok(())
    }
}
