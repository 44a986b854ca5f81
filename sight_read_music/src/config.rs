// Data-driven generator configuration.
//
// The musical tables (keys, meters, palettes, progressions) are fixed in
// tables.rs. What lives here are the knobs a deployment may want to tune
// without recompiling: the highest level offered, default bar layout, how
// eagerly dynamics are sprinkled, and the engraving layout directives written
// into the score header. `GeneratorConfig::default()` reproduces the stock
// behaviour; a JSON file may override any subset of fields.
//
// See also: `exercise.rs`, which reads the config for every generation, and
// `score.rs` for the dynamics and layout consumers.

use crate::error::ConfigError;
use crate::tables::Level;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How dynamic markings are placed on the melody.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// When false, no markings are written at all.
    pub enabled: bool,
    /// Chance of a different dynamic halfway through the piece.
    pub mid_change_probability: f64,
    /// Chance of one crescendo or diminuendo hairpin.
    pub hairpin_probability: f64,
    /// Pieces shorter than this get only the opening dynamic. Values below
    /// four are treated as four.
    pub min_bars_for_changes: usize,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        DynamicsConfig {
            enabled: true,
            mid_change_probability: 0.5,
            hairpin_probability: 0.4,
            min_bars_for_changes: 4,
        }
    }
}

/// Engraving hints written as `%%` directives. `None` omits the directive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub staff_separation: Option<u32>,
    pub music_space: Option<u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            staff_separation: Some(26),
            music_space: Some(6),
        }
    }
}

/// Top-level generator configuration. Loaded once, never mutated by
/// generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Highest level a request may ask for; higher requests are clamped.
    pub max_level: u8,
    /// Bars used when a request does not say.
    pub default_bars: usize,
    /// Bars per system used when a request does not say.
    pub default_bars_per_line: usize,
    pub dynamics: DynamicsConfig,
    pub layout: LayoutConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_level: Level::MAX.get(),
            default_bars: 8,
            default_bars_per_line: 4,
            dynamics: DynamicsConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded generator config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Level::MIN.get()..=Level::MAX.get()).contains(&self.max_level) {
            return Err(ConfigError::Invalid(format!(
                "max_level must be between {} and {}, got {}",
                Level::MIN.get(),
                Level::MAX.get(),
                self.max_level
            )));
        }
        if self.default_bars == 0 || self.default_bars_per_line == 0 {
            return Err(ConfigError::Invalid(
                "default_bars and default_bars_per_line must be at least 1".to_string(),
            ));
        }
        for (name, p) in [
            ("mid_change_probability", self.dynamics.mid_change_probability),
            ("hairpin_probability", self.dynamics.hairpin_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "dynamics.{name} must be in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}
