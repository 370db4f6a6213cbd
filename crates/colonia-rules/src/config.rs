//! Game configuration: which ruleset to play, with which seed, for how long.
//!
//! The configuration lives in a small YAML file (by default `colonia.yaml`
//! at the project root). Every field has a default, so an empty file, or no
//! file at all, yields a playable configuration. Option overrides are
//! applied on top of the ruleset's own `options` section before the
//! ruleset is frozen.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RulesError;
use crate::ruleset::{Options, Ruleset, ShortfallPolicy};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "COLONIA_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "colonia.yaml";

/// Top-level game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of turns the engine plays.
    #[serde(default = "default_turns")]
    pub turns: u32,

    /// Ruleset file; the bundled classic ruleset when absent.
    #[serde(default)]
    pub ruleset: Option<PathBuf>,

    /// Map dimensions.
    #[serde(default)]
    pub map: MapConfig,

    /// Overrides for the ruleset's global options.
    #[serde(default)]
    pub options: OptionOverrides,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            turns: default_turns(),
            ruleset: None,
            map: MapConfig::default(),
            options: OptionOverrides::default(),
        }
    }
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, RulesError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.map.validate()?;
        Ok(config)
    }

    /// Path of the configuration file: `COLONIA_CONFIG`, else `colonia.yaml`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Load the configured ruleset and apply the option overrides.
    pub fn load_ruleset(&self) -> Result<Ruleset, RulesError> {
        let ruleset = match &self.ruleset {
            Some(path) => Ruleset::from_file(path)?,
            None => Ruleset::classic()?,
        };
        let options = self.options.apply(ruleset.options());
        Ok(ruleset.with_options(options))
    }
}

/// Map dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MapConfig {
    /// Width in tiles.
    #[serde(default = "default_map_width")]
    pub width: u32,

    /// Height in tiles.
    #[serde(default = "default_map_height")]
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_width(),
            height: default_map_height(),
        }
    }
}

impl MapConfig {
    fn validate(self) -> Result<(), RulesError> {
        if self.width < MIN_MAP_SIDE || self.height < MIN_MAP_SIDE {
            return Err(RulesError::InvalidValue {
                context: String::from("map"),
                reason: format!(
                    "map must be at least {MIN_MAP_SIDE}x{MIN_MAP_SIDE}, got {}x{}",
                    self.width, self.height
                ),
            });
        }
        Ok(())
    }
}

/// Smallest accepted map side.
const MIN_MAP_SIDE: u32 = 4;

/// Optional replacements for the ruleset's `options` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OptionOverrides {
    /// Replaces `natural_disaster_pct`.
    #[serde(default)]
    pub natural_disaster_pct: Option<u32>,

    /// Replaces `tension_decay`.
    #[serde(default)]
    pub tension_decay: Option<i32>,

    /// Replaces `shortfall_policy`.
    #[serde(default)]
    pub shortfall_policy: Option<ShortfallPolicy>,
}

impl OptionOverrides {
    /// `options` with every set override applied.
    pub fn apply(&self, options: &Options) -> Options {
        Options {
            natural_disaster_pct: self
                .natural_disaster_pct
                .unwrap_or(options.natural_disaster_pct)
                .min(100),
            tension_decay: self.tension_decay.unwrap_or(options.tension_decay).max(0),
            shortfall_policy: self.shortfall_policy.unwrap_or(options.shortfall_policy),
            ..options.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    1492
}

const fn default_turns() -> u32 {
    20
}

const fn default_map_width() -> u32 {
    16
}

const fn default_map_height() -> u32 {
    12
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = GameConfig::parse("").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.turns, 20);
        assert!(config.ruleset.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = GameConfig::parse("seed: 7\nmap:\n  width: 30\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.map.width, 30);
        assert_eq!(config.map.height, 12);
    }

    #[test]
    fn tiny_map_is_rejected() {
        assert!(matches!(
            GameConfig::parse("map:\n  width: 2\n"),
            Err(RulesError::InvalidValue { .. })
        ));
    }

    #[test]
    fn overrides_replace_ruleset_options() {
        let config = GameConfig::parse(
            "options:\n  natural_disaster_pct: 0\n  shortfall_policy: strict\n",
        )
        .unwrap();
        let rules = config.load_ruleset().unwrap();
        assert_eq!(rules.options().natural_disaster_pct, 0);
        assert_eq!(rules.options().shortfall_policy, ShortfallPolicy::Strict);
        assert_eq!(rules.options().tension_decay, Options::default().tension_decay);
    }
}
