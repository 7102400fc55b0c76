//! Layered configuration for consonance scoring and fitting.
//!
//! The scoring and fitting functions in `consonance` take their options as
//! plain arguments. This crate lets a caller keep those options in TOML files
//! and environment variables instead of hard-coding them.
//!
//! # Usage
//!
//! ```rust,no_run
//! use consonance_conf::ConsonanceConfig;
//!
//! let config = ConsonanceConfig::load().expect("Failed to load config");
//!
//! let options = config.fitting.options();
//! println!("fitting {} weights, excluding {:?}", options.space, options.exclude);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/consonance/config.toml` (system)
//! 2. `~/.config/consonance/config.toml` (user)
//! 3. `./consonance.toml` (local override)
//! 4. Environment variables (`CONSONANCE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [scoring]
//! space = "interval"
//! agg_method = "type"
//!
//! [fitting]
//! space = "interval_class"
//! agg_method = "sum"
//! exclude = [6]
//! singular_tolerance = 1e-10
//! ```

pub mod loader;

pub use loader::{
    discover_config_files_with_override, ConfigSources, PartialConfig, PartialFitting,
    PartialScoring,
};

use consonance::{AggMethod, FitOptions, IntervalSpace, DEFAULT_SINGULAR_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Options for scoring chords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub space: IntervalSpace,
    #[serde(default)]
    pub agg_method: AggMethod,
}

/// Options for fitting weights from ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingConfig {
    #[serde(default)]
    pub space: IntervalSpace,
    #[serde(default)]
    pub agg_method: AggMethod,
    /// Labels that split the fit into exclusion groups.
    #[serde(default)]
    pub exclude: Vec<u8>,
    #[serde(default = "default_singular_tolerance")]
    pub singular_tolerance: f64,
}

fn default_singular_tolerance() -> f64 {
    DEFAULT_SINGULAR_TOLERANCE
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            space: IntervalSpace::default(),
            agg_method: AggMethod::default(),
            exclude: Vec::new(),
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
        }
    }
}

impl FittingConfig {
    pub fn options(&self) -> FitOptions {
        FitOptions {
            space: self.space,
            agg_method: self.agg_method,
            exclude: self.exclude.clone(),
            singular_tolerance: self.singular_tolerance,
        }
    }
}

/// Complete consonance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConsonanceConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub fitting: FittingConfig,
}

impl ConsonanceConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/consonance/config.toml`
    /// 3. `~/.config/consonance/config.toml`
    /// 4. `./consonance.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./consonance.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ConsonanceConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Consonance Configuration\n\n");

        output.push_str("[scoring]\n");
        output.push_str(&format!("space = \"{}\"\n", self.scoring.space));
        output.push_str(&format!("agg_method = \"{}\"\n", self.scoring.agg_method));

        output.push_str("\n[fitting]\n");
        output.push_str(&format!("space = \"{}\"\n", self.fitting.space));
        output.push_str(&format!("agg_method = \"{}\"\n", self.fitting.agg_method));
        let exclude: Vec<String> = self.fitting.exclude.iter().map(|l| l.to_string()).collect();
        output.push_str(&format!("exclude = [{}]\n", exclude.join(", ")));
        output.push_str(&format!(
            "singular_tolerance = {:e}\n",
            self.fitting.singular_tolerance
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ConsonanceConfig::default();
        assert_eq!(config.scoring.agg_method, AggMethod::Type);
        assert_eq!(config.fitting.space, IntervalSpace::Interval);
        assert_eq!(config.fitting.singular_tolerance, DEFAULT_SINGULAR_TOLERANCE);
        assert!(config.fitting.exclude.is_empty());
    }

    #[test]
    fn test_to_toml() {
        let mut config = ConsonanceConfig::default();
        config.fitting.exclude = vec![1, 6];
        let toml = config.to_toml();
        assert!(toml.contains("[scoring]"));
        assert!(toml.contains("[fitting]"));
        assert!(toml.contains("exclude = [1, 6]"));
        assert!(toml.contains("agg_method = \"type\""));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = ConsonanceConfig::default();
        config.scoring.space = IntervalSpace::IntervalClass;
        config.fitting.agg_method = AggMethod::Sum;
        config.fitting.exclude = vec![6];
        let parsed: ConsonanceConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_fitting_options() {
        let config = FittingConfig {
            space: IntervalSpace::IntervalClass,
            agg_method: AggMethod::Sum,
            exclude: vec![6],
            singular_tolerance: 1e-8,
        };
        let options = config.options();
        assert_eq!(options.space, IntervalSpace::IntervalClass);
        assert_eq!(options.agg_method, AggMethod::Sum);
        assert_eq!(options.exclude, vec![6]);
        assert_eq!(options.singular_tolerance, 1e-8);
    }
}
