//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ConsonanceConfig, FittingConfig, ScoringConfig};
use consonance::{AggMethod, IntervalSpace};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with an explicit override path.
///
/// If `override_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/override).
pub fn discover_config_files_with_override(override_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/consonance/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("consonance/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = override_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("consonance.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Fields set by one config file. `None` leaves the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialConfig {
    pub scoring: PartialScoring,
    pub fitting: PartialFitting,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialScoring {
    pub space: Option<IntervalSpace>,
    pub agg_method: Option<AggMethod>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFitting {
    pub space: Option<IntervalSpace>,
    pub agg_method: Option<AggMethod>,
    pub exclude: Option<Vec<u8>>,
    pub singular_tolerance: Option<f64>,
}

/// Load the fields a TOML file sets.
pub fn load_from_file(path: &Path) -> Result<PartialConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string.
fn parse_toml(contents: &str, path: &Path) -> Result<PartialConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let invalid = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut config = PartialConfig::default();

    if let Some(section) = section(&table, "scoring", &invalid)? {
        config.scoring.space = string_field(section, "space", &invalid)?;
        config.scoring.agg_method = string_field(section, "agg_method", &invalid)?;
    }

    if let Some(section) = section(&table, "fitting", &invalid)? {
        config.fitting.space = string_field(section, "space", &invalid)?;
        config.fitting.agg_method = string_field(section, "agg_method", &invalid)?;
        config.fitting.exclude = match section.get("exclude") {
            None => None,
            Some(toml::Value::Array(labels)) => Some(
                labels
                    .iter()
                    .map(|v| {
                        v.as_integer()
                            .and_then(|i| u8::try_from(i).ok())
                            .ok_or_else(|| {
                                invalid(format!("exclude label {v} is not a small integer"))
                            })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            Some(other) => return Err(invalid(format!("exclude must be an array, got {other}"))),
        };
        if let Some(v) = section.get("singular_tolerance") {
            let tolerance = v
                .as_float()
                .or_else(|| v.as_integer().map(|i| i as f64))
                .ok_or_else(|| invalid(format!("singular_tolerance {v} is not a number")))?;
            config.fitting.singular_tolerance = Some(tolerance);
        }
    }

    Ok(config)
}

fn section<'a>(
    table: &'a toml::Table,
    name: &str,
    invalid: &impl Fn(String) -> ConfigError,
) -> Result<Option<&'a toml::Table>, ConfigError> {
    match table.get(name) {
        None => Ok(None),
        Some(toml::Value::Table(section)) => Ok(Some(section)),
        Some(other) => Err(invalid(format!("[{name}] must be a table, got {other}"))),
    }
}

fn string_field<T>(
    section: &toml::Table,
    key: &str,
    invalid: &impl Fn(String) -> ConfigError,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = String>,
{
    match section.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => s.parse().map(Some).map_err(invalid),
        Some(other) => Err(invalid(format!("{key} must be a string, got {other}"))),
    }
}

/// Merge a file's fields over `base`. Every field the overlay sets wins,
/// including ones set back to their default.
pub fn merge_configs(base: ConsonanceConfig, overlay: PartialConfig) -> ConsonanceConfig {
    let PartialConfig { scoring, fitting } = overlay;

    ConsonanceConfig {
        scoring: ScoringConfig {
            space: scoring.space.unwrap_or(base.scoring.space),
            agg_method: scoring.agg_method.unwrap_or(base.scoring.agg_method),
        },
        fitting: FittingConfig {
            space: fitting.space.unwrap_or(base.fitting.space),
            agg_method: fitting.agg_method.unwrap_or(base.fitting.agg_method),
            exclude: fitting.exclude.unwrap_or(base.fitting.exclude),
            singular_tolerance: fitting
                .singular_tolerance
                .unwrap_or(base.fitting.singular_tolerance),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ConsonanceConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply `CONSONANCE_*` overrides read through `lookup`.
///
/// Unparseable values are skipped and not recorded as overrides.
pub fn apply_overrides_from(
    config: &mut ConsonanceConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let mut record = |key: &str| sources.env_overrides.push(key.to_string());

    if let Some(space) = parsed::<IntervalSpace>(&lookup, "CONSONANCE_SCORING_SPACE") {
        config.scoring.space = space;
        record("CONSONANCE_SCORING_SPACE");
    }
    if let Some(agg) = parsed::<AggMethod>(&lookup, "CONSONANCE_SCORING_AGG_METHOD") {
        config.scoring.agg_method = agg;
        record("CONSONANCE_SCORING_AGG_METHOD");
    }
    if let Some(space) = parsed::<IntervalSpace>(&lookup, "CONSONANCE_FITTING_SPACE") {
        config.fitting.space = space;
        record("CONSONANCE_FITTING_SPACE");
    }
    if let Some(agg) = parsed::<AggMethod>(&lookup, "CONSONANCE_FITTING_AGG_METHOD") {
        config.fitting.agg_method = agg;
        record("CONSONANCE_FITTING_AGG_METHOD");
    }
    if let Some(v) = lookup("CONSONANCE_FITTING_EXCLUDE") {
        let labels: Result<Vec<u8>, _> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<u8>)
            .collect();
        if let Ok(labels) = labels {
            config.fitting.exclude = labels;
            record("CONSONANCE_FITTING_EXCLUDE");
        }
    }
    if let Some(tolerance) = parsed::<f64>(&lookup, "CONSONANCE_SINGULAR_TOLERANCE") {
        config.fitting.singular_tolerance = tolerance;
        record("CONSONANCE_SINGULAR_TOLERANCE");
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
