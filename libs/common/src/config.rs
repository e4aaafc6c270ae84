//! Layered configuration for PV monitoring tools
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`PVWATCH_` prefix, `__` between section and key)
//! 2. Explicit config file, or `pvwatch.toml` / `pvwatch.yaml` in the working directory
//! 3. Default values

use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PVWATCH_";
/// Default power threshold in watts
pub const DEFAULT_POWER_THRESHOLD: f64 = 50.0;
/// Default voltage threshold in volts
pub const DEFAULT_VOLTAGE_THRESHOLD: f64 = 200.0;
/// Default state snapshot location
pub const DEFAULT_STATE_PATH: &str = "pvwatch-state.json";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PvConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batch-wide classification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Watts; producing readings below this are `low`
    #[serde(default = "default_power_threshold")]
    pub power_threshold: f64,
    /// Volts; readings below this raise a low-voltage alert
    #[serde(default = "default_voltage_threshold")]
    pub voltage_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            power_threshold: DEFAULT_POWER_THRESHOLD,
            voltage_threshold: DEFAULT_VOLTAGE_THRESHOLD,
        }
    }
}

fn default_power_threshold() -> f64 {
    DEFAULT_POWER_THRESHOLD
}

fn default_voltage_threshold() -> f64 {
    DEFAULT_VOLTAGE_THRESHOLD
}

/// Rule evaluation settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Tolerance for the `eq` condition; absent means literal equality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq_tolerance: Option<f64>,
}

/// Batch input settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter; absent means detect from the header line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

/// State snapshot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log directory; `PVWATCH_LOG_DIR` wins over this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Also write a daily-rolling log file
    #[serde(default)]
    pub file: bool,
    /// Write the file log as JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            file: false,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PvConfig {
    /// Check value ranges after loading
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !t.power_threshold.is_finite() || t.power_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "thresholds.power_threshold",
                format!("must be a finite, non-negative number (got {})", t.power_threshold),
            ));
        }
        if !t.voltage_threshold.is_finite() || t.voltage_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "thresholds.voltage_threshold",
                format!("must be a finite, non-negative number (got {})", t.voltage_threshold),
            ));
        }

        if let Some(tol) = self.rules.eq_tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(ConfigError::invalid(
                    "rules.eq_tolerance",
                    format!("must be a positive number (got {})", tol),
                ));
            }
        }

        if let Some(d) = self.input.delimiter {
            if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
                return Err(ConfigError::invalid(
                    "input.delimiter",
                    format!("unsupported delimiter {:?}", d),
                ));
            }
        }

        Ok(())
    }

    /// Delimiter as a byte for the CSV reader
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.input
            .delimiter
            .filter(char::is_ascii)
            .map(|c| c as u8)
    }
}

/// Load configuration from defaults, a config file and the environment.
///
/// `explicit` must exist when given; otherwise `pvwatch.toml` and
/// `pvwatch.yaml` are picked up from the working directory if present.
pub fn load_config(explicit: Option<&Path>) -> Result<PvConfig> {
    let mut figment = Figment::from(Serialized::defaults(PvConfig::default()));

    figment = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            merge_file(figment, path)?
        },
        None => figment
            .merge(Toml::file("pvwatch.toml"))
            .merge(Yaml::file("pvwatch.yaml")),
    };

    let config: PvConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    config.validate()?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

    match extension {
        "toml" => Ok(figment.merge(Toml::file(path))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        "json" => Ok(figment.merge(Json::file(path))),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}
