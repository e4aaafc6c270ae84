//! PV monitoring basic library
//!
//! Provides functions shared by the PV tools:
//! - layered configuration (defaults, file, environment)
//! - logging bootstrap

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    load_config, InputConfig, LoggingConfig, PvConfig, RuleConfig, StorageConfig,
    ThresholdConfig, DEFAULT_POWER_THRESHOLD, DEFAULT_STATE_PATH, DEFAULT_VOLTAGE_THRESHOLD,
};
pub use error::{ConfigError, Result};
pub use logging::{init_logging, resolve_log_dir};
