//! Unified logging bootstrap for PV monitoring tools
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! An optional daily-rolling file layer writes `{tool}.YYYY-MM-DD` files.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Env var overriding the log directory
pub const ENV_LOG_DIR: &str = "PVWATCH_LOG_DIR";

// Keeps the non-blocking file writer alive for the process lifetime
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] Batch analyzed`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.3fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Resolve the log directory.
///
/// Priority: `PVWATCH_LOG_DIR` env > configured dir > `logs`
pub fn resolve_log_dir(config: &LoggingConfig) -> PathBuf {
    std::env::var(ENV_LOG_DIR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| config.dir.clone())
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Build the filter: `RUST_LOG` when set, otherwise the configured level
fn build_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    if let Ok(env) = std::env::var("RUST_LOG") {
        if !env.is_empty() {
            return EnvFilter::new(env);
        }
    }
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(&config.level)
    }
}

/// Install the global subscriber.
///
/// `tool_name` names the log files. Fails if a subscriber is already set.
pub fn init_logging(
    config: &LoggingConfig,
    tool_name: &str,
    verbose: bool,
    ansi: bool,
) -> Result<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file_layer = if config.file {
        let log_dir = resolve_log_dir(config);
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| ConfigError::Logging(format!("{}: {}", log_dir.display(), e)))?;

        let appender = tracing_appender::rolling::daily(&log_dir, format!("{}.log", tool_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        if FILE_GUARD.set(guard).is_err() {
            return Err(ConfigError::Logging("logging already initialized".to_string()));
        }

        let layer = if config.json {
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(BracketedLevelFormat)
                .boxed()
        };
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(build_filter(config, verbose))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(&Level::INFO), "[INFO]");
        assert_eq!(format_level(&Level::ERROR), "[ERROR]");
        assert_eq!(format_level(&Level::TRACE), "[TRACE]");
    }

    #[test]
    fn test_resolve_log_dir_from_config() {
        // the env override is process-global; only assert the fallback chain
        if std::env::var(ENV_LOG_DIR).is_ok() {
            return;
        }
        let mut config = LoggingConfig::default();
        assert_eq!(resolve_log_dir(&config), PathBuf::from("logs"));

        config.dir = Some(PathBuf::from("/var/log/pvwatch"));
        assert_eq!(resolve_log_dir(&config), PathBuf::from("/var/log/pvwatch"));
    }
}
