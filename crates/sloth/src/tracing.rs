//! Tracing subscriber setup for the sloth CLI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub use ::tracing::Level;

/// Logging verbosity selectable on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize, Default)]
pub enum LogLevel {
    /// Everything, including per-task scheduling
    Trace,
    /// Compilation and run summaries
    Debug,
    /// Informational messages
    Info,
    /// Warnings only
    #[default]
    Warn,
    /// Errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Output format for log lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum TracingFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Subscriber configuration.
#[derive(Copy, Clone, Debug)]
pub struct TracingConfig {
    /// Line format
    pub format: TracingFormat,
    /// Maximum level when `RUST_LOG` is not set
    pub level: Level,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::default(),
            level: Level::WARN,
        }
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    config: TracingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.format {
        TracingFormat::Pretty => builder.try_init(),
        TracingFormat::Json => builder.json().try_init(),
    }
}
