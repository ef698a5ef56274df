//! Structured logging initialisation.
//!
//! Library code only emits `tracing` events; binaries decide where they go.
//! Logs always go to stderr so stdout stays free for command output.
//!
//! The filter is read from `VAUBAN_LOG`, then `RUST_LOG`, and otherwise
//! defaults to `vauban=<level>`.

use clap::ValueEnum;
use std::io::IsTerminal;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "VAUBAN_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console lines.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// Default level for the `vauban` target when no filter is set.
    pub default_level: tracing::Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Human,
            default_level: tracing::Level::INFO,
        }
    }
}

impl LogConfig {
    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the default level.
    #[must_use]
    pub const fn with_default_level(mut self, level: tracing::Level) -> Self {
        self.default_level = level;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_FILTER_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(format!("vauban={}", self.default_level)))
    }
}

/// Error returned when a global subscriber is already installed.
#[derive(Debug, Error)]
#[error("failed to install log subscriber: {0}")]
pub struct LoggingInitError(#[from] tracing_subscriber::util::TryInitError);

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingInitError`] when a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingInitError> {
    let filter = config.filter();
    match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
    }
    Ok(())
}
