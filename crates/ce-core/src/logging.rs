//! Structured logging setup.
//!
//! Library code only emits `tracing` events; binaries and test harnesses that
//! want to see them call [`init_logging`] once. `RUST_LOG` takes precedence
//! over the default filter.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install a global fmt subscriber writing to stderr.
pub fn init_logging(format: LogFormat, default_filter: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        init_logging(LogFormat::Json, "ce_core=debug").unwrap();
        tracing::debug!(target: "ce_core", "logging initialised");
        assert!(matches!(
            init_logging(LogFormat::Plain, "info"),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }
}
