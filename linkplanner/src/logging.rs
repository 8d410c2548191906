//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding application, which can call [`init`] once at startup.
//!
//! ```rust,ignore
//! linkplanner::logging::init("linkplanner=info")?;
//! tracing::info!(url = %config.channel.url, "Connecting");
//! ```

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the caller provide one.
pub const DEFAULT_FILTER: &str = "linkplanner=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Builds the filter: `RUST_LOG` when set, else `default_filter`.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| LoggingError::InvalidFilter {
            filter: default_filter.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Installs a global fmt subscriber.
pub fn init(default_filter: &str) -> Result<(), LoggingError> {
    let filter = env_filter(default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init(DEFAULT_FILTER);
        assert!(matches!(
            init(DEFAULT_FILTER),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new("linkplanner::channel=debug,warn").is_ok());
    }
}
