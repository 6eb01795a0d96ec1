//! Observability utilities for the admission gate.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter applied when neither `RUST_LOG` nor a caller default is usable.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter directive did not parse.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// Directive that failed.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialised")]
    AlreadyInitialised,
}

/// Builds the filter from `RUST_LOG`, falling back to `default_filter`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if `RUST_LOG` is unset or
/// invalid and `default_filter` does not parse either.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(default_filter).map_err(|err| TelemetryError::InvalidFilter {
            directive: default_filter.to_owned(),
            reason: err.to_string(),
        })
    })
}

/// Installs a global fmt subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInitialised`] when called twice, or
/// [`TelemetryError::InvalidFilter`] as [`env_filter`].
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialised)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error() {
        // Another test may have won the race; either way the second call fails.
        let _ = init_tracing(DEFAULT_FILTER);
        assert!(matches!(
            init_tracing(DEFAULT_FILTER),
            Err(TelemetryError::AlreadyInitialised)
        ));
    }

    #[test]
    fn fallback_filter_parses() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter("gate_kernel=debug,warn").is_ok());
        }
    }
}
