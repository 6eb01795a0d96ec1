//! Error types for the policy store.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by policy store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Stored value could not be encoded or decoded.
    #[error("serialization error for `{key}`: {source}")]
    Serialization {
        /// Storage key being read or written.
        key: String,
        /// Source [`serde_json::Error`].
        #[source]
        source: SerdeError,
    },
    /// Backend reported an application error.
    #[error("policy store backend error: {reason}")]
    Backend {
        /// Human-readable reason describing the failure.
        reason: String,
    },
}

impl StoreError {
    /// Helper to construct backend errors from string-like values.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
