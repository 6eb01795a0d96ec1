//! Error types for rule construction and pattern compilation.

use thiserror::Error;

/// Errors surfaced while building rules or compiling patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Rule configuration error.
    #[error("invalid rule: {0}")]
    InvalidRule(&'static str),
    /// Regular expression body failed to compile.
    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidRegex {
        /// Regex body without delimiters.
        pattern: String,
        /// Compiler message, unmodified.
        message: String,
    },
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
