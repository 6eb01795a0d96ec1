//! Core shared types for the group admission gate.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifiers for groups, users, and individual join requests.
pub use ids::{GroupId, RequestId, UserId};
