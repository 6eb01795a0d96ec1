//! Configuration management for the admission gate.
//!
//! Every key is optional; an empty document yields [`GateConfig::default`].

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{
    DEFAULT_COMMAND_PREFIX, DEFAULT_NOTIFICATION_CONCURRENCY, DEFAULT_PLATFORM, GateConfig,
};
