//! Policy storage for the admission gate.
//!
//! [`PolicyStore`] is the accessor the pipeline reads a group's rules and
//! member lists through. [`MemoryStore`] is the in-process implementation
//! used by tests and demos; durable backends implement the same trait.

#![warn(missing_docs, clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{ListKind, PolicyStore};
