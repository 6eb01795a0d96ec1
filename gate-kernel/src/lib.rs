//! Join-request runtime for the admission gate.
//!
//! [`AdmissionService`] runs the fetch → evaluate → compose → dispatch
//! pipeline; [`CommandHandler`] exposes rule and member administration over a
//! prefixed chat-command grammar. Notification delivery runs on a bounded
//! [`DispatchPool`] so it never delays a decision.

#![warn(missing_docs, clippy::pedantic)]

mod command;
mod console;
mod dispatch_pool;
mod pipeline;
pub mod reply;

pub use command::{Command, CommandError, CommandParser, CommandResult};
pub use console::{CommandContext, CommandHandler};
pub use dispatch_pool::{DispatchPool, PoolError, PoolResult};
pub use pipeline::{Admission, AdmissionService};
