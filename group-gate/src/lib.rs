//! Rule-based admission engine for group join requests.
//!
//! Depend on this crate to get the whole gate; the component crates are
//! re-exported behind feature flags so embedders can take only the decision
//! engine.

#![warn(missing_docs, clippy::pedantic)]

/// Identifier newtypes.
pub use gate_primitives as primitives;

/// Pattern matcher and decision engine.
pub use gate_policy as policy;

/// Join-request pipeline and command surface (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use gate_kernel as kernel;

/// Policy store accessor (enabled by `store` feature).
#[cfg(feature = "store")]
pub use gate_store as store;

/// Notification templates and dispatch (enabled by `notify` feature).
#[cfg(feature = "notify")]
pub use gate_notify as notify;

/// Configuration schema and loader (enabled by `config` feature).
#[cfg(feature = "config")]
pub use gate_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use gate_telemetry as telemetry;
