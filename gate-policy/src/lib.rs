//! Admission policy evaluation for group join requests.
//!
//! The crate is pure: it fetches nothing and holds no state between calls.
//! Callers load a [`PolicySnapshot`] for the group, run [`evaluate`] (or
//! [`DecisionEngine::evaluate`]), and act on the returned [`Evaluation`].

#![warn(missing_docs, clippy::pedantic)]

pub mod contracts;
pub mod decision;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod rule;

pub use contracts::{JoinRequest, MemberSet, PolicySnapshot};
pub use decision::{Decision, DefaultPolicy, Evaluation};
pub use engine::{DecisionEngine, evaluate, matching_rules};
pub use error::{PolicyError, PolicyResult};
pub use pattern::{MatchOutcome, PatternKind};
pub use rule::{Rule, RuleKind};
