//! Admission decisions returned by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Fallback applied when a group has no rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    /// Admit the requester.
    #[default]
    Allow,
    /// Refuse the requester.
    Reject,
}

/// Describes the outcome of an admission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Requester is on the blacklist.
    Blacklisted,
    /// Requester is on the whitelist.
    Whitelisted,
    /// A rule matched, or the group has no rules and the default is allow.
    Allowed,
    /// No rule matched, or the group has no rules and the default is reject.
    Rejected,
}

impl Decision {
    /// Returns true when the requester is admitted.
    #[must_use]
    pub const fn is_admitted(self) -> bool {
        matches!(self, Self::Whitelisted | Self::Allowed)
    }

    /// Stable lower-case label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blacklisted => "blacklisted",
            Self::Whitelisted => "whitelisted",
            Self::Allowed => "allowed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision plus the matched rules that justify it.
///
/// Evidence is non-empty only for [`Decision::Allowed`] reached through rule
/// matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    decision: Decision,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    evidence: Vec<Rule>,
}

impl Evaluation {
    /// Blacklist veto.
    #[must_use]
    pub const fn blacklisted() -> Self {
        Self {
            decision: Decision::Blacklisted,
            evidence: Vec::new(),
        }
    }

    /// Whitelist bypass.
    #[must_use]
    pub const fn whitelisted() -> Self {
        Self {
            decision: Decision::Whitelisted,
            evidence: Vec::new(),
        }
    }

    /// Admission justified by the supplied matched rules.
    #[must_use]
    pub fn allowed(evidence: Vec<Rule>) -> Self {
        Self {
            decision: Decision::Allowed,
            evidence,
        }
    }

    /// Refusal with no evidence.
    #[must_use]
    pub const fn rejected() -> Self {
        Self {
            decision: Decision::Rejected,
            evidence: Vec::new(),
        }
    }

    /// Outcome of the default policy for a group without rules.
    #[must_use]
    pub const fn from_default(policy: DefaultPolicy) -> Self {
        match policy {
            DefaultPolicy::Allow => Self {
                decision: Decision::Allowed,
                evidence: Vec::new(),
            },
            DefaultPolicy::Reject => Self::rejected(),
        }
    }

    /// Returns the decision.
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns the matched rules.
    #[must_use]
    pub fn evidence(&self) -> &[Rule] {
        &self.evidence
    }

    /// Returns true when the requester is admitted.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        self.decision.is_admitted()
    }
}
