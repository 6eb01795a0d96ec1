//! Inputs to an admission evaluation: the join request and the group policy.

use gate_primitives::{GroupId, RequestId, UserId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Ordered set of user identifiers. Insertion order is kept for listings.
pub type MemberSet = IndexSet<UserId>;

/// Inbound request to join a managed group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    id: RequestId,
    group_id: GroupId,
    group_name: String,
    requester_id: UserId,
    requester_name: String,
    #[serde(default)]
    reason: String,
}

impl JoinRequest {
    /// Creates a request; display names default to the identifiers.
    #[must_use]
    pub fn new(group_id: GroupId, requester_id: UserId, reason: impl Into<String>) -> Self {
        Self {
            id: RequestId::random(),
            group_name: group_id.to_string(),
            requester_name: requester_id.to_string(),
            group_id,
            requester_id,
            reason: reason.into(),
        }
    }

    /// Sets the human-readable group name.
    #[must_use]
    pub fn with_group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = name.into();
        self
    }

    /// Sets the requester's display name.
    #[must_use]
    pub fn with_requester_name(mut self, name: impl Into<String>) -> Self {
        self.requester_name = name.into();
        self
    }

    /// Returns the correlation identifier.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the target group.
    #[must_use]
    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Returns the group display name.
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Returns the requesting user.
    #[must_use]
    pub fn requester_id(&self) -> &UserId {
        &self.requester_id
    }

    /// Returns the requester display name.
    #[must_use]
    pub fn requester_name(&self) -> &str {
        &self.requester_name
    }

    /// Returns the free-text reason supplied with the request.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Point-in-time copy of one group's rules and member lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Rules in insertion order; index 0 is the oldest.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Users admitted without rule evaluation.
    #[serde(default)]
    pub whitelist: MemberSet,
    /// Users always refused. Consulted before the whitelist.
    #[serde(default)]
    pub blacklist: MemberSet,
}

impl PolicySnapshot {
    /// Creates a snapshot from its parts.
    #[must_use]
    pub fn new(rules: Vec<Rule>, whitelist: MemberSet, blacklist: MemberSet) -> Self {
        Self {
            rules,
            whitelist,
            blacklist,
        }
    }

    /// Returns `true` when the user is on the blacklist.
    #[must_use]
    pub fn is_blacklisted(&self, user: &UserId) -> bool {
        self.blacklist.contains(user)
    }

    /// Returns `true` when the user is on the whitelist.
    #[must_use]
    pub fn is_whitelisted(&self, user: &UserId) -> bool {
        self.whitelist.contains(user)
    }
}
