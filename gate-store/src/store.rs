//! Policy store accessor contract.

use std::fmt;

use async_trait::async_trait;
use gate_policy::{MemberSet, PolicySnapshot, Rule};
use gate_primitives::{GroupId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Which per-group member list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Users admitted without rule evaluation.
    Whitelist,
    /// Users always refused.
    Blacklist,
}

impl ListKind {
    /// Lower-case label, also used as the storage key prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read/write access to per-group rules and member lists.
///
/// Writes replace the whole collection; there is no partial update API.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Returns the group's rules in insertion order (oldest first).
    async fn rules(&self, group: &GroupId) -> StoreResult<Vec<Rule>>;

    /// Replaces the group's rules.
    async fn save_rules(&self, group: &GroupId, rules: &[Rule]) -> StoreResult<()>;

    /// Returns one of the group's member lists.
    async fn members(&self, group: &GroupId, list: ListKind) -> StoreResult<MemberSet>;

    /// Replaces one of the group's member lists.
    async fn save_members(
        &self,
        group: &GroupId,
        list: ListKind,
        members: &MemberSet,
    ) -> StoreResult<()>;

    /// Returns the group's whitelist.
    async fn whitelist(&self, group: &GroupId) -> StoreResult<MemberSet> {
        self.members(group, ListKind::Whitelist).await
    }

    /// Returns the group's blacklist.
    async fn blacklist(&self, group: &GroupId) -> StoreResult<MemberSet> {
        self.members(group, ListKind::Blacklist).await
    }

    /// Loads everything the decision engine needs for one group.
    ///
    /// The three reads are independent; a concurrent mutation may land
    /// between them.
    async fn snapshot(&self, group: &GroupId) -> StoreResult<PolicySnapshot> {
        let rules = self.rules(group).await?;
        let whitelist = self.whitelist(group).await?;
        let blacklist = self.blacklist(group).await?;
        Ok(PolicySnapshot::new(rules, whitelist, blacklist))
    }

    /// Adds a user to a list. Returns `false` when already present.
    async fn add_member(
        &self,
        group: &GroupId,
        list: ListKind,
        user: &UserId,
    ) -> StoreResult<bool> {
        let mut members = self.members(group, list).await?;
        if !members.insert(user.clone()) {
            return Ok(false);
        }
        self.save_members(group, list, &members).await?;
        Ok(true)
    }

    /// Removes a user from a list. Returns `false` when absent.
    async fn remove_member(
        &self,
        group: &GroupId,
        list: ListKind,
        user: &UserId,
    ) -> StoreResult<bool> {
        let mut members = self.members(group, list).await?;
        if !members.shift_remove(user) {
            return Ok(false);
        }
        self.save_members(group, list, &members).await?;
        Ok(true)
    }
}
