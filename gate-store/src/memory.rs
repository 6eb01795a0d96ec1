//! In-process key-value store holding JSON documents per group.

use std::collections::HashMap;

use async_trait::async_trait;
use gate_policy::{MemberSet, Rule};
use gate_primitives::GroupId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{ListKind, PolicyStore};

/// Storage key for a group's rule list.
#[must_use]
pub fn rules_key(group: &GroupId) -> String {
    format!("rules_{group}")
}

/// Storage key for one of a group's member lists.
#[must_use]
pub fn members_key(group: &GroupId, list: ListKind) -> String {
    format!("{list}_{group}")
}

/// Volatile policy store backed by a map of JSON values.
///
/// Values are kept in their serialized form, mirroring a platform key-value
/// service, so data that fails to decode surfaces the same way it would from
/// a remote backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw JSON value under `key`, bypassing rule validation.
    pub async fn put_raw(&self, key: impl Into<String>, value: Value) {
        self.entries.write().await.insert(key.into(), value);
    }

    /// Returns the raw JSON value stored under `key`.
    pub async fn get_raw(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Returns the number of populated keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` when nothing has been written.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn get_or_default<T>(&self, key: &str) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(value) => {
                T::deserialize(value).map_err(|source| StoreError::Serialization {
                    key: key.to_owned(),
                    source,
                })
            }
            None => Ok(T::default()),
        }
    }

    /// Decodes a stored rule list one record at a time.
    ///
    /// Records that no longer decode are skipped so one corrupt entry cannot
    /// hide the rest of the group's rules. A value that is not a list at all
    /// is still an error.
    async fn decode_rules(&self, key: &str) -> StoreResult<Vec<Rule>> {
        let records: Vec<Value> = self.get_or_default(key).await?;
        let rules = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match Rule::deserialize(record) {
                Ok(rule) => Some(rule),
                Err(error) => {
                    debug!(key, index, %error, "skipping undecodable rule");
                    None
                }
            })
            .collect();
        Ok(rules)
    }

    async fn put<T>(&self, key: String, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialization {
            key: key.clone(),
            source,
        })?;
        self.entries.write().await.insert(key, value);
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn rules(&self, group: &GroupId) -> StoreResult<Vec<Rule>> {
        self.decode_rules(&rules_key(group)).await
    }

    async fn save_rules(&self, group: &GroupId, rules: &[Rule]) -> StoreResult<()> {
        self.put(rules_key(group), rules).await
    }

    async fn members(&self, group: &GroupId, list: ListKind) -> StoreResult<MemberSet> {
        self.get_or_default(&members_key(group, list)).await
    }

    async fn save_members(
        &self,
        group: &GroupId,
        list: ListKind,
        members: &MemberSet,
    ) -> StoreResult<()> {
        self.put(members_key(group, list), members).await
    }
}
