//! Strongly typed configuration schema.

use std::num::NonZeroUsize;
use std::time::Duration;

use gate_notify::TemplateSet;
use gate_policy::DefaultPolicy;
use gate_primitives::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Platform used to address administrators when none is configured.
pub const DEFAULT_PLATFORM: &str = "qq";

/// Command prefix used when none is configured.
pub const DEFAULT_COMMAND_PREFIX: &str = "ga";

const DEFAULT_NOTIFICATION_TIMEOUT_MS: u64 = 5_000;

/// Notification dispatches allowed to deliver at once when none is configured.
pub const DEFAULT_NOTIFICATION_CONCURRENCY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(15);

/// Runtime configuration for one gate deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Administrators. Empty means every user is treated as an administrator.
    pub admin_list: Vec<UserId>,
    /// Outcome when no rule matches.
    pub default_mode: DefaultPolicy,
    /// Emit info-level audit records for decisions and mutations.
    pub enable_logging: bool,
    /// Informational only; the whitelist is always consulted second.
    pub whitelist_priority: bool,
    /// Informational only; the blacklist is always consulted first.
    pub blacklist_priority: bool,
    /// Notify administrators about decisions.
    pub enable_admin_notification: bool,
    /// Platform prefix used to address administrators.
    pub admin_notification_platform: String,
    /// Notification templates. A supplied map replaces the defaults wholesale.
    pub admin_notification_messages: TemplateSet,
    /// Leading word of administrative commands.
    pub command_prefix: String,
    /// Per-recipient delivery timeout in milliseconds.
    pub notification_timeout_ms: u64,
    /// Notification dispatches allowed to deliver at once; later ones queue.
    pub notification_concurrency: NonZeroUsize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            admin_list: Vec::new(),
            default_mode: DefaultPolicy::Allow,
            enable_logging: true,
            whitelist_priority: true,
            blacklist_priority: true,
            enable_admin_notification: true,
            admin_notification_platform: DEFAULT_PLATFORM.to_owned(),
            admin_notification_messages: TemplateSet::default(),
            command_prefix: DEFAULT_COMMAND_PREFIX.to_owned(),
            notification_timeout_ms: DEFAULT_NOTIFICATION_TIMEOUT_MS,
            notification_concurrency: DEFAULT_NOTIFICATION_CONCURRENCY,
        }
    }
}

impl GateConfig {
    /// Returns whether `user` may administer rules.
    #[must_use]
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admin_list.is_empty() || self.admin_list.contains(user)
    }

    /// Returns the per-recipient delivery timeout.
    #[must_use]
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }

    /// Checks values serde cannot express.
    ///
    /// Unknown template placeholders are logged, not rejected: they render
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a blank command prefix or
    /// platform, or a zero timeout.
    pub fn validate(&self) -> ConfigResult<()> {
        let prefix = &self.command_prefix;
        if prefix.trim().is_empty() || prefix.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                key: "command_prefix",
                reason: "must be a single non-empty word".into(),
            });
        }
        if self.admin_notification_platform.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "admin_notification_platform",
                reason: "must not be empty".into(),
            });
        }
        if self.notification_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "notification_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }

        for (category, template) in self.admin_notification_messages.iter() {
            let unknown = template.unknown_placeholders();
            if !unknown.is_empty() {
                tracing::warn!(
                    ?category,
                    placeholders = ?unknown,
                    "notification template references unknown placeholders"
                );
            }
        }

        Ok(())
    }
}
