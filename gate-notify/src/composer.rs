//! Renders admission decisions into notification text.

use std::fmt::Write as _;

use gate_policy::{Decision, Evaluation, JoinRequest};

use crate::template::{OutcomeCategory, TemplateSet, TemplateVars};

/// Request details exposed to notification templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    /// Group display name.
    pub group_name: String,
    /// Requester display name.
    pub user_name: String,
    /// Requester identifier.
    pub user_id: String,
    /// Free-text request reason.
    pub reason: String,
}

impl From<&JoinRequest> for NotificationContext {
    fn from(request: &JoinRequest) -> Self {
        Self {
            group_name: request.group_name().to_owned(),
            user_name: request.requester_name().to_owned(),
            user_id: request.requester_id().to_string(),
            reason: request.reason().to_owned(),
        }
    }
}

/// Maps a decision to its template bucket.
#[must_use]
pub const fn category_for(decision: Decision) -> OutcomeCategory {
    match decision {
        Decision::Allowed => OutcomeCategory::Received,
        Decision::Whitelisted => OutcomeCategory::Approved,
        Decision::Blacklisted | Decision::Rejected => OutcomeCategory::Rejected,
    }
}

/// Human-readable label substituted for `{result}`.
#[must_use]
pub fn result_label(evaluation: &Evaluation) -> &'static str {
    match evaluation.decision() {
        Decision::Whitelisted => "approved (whitelist)",
        Decision::Blacklisted => "rejected (blacklist)",
        Decision::Allowed if evaluation.evidence().is_empty() => "approved (default policy)",
        Decision::Allowed => "approved (matched rules)",
        Decision::Rejected => "rejected (no matching rule)",
    }
}

/// Builds notification text from a template set.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    templates: TemplateSet,
}

impl Composer {
    /// Creates a composer over the supplied templates.
    #[must_use]
    pub fn new(templates: TemplateSet) -> Self {
        Self { templates }
    }

    /// Renders the notification for one evaluated request.
    ///
    /// A category without a template yields an empty body. Matched rules of
    /// an allowed request are appended as a numbered list after a blank line.
    /// The result is trimmed.
    #[must_use]
    pub fn compose(&self, evaluation: &Evaluation, context: &NotificationContext) -> String {
        let vars = TemplateVars {
            group_name: &context.group_name,
            user_name: &context.user_name,
            user_id: &context.user_id,
            reason: &context.reason,
            result: result_label(evaluation),
        };

        let mut message = self
            .templates
            .get(category_for(evaluation.decision()))
            .map(|template| template.render(&vars))
            .unwrap_or_default();

        if evaluation.decision() == Decision::Allowed && !evaluation.evidence().is_empty() {
            message.push_str("\n\nMatched rules:\n");
            for (idx, rule) in evaluation.evidence().iter().enumerate() {
                let _ = writeln!(message, "{}. {}: {}", idx + 1, rule.kind(), rule.content());
            }
        }

        message.trim().to_owned()
    }
}
