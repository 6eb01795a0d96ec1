//! Ordered admission policy: blacklist, whitelist, rules, default.

use gate_primitives::{GroupId, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contracts::{JoinRequest, PolicySnapshot};
use crate::decision::{DefaultPolicy, Evaluation};
use crate::rule::Rule;

/// Returns every rule that matches `text`, in rule order.
///
/// Rules whose regex no longer compiles are skipped.
pub fn matching_rules<'a>(rules: &'a [Rule], text: &str) -> Vec<&'a Rule> {
    rules
        .iter()
        .filter(|rule| {
            let outcome = rule.matches(text);
            if !outcome.valid {
                debug!(
                    kind = %rule.kind(),
                    content = rule.content(),
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "skipping unusable rule"
                );
            }
            outcome.matched
        })
        .collect()
}

/// Evaluates one request against a policy snapshot.
///
/// Steps run in a fixed order and the first conclusive one wins: the
/// blacklist vetoes, the whitelist admits, an empty rule set falls back to
/// `default_policy`, otherwise any matching rule admits.
#[must_use]
pub fn evaluate(
    group_id: &GroupId,
    requester_id: &UserId,
    request_text: &str,
    snapshot: &PolicySnapshot,
    default_policy: DefaultPolicy,
) -> Evaluation {
    let evaluation = if snapshot.is_blacklisted(requester_id) {
        Evaluation::blacklisted()
    } else if snapshot.is_whitelisted(requester_id) {
        Evaluation::whitelisted()
    } else if snapshot.rules.is_empty() {
        Evaluation::from_default(default_policy)
    } else {
        let evidence: Vec<Rule> = matching_rules(&snapshot.rules, request_text)
            .into_iter()
            .cloned()
            .collect();
        if evidence.is_empty() {
            Evaluation::rejected()
        } else {
            Evaluation::allowed(evidence)
        }
    };

    debug!(
        group_id = %group_id,
        user_id = %requester_id,
        decision = %evaluation.decision(),
        matched = evaluation.evidence().len(),
        "admission evaluated"
    );
    evaluation
}

/// Stateless decision engine carrying the configured default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEngine {
    default_policy: DefaultPolicy,
}

impl DecisionEngine {
    /// Constructs an engine with the provided default policy.
    #[must_use]
    pub const fn new(default_policy: DefaultPolicy) -> Self {
        Self { default_policy }
    }

    /// Evaluates a join request against a freshly fetched snapshot.
    #[must_use]
    pub fn evaluate(&self, request: &JoinRequest, snapshot: &PolicySnapshot) -> Evaluation {
        evaluate(
            request.group_id(),
            request.requester_id(),
            request.reason(),
            snapshot,
            self.default_policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::contracts::MemberSet;
    use crate::decision::Decision;
    use crate::rule::RuleKind;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn group() -> GroupId {
        GroupId::new("10001").unwrap()
    }

    fn rule(pattern: &str) -> Rule {
        Rule::parse(pattern, user("admin"), Utc::now()).unwrap()
    }

    fn members(ids: &[&str]) -> MemberSet {
        ids.iter().map(|id| user(id)).collect()
    }

    fn decide(
        who: &str,
        text: &str,
        snapshot: &PolicySnapshot,
        default: DefaultPolicy,
    ) -> Evaluation {
        evaluate(&group(), &user(who), text, snapshot, default)
    }

    fn student_group() -> PolicySnapshot {
        PolicySnapshot::new(vec![rule("student")], MemberSet::new(), members(&["u1"]))
    }

    #[test]
    fn blacklist_wins_over_everything() {
        let both = members(&["u1"]);
        let snapshot = PolicySnapshot::new(vec![rule("student")], both.clone(), both);
        let result = decide("u1", "I am a student", &snapshot, DefaultPolicy::Allow);
        assert_eq!(result.decision(), Decision::Blacklisted);
        assert!(result.evidence().is_empty());
    }

    #[test]
    fn whitelist_bypasses_rules() {
        let whitelist = members(&["u2"]);
        let snapshot = PolicySnapshot::new(vec![rule("student")], whitelist, MemberSet::new());
        let result = decide("u2", "nothing relevant", &snapshot, DefaultPolicy::Reject);
        assert_eq!(result.decision(), Decision::Whitelisted);
        assert!(result.evidence().is_empty());
    }

    #[test]
    fn empty_rules_follow_default_policy() {
        let snapshot = PolicySnapshot::default();
        let allow = decide("u3", "hi", &snapshot, DefaultPolicy::Allow);
        assert_eq!(allow.decision(), Decision::Allowed);
        assert!(allow.evidence().is_empty());

        let reject = decide("u3", "hi", &snapshot, DefaultPolicy::Reject);
        assert_eq!(reject.decision(), Decision::Rejected);
    }

    #[test]
    fn student_group_scenarios() {
        let snapshot = student_group();
        let engine = DecisionEngine::new(DefaultPolicy::Allow);

        let banned = JoinRequest::new(group(), user("u1"), "I am a student");
        assert_eq!(engine.evaluate(&banned, &snapshot).decision(), Decision::Blacklisted);

        let student = JoinRequest::new(group(), user("u2"), "I am a student");
        let result = engine.evaluate(&student, &snapshot);
        assert_eq!(result.decision(), Decision::Allowed);
        assert_eq!(result.evidence().len(), 1);
        assert_eq!(result.evidence()[0].kind(), RuleKind::Keyword);
        assert_eq!(result.evidence()[0].content(), "student");

        let unmatched = JoinRequest::new(group(), user("u2"), "I am a teacher");
        let result = engine.evaluate(&unmatched, &snapshot);
        assert_eq!(result.decision(), Decision::Rejected);
        assert!(result.evidence().is_empty());
    }

    #[test]
    fn collects_every_matching_rule_in_order() {
        let snapshot = PolicySnapshot::new(
            vec![rule(r"/\d{11}/"), rule("teacher"), rule("call")],
            MemberSet::new(),
            MemberSet::new(),
        );
        let result = decide("u9", "call me at 13812345678", &snapshot, DefaultPolicy::Reject);
        let contents: Vec<_> = result.evidence().iter().map(Rule::content).collect();
        assert_eq!(contents, [r"\d{11}", "call"]);
    }

    #[test]
    fn corrupt_regex_is_skipped_not_fatal() {
        let broken: Rule = serde_json::from_value(serde_json::json!({
            "type": "regex",
            "content": "[unclosed",
            "created_by": "admin",
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        let rules = vec![broken, rule("student")];
        let snapshot = PolicySnapshot::new(rules, MemberSet::new(), MemberSet::new());

        let result = decide("u2", "student [unclosed", &snapshot, DefaultPolicy::Reject);
        assert_eq!(result.decision(), Decision::Allowed);
        assert_eq!(result.evidence().len(), 1);

        let result = decide("u2", "[unclosed", &snapshot, DefaultPolicy::Allow);
        assert_eq!(result.decision(), Decision::Rejected);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let snapshot = student_group();
        let first = decide("u2", "I am a student", &snapshot, DefaultPolicy::Allow);
        let second = decide("u2", "I am a student", &snapshot, DefaultPolicy::Allow);
        assert_eq!(first, second);
    }
}
