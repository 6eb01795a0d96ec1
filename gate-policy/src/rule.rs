//! Stored admission rules.

use std::fmt;

use chrono::{DateTime, Utc};
use gate_primitives::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::pattern::{self, MatchOutcome, PatternKind, REGEX_DELIMITER};

/// Matching strategy of a stored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Case-sensitive substring match.
    Keyword,
    /// Regular expression search.
    Regex,
}

impl RuleKind {
    /// Lower-case label used in listings and notifications.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Regex => "regex",
        }
    }

    /// Pattern class the stored content is matched as.
    #[must_use]
    pub const fn pattern_kind(self) -> PatternKind {
        match self {
            Self::Keyword => PatternKind::Literal,
            Self::Regex => PatternKind::Regex,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword or regular-expression pattern that auto-approves matching requests.
///
/// Rules are immutable once created. Regex content is stored without its
/// delimiters and is compiled again on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    kind: RuleKind,
    content: String,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl Rule {
    /// Builds a rule from a raw pattern, treating `/body/` as a regex.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] for a blank pattern and
    /// [`PolicyError::InvalidRegex`] when a regex body does not compile.
    pub fn parse(
        pattern: &str,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> PolicyResult<Self> {
        match pattern::classify(pattern) {
            PatternKind::Regex => {
                let delimiter = REGEX_DELIMITER.len_utf8();
                let body = &pattern[delimiter..pattern.len() - delimiter];
                Self::regex(body, created_by, created_at)
            }
            PatternKind::Literal => Self::keyword(pattern, created_by, created_at),
        }
    }

    /// Builds a keyword rule.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] when the keyword is blank.
    pub fn keyword(
        content: impl Into<String>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> PolicyResult<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(PolicyError::InvalidRule("rule pattern cannot be empty"));
        }

        Ok(Self {
            kind: RuleKind::Keyword,
            content,
            created_by,
            created_at,
        })
    }

    /// Builds a regex rule from a body without delimiters.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRegex`] when the body does not compile.
    pub fn regex(
        body: impl Into<String>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> PolicyResult<Self> {
        let content = body.into();
        if content.is_empty() {
            return Err(PolicyError::InvalidRule("rule pattern cannot be empty"));
        }
        pattern::validate(&content)?;

        Ok(Self {
            kind: RuleKind::Regex,
            content,
            created_by,
            created_at,
        })
    }

    /// Returns the rule kind.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Returns the stored content (regex bodies carry no delimiters).
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the user that created the rule.
    #[must_use]
    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Tests the rule against request text.
    ///
    /// A stored regex that no longer compiles (for example, data written by
    /// another tool) yields an invalid, non-matching outcome.
    #[must_use]
    pub fn matches(&self, text: &str) -> MatchOutcome {
        pattern::match_body(self.kind.pattern_kind(), &self.content, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> UserId {
        UserId::new("admin").unwrap()
    }

    #[test]
    fn parse_strips_regex_delimiters() {
        let rule = Rule::parse(r"/\d{11}/", author(), Utc::now()).unwrap();
        assert_eq!(rule.kind(), RuleKind::Regex);
        assert_eq!(rule.content(), r"\d{11}");
        assert!(rule.matches("13812345678").matched);
    }

    #[test]
    fn parse_keeps_literal_verbatim() {
        let rule = Rule::parse("//", author(), Utc::now()).unwrap();
        assert_eq!(rule.kind(), RuleKind::Keyword);
        assert_eq!(rule.content(), "//");
    }

    #[test]
    fn invalid_regex_is_rejected_at_creation() {
        let err = Rule::parse("/[unclosed/", author(), Utc::now()).expect_err("invalid");
        assert!(matches!(err, PolicyError::InvalidRegex { .. }));
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let err = Rule::keyword("  ", author(), Utc::now()).expect_err("blank");
        assert_eq!(err, PolicyError::InvalidRule("rule pattern cannot be empty"));
    }

    #[test]
    fn serialized_form_uses_type_field() {
        let rule = Rule::keyword("student", author(), Utc::now()).unwrap();
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["type"], "keyword");
        assert_eq!(value["content"], "student");
        assert_eq!(value["created_by"], "admin");
    }

    #[test]
    fn stored_invalid_regex_fails_at_match_time() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "type": "regex",
            "content": "(",
            "created_by": "admin",
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();

        let outcome = rule.matches("anything");
        assert!(!outcome.valid);
        assert!(!outcome.matched);
    }
}
