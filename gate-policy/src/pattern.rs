//! Pattern sublanguage used by admission rules.
//!
//! A pattern wrapped in [`REGEX_DELIMITER`] on both sides (with a non-empty
//! body) is a regular expression; anything else is a literal keyword matched
//! by plain substring containment.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// Character wrapping a regular expression body, as in `/\d{11}/`.
pub const REGEX_DELIMITER: char = '/';

/// Syntactic class of a pattern string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Plain keyword, matched as a case-sensitive substring.
    Literal,
    /// Delimited regular expression, matched with search semantics.
    Regex,
}

/// Classifies a pattern without checking that a regex body compiles.
#[must_use]
pub fn classify(pattern: &str) -> PatternKind {
    if regex_body(pattern).is_some() {
        PatternKind::Regex
    } else {
        PatternKind::Literal
    }
}

/// Returns the body between the delimiters when `pattern` is a regex pattern.
#[must_use]
pub fn regex_body(pattern: &str) -> Option<&str> {
    pattern
        .strip_prefix(REGEX_DELIMITER)?
        .strip_suffix(REGEX_DELIMITER)
        .filter(|body| !body.is_empty())
}

/// Compiles a regex body (without delimiters).
///
/// # Errors
///
/// Returns [`PolicyError::InvalidRegex`] carrying the compiler message verbatim.
pub fn compile(body: &str) -> PolicyResult<Regex> {
    Regex::new(body).map_err(|err| PolicyError::InvalidRegex {
        pattern: body.to_owned(),
        message: err.to_string(),
    })
}

/// Checks that a regex body (without delimiters) compiles.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidRegex`] carrying the compiler message verbatim.
pub fn validate(body: &str) -> PolicyResult<()> {
    compile(body).map(drop)
}

/// Outcome of matching an unclassified pattern against free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// `false` only when a regex pattern failed to compile.
    pub valid: bool,
    /// Whether the pattern occurs in the text.
    pub matched: bool,
    /// Compiler message for invalid regex patterns.
    pub error: Option<String>,
}

impl MatchOutcome {
    fn hit(matched: bool) -> Self {
        Self {
            valid: true,
            matched,
            error: None,
        }
    }

    fn invalid(message: String) -> Self {
        Self {
            valid: false,
            matched: false,
            error: Some(message),
        }
    }
}

/// Matches an already classified body against `text`.
///
/// `body` is the keyword itself or the regex without delimiters. Never fails:
/// an invalid regex is reported through [`MatchOutcome::valid`].
#[must_use]
pub fn match_body(kind: PatternKind, body: &str, text: &str) -> MatchOutcome {
    match kind {
        PatternKind::Literal => MatchOutcome::hit(text.contains(body)),
        PatternKind::Regex => match compile(body) {
            Ok(regex) => MatchOutcome::hit(regex.is_match(text)),
            Err(PolicyError::InvalidRegex { message, .. }) => MatchOutcome::invalid(message),
            Err(other) => MatchOutcome::invalid(other.to_string()),
        },
    }
}

/// Classifies `pattern` and reports whether it matches anywhere in `text`.
///
/// Never fails: an invalid regex is reported through [`MatchOutcome::valid`].
#[must_use]
pub fn matches(pattern: &str, text: &str) -> MatchOutcome {
    match regex_body(pattern) {
        Some(body) => match_body(PatternKind::Regex, body, text),
        None => match_body(PatternKind::Literal, pattern, text),
    }
}
