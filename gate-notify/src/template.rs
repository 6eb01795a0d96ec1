//! Notification templates with named `{placeholder}` substitution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder names understood by notification templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `{group_name}`
    GroupName,
    /// `{user_name}`
    UserName,
    /// `{user_id}`
    UserId,
    /// `{reason}`: free text supplied with the join request.
    Reason,
    /// `{result}`: human-readable decision label.
    Result,
}

impl Placeholder {
    /// Every supported placeholder.
    pub const ALL: [Self; 5] = [
        Self::GroupName,
        Self::UserName,
        Self::UserId,
        Self::Reason,
        Self::Result,
    ];

    /// Parses a placeholder name as written between braces.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Returns the name written between braces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GroupName => "group_name",
            Self::UserName => "user_name",
            Self::UserId => "user_id",
            Self::Reason => "reason",
            Self::Result => "result",
        }
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// Group display name.
    pub group_name: &'a str,
    /// Requester display name.
    pub user_name: &'a str,
    /// Requester identifier.
    pub user_id: &'a str,
    /// Free-text request reason.
    pub reason: &'a str,
    /// Decision label.
    pub result: &'a str,
}

impl TemplateVars<'_> {
    /// Returns the value bound to a placeholder.
    #[must_use]
    pub fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::GroupName => self.group_name,
            Placeholder::UserName => self.user_name,
            Placeholder::UserId => self.user_id,
            Placeholder::Reason => self.reason,
            Placeholder::Result => self.result,
        }
    }
}

/// A text template such as `"Group: {group_name}"`.
///
/// Rendering is a single pass: substituted values are never re-scanned, so a
/// request reason containing `{user_id}` is emitted verbatim. `{{` and `}}`
/// produce literal braces and unknown names are left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationTemplate(String);

impl NotificationTemplate {
    /// Creates a template from its text.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the template with the supplied values.
    #[must_use]
    pub fn render(&self, vars: &TemplateVars<'_>) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix("{{") {
                out.push('{');
                rest = after;
                continue;
            }
            if let Some(after) = tail.strip_prefix("}}") {
                out.push('}');
                rest = after;
                continue;
            }

            let inner = &tail[1..];
            if tail.starts_with('{') {
                if let Some(end) = inner.find('}') {
                    if let Some(placeholder) = Placeholder::parse(&inner[..end]) {
                        out.push_str(vars.value(placeholder));
                        rest = &inner[end + 1..];
                        continue;
                    }
                }
            }

            out.push_str(&tail[..1]);
            rest = inner;
        }

        out.push_str(rest);
        out
    }

    /// Returns `{names}` referenced by the template that are not supported.
    #[must_use]
    pub fn unknown_placeholders(&self) -> Vec<String> {
        extract_placeholder_refs(&self.0)
            .into_iter()
            .filter(|name| Placeholder::parse(name).is_none())
            .collect()
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Extracts `{name}` references, skipping `{{` escapes.
fn extract_placeholder_refs(template: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next(); // escaped brace
            continue;
        }

        let mut name = String::new();
        let mut closed = false;
        for next in chars.by_ref() {
            if next == '}' {
                closed = true;
                break;
            }
            name.push(next);
        }
        if closed && !name.is_empty() {
            vars.push(name);
        }
    }

    vars
}

/// Notification bucket selected from a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    /// Request admitted by rule match; carries the matched-rule evidence.
    #[serde(alias = "request_received")]
    Received,
    /// Request admitted through the whitelist.
    #[serde(alias = "request_approved")]
    Approved,
    /// Request refused.
    #[serde(alias = "request_rejected")]
    Rejected,
}

const DEFAULT_RECEIVED: &str = "New join request\n\n\
    Group: {group_name}\nApplicant: {user_name}({user_id})\nReason: {reason}\n\n\
    Result: {result}";
const DEFAULT_APPROVED: &str =
    "Join request approved\n\nGroup: {group_name}\nApplicant: {user_name}({user_id})";
const DEFAULT_REJECTED: &str = "Join request rejected\n\n\
    Group: {group_name}\nApplicant: {user_name}({user_id})\nReason: {reason}";

/// Per-category templates. A configured set replaces the defaults wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateSet(BTreeMap<OutcomeCategory, NotificationTemplate>);

impl TemplateSet {
    /// Creates an empty set; every category renders an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets the template for a category.
    #[must_use]
    pub fn with(
        mut self,
        category: OutcomeCategory,
        template: impl Into<NotificationTemplate>,
    ) -> Self {
        self.0.insert(category, template.into());
        self
    }

    /// Returns the template for a category, if configured.
    #[must_use]
    pub fn get(&self, category: OutcomeCategory) -> Option<&NotificationTemplate> {
        self.0.get(&category)
    }

    /// Iterates configured templates by category.
    pub fn iter(&self) -> impl Iterator<Item = (OutcomeCategory, &NotificationTemplate)> {
        self.0.iter().map(|(category, template)| (*category, template))
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::empty()
            .with(OutcomeCategory::Received, DEFAULT_RECEIVED)
            .with(OutcomeCategory::Approved, DEFAULT_APPROVED)
            .with(OutcomeCategory::Rejected, DEFAULT_REJECTED)
    }
}
