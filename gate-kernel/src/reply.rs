//! Reply text for the command surface.

use std::fmt::Write as _;

use gate_policy::{MemberSet, Rule};
use gate_store::ListKind;

const RULER: &str = "----------------------------------------";

/// Marks a successful operation.
#[must_use]
pub fn success(content: &str) -> String {
    format!("✨ {content}")
}

/// Marks a failed operation.
#[must_use]
pub fn error(content: &str) -> String {
    format!("❌ {content}")
}

/// Marks a no-op or noteworthy condition.
#[must_use]
pub fn warning(content: &str) -> String {
    format!("⚠️ {content}")
}

/// Enumerated rule listing with provenance.
#[must_use]
pub fn rules_list(rules: &[Rule], prefix: &str) -> String {
    if rules.is_empty() {
        return warning(&format!(
            "this group has no rules\n\nuse /{prefix} add <keyword|/regex/> to add one"
        ));
    }

    let mut out = String::from("📋 Rules for this group\n");
    out.push_str(RULER);
    out.push('\n');
    for (idx, rule) in rules.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, rule.kind());
        let _ = writeln!(out, "   content: {}", rule.content());
        let _ = writeln!(out, "   created by: {}", rule.created_by());
        let created_at = rule.created_at().format("%Y-%m-%d %H:%M:%S UTC");
        let _ = writeln!(out, "   created at: {created_at}");
        out.push_str(RULER);
        out.push('\n');
    }
    let _ = write!(
        out,
        "total: {} rule(s)\nuse /{prefix} remove <index> to delete a rule",
        rules.len()
    );
    out
}

/// Enumerated member listing.
#[must_use]
pub fn members_list(list: ListKind, members: &MemberSet) -> String {
    if members.is_empty() {
        return warning(&format!("the {list} of this group is empty"));
    }

    let mut out = format!("📋 {list} of this group\n{RULER}\n");
    for (idx, member) in members.iter().enumerate() {
        let _ = writeln!(out, "{}. {member}", idx + 1);
    }
    let _ = write!(out, "\ntotal: {} user(s)", members.len());
    out
}

/// Result of matching text against the rule set only.
#[must_use]
pub fn test_result(text: &str, matched: &[&Rule]) -> String {
    if matched.is_empty() {
        return format!(
            "❌ no match\n{RULER}\ntext: {text}\n\
             no rule matched\nthis join request would be rejected"
        );
    }

    let mut out = format!(
        "✅ match\n{RULER}\ntext: {text}\nmatched {} rule(s):\n\n",
        matched.len()
    );
    for (idx, rule) in matched.iter().enumerate() {
        let _ = writeln!(out, "{}. {}: {}", idx + 1, rule.kind(), rule.content());
    }
    out.push_str("\nthis join request would be allowed");
    out
}

/// Usage overview rendered with the configured prefix.
#[must_use]
pub fn help(prefix: &str) -> String {
    format!(
        "🤖 Group admission gate

Join requests are checked against the blacklist, then the whitelist, then the
group's keyword and regex rules.

Commands
  /{prefix} add <keyword|/regex/>      add a rule, e.g. /{prefix} add /\\d{{11}}/
  /{prefix} remove <index>             delete a rule by its list position
  /{prefix} list                       show this group's rules
  /{prefix} clear                      delete every rule
  /{prefix} test <text>                check text against the rules
  /{prefix} whitelist add|remove <id>  manage the whitelist
  /{prefix} whitelist list             show the whitelist
  /{prefix} blacklist add|remove <id>  manage the blacklist
  /{prefix} blacklist list             show the blacklist
  /{prefix} test_join <id> <reason>    simulate a join request
  /{prefix} help                       show this message

Notes
- wrap regular expressions in slashes
- keywords match anywhere in the request text, case-sensitive
- blacklisted users are always rejected, even if whitelisted
- only administrators may change rules and lists or run test_join"
    )
}
