//! Administrative command grammar.
//!
//! Commands look like `/<prefix> <verb> [args]`; the leading slash is
//! optional. Argument presence is checked at execution time so that context
//! checks (group chat, authority) report first.

use gate_policy::PolicyError;
use gate_store::{ListKind, StoreError};
use thiserror::Error;

/// Result alias for command handling.
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors reported back to the command sender.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Verb not recognised.
    #[error("unknown command `{0}`, see `help`")]
    UnknownCommand(String),

    /// A required argument was not supplied.
    #[error("missing argument\n\nusage: {usage}")]
    MissingArgument {
        /// Usage line for the command.
        usage: String,
    },

    /// An argument was supplied but is unusable.
    #[error("{0}")]
    InvalidArgument(String),

    /// The command only works inside a group chat.
    #[error("this command can only be used in a group chat")]
    NotInGroup,

    /// The sender is not an administrator.
    #[error("this command is restricted to administrators")]
    PermissionDenied,

    /// Rule construction failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A parsed command with raw, possibly absent arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show usage.
    Help,
    /// Append a keyword or `/regex/` rule.
    AddRule {
        /// Raw pattern.
        pattern: Option<String>,
    },
    /// Remove a rule by 1-based index.
    RemoveRule {
        /// Raw index.
        index: Option<String>,
    },
    /// List rules.
    ListRules,
    /// Remove every rule.
    ClearRules,
    /// Match text against the rules only.
    TestRules {
        /// Text to test.
        text: Option<String>,
    },
    /// Add a user to a member list.
    AddMember {
        /// Target list.
        list: ListKind,
        /// Raw user id.
        user: Option<String>,
    },
    /// Remove a user from a member list.
    RemoveMember {
        /// Target list.
        list: ListKind,
        /// Raw user id.
        user: Option<String>,
    },
    /// List a member list.
    ListMembers {
        /// Target list.
        list: ListKind,
    },
    /// Run a simulated join request through the full pipeline.
    TestJoin {
        /// Raw requester id.
        user: Option<String>,
        /// Request reason.
        reason: Option<String>,
    },
}

impl Command {
    /// Whether the command needs a group context.
    #[must_use]
    pub const fn requires_group(&self) -> bool {
        !matches!(self, Self::Help)
    }

    /// Whether the command needs administrator authority.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::AddRule { .. }
                | Self::RemoveRule { .. }
                | Self::ClearRules
                | Self::AddMember { .. }
                | Self::RemoveMember { .. }
                | Self::TestJoin { .. }
        )
    }
}

/// Splits off the first whitespace-delimited word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], input[end..].trim_start())),
        None => Some((input, "")),
    }
}

fn non_empty(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_owned())
}

fn first_word(rest: &str) -> Option<String> {
    next_word(rest).map(|(word, _)| word.to_owned())
}

/// Recognises commands addressed to one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    /// Creates a parser for `prefix` (without the leading slash).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the command prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parses one message.
    ///
    /// Returns `Ok(None)` unless the message starts with `/<prefix>`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCommand`] for an unrecognised verb.
    pub fn parse(&self, input: &str) -> CommandResult<Option<Command>> {
        let Some((head, rest)) = next_word(input) else {
            return Ok(None);
        };
        if head.strip_prefix('/') != Some(self.prefix.as_str()) {
            return Ok(None);
        }

        let Some((verb, rest)) = next_word(rest) else {
            return Ok(Some(Command::Help));
        };

        let command = match verb {
            "help" | "帮助" => Command::Help,
            "add" => Command::AddRule {
                pattern: non_empty(rest),
            },
            "remove" => Command::RemoveRule {
                index: first_word(rest),
            },
            "list" => Command::ListRules,
            "clear" => Command::ClearRules,
            "test" => Command::TestRules {
                text: non_empty(rest),
            },
            "whitelist" => Self::parse_members(ListKind::Whitelist, rest)?,
            "blacklist" => Self::parse_members(ListKind::Blacklist, rest)?,
            "test_join" => {
                let (user, reason) = match next_word(rest) {
                    Some((user, reason)) => (Some(user.to_owned()), non_empty(reason)),
                    None => (None, None),
                };
                Command::TestJoin { user, reason }
            }
            other => return Err(CommandError::UnknownCommand(other.to_owned())),
        };

        Ok(Some(command))
    }

    fn parse_members(list: ListKind, rest: &str) -> CommandResult<Command> {
        match next_word(rest) {
            Some(("add", user)) => Ok(Command::AddMember {
                list,
                user: first_word(user),
            }),
            Some(("remove", user)) => Ok(Command::RemoveMember {
                list,
                user: first_word(user),
            }),
            Some(("list", _)) => Ok(Command::ListMembers { list }),
            Some((other, _)) => Err(CommandError::UnknownCommand(format!("{list} {other}"))),
            None => Err(CommandError::UnknownCommand(list.to_string())),
        }
    }

    /// Usage line for a command, rendered with this parser's prefix.
    #[must_use]
    pub fn usage(&self, command: &Command) -> String {
        let prefix = &self.prefix;
        match command {
            Command::Help => format!("/{prefix} help"),
            Command::AddRule { .. } => format!(
                "/{prefix} add <keyword|/regex/>\n\
                 wrap regular expressions in slashes, e.g. /{prefix} add /\\d{{11}}/"
            ),
            Command::RemoveRule { .. } => format!("/{prefix} remove <index>"),
            Command::ListRules => format!("/{prefix} list"),
            Command::ClearRules => format!("/{prefix} clear"),
            Command::TestRules { .. } => format!("/{prefix} test <text>"),
            Command::AddMember { list, .. } => format!("/{prefix} {list} add <user_id>"),
            Command::RemoveMember { list, .. } => format!("/{prefix} {list} remove <user_id>"),
            Command::ListMembers { list } => format!("/{prefix} {list} list"),
            Command::TestJoin { .. } => format!("/{prefix} test_join <user_id> <reason>"),
        }
    }
}
