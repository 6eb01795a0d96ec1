//! Executes administrative commands against the policy store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gate_policy::{JoinRequest, Rule, matching_rules};
use gate_primitives::{GroupId, UserId};
use gate_store::{ListKind, PolicyStore};
use tracing::info;

use crate::command::{Command, CommandError, CommandParser, CommandResult};
use crate::pipeline::AdmissionService;
use crate::reply;

/// Where and by whom a command was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Group the command was sent in, `None` for private chats.
    pub group_id: Option<GroupId>,
    /// Group display name, if known.
    pub group_name: Option<String>,
    /// Command sender.
    pub sender: UserId,
    /// Message time, recorded on new rules.
    pub timestamp: DateTime<Utc>,
}

impl CommandContext {
    /// Context for a message sent in a group.
    #[must_use]
    pub fn group(group_id: GroupId, sender: UserId) -> Self {
        Self {
            group_id: Some(group_id),
            group_name: None,
            sender,
            timestamp: Utc::now(),
        }
    }

    /// Context for a private message.
    #[must_use]
    pub fn private(sender: UserId) -> Self {
        Self {
            group_id: None,
            group_name: None,
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// Parses and runs commands for one admission service.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    parser: CommandParser,
    service: Arc<AdmissionService>,
}

impl CommandHandler {
    /// Creates a handler using the service's configured command prefix.
    #[must_use]
    pub fn new(service: Arc<AdmissionService>) -> Self {
        Self {
            parser: CommandParser::new(service.config().command_prefix.clone()),
            service,
        }
    }

    /// Returns the parser.
    #[must_use]
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Handles one message, producing the reply text.
    ///
    /// Returns `None` when the message is not a command for this prefix.
    /// Failures are rendered as error replies.
    pub async fn respond(&self, ctx: &CommandContext, input: &str) -> Option<String> {
        let command = match self.parser.parse(input) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(err) => return Some(reply::error(&err.to_string())),
        };

        Some(match self.execute(ctx, &command).await {
            Ok(text) => text,
            Err(CommandError::PermissionDenied) => reply::error(&format!(
                "{}: {}\n\nask a group administrator or update the administrator list",
                ctx.sender,
                CommandError::PermissionDenied
            )),
            Err(err) => reply::error(&err.to_string()),
        })
    }

    /// Runs a parsed command.
    ///
    /// Checks run in order: group context, arguments, authority.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing why the command did not run.
    pub async fn execute(&self, ctx: &CommandContext, command: &Command) -> CommandResult<String> {
        let group = match (&ctx.group_id, command.requires_group()) {
            (Some(group), _) => Some(group),
            (None, true) => return Err(CommandError::NotInGroup),
            (None, false) => None,
        };

        let Some(group) = group else {
            return Ok(reply::help(self.parser.prefix()));
        };

        match command {
            Command::Help => Ok(reply::help(self.parser.prefix())),
            Command::AddRule { pattern } => {
                let pattern = self.required(command, pattern.as_deref())?;
                self.authorise(ctx, command)?;
                self.add_rule(ctx, group, pattern).await
            }
            Command::RemoveRule { index } => {
                let raw = self.required(command, index.as_deref())?;
                let index: usize = raw.parse().map_err(|_| {
                    CommandError::InvalidArgument(format!("`{raw}` is not a rule index"))
                })?;
                self.authorise(ctx, command)?;
                self.remove_rule(ctx, group, index).await
            }
            Command::ListRules => {
                let rules = self.service.store().rules(group).await?;
                Ok(reply::rules_list(&rules, self.parser.prefix()))
            }
            Command::ClearRules => {
                self.authorise(ctx, command)?;
                self.clear_rules(ctx, group).await
            }
            Command::TestRules { text } => {
                let text = self.required(command, text.as_deref())?;
                let rules = self.service.store().rules(group).await?;
                if rules.is_empty() {
                    return Ok(reply::warning(&format!(
                        "this group has no rules\n\nuse /{} add <keyword|/regex/> to add one",
                        self.parser.prefix()
                    )));
                }
                Ok(reply::test_result(text, &matching_rules(&rules, text)))
            }
            Command::AddMember { list, user } => {
                let user = self.user_arg(command, user.as_deref())?;
                self.authorise(ctx, command)?;
                self.add_member(ctx, group, *list, &user).await
            }
            Command::RemoveMember { list, user } => {
                let user = self.user_arg(command, user.as_deref())?;
                self.authorise(ctx, command)?;
                self.remove_member(ctx, group, *list, &user).await
            }
            Command::ListMembers { list } => {
                let members = self.service.store().members(group, *list).await?;
                Ok(reply::members_list(*list, &members))
            }
            Command::TestJoin { user, reason } => {
                let (Some(user), Some(reason)) = (user.as_deref(), reason.as_deref()) else {
                    return Err(self.missing(command));
                };
                let user = parse_user(user)?;
                self.authorise(ctx, command)?;
                self.test_join(ctx, group, user, reason).await
            }
        }
    }

    fn missing(&self, command: &Command) -> CommandError {
        CommandError::MissingArgument {
            usage: self.parser.usage(command),
        }
    }

    fn required<'a>(&self, command: &Command, value: Option<&'a str>) -> CommandResult<&'a str> {
        value.ok_or_else(|| self.missing(command))
    }

    fn user_arg(&self, command: &Command, value: Option<&str>) -> CommandResult<UserId> {
        parse_user(self.required(command, value)?)
    }

    fn authorise(&self, ctx: &CommandContext, command: &Command) -> CommandResult<()> {
        if command.requires_admin() && !self.service.config().is_admin(&ctx.sender) {
            return Err(CommandError::PermissionDenied);
        }
        Ok(())
    }

    fn audit(&self) -> bool {
        self.service.config().enable_logging
    }

    async fn add_rule(
        &self,
        ctx: &CommandContext,
        group: &GroupId,
        pattern: &str,
    ) -> CommandResult<String> {
        let rule = Rule::parse(pattern, ctx.sender.clone(), ctx.timestamp)?;
        let store = self.service.store();

        let mut rules = store.rules(group).await?;
        rules.push(rule.clone());
        store.save_rules(group, &rules).await?;

        if self.audit() {
            info!(
                group_id = %group,
                kind = %rule.kind(),
                content = rule.content(),
                operator = %ctx.sender,
                "rule added"
            );
        }

        Ok(reply::success(&format!(
            "{} rule added\ncontent: {}\nrules in this group: {}",
            rule.kind(),
            rule.content(),
            rules.len()
        )))
    }

    async fn remove_rule(
        &self,
        ctx: &CommandContext,
        group: &GroupId,
        index: usize,
    ) -> CommandResult<String> {
        let store = self.service.store();
        let mut rules = store.rules(group).await?;
        if rules.is_empty() {
            return Ok(reply::warning("this group has no rules"));
        }
        if index == 0 || index > rules.len() {
            return Err(CommandError::InvalidArgument(format!(
                "invalid index, enter a number between 1 and {}",
                rules.len()
            )));
        }

        let removed = rules.remove(index - 1);
        store.save_rules(group, &rules).await?;

        if self.audit() {
            info!(
                group_id = %group,
                kind = %removed.kind(),
                content = removed.content(),
                operator = %ctx.sender,
                "rule removed"
            );
        }

        Ok(reply::success(&format!(
            "rule removed\nkind: {}\ncontent: {}\nrules remaining: {}",
            removed.kind(),
            removed.content(),
            rules.len()
        )))
    }

    async fn clear_rules(&self, ctx: &CommandContext, group: &GroupId) -> CommandResult<String> {
        let store = self.service.store();
        let count = store.rules(group).await?.len();
        if count == 0 {
            return Ok(reply::warning("this group has no rules"));
        }
        store.save_rules(group, &[]).await?;

        if self.audit() {
            info!(group_id = %group, removed = count, operator = %ctx.sender, "rules cleared");
        }
        Ok(reply::success(&format!("all rules cleared\nremoved {count} rule(s)")))
    }

    async fn add_member(
        &self,
        ctx: &CommandContext,
        group: &GroupId,
        list: ListKind,
        user: &UserId,
    ) -> CommandResult<String> {
        if !self.service.store().add_member(group, list, user).await? {
            return Ok(reply::warning(&format!("user {user} is already in the {list}")));
        }
        if self.audit() {
            info!(
                group_id = %group,
                %list,
                user_id = %user,
                operator = %ctx.sender,
                "member added"
            );
        }
        Ok(reply::success(&format!("user {user} added to the {list}")))
    }

    async fn remove_member(
        &self,
        ctx: &CommandContext,
        group: &GroupId,
        list: ListKind,
        user: &UserId,
    ) -> CommandResult<String> {
        if !self.service.store().remove_member(group, list, user).await? {
            return Ok(reply::warning(&format!("user {user} is not in the {list}")));
        }
        if self.audit() {
            info!(
                group_id = %group,
                %list,
                user_id = %user,
                operator = %ctx.sender,
                "member removed"
            );
        }
        Ok(reply::success(&format!("user {user} removed from the {list}")))
    }

    async fn test_join(
        &self,
        ctx: &CommandContext,
        group: &GroupId,
        user: UserId,
        reason: &str,
    ) -> CommandResult<String> {
        let group_name = ctx.group_name.clone().unwrap_or_else(|| group.to_string());
        let request = JoinRequest::new(group.clone(), user.clone(), reason)
            .with_group_name(group_name);

        let admission = self.service.handle(&request).await?;
        let notified = if admission.notification_scheduled() {
            "administrators notified"
        } else {
            "administrators not notified"
        };

        let body = format!(
            "user: {user}\nreason: {reason}\nresult: {}\n\n{notified}",
            admission.summary()
        );
        Ok(if admission.approved() {
            reply::success(&format!("test join request approved\n\n{body}"))
        } else {
            reply::warning(&format!("test join request rejected\n\n{body}"))
        })
    }
}

fn parse_user(raw: &str) -> CommandResult<UserId> {
    UserId::new(raw).map_err(|err| CommandError::InvalidArgument(err.to_string()))
}

#[cfg(test)]
mod tests {
    use gate_config::GateConfig;
    use gate_notify::RecordingNotifier;
    use gate_store::MemoryStore;

    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn group() -> GroupId {
        GroupId::new("g1").unwrap()
    }

    fn handler(admins: &[&str]) -> (CommandHandler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = GateConfig {
            admin_list: admins.iter().map(|id| user(id)).collect(),
            ..GateConfig::default()
        };
        let notifier = Arc::new(RecordingNotifier::new("qq"));
        let service = AdmissionService::new(store.clone(), notifier, config);
        (CommandHandler::new(Arc::new(service)), store)
    }

    fn admin_ctx() -> CommandContext {
        CommandContext::group(group(), user("root"))
    }

    #[tokio::test]
    async fn add_list_remove_round() {
        let (handler, store) = handler(&["root"]);
        let ctx = admin_ctx();

        let reply = handler.respond(&ctx, "/ga add student").await.unwrap();
        assert!(reply.starts_with("✨ keyword rule added"));
        handler.respond(&ctx, "/ga add /\\d{11}/").await.unwrap();
        assert_eq!(store.rules(&group()).await.unwrap().len(), 2);

        let listing = handler.respond(&ctx, "/ga list").await.unwrap();
        assert!(listing.contains("created by: root"));

        let reply = handler.respond(&ctx, "/ga remove 3").await.unwrap();
        assert_eq!(reply, "❌ invalid index, enter a number between 1 and 2");

        let reply = handler.respond(&ctx, "/ga remove 1").await.unwrap();
        assert!(reply.contains("rules remaining: 1"));
        let rules = store.rules(&group()).await.unwrap();
        assert_eq!(rules[0].content(), "\\d{11}");
    }

    #[tokio::test]
    async fn invalid_regex_is_not_stored() {
        let (handler, store) = handler(&[]);
        let reply = handler.respond(&admin_ctx(), "/ga add /[unclosed/").await.unwrap();
        assert!(reply.starts_with("❌ invalid regular expression `[unclosed`"));
        assert!(store.rules(&group()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn checks_group_then_arguments_then_authority() {
        let (handler, _) = handler(&["root"]);
        let stranger = user("guest");

        let err = handler
            .execute(&CommandContext::private(stranger.clone()), &Command::ClearRules)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotInGroup));

        let ctx = CommandContext::group(group(), stranger);
        let err = handler
            .execute(&ctx, &Command::AddRule { pattern: None })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingArgument { usage } if usage.starts_with("/ga add")
        ));

        let err = handler
            .execute(&ctx, &Command::AddRule { pattern: Some("x".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::PermissionDenied));

        // read-only commands need no authority
        assert!(handler.execute(&ctx, &Command::ListRules).await.is_ok());
    }

    #[tokio::test]
    async fn help_works_outside_groups() {
        let (handler, _) = handler(&[]);
        let reply = handler
            .respond(&CommandContext::private(user("anyone")), "/ga help")
            .await
            .unwrap();
        assert!(reply.contains("/ga test_join"));
    }

    #[tokio::test]
    async fn membership_changes_are_idempotent() {
        let (handler, store) = handler(&[]);
        let ctx = admin_ctx();

        let first = handler.respond(&ctx, "/ga whitelist add 42").await.unwrap();
        let second = handler.respond(&ctx, "/ga whitelist add 42").await.unwrap();
        assert_eq!(first, "✨ user 42 added to the whitelist");
        assert_eq!(second, "⚠️ user 42 is already in the whitelist");
        assert_eq!(store.whitelist(&group()).await.unwrap().len(), 1);

        let reply = handler.respond(&ctx, "/ga blacklist remove 42").await.unwrap();
        assert_eq!(reply, "⚠️ user 42 is not in the blacklist");
    }

    #[tokio::test]
    async fn clear_reports_count() {
        let (handler, _) = handler(&[]);
        let ctx = admin_ctx();
        assert_eq!(
            handler.respond(&ctx, "/ga clear").await.unwrap(),
            "⚠️ this group has no rules"
        );
        handler.respond(&ctx, "/ga add a").await.unwrap();
        handler.respond(&ctx, "/ga add b").await.unwrap();
        assert_eq!(
            handler.respond(&ctx, "/ga clear").await.unwrap(),
            "✨ all rules cleared\nremoved 2 rule(s)"
        );
    }

    #[tokio::test]
    async fn test_rules_lists_matches() {
        let (handler, _) = handler(&[]);
        let ctx = admin_ctx();
        handler.respond(&ctx, "/ga add student").await.unwrap();

        let hit = handler.respond(&ctx, "/ga test I am a student").await.unwrap();
        assert!(hit.contains("1. keyword: student"));
        let miss = handler.respond(&ctx, "/ga test I am a teacher").await.unwrap();
        assert!(miss.contains("would be rejected"));
    }

    #[tokio::test]
    async fn test_join_runs_the_pipeline() {
        let (handler, store) = handler(&["root"]);
        store
            .add_member(&group(), ListKind::Blacklist, &user("u1"))
            .await
            .unwrap();

        let reply = handler
            .respond(&admin_ctx(), "/ga test_join u1 I am a student")
            .await
            .unwrap();
        assert!(reply.starts_with("⚠️ test join request rejected"));
        assert!(reply.contains("result: user is blacklisted"));
        assert!(reply.ends_with("administrators notified"));
    }

    #[tokio::test]
    async fn foreign_messages_are_ignored() {
        let (handler, store) = handler(&[]);
        assert!(handler.respond(&admin_ctx(), "good morning").await.is_none());

        // chat that merely starts with the prefix word is not a command
        assert!(handler.respond(&admin_ctx(), "ga add student").await.is_none());
        assert!(store.rules(&group()).await.unwrap().is_empty());
    }
}
