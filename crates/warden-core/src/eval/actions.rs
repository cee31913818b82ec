//! Running a rule's `do` list.
//!
//! Entries run in order. Conditions placed in `do` record their result for
//! the `if-true`/`if-false` blocks that follow; blocks nest by pushing their
//! body onto a stack of iterators, so execution never recurses.

use std::collections::BTreeMap;
use std::slice;

use chrono::{Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::{debug, info, warn};

use super::template::{substitute, TIMESTAMP_FORMAT};
use super::{Runtime, Variables};
use crate::error::{ErrorCode, WardenError, WardenResult};
use crate::heat::HeatKey;
use crate::host::{
    Destination, EffectContext, Embed, EmbedColor, EmbedField, ExpelAction, Lookup, Notification,
    OutgoingMessage, SentMessage,
};
use crate::rule::params::{
    Choices, ColorArg, DmArgs, GetUserInfoArgs, IdOrName, SendMessageArgs, Text, Transform,
    VarAssignRandomArgs, VarSliceArgs, VarSplitArgs,
};
use crate::rule::{ActionCall, ActionEntry};
use crate::types::{Action, Channel, Member, Message, Role, Subject};

/// An action whose effect the host could not carry out.
#[derive(Debug)]
pub struct ActionFailure {
    pub action: Action,
    pub error: WardenError,
}

/// What a `do_actions` call did.
#[derive(Debug, Default)]
pub struct ActionReport {
    /// Actions run, failed ones included.
    pub executed: usize,
    /// Whether `exit` stopped the list.
    pub exited: bool,
    pub last_expel: Option<ExpelAction>,
    pub failures: Vec<ActionFailure>,
}

impl ActionReport {
    /// Whether the member was banned, kicked or softbanned.
    pub fn expelled(&self) -> bool {
        self.last_expel.is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Flow {
    Continue,
    Exit,
}

pub(crate) async fn execute(
    rt: Runtime<'_>,
    actions: &[ActionEntry],
    subject: &Subject,
    vars: Variables,
) -> WardenResult<ActionReport> {
    let mut run = Execution {
        rt,
        subject,
        vars,
        last_sent: None,
        last_expel: None,
    };
    let mut report = ActionReport::default();
    let mut last_result: Option<bool> = None;
    let mut stack: Vec<slice::Iter<'_, ActionEntry>> = vec![actions.iter()];

    while let Some(entries) = stack.last_mut() {
        let Some(entry) = entries.next() else {
            stack.pop();
            continue;
        };

        match entry {
            ActionEntry::Action(item) => {
                report.executed += 1;
                match run.action(&item.call).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit) => {
                        debug!(rule = rt.rule, "exit reached");
                        report.exited = true;
                        break;
                    }
                    Err(e) if e.is_evaluation() || e.is_invalid_rule() => return Err(e),
                    Err(e) => {
                        warn!(
                            rule = rt.rule,
                            guild_id = subject.guild.id,
                            mode = %rt.mode,
                            action = %item.kind(),
                            error = %e,
                            "action failed"
                        );
                        report.failures.push(ActionFailure {
                            action: item.kind(),
                            error: e,
                        });
                    }
                }
            }
            ActionEntry::Condition(condition) => {
                let trace = rt.evaluate_entry(condition, subject, &run.vars).await?;
                last_result = Some(trace.passed());
            }
            ActionEntry::Branch { block, body } => {
                if block.runs_after(last_result) {
                    stack.push(body.iter());
                }
            }
        }
    }

    report.last_expel = run.last_expel;
    Ok(report)
}

/// State of one `do_actions` invocation.
struct Execution<'a> {
    rt: Runtime<'a>,
    subject: &'a Subject,
    vars: Variables,
    last_sent: Option<SentMessage>,
    last_expel: Option<ExpelAction>,
}

impl<'a> Execution<'a> {
    fn ctx(&self) -> EffectContext<'a> {
        EffectContext {
            rule: self.rt.rule,
            guild: &self.subject.guild,
            mode: self.rt.mode,
        }
    }

    fn sub(&self, text: &Text) -> String {
        substitute(&text.0, &self.vars)
    }

    fn member(&self, action: Action) -> WardenResult<&'a Member> {
        self.subject
            .member()
            .ok_or_else(|| WardenError::missing_context("user", action.as_str()))
    }

    fn message(&self, action: Action) -> WardenResult<&'a Message> {
        self.subject
            .msg()
            .ok_or_else(|| WardenError::missing_context("message", action.as_str()))
    }

    fn channel(&self, action: Action) -> WardenResult<&'a Channel> {
        self.message(action).map(|m| &m.channel)
    }

    fn var(&self, name: &str) -> WardenResult<String> {
        self.vars.get(name).cloned().ok_or_else(|| {
            WardenError::evaluation(
                ErrorCode::EvalUnknownVariable,
                format!("Variable \"{name}\" does not exist."),
            )
        })
    }

    async fn monitor(&self, text: &str) -> WardenResult<()> {
        let line = format!("[Warden] ({}): {}", self.rt.rule, text);
        self.rt.host.send_to_monitor(&self.ctx(), &line).await
    }

    async fn action(&mut self, call: &ActionCall) -> WardenResult<Flow> {
        use ActionCall as A;

        let kind = call.kind();
        let host = self.rt.host;
        let subject = self.subject;
        let guild = &subject.guild;
        let ctx = self.ctx();

        if let Some(replacement) = kind.replacement() {
            let notice = format!("Action '{kind}' is deprecated, use '{replacement}' instead.");
            if let Err(e) = self.monitor(&notice).await {
                warn!(rule = self.rt.rule, error = %e, "could not post deprecation notice");
            }
        }

        match call {
            A::Dm(args) => self.send_dm(args).await?,
            A::DmUser(text) => {
                let member = self.member(kind)?;
                let content = self.sub(text);
                self.dm(member, content).await?;
            }
            A::NotifyStaff(text) | A::NotifyStaffAndPing(text) => {
                let notification = Notification {
                    text: self.sub(text),
                    ping: matches!(call, A::NotifyStaffAndPing(_)),
                    ..Notification::default()
                };
                self.last_sent = host.notify_staff(&ctx, &notification).await?;
            }
            A::NotifyStaffWithEmbed(args) => {
                let notification = Notification {
                    text: self.sub(&args.content),
                    title: Some(self.sub(&args.title)),
                    footer: Some(format!("Warden rule `{}`", self.rt.rule)),
                    ping: false,
                };
                self.last_sent = host.notify_staff(&ctx, &notification).await?;
            }
            A::BanAndDelete(days) => {
                let member = self.member_in_guild(kind).await?;
                let reason = format!("Banned by Warden rule '{}'", self.rt.rule);
                host.ban(&ctx, member, *days, &reason).await?;
                self.expelled(ExpelAction::Ban, member);
            }
            A::Kick => {
                let member = self.member_in_guild(kind).await?;
                let reason = format!("Kicked by Warden action '{}'", self.rt.rule);
                host.kick(&ctx, member, &reason).await?;
                self.expelled(ExpelAction::Kick, member);
            }
            A::Softban => {
                let member = self.member_in_guild(kind).await?;
                let reason = format!("Softbanned by Warden rule '{}'", self.rt.rule);
                host.softban(&ctx, member, &reason).await?;
                self.expelled(ExpelAction::Softban, member);
            }
            A::PunishUser | A::PunishUserWithMessage => {
                let member = self.member(kind)?;
                let channel = match call {
                    A::PunishUserWithMessage => Some(self.channel(kind)?),
                    _ => None,
                };
                if !host.punish(&ctx, member, channel).await? {
                    self.monitor(
                        "Failed to punish user. Is the punish role still present and with *no* privileges?",
                    )
                    .await?;
                }
            }
            A::Modlog(text) => {
                if let Some(action) = self.last_expel {
                    let member = self.member(kind)?;
                    let reason = self.sub(text);
                    host.create_modlog_case(&ctx, member, action, &reason).await?;
                }
            }
            A::DeleteUserMessage => {
                let message = self.message(kind)?;
                host.delete_message(&ctx, message).await?;
            }
            A::SendInChannel(text) => {
                let channel = self.channel(kind)?;
                let message = OutgoingMessage {
                    allow_mass_mentions: true,
                    ..OutgoingMessage::text(self.sub(text))
                };
                self.last_sent = host
                    .send_message(&ctx, &Destination::Channel(channel.clone()), &message)
                    .await?;
            }
            A::SetChannelSlowmode(delay) => {
                let channel = self.channel(kind)?;
                host.set_slowmode(&ctx, channel, *delay).await?;
            }
            A::AddRolesToUser(refs) => {
                let member = self.member(kind)?;
                let roles: Vec<Role> = self
                    .resolve_roles(refs)
                    .await?
                    .into_iter()
                    .filter(|role| !member.roles.iter().any(|r| r.id == role.id))
                    .collect();
                if !roles.is_empty() {
                    let reason = format!("Assigned by Warden rule '{}'", self.rt.rule);
                    host.add_roles(&ctx, member, &roles, &reason).await?;
                }
            }
            A::RemoveRolesFromUser(refs) => {
                let member = self.member(kind)?;
                let roles: Vec<Role> = self
                    .resolve_roles(refs)
                    .await?
                    .into_iter()
                    .filter(|role| member.roles.iter().any(|r| r.id == role.id))
                    .collect();
                if !roles.is_empty() {
                    let reason = format!("Unassigned by Warden rule '{}'", self.rt.rule);
                    host.remove_roles(&ctx, member, &roles, &reason).await?;
                }
            }
            A::EnableEmergencyMode(active) => host.set_emergency_mode(&ctx, *active).await?,
            A::SetUserNickname(text) => {
                let member = self.member(kind)?;
                let nickname = (!text.0.is_empty()).then(|| self.sub(text));
                let reason = format!("Changed nickname by Warden rule '{}'", self.rt.rule);
                host.set_nickname(&ctx, member, nickname.as_deref(), &reason)
                    .await?;
            }
            A::NoOp => {}
            A::SendToMonitor(text) => {
                let text = self.sub(text);
                self.monitor(&text).await?;
            }
            A::SendToChannel(args) => {
                let reference = &args.id_or_name.0;
                let channel = self
                    .find_channel(reference)
                    .await?
                    .ok_or_else(|| WardenError::not_found(format!("Channel '{reference}' not found.")))?;
                let message = OutgoingMessage {
                    allow_mass_mentions: true,
                    ..OutgoingMessage::text(self.sub(&args.content))
                };
                self.last_sent = host
                    .send_message(&ctx, &Destination::Channel(channel), &message)
                    .await?;
            }
            A::AddUserHeatpoint(ttl) => self.add_user_heat(kind, 1, *ttl)?,
            A::AddUserHeatpoints(args) => {
                self.add_user_heat(kind, points(args.points.0), args.delta.0)?
            }
            A::AddChannelHeatpoint(ttl) => self.add_channel_heat(kind, 1, *ttl)?,
            A::AddChannelHeatpoints(args) => {
                self.add_channel_heat(kind, points(args.points.0), args.delta.0)?
            }
            A::AddCustomHeatpoint(args) => {
                let key = HeatKey::custom(self.rt.mode, guild.id, self.sub(&args.label));
                self.rt.heat.increase_by(&key, 1, Some(args.delta.0));
            }
            A::AddCustomHeatpoints(args) => {
                let key = HeatKey::custom(self.rt.mode, guild.id, self.sub(&args.label));
                self.rt
                    .heat
                    .increase_by(&key, points(args.points.0), Some(args.delta.0));
            }
            A::EmptyUserHeat => {
                let member = self.member(kind)?;
                self.rt
                    .heat
                    .reset(&HeatKey::user(self.rt.mode, guild.id, member.id));
                self.vars.insert("user_heat".into(), "0".into());
            }
            A::EmptyChannelHeat => {
                let channel = self.channel(kind)?;
                self.rt
                    .heat
                    .reset(&HeatKey::channel(self.rt.mode, guild.id, channel.id));
                self.vars.insert("channel_heat".into(), "0".into());
            }
            A::EmptyCustomHeat(label) => {
                let key = HeatKey::custom(self.rt.mode, guild.id, self.sub(label));
                self.rt.heat.reset(&key);
            }
            A::IssueCommand(args) => {
                let issuer = host
                    .lookup_member(guild, &Lookup::Id(args.id.0))
                    .await?
                    .ok_or_else(|| {
                        WardenError::not_found(format!("User {} is not in the server.", args.id.0))
                    })?;
                let command = self.sub(&args.command);
                host.issue_command(&ctx, &issuer, &command, subject.channel())
                    .await?;
            }
            A::DeleteLastMessageSentAfter(after) => {
                if let Some(sent) = self.last_sent.take() {
                    host.delete_message_after(&ctx, &sent, *after).await?;
                }
            }
            A::SendMessage(args) => self.send_message(args).await?,
            A::GetUserInfo(args) => self.get_user_info(args).await?,
            A::Exit => return Ok(Flow::Exit),
            A::VarAssign(args) => {
                let value = if args.evaluate {
                    self.sub(&args.value)
                } else {
                    args.value.0.clone()
                };
                let name = self.sub(&args.var_name);
                self.vars.insert(name, value);
            }
            A::VarAssignRandom(args) => self.var_assign_random(args)?,
            A::VarReplace(args) => {
                let name = self.sub(&args.var_name);
                let mut value = self.var(&name)?;
                for needle in args.strings.items() {
                    value = value.replace(&needle.0, &args.substring.0);
                }
                self.vars.insert(name, value);
            }
            A::VarSlice(args) => self.var_slice(args)?,
            A::VarSplit(args) => self.var_split(args)?,
            A::VarTransform(args) => {
                let name = self.sub(&args.var_name);
                let value = self.var(&name)?;
                self.vars.insert(name, transform(&value, args.operation));
            }
        }

        Ok(Flow::Continue)
    }

    fn expelled(&mut self, action: ExpelAction, member: &Member) {
        info!(
            rule = self.rt.rule,
            guild_id = self.subject.guild.id,
            user_id = member.id,
            action = %action,
            "member expelled"
        );
        self.last_expel = Some(action);
    }

    /// The subject's member, checked to still be in the guild.
    async fn member_in_guild(&self, action: Action) -> WardenResult<&'a Member> {
        let member = self.member(action)?;
        let present = self
            .rt
            .host
            .lookup_member(&self.subject.guild, &Lookup::Id(member.id))
            .await?;
        if present.is_none() {
            return Err(WardenError::not_found(format!(
                "User {} ({}) not in the server.",
                member.name, member.id
            )));
        }
        Ok(member)
    }

    /// Channels by id, then by name.
    async fn find_channel(&self, reference: &str) -> WardenResult<Option<Channel>> {
        let guild = &self.subject.guild;
        if let Lookup::Id(id) = Lookup::parse(reference) {
            if let Some(channel) = self.rt.host.lookup_channel(guild, &Lookup::Id(id)).await? {
                return Ok(Some(channel));
            }
        }
        self.rt
            .host
            .lookup_channel(guild, &Lookup::Name(reference.to_string()))
            .await
    }

    /// Roles by id, then by name. Unknown references are skipped.
    async fn resolve_roles(&self, refs: &[IdOrName]) -> WardenResult<Vec<Role>> {
        let guild = &self.subject.guild;
        let mut roles: Vec<Role> = Vec::with_capacity(refs.len());
        for reference in refs {
            let mut role = match reference.id() {
                Some(id) => self.rt.host.lookup_role(guild, &Lookup::Id(id)).await?,
                None => None,
            };
            if role.is_none() {
                role = self
                    .rt
                    .host
                    .lookup_role(guild, &Lookup::Name(reference.0.clone()))
                    .await?;
            }
            match role {
                Some(role) if !roles.iter().any(|r| r.id == role.id) => roles.push(role),
                Some(_) => {}
                None => debug!(rule = self.rt.rule, role = %reference.0, "role not found"),
            }
        }
        Ok(roles)
    }

    fn add_user_heat(&mut self, action: Action, amount: u32, ttl: Duration) -> WardenResult<()> {
        let member = self.member(action)?;
        let key = HeatKey::user(self.rt.mode, self.subject.guild.id, member.id);
        let count = self.rt.heat.increase_by(&key, amount, Some(ttl));
        self.vars.insert("user_heat".into(), count.to_string());
        Ok(())
    }

    fn add_channel_heat(&mut self, action: Action, amount: u32, ttl: Duration) -> WardenResult<()> {
        let channel = self.channel(action)?;
        let key = HeatKey::channel(self.rt.mode, self.subject.guild.id, channel.id);
        let count = self.rt.heat.increase_by(&key, amount, Some(ttl));
        self.vars.insert("channel_heat".into(), count.to_string());
        Ok(())
    }

    async fn send_dm(&mut self, args: &DmArgs) -> WardenResult<()> {
        let subject = self.subject;
        let guild = &subject.guild;
        let host = self.rt.host;
        let mut member = host.lookup_member(guild, &Lookup::Id(args.id.0)).await?;
        if member.is_none() {
            member = host
                .lookup_member(guild, &Lookup::Name(args.id.0.to_string()))
                .await?;
        }
        let Some(member) = member else {
            debug!(rule = self.rt.rule, user_id = args.id.0, "dm recipient not found");
            return Ok(());
        };
        let content = self.sub(&args.content);
        self.dm(&member, content).await
    }

    /// A failed DM is reported to the monitor rather than as a failure:
    /// members can simply have DMs closed.
    async fn dm(&mut self, member: &Member, content: String) -> WardenResult<()> {
        let destination = Destination::Member(member.clone());
        match self
            .rt
            .host
            .send_message(&self.ctx(), &destination, &OutgoingMessage::text(content))
            .await
        {
            Ok(sent) => self.last_sent = sent,
            Err(e) => {
                debug!(rule = self.rt.rule, user_id = member.id, error = %e, "dm failed");
                self.last_sent = None;
                self.monitor(&format!("Failed to DM user {} ({})", member.name, member.id))
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_message(&mut self, args: &SendMessageArgs) -> WardenResult<()> {
        let subject = self.subject;
        let guild = &subject.guild;
        let host = self.rt.host;
        let ctx = self.ctx();

        let target = self.sub(&args.id);
        let destination = match Lookup::parse(&target) {
            Lookup::Id(id) => match host.lookup_channel(guild, &Lookup::Id(id)).await? {
                Some(channel) => Destination::Channel(channel),
                None => match host.lookup_member(guild, &Lookup::Id(id)).await? {
                    Some(member) => Destination::Member(member),
                    None => {
                        return self
                            .monitor("Failed to send message, I could not find the recipient.")
                            .await;
                    }
                },
            },
            name @ Lookup::Name(_) => match host.lookup_channel(guild, &name).await? {
                Some(channel) => Destination::Channel(channel),
                None => {
                    return Err(WardenError::not_found(format!(
                        "Failed to send message, '{target}' is not a valid channel name."
                    )))
                }
            },
        };

        let content = args
            .content
            .as_ref()
            .map(|c| self.sub(c))
            .filter(|c| !c.is_empty());
        let embed = args.has_embed().then(|| self.embed(args));
        if content.is_none() && embed.is_none() {
            return Err(WardenError::effect("I have no content and no embed to send."));
        }
        let message = OutgoingMessage {
            content,
            embed,
            allow_mass_mentions: args.allow_mass_mentions,
        };

        let edit_id = args
            .edit_message_id
            .as_ref()
            .map(|id| self.sub(id))
            .filter(|id| !id.is_empty());

        match edit_id {
            Some(raw) => {
                let message_id: u64 = raw.trim().parse().map_err(|_| {
                    WardenError::effect(format!("Failed to edit message. {raw} is not a valid ID"))
                })?;
                host.edit_message(&ctx, &destination, message_id, &message)
                    .await?;
            }
            None => match host.send_message(&ctx, &destination, &message).await {
                Ok(sent) => self.last_sent = sent,
                Err(e) if matches!(destination, Destination::Member(_)) => {
                    debug!(rule = self.rt.rule, error = %e, "could not message member");
                }
                Err(e) => return Err(e),
            },
        }

        Ok(())
    }

    fn embed(&self, args: &SendMessageArgs) -> Embed {
        let text = |part: &Option<Text>| part.as_ref().map(|t| self.sub(t));
        Embed {
            title: text(&args.title),
            description: text(&args.description),
            url: text(&args.url),
            color: match args.color {
                ColorArg::Toggle(true) => EmbedColor::Default,
                ColorArg::Toggle(false) => EmbedColor::None,
                ColorArg::Rgb(rgb) => EmbedColor::Rgb(rgb),
            },
            author_name: text(&args.author_name),
            author_url: text(&args.author_url),
            author_icon_url: text(&args.author_icon_url),
            image: text(&args.image),
            thumbnail: text(&args.thumbnail),
            footer_text: text(&args.footer_text),
            footer_icon_url: text(&args.footer_icon_url),
            fields: args
                .fields
                .iter()
                .map(|field| EmbedField {
                    name: self.sub(&field.name),
                    value: self.sub(&field.value),
                    inline: field.inline,
                })
                .collect(),
            timestamp: args.add_timestamp.then(Utc::now),
        }
    }

    async fn get_user_info(&mut self, args: &GetUserInfoArgs) -> WardenResult<()> {
        let subject = self.subject;
        let guild = &subject.guild;
        let host = self.rt.host;

        let raw_id = self.sub(&args.id);
        let id: u64 = raw_id.trim().parse().map_err(|_| {
            WardenError::evaluation(ErrorCode::EvalFailed, format!("{raw_id} is not a valid ID."))
        })?;
        let member = host
            .lookup_member(guild, &Lookup::Id(id))
            .await?
            .ok_or_else(|| WardenError::not_found(format!("Member {id} not found.")))?;

        let mut values = BTreeMap::new();
        for (target, attribute) in &args.mapping {
            let attribute = &attribute.0;
            if attribute.starts_with('_') || attribute.contains('.') {
                return Err(WardenError::evaluation(
                    ErrorCode::EvalFailed,
                    "You cannot access internal attributes.",
                ));
            }

            let attribute = attribute.to_lowercase();
            let value = match attribute.as_str() {
                "id" => Some(member.id.to_string()),
                "name" => Some(member.name.clone()),
                "nick" => member.nick.clone(),
                "display_name" => Some(member.display_name().to_string()),
                "mention" => Some(member.mention()),
                "avatar_url" => Some(member.avatar_url.clone()),
                "bot" => Some(member.bot.to_string()),
                "created_at" => Some(member.created_at.format(TIMESTAMP_FORMAT).to_string()),
                "joined_at" => member
                    .joined_at
                    .map(|at| at.format(TIMESTAMP_FORMAT).to_string()),
                "rank" => Some(host.resolve_rank(guild, &member).await?.to_string()),
                "is_staff" => Some(host.is_staff(guild, &member).await?.to_string()),
                "is_helper" => Some(host.is_helper(guild, &member).await?.to_string()),
                "message_count" => Some(
                    host.recorded_message_count(guild, &member)
                        .await?
                        .to_string(),
                ),
                _ => None,
            };
            let value = value.ok_or_else(|| {
                WardenError::evaluation(
                    ErrorCode::EvalFailed,
                    format!("Attribute \"{attribute}\" does not exist."),
                )
            })?;
            values.insert(substitute(target, &self.vars), value);
        }

        self.vars.extend(values);
        Ok(())
    }

    fn var_assign_random(&mut self, args: &VarAssignRandomArgs) -> WardenResult<()> {
        let picked = match &args.choices {
            Choices::Uniform(choices) => choices
                .choose(&mut thread_rng())
                .map(|choice| choice.0.clone()),
            Choices::Weighted(choices) => {
                let dist = WeightedIndex::new(choices.values().copied()).map_err(|e| {
                    WardenError::evaluation(
                        ErrorCode::EvalFailed,
                        format!("Invalid choice weights: {e}"),
                    )
                })?;
                choices
                    .keys()
                    .nth(dist.sample(&mut thread_rng()))
                    .cloned()
            }
        };
        let picked = picked.ok_or_else(|| {
            WardenError::evaluation(ErrorCode::EvalFailed, "Choices cannot be empty")
        })?;

        let value = if args.evaluate {
            substitute(&picked, &self.vars)
        } else {
            picked
        };
        let name = self.sub(&args.var_name);
        self.vars.insert(name, value);
        Ok(())
    }

    fn var_slice(&mut self, args: &VarSliceArgs) -> WardenResult<()> {
        let name = self.sub(&args.var_name);
        let value = self.var(&name)?;
        let sliced = py_slice(&value, args.index, args.end_index, args.step).ok_or_else(|| {
            WardenError::evaluation(ErrorCode::EvalFailed, "Slice step cannot be zero.")
        })?;
        let target = match &args.slice_into {
            Some(into) => self.sub(into),
            None => name,
        };
        self.vars.insert(target, sliced);
        Ok(())
    }

    fn var_split(&mut self, args: &VarSplitArgs) -> WardenResult<()> {
        let name = self.sub(&args.var_name);
        let value = self.var(&name)?;
        let separator = &args.separator.0;
        if separator.is_empty() {
            return Err(WardenError::evaluation(
                ErrorCode::EvalFailed,
                "Cannot split with an empty separator.",
            ));
        }

        let parts: Vec<&str> = match usize::try_from(args.max_split) {
            Ok(max) => value.splitn(max.saturating_add(1), separator.as_str()).collect(),
            Err(_) => value.split(separator.as_str()).collect(),
        };
        for (i, into) in args.split_into.iter().enumerate() {
            let part = parts.get(i).copied().unwrap_or_default();
            self.vars.insert(into.0.clone(), part.to_string());
        }
        Ok(())
    }
}

fn points(points: i64) -> u32 {
    u32::try_from(points).unwrap_or(u32::MAX)
}

fn transform(value: &str, operation: Transform) -> String {
    match operation {
        Transform::Capitalize => {
            let mut chars = value.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        }
        Transform::Lowercase => value.to_lowercase(),
        Transform::Reverse => value.chars().rev().collect(),
        Transform::Uppercase => value.to_uppercase(),
        Transform::Title => {
            let mut out = String::with_capacity(value.len());
            let mut in_word = false;
            for c in value.chars() {
                if in_word {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                in_word = c.is_alphabetic();
            }
            out
        }
    }
}

/// `text[start:stop:step]` over characters, negative indices counting from
/// the end. `None` when `step` is zero.
fn py_slice(text: &str, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return None;
    }

    let bound = |index: Option<i64>, default: i64, lower: i64, upper: i64| match index {
        None => default,
        Some(i) if i < 0 => (i + len).max(lower),
        Some(i) => i.min(upper),
    };

    let mut out = String::new();
    if step > 0 {
        let mut i = bound(start, 0, 0, len);
        let stop = bound(stop, len, 0, len);
        while i < stop {
            out.push(chars[i as usize]);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    } else {
        let mut i = bound(start, len - 1, -1, len - 1);
        let stop = bound(stop, -1, -1, len - 1);
        while i > stop {
            out.push(chars[i as usize]);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_slice() {
        assert_eq!(py_slice("hello", Some(1), Some(3), None).unwrap(), "el");
        assert_eq!(py_slice("hello", None, None, Some(-1)).unwrap(), "olleh");
        assert_eq!(py_slice("hello", Some(-3), None, None).unwrap(), "llo");
        assert_eq!(py_slice("hello", None, Some(-1), None).unwrap(), "hell");
        assert_eq!(py_slice("hello", None, None, Some(2)).unwrap(), "hlo");
        assert_eq!(py_slice("hello", Some(10), None, None).unwrap(), "");
        assert_eq!(py_slice("hello", Some(3), Some(0), Some(-1)).unwrap(), "lle");
        assert_eq!(py_slice("", None, None, Some(-1)).unwrap(), "");
        assert!(py_slice("hello", None, None, Some(0)).is_none());
    }

    #[test]
    fn test_py_slice_extreme_steps() {
        assert_eq!(py_slice("hello", Some(1), Some(5), Some(i64::MAX)).unwrap(), "e");
        assert_eq!(py_slice("hello", None, None, Some(i64::MAX)).unwrap(), "h");
        assert_eq!(py_slice("hello", Some(-1), None, Some(i64::MIN)).unwrap(), "o");
        assert_eq!(py_slice("hello", Some(i64::MIN), Some(i64::MAX), None).unwrap(), "hello");
    }

    #[test]
    fn test_transform() {
        assert_eq!(transform("hELLO world", Transform::Capitalize), "Hello world");
        assert_eq!(transform("they're bill's", Transform::Title), "They'Re Bill'S");
        assert_eq!(transform("abc", Transform::Reverse), "cba");
        assert_eq!(transform("MiXed", Transform::Lowercase), "mixed");
        assert_eq!(transform("MiXed", Transform::Uppercase), "MIXED");
        assert_eq!(transform("", Transform::Capitalize), "");
    }

    #[test]
    fn test_points_clamp() {
        assert_eq!(points(3), 3);
        assert_eq!(points(i64::MAX), u32::MAX);
    }
}
