//! Host adapter that drops effects during dry runs.

use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

use super::{
    Destination, EffectContext, ExpelAction, Host, Lookup, Notification, OutgoingMessage,
    SentMessage,
};
use crate::error::WardenResult;
use crate::types::{Channel, Guild, Member, Message, Rank, Role};

/// Wraps a host so that effects requested in sandbox mode are logged and
/// skipped. Queries always reach the inner host.
#[derive(Debug, Clone)]
pub struct SandboxedHost<H> {
    inner: H,
}

impl<H: Host> SandboxedHost<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

fn skipped(ctx: &EffectContext<'_>, effect: &str) -> bool {
    if ctx.mode.is_sandbox() {
        info!(rule = ctx.rule, guild_id = ctx.guild.id, effect, "sandbox: effect skipped");
        return true;
    }
    false
}

#[async_trait]
impl<H: Host> Host for SandboxedHost<H> {
    async fn resolve_rank(&self, guild: &Guild, member: &Member) -> WardenResult<Rank> {
        self.inner.resolve_rank(guild, member).await
    }

    async fn is_staff(&self, guild: &Guild, member: &Member) -> WardenResult<bool> {
        self.inner.is_staff(guild, member).await
    }

    async fn is_helper(&self, guild: &Guild, member: &Member) -> WardenResult<bool> {
        self.inner.is_helper(guild, member).await
    }

    async fn in_emergency_mode(&self, guild: &Guild) -> WardenResult<bool> {
        self.inner.in_emergency_mode(guild).await
    }

    async fn is_own_invite(&self, guild: &Guild, code: &str) -> WardenResult<bool> {
        self.inner.is_own_invite(guild, code).await
    }

    async fn recorded_message_count(&self, guild: &Guild, member: &Member) -> WardenResult<u64> {
        self.inner.recorded_message_count(guild, member).await
    }

    async fn lookup_member(&self, guild: &Guild, lookup: &Lookup) -> WardenResult<Option<Member>> {
        self.inner.lookup_member(guild, lookup).await
    }

    async fn lookup_channel(
        &self,
        guild: &Guild,
        lookup: &Lookup,
    ) -> WardenResult<Option<Channel>> {
        self.inner.lookup_channel(guild, lookup).await
    }

    async fn lookup_role(&self, guild: &Guild, lookup: &Lookup) -> WardenResult<Option<Role>> {
        self.inner.lookup_role(guild, lookup).await
    }

    async fn send_message(
        &self,
        ctx: &EffectContext<'_>,
        destination: &Destination,
        message: &OutgoingMessage,
    ) -> WardenResult<Option<SentMessage>> {
        if skipped(ctx, "send_message") {
            return Ok(None);
        }
        self.inner.send_message(ctx, destination, message).await
    }

    async fn edit_message(
        &self,
        ctx: &EffectContext<'_>,
        destination: &Destination,
        message_id: u64,
        message: &OutgoingMessage,
    ) -> WardenResult<()> {
        if skipped(ctx, "edit_message") {
            return Ok(());
        }
        self.inner
            .edit_message(ctx, destination, message_id, message)
            .await
    }

    async fn notify_staff(
        &self,
        ctx: &EffectContext<'_>,
        notification: &Notification,
    ) -> WardenResult<Option<SentMessage>> {
        if skipped(ctx, "notify_staff") {
            return Ok(None);
        }
        self.inner.notify_staff(ctx, notification).await
    }

    async fn send_to_monitor(&self, ctx: &EffectContext<'_>, text: &str) -> WardenResult<()> {
        if skipped(ctx, "send_to_monitor") {
            return Ok(());
        }
        self.inner.send_to_monitor(ctx, text).await
    }

    async fn delete_message(&self, ctx: &EffectContext<'_>, message: &Message) -> WardenResult<()> {
        if skipped(ctx, "delete_message") {
            return Ok(());
        }
        self.inner.delete_message(ctx, message).await
    }

    async fn delete_message_after(
        &self,
        ctx: &EffectContext<'_>,
        message: &SentMessage,
        after: Duration,
    ) -> WardenResult<()> {
        if skipped(ctx, "delete_message_after") {
            return Ok(());
        }
        self.inner.delete_message_after(ctx, message, after).await
    }

    async fn ban(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        delete_message_days: u32,
        reason: &str,
    ) -> WardenResult<()> {
        if skipped(ctx, "ban") {
            return Ok(());
        }
        self.inner.ban(ctx, member, delete_message_days, reason).await
    }

    async fn softban(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        reason: &str,
    ) -> WardenResult<()> {
        if skipped(ctx, "softban") {
            return Ok(());
        }
        self.inner.softban(ctx, member, reason).await
    }

    async fn kick(&self, ctx: &EffectContext<'_>, member: &Member, reason: &str) -> WardenResult<()> {
        if skipped(ctx, "kick") {
            return Ok(());
        }
        self.inner.kick(ctx, member, reason).await
    }

    async fn punish(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        channel: Option<&Channel>,
    ) -> WardenResult<bool> {
        if skipped(ctx, "punish") {
            return Ok(true);
        }
        self.inner.punish(ctx, member, channel).await
    }

    async fn add_roles(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        roles: &[Role],
        reason: &str,
    ) -> WardenResult<()> {
        if skipped(ctx, "add_roles") {
            return Ok(());
        }
        self.inner.add_roles(ctx, member, roles, reason).await
    }

    async fn remove_roles(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        roles: &[Role],
        reason: &str,
    ) -> WardenResult<()> {
        if skipped(ctx, "remove_roles") {
            return Ok(());
        }
        self.inner.remove_roles(ctx, member, roles, reason).await
    }

    async fn set_nickname(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        nickname: Option<&str>,
        reason: &str,
    ) -> WardenResult<()> {
        if skipped(ctx, "set_nickname") {
            return Ok(());
        }
        self.inner.set_nickname(ctx, member, nickname, reason).await
    }

    async fn set_slowmode(
        &self,
        ctx: &EffectContext<'_>,
        channel: &Channel,
        delay: Duration,
    ) -> WardenResult<()> {
        if skipped(ctx, "set_slowmode") {
            return Ok(());
        }
        self.inner.set_slowmode(ctx, channel, delay).await
    }

    async fn set_emergency_mode(&self, ctx: &EffectContext<'_>, active: bool) -> WardenResult<()> {
        if skipped(ctx, "set_emergency_mode") {
            return Ok(());
        }
        self.inner.set_emergency_mode(ctx, active).await
    }

    async fn create_modlog_case(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        action: ExpelAction,
        reason: &str,
    ) -> WardenResult<()> {
        if skipped(ctx, "create_modlog_case") {
            return Ok(());
        }
        self.inner.create_modlog_case(ctx, member, action, reason).await
    }

    async fn issue_command(
        &self,
        ctx: &EffectContext<'_>,
        issuer: &Member,
        command: &str,
        channel: Option<&Channel>,
    ) -> WardenResult<()> {
        if skipped(ctx, "issue_command") {
            return Ok(());
        }
        self.inner.issue_command(ctx, issuer, command, channel).await
    }
}
