//! The capabilities a host bot lends to the engine.
//!
//! Conditions call the query methods; actions call the effect methods. The
//! engine never reaches the chat platform any other way, so a host can
//! redirect or drop anything it is asked to do.

mod sandbox;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use sandbox::SandboxedHost;

use crate::error::WardenResult;
use crate::heat::Mode;
use crate::types::{Channel, Guild, Member, Message, Rank, Role};

/// Who or what an effect was triggered by.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub rule: &'a str,
    pub guild: &'a Guild,
    pub mode: Mode,
}

/// How to find a member, channel or role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    Id(u64),
    Name(String),
}

impl Lookup {
    /// Digits are an id, anything else a name.
    pub fn parse(reference: &str) -> Self {
        match reference.parse() {
            Ok(id) => Lookup::Id(id),
            Err(_) => Lookup::Name(reference.to_string()),
        }
    }
}

/// Where a message goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Channel(Channel),
    /// Direct message.
    Member(Member),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbedColor {
    /// Whatever the host normally uses.
    #[default]
    Default,
    None,
    Rgb(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: EmbedColor,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    pub author_icon_url: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub footer_text: Option<String>,
    pub footer_icon_url: Option<String>,
    pub fields: Vec<EmbedField>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    /// Whether @everyone and @here may ping.
    pub allow_mass_mentions: bool,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            allow_mass_mentions: false,
        }
    }
}

/// A message the host sent on the engine's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: u64,
    pub channel_id: u64,
}

/// A message for the guild's staff notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notification {
    pub text: String,
    /// Set for embed notifications.
    pub title: Option<String>,
    pub footer: Option<String>,
    /// Ping the staff role.
    pub ping: bool,
}

/// Actions that remove a member from the guild.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpelAction {
    Ban,
    Kick,
    Softban,
}

/// Everything the engine asks of the host bot.
#[async_trait]
pub trait Host: Send + Sync {
    // Queries

    /// Rank of a member as the host sees it.
    async fn resolve_rank(&self, guild: &Guild, member: &Member) -> WardenResult<Rank>;

    async fn is_staff(&self, guild: &Guild, member: &Member) -> WardenResult<bool>;

    async fn is_helper(&self, guild: &Guild, member: &Member) -> WardenResult<bool>;

    async fn in_emergency_mode(&self, guild: &Guild) -> WardenResult<bool>;

    /// Whether an invite code points back to `guild` itself.
    async fn is_own_invite(&self, guild: &Guild, code: &str) -> WardenResult<bool>;

    /// Messages the host has recorded for a member.
    async fn recorded_message_count(&self, guild: &Guild, member: &Member) -> WardenResult<u64>;

    async fn lookup_member(&self, guild: &Guild, lookup: &Lookup) -> WardenResult<Option<Member>>;

    /// Text channels only.
    async fn lookup_channel(&self, guild: &Guild, lookup: &Lookup)
        -> WardenResult<Option<Channel>>;

    async fn lookup_role(&self, guild: &Guild, lookup: &Lookup) -> WardenResult<Option<Role>>;

    // Effects

    async fn send_message(
        &self,
        ctx: &EffectContext<'_>,
        destination: &Destination,
        message: &OutgoingMessage,
    ) -> WardenResult<Option<SentMessage>>;

    async fn edit_message(
        &self,
        ctx: &EffectContext<'_>,
        destination: &Destination,
        message_id: u64,
        message: &OutgoingMessage,
    ) -> WardenResult<()>;

    async fn notify_staff(
        &self,
        ctx: &EffectContext<'_>,
        notification: &Notification,
    ) -> WardenResult<Option<SentMessage>>;

    /// Post a line to the host's monitor log.
    async fn send_to_monitor(&self, ctx: &EffectContext<'_>, text: &str) -> WardenResult<()>;

    async fn delete_message(&self, ctx: &EffectContext<'_>, message: &Message) -> WardenResult<()>;

    /// Delete a message sent earlier once `after` has passed.
    async fn delete_message_after(
        &self,
        ctx: &EffectContext<'_>,
        message: &SentMessage,
        after: Duration,
    ) -> WardenResult<()>;

    async fn ban(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        delete_message_days: u32,
        reason: &str,
    ) -> WardenResult<()>;

    /// Ban then unban, clearing a day of messages.
    async fn softban(&self, ctx: &EffectContext<'_>, member: &Member, reason: &str)
        -> WardenResult<()>;

    async fn kick(&self, ctx: &EffectContext<'_>, member: &Member, reason: &str)
        -> WardenResult<()>;

    /// Apply the guild's punish role. With a channel, also post the guild's
    /// punish message there. Returns false if the guild has no usable punish role.
    async fn punish(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        channel: Option<&Channel>,
    ) -> WardenResult<bool>;

    async fn add_roles(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        roles: &[Role],
        reason: &str,
    ) -> WardenResult<()>;

    async fn remove_roles(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        roles: &[Role],
        reason: &str,
    ) -> WardenResult<()>;

    /// `None` clears the nickname.
    async fn set_nickname(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        nickname: Option<&str>,
        reason: &str,
    ) -> WardenResult<()>;

    async fn set_slowmode(
        &self,
        ctx: &EffectContext<'_>,
        channel: &Channel,
        delay: Duration,
    ) -> WardenResult<()>;

    async fn set_emergency_mode(&self, ctx: &EffectContext<'_>, active: bool) -> WardenResult<()>;

    async fn create_modlog_case(
        &self,
        ctx: &EffectContext<'_>,
        member: &Member,
        action: ExpelAction,
        reason: &str,
    ) -> WardenResult<()>;

    /// Run a bot command as if `issuer` typed it. Without a channel the host
    /// picks its notification channel.
    async fn issue_command(
        &self,
        ctx: &EffectContext<'_>,
        issuer: &Member,
        command: &str,
        channel: Option<&Channel>,
    ) -> WardenResult<()>;
}
