//! Shared fixtures for the integration tests: a host that records every call
//! and builders for guilds, members and messages.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use warden_core::error::{WardenError, WardenResult};
use warden_core::host::{
    Destination, EffectContext, ExpelAction, Host, Lookup, Notification, OutgoingMessage,
    SentMessage,
};
use warden_core::types::{Attachment, Category, Channel, Guild, Member, Message, Rank, Role};
use warden_core::{Subject, Warden, WardenConfig};

pub const GUILD_ID: u64 = 100;
pub const USER_ID: u64 = 262626;
pub const CHANNEL_ID: u64 = 555;

/// One effect as the host saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        to: String,
        message: OutgoingMessage,
    },
    Edit {
        to: String,
        message_id: u64,
    },
    Notify(Notification),
    Monitor(String),
    Delete(u64),
    DeleteAfter(u64, Duration),
    Ban {
        user: u64,
        days: u32,
        reason: String,
    },
    Softban(u64),
    Kick(u64),
    Punish {
        user: u64,
        channel: Option<u64>,
    },
    AddRoles(u64, Vec<u64>),
    RemoveRoles(u64, Vec<u64>),
    Nickname(u64, Option<String>),
    Slowmode(u64, Duration),
    Emergency(bool),
    Modlog(u64, ExpelAction, String),
    Command {
        issuer: u64,
        command: String,
    },
}

/// In-memory host. Effects are appended to `calls`; effects whose name is
/// in `failing` return an error instead.
#[derive(Default)]
pub struct RecordingHost {
    pub calls: Mutex<Vec<Call>>,
    pub members: Vec<Member>,
    pub channels: Vec<Channel>,
    pub roles: Vec<Role>,
    pub staff: HashSet<u64>,
    pub message_counts: HashMap<u64, u64>,
    pub emergency: Mutex<bool>,
    pub own_invites: HashSet<String>,
    pub failing: HashSet<&'static str>,
    pub no_punish_role: bool,
    next_message_id: Mutex<u64>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            members: vec![member(USER_ID, "Twentysix")],
            channels: vec![channel(CHANNEL_ID, "general"), channel(777, "mod-log")],
            roles: vec![role(1, "muted"), role(2, "verified")],
            ..Self::default()
        }
    }

    pub fn failing(mut self, effect: &'static str) -> Self {
        self.failing.insert(effect);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn monitor_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Monitor(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, effect: &'static str, call: Call) -> WardenResult<()> {
        if self.failing.contains(effect) {
            return Err(WardenError::effect(format!("{effect} failed")));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn sent(&self, channel_id: u64) -> SentMessage {
        let mut next = self.next_message_id.lock().unwrap();
        *next += 1;
        SentMessage {
            id: 9000 + *next,
            channel_id,
        }
    }
}

fn describe(destination: &Destination) -> String {
    match destination {
        Destination::Channel(channel) => format!("#{}", channel.name),
        Destination::Member(member) => format!("@{}", member.id),
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn resolve_rank(&self, _guild: &Guild, member: &Member) -> WardenResult<Rank> {
        Ok(if self.staff.contains(&member.id) {
            Rank::Rank1
        } else {
            Rank::Rank3
        })
    }

    async fn is_staff(&self, _guild: &Guild, member: &Member) -> WardenResult<bool> {
        Ok(self.staff.contains(&member.id))
    }

    async fn is_helper(&self, _guild: &Guild, _member: &Member) -> WardenResult<bool> {
        Ok(false)
    }

    async fn in_emergency_mode(&self, _guild: &Guild) -> WardenResult<bool> {
        Ok(*self.emergency.lock().unwrap())
    }

    async fn is_own_invite(&self, _guild: &Guild, code: &str) -> WardenResult<bool> {
        Ok(self.own_invites.contains(code))
    }

    async fn recorded_message_count(&self, _guild: &Guild, member: &Member) -> WardenResult<u64> {
        Ok(self.message_counts.get(&member.id).copied().unwrap_or(0))
    }

    async fn lookup_member(&self, _guild: &Guild, lookup: &Lookup) -> WardenResult<Option<Member>> {
        Ok(self
            .members
            .iter()
            .find(|m| match lookup {
                Lookup::Id(id) => m.id == *id,
                Lookup::Name(name) => &m.name == name,
            })
            .cloned())
    }

    async fn lookup_channel(
        &self,
        _guild: &Guild,
        lookup: &Lookup,
    ) -> WardenResult<Option<Channel>> {
        Ok(self
            .channels
            .iter()
            .find(|c| match lookup {
                Lookup::Id(id) => c.id == *id,
                Lookup::Name(name) => &c.name == name,
            })
            .cloned())
    }

    async fn lookup_role(&self, _guild: &Guild, lookup: &Lookup) -> WardenResult<Option<Role>> {
        Ok(self
            .roles
            .iter()
            .find(|r| match lookup {
                Lookup::Id(id) => r.id == *id,
                Lookup::Name(name) => &r.name == name,
            })
            .cloned())
    }

    async fn send_message(
        &self,
        _ctx: &EffectContext<'_>,
        destination: &Destination,
        message: &OutgoingMessage,
    ) -> WardenResult<Option<SentMessage>> {
        let effect = match destination {
            Destination::Channel(_) => "send_message",
            Destination::Member(_) => "dm",
        };
        self.record(
            effect,
            Call::Send {
                to: describe(destination),
                message: message.clone(),
            },
        )?;
        let channel_id = match destination {
            Destination::Channel(channel) => channel.id,
            Destination::Member(member) => member.id,
        };
        Ok(Some(self.sent(channel_id)))
    }

    async fn edit_message(
        &self,
        _ctx: &EffectContext<'_>,
        destination: &Destination,
        message_id: u64,
        _message: &OutgoingMessage,
    ) -> WardenResult<()> {
        self.record(
            "edit_message",
            Call::Edit {
                to: describe(destination),
                message_id,
            },
        )
    }

    async fn notify_staff(
        &self,
        _ctx: &EffectContext<'_>,
        notification: &Notification,
    ) -> WardenResult<Option<SentMessage>> {
        self.record("notify_staff", Call::Notify(notification.clone()))?;
        Ok(Some(self.sent(777)))
    }

    async fn send_to_monitor(&self, _ctx: &EffectContext<'_>, text: &str) -> WardenResult<()> {
        self.record("send_to_monitor", Call::Monitor(text.to_string()))
    }

    async fn delete_message(&self, _ctx: &EffectContext<'_>, message: &Message) -> WardenResult<()> {
        self.record("delete_message", Call::Delete(message.id))
    }

    async fn delete_message_after(
        &self,
        _ctx: &EffectContext<'_>,
        message: &SentMessage,
        after: Duration,
    ) -> WardenResult<()> {
        self.record("delete_message_after", Call::DeleteAfter(message.id, after))
    }

    async fn ban(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        delete_message_days: u32,
        reason: &str,
    ) -> WardenResult<()> {
        self.record(
            "ban",
            Call::Ban {
                user: member.id,
                days: delete_message_days,
                reason: reason.to_string(),
            },
        )
    }

    async fn softban(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        _reason: &str,
    ) -> WardenResult<()> {
        self.record("softban", Call::Softban(member.id))
    }

    async fn kick(&self, _ctx: &EffectContext<'_>, member: &Member, _reason: &str) -> WardenResult<()> {
        self.record("kick", Call::Kick(member.id))
    }

    async fn punish(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        channel: Option<&Channel>,
    ) -> WardenResult<bool> {
        if self.no_punish_role {
            return Ok(false);
        }
        self.record(
            "punish",
            Call::Punish {
                user: member.id,
                channel: channel.map(|c| c.id),
            },
        )?;
        Ok(true)
    }

    async fn add_roles(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        roles: &[Role],
        _reason: &str,
    ) -> WardenResult<()> {
        self.record(
            "add_roles",
            Call::AddRoles(member.id, roles.iter().map(|r| r.id).collect()),
        )
    }

    async fn remove_roles(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        roles: &[Role],
        _reason: &str,
    ) -> WardenResult<()> {
        self.record(
            "remove_roles",
            Call::RemoveRoles(member.id, roles.iter().map(|r| r.id).collect()),
        )
    }

    async fn set_nickname(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        nickname: Option<&str>,
        _reason: &str,
    ) -> WardenResult<()> {
        self.record(
            "set_nickname",
            Call::Nickname(member.id, nickname.map(str::to_string)),
        )
    }

    async fn set_slowmode(
        &self,
        _ctx: &EffectContext<'_>,
        channel: &Channel,
        delay: Duration,
    ) -> WardenResult<()> {
        self.record("set_slowmode", Call::Slowmode(channel.id, delay))
    }

    async fn set_emergency_mode(&self, _ctx: &EffectContext<'_>, active: bool) -> WardenResult<()> {
        self.record("set_emergency_mode", Call::Emergency(active))?;
        *self.emergency.lock().unwrap() = active;
        Ok(())
    }

    async fn create_modlog_case(
        &self,
        _ctx: &EffectContext<'_>,
        member: &Member,
        action: ExpelAction,
        reason: &str,
    ) -> WardenResult<()> {
        self.record(
            "create_modlog_case",
            Call::Modlog(member.id, action, reason.to_string()),
        )
    }

    async fn issue_command(
        &self,
        _ctx: &EffectContext<'_>,
        issuer: &Member,
        command: &str,
        _channel: Option<&Channel>,
    ) -> WardenResult<()> {
        self.record(
            "issue_command",
            Call::Command {
                issuer: issuer.id,
                command: command.to_string(),
            },
        )
    }
}

pub fn guild() -> Guild {
    Guild {
        id: GUILD_ID,
        name: "Red - Discord Bot".to_string(),
    }
}

pub fn role(id: u64, name: &str) -> Role {
    Role {
        id,
        name: name.to_string(),
    }
}

pub fn member(id: u64, name: &str) -> Member {
    Member {
        id,
        name: name.to_string(),
        nick: None,
        created_at: Utc::now() - Duration::days(365),
        joined_at: Some(Utc::now() - Duration::days(30)),
        avatar_url: format!("https://cdn.discordapp.com/avatars/{id}/abc.png"),
        roles: vec![],
        bot: false,
    }
}

pub fn channel(id: u64, name: &str) -> Channel {
    Channel {
        id,
        name: name.to_string(),
        category: Some(Category {
            id: 50,
            name: "Text Channels".to_string(),
        }),
        is_public: true,
    }
}

pub fn message_from(author: Member, content: &str) -> Message {
    Message {
        id: 4242,
        content: content.to_string(),
        clean_content: content.to_string(),
        created_at: Utc::now(),
        jump_url: format!("https://discord.com/channels/{GUILD_ID}/{CHANNEL_ID}/4242"),
        channel: channel(CHANNEL_ID, "general"),
        author,
        attachments: vec![],
        raw_mentions: vec![],
        role_mentions: vec![],
    }
}

pub fn message(content: &str) -> Message {
    message_from(member(USER_ID, "Twentysix"), content)
}

pub fn message_subject(content: &str) -> Subject {
    Subject::message(guild(), message(content), Rank::Rank3)
}

pub fn attachment(filename: &str) -> Attachment {
    Attachment {
        filename: filename.to_string(),
        url: format!("https://cdn.discordapp.com/attachments/1/2/{filename}"),
    }
}

pub fn user_subject() -> Subject {
    Subject::user(guild(), member(USER_ID, "Twentysix"), Rank::Rank3)
}

pub fn warden(host: RecordingHost) -> (Warden, Arc<RecordingHost>) {
    let host = Arc::new(host);
    let warden = Warden::new(WardenConfig::default(), host.clone()).unwrap();
    (warden, host)
}
