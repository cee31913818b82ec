//! Host-supplied data a rule is evaluated against.
//!
//! These are plain snapshots: the host fills them in from its chat platform
//! before calling into the engine and the engine never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rank::Rank;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: Option<Category>,
    /// Whether the default role can read the channel.
    #[serde(default)]
    pub is_public: bool,
}

impl Channel {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub nick: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    pub avatar_url: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub bot: bool,
}

impl Member {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Nickname when set, account name otherwise.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub content: String,
    /// Content with mentions resolved to names.
    pub clean_content: String,
    pub created_at: DateTime<Utc>,
    pub jump_url: String,
    pub channel: Channel,
    pub author: Member,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Every user mention in order of appearance, duplicates included.
    #[serde(default)]
    pub raw_mentions: Vec<u64>,
    #[serde(default)]
    pub role_mentions: Vec<u64>,
}

/// The entity a rule is being evaluated against.
///
/// A subject always has a guild and the rank of the actor. It carries a
/// user for user-bound events and a message for message-bound events; the
/// message author doubles as the user when no user is set explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub guild: Guild,
    pub rank: Rank,
    user: Option<Member>,
    message: Option<Message>,
}

impl Subject {
    /// A guild-only subject (emergency events).
    pub fn guild(guild: Guild, rank: Rank) -> Self {
        Self {
            guild,
            rank,
            user: None,
            message: None,
        }
    }

    /// A subject for user events (join, leave, manual, periodic).
    pub fn user(guild: Guild, user: Member, rank: Rank) -> Self {
        Self {
            guild,
            rank,
            user: Some(user),
            message: None,
        }
    }

    /// A subject for message events. The author is the user.
    pub fn message(guild: Guild, message: Message, rank: Rank) -> Self {
        Self {
            guild,
            rank,
            user: None,
            message: Some(message),
        }
    }

    pub fn member(&self) -> Option<&Member> {
        self.user
            .as_ref()
            .or_else(|| self.message.as_ref().map(|m| &m.author))
    }

    pub fn msg(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.message.as_ref().map(|m| &m.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u64, nick: Option<&str>) -> Member {
        Member {
            id,
            name: "Twentysix".to_string(),
            nick: nick.map(str::to_string),
            created_at: Utc::now(),
            joined_at: None,
            avatar_url: String::new(),
            roles: vec![],
            bot: false,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(member(1, None).display_name(), "Twentysix");
        assert_eq!(member(1, Some("26")).display_name(), "26");
        assert_eq!(member(42, None).mention(), "<@42>");
    }

    #[test]
    fn test_message_author_is_member() {
        let guild = Guild {
            id: 1,
            name: "Test".to_string(),
        };
        let message = Message {
            id: 9,
            content: "hi".to_string(),
            clean_content: "hi".to_string(),
            created_at: Utc::now(),
            jump_url: String::new(),
            channel: Channel {
                id: 5,
                name: "general".to_string(),
                category: None,
                is_public: true,
            },
            author: member(7, None),
            attachments: vec![],
            raw_mentions: vec![],
            role_mentions: vec![],
        };
        let subject = Subject::message(guild.clone(), message, Rank::Rank3);
        assert_eq!(subject.member().map(|m| m.id), Some(7));
        assert_eq!(subject.channel().map(|c| c.id), Some(5));

        let guild_only = Subject::guild(guild, Rank::Rank1);
        assert!(guild_only.member().is_none());
        assert!(guild_only.msg().is_none());
    }
}
