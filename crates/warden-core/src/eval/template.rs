//! `$var` substitution and the built-in variables.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::Variables;
use crate::heat::{HeatKey, HeatStore, Mode};
use crate::types::Subject;

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\})",
    )
    .unwrap()
});

/// Replace `$name` and `${name}` with their values. `$$` is a literal `$`;
/// unknown names and stray `$` are left untouched.
pub fn substitute(text: &str, vars: &Variables) -> String {
    if !text.contains('$') {
        return text.to_string();
    }

    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| {
            if caps.name("escaped").is_some() {
                return "$".to_string();
            }
            caps.name("named")
                .or_else(|| caps.name("braced"))
                .and_then(|name| vars.get(name.as_str()))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// The small set available while evaluating a rule's `if`. Enough to build
/// per-user or per-channel custom heat labels.
pub(crate) fn condition_variables(rule_name: &str, subject: &Subject) -> Variables {
    let mut vars = Variables::new();
    vars.insert("rule_name".into(), rule_name.to_string());
    vars.insert("guild_id".into(), subject.guild.id.to_string());

    if let Some(member) = subject.member() {
        vars.insert("user_id".into(), member.id.to_string());
    }
    if let Some(message) = subject.msg() {
        vars.insert("message_id".into(), message.id.to_string());
    }
    if let Some(channel) = subject.channel() {
        vars.insert("channel_id".into(), channel.id.to_string());
        vars.insert(
            "channel_category_id".into(),
            channel
                .category
                .as_ref()
                .map_or_else(|| "0".to_string(), |c| c.id.to_string()),
        );
    }

    vars
}

/// Everything a rule's `do` can reference. Scratch variables are added to
/// the same map as actions run.
pub(crate) fn action_variables(
    rule_name: &str,
    subject: &Subject,
    heat: &HeatStore,
    mode: Mode,
) -> Variables {
    let guild = &subject.guild;
    let mut vars = Variables::new();
    let mut set = |name: &str, value: String| {
        vars.insert(name.to_string(), value);
    };

    set("rule_name", rule_name.to_string());
    set("guild", guild.name.clone());
    set("guild_id", guild.id.to_string());

    if let Some(user) = subject.member() {
        set("user", user.name.clone());
        set("user_name", user.name.clone());
        set("user_id", user.id.to_string());
        set("user_mention", user.mention());
        set(
            "user_nickname",
            user.nick.clone().unwrap_or_else(|| "None".to_string()),
        );
        set(
            "user_created_at",
            user.created_at.format(TIMESTAMP_FORMAT).to_string(),
        );
        set(
            "user_joined_at",
            user.joined_at
                .map_or_else(|| "None".to_string(), |at| at.format(TIMESTAMP_FORMAT).to_string()),
        );
        set(
            "user_heat",
            heat.get(&HeatKey::user(mode, guild.id, user.id)).to_string(),
        );
        set("user_avatar_url", user.avatar_url.clone());
    }

    if let Some(message) = subject.msg() {
        // Keeps @everyone and @here from pinging when echoed back.
        set("message", message.content.replace('@', "@\u{200b}"));
        set("message_clean", message.clean_content.clone());
        set("message_id", message.id.to_string());
        set(
            "message_created_at",
            message.created_at.format(TIMESTAMP_FORMAT).to_string(),
        );
        set("message_link", message.jump_url.clone());
        if let Some(attachment) = message.attachments.first() {
            set("attachment_filename", attachment.filename.clone());
            set("attachment_url", attachment.url.clone());
        }
    }

    if let Some(channel) = subject.channel() {
        set("channel", format!("#{}", channel.name));
        set("channel_name", channel.name.clone());
        set("channel_id", channel.id.to_string());
        set("channel_mention", channel.mention());
        match &channel.category {
            Some(category) => {
                set("channel_category", category.name.clone());
                set("channel_category_id", category.id.to_string());
            }
            None => {
                set("channel_category", "None".to_string());
                set("channel_category_id", "0".to_string());
            }
        }
        set(
            "channel_heat",
            heat.get(&HeatKey::channel(mode, guild.id, channel.id))
                .to_string(),
        );
    }

    vars
}
