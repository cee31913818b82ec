//! Text patterns used by message and user conditions.
//!
//! Globs follow shell `fnmatch` rules: `*` matches any run of characters,
//! `?` a single character and `[...]` / `[!...]` a character class. A glob
//! must match the whole text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&/=]*)",
    )
    .unwrap()
});

/// Custom emoji markup, `<:name:id>` or `<a:name:id>`.
static CUSTOM_EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a?:[a-zA-Z0-9_~]+:[0-9]+>").unwrap());

static UNICODE_EMOJI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Emoji_Presentation}|\p{Extended_Pictographic}\u{FE0F}").unwrap());

pub const DEFAULT_AVATAR_PATTERN: &str = "*/embed/avatars/*.png";
pub const DEFAULT_INVITE_PATTERN: &str =
    r"(?i)(discord\.(?:gg|io|me|li)|discord(?:app)?\.com/invite)/(\S+)";
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "mp4", "gifv"];

/// Size cap for user-supplied regexes.
const USER_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// A compiled glob.
#[derive(Clone)]
pub struct Glob {
    source: String,
    case_insensitive: bool,
    regex: Regex,
}

impl Glob {
    /// Compile a glob, optionally ignoring case.
    pub fn new(pattern: &str, case_insensitive: bool) -> WardenResult<Self> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| {
                WardenError::evaluation(
                    crate::error::ErrorCode::EvalInvalidRegex,
                    format!("invalid pattern `{pattern}`: {e}"),
                )
            })?;
        Ok(Self {
            source: pattern.to_string(),
            case_insensitive,
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_insensitive == other.case_insensitive
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Glob").field(&self.source).finish()
    }
}

/// Whole-text glob match, ignoring case.
pub fn glob_match(text: &str, pattern: &str) -> WardenResult<bool> {
    Ok(Glob::new(pattern, true)?.is_match(text))
}

/// Translate an fnmatch-style glob into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                // Consecutive stars collapse.
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    // Unterminated class, literal bracket.
                    out.push_str(r"\[");
                    continue;
                }
                let body: String = chars[i..j].iter().collect();
                i = j + 1;
                let (negated, body) = match body.strip_prefix('!') {
                    Some(rest) => (true, rest.to_string()),
                    None => (false, body),
                };
                let members = class_members(&body);
                if members.is_empty() {
                    // Only reversed ranges, nothing can match.
                    out.push_str(if negated { "." } else { r"[^\s\S]" });
                    continue;
                }
                out.push('[');
                if negated {
                    out.push('^');
                }
                out.push_str(&members);
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}

/// Regex class members for a glob class body. Every member is escaped so
/// `--`, `&&` and `~~` never read as class set operators. Reversed ranges
/// match nothing and are dropped.
fn class_members(body: &str) -> String {
    fn push_member(out: &mut String, c: char) {
        if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
            out.push('\\');
        }
        out.push(c);
    }

    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len() * 2);
    let mut k = 0;
    while k < chars.len() {
        if k + 2 < chars.len() && chars[k + 1] == '-' {
            let (lo, hi) = (chars[k], chars[k + 2]);
            if lo <= hi {
                push_member(&mut out, lo);
                out.push('-');
                push_member(&mut out, hi);
            }
            k += 3;
        } else {
            push_member(&mut out, chars[k]);
            k += 1;
        }
    }
    out
}

/// Compile a regex supplied in a rule.
pub fn compile_user_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(USER_REGEX_SIZE_LIMIT)
        .build()
}

/// Number of characters with each custom emoji counted as one.
pub fn visible_length(text: &str) -> usize {
    CUSTOM_EMOJI_RE.replace_all(text, "x").chars().count()
}

/// Custom plus unicode emojis in `text`.
pub fn count_emojis(text: &str) -> usize {
    let custom = CUSTOM_EMOJI_RE.find_iter(text).count();
    let stripped = CUSTOM_EMOJI_RE.replace_all(text, "");
    custom + UNICODE_EMOJI_RE.find_iter(&stripped).count()
}

pub fn contains_url(text: &str) -> bool {
    URL_RE.is_match(text)
}

/// Host-refreshable pattern configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Glob matched against avatar urls.
    pub default_avatar: String,
    /// Regex whose second group is the invite code.
    pub invite: String,
    pub media_extensions: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            default_avatar: DEFAULT_AVATAR_PATTERN.to_string(),
            invite: DEFAULT_INVITE_PATTERN.to_string(),
            media_extensions: DEFAULT_MEDIA_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Compiled form of [`PatternConfig`].
#[derive(Debug, Clone)]
pub struct PatternSet {
    default_avatar: Glob,
    invite: Regex,
    media: Regex,
}

impl PatternSet {
    pub fn compile(config: &PatternConfig) -> WardenResult<Self> {
        let default_avatar = Glob::new(&config.default_avatar, false)
            .map_err(|e| WardenError::Configuration(e.to_string()))?;
        let invite = Regex::new(&config.invite)
            .map_err(|e| WardenError::Configuration(format!("invalid invite pattern: {e}")))?;

        if config.media_extensions.is_empty() {
            return Err(WardenError::Configuration(
                "media_extensions cannot be empty".to_string(),
            ));
        }
        let extensions = config
            .media_extensions
            .iter()
            .map(|e| regex::escape(e.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");
        let media = Regex::new(&format!(r#"(?i)(http)?s?:?(//[^"']*\.(?:{extensions}))"#))
            .map_err(|e| WardenError::Configuration(format!("invalid media extensions: {e}")))?;

        Ok(Self {
            default_avatar,
            invite,
            media,
        })
    }

    pub fn is_default_avatar(&self, avatar_url: &str) -> bool {
        self.default_avatar.is_match(avatar_url)
    }

    /// The first invite code found in `text`.
    pub fn find_invite<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.invite.captures(text)?;
        caps.get(2)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str())
    }

    pub fn contains_media(&self, text: &str) -> bool {
        self.media.is_match(text)
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        // Built-in patterns always compile.
        Self::compile(&PatternConfig::default()).unwrap()
    }
}
