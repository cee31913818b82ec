//! Heat points: per-subject counters whose points expire.
//!
//! Every point is stored with its own expiry, so "3 heat" means three points
//! that haven't expired yet. Sandbox and production writes land in separate
//! keys and never see each other.

mod store;

use serde::{Deserialize, Serialize};

pub use store::{HeatConfig, HeatStore};

/// Name of the built-in user and channel counters.
pub const BUILTIN_HEAT: &str = "heat";

/// Which namespace heat reads and writes go to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    /// Dry runs. Effects are expected to be suppressed by the host.
    Sandbox,
}

impl Mode {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            Mode::Sandbox
        } else {
            Mode::Production
        }
    }

    pub fn is_sandbox(self) -> bool {
        self == Mode::Sandbox
    }
}

/// What a counter is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatSubject {
    User(u64),
    Channel(u64),
    /// Custom counters are guild-wide and told apart by name.
    Guild,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeatKey {
    pub mode: Mode,
    pub guild: u64,
    pub subject: HeatSubject,
    pub name: String,
}

impl HeatKey {
    pub fn new(mode: Mode, guild: u64, subject: HeatSubject, name: impl Into<String>) -> Self {
        Self {
            mode,
            guild,
            subject,
            name: name.into(),
        }
    }

    pub fn user(mode: Mode, guild: u64, user_id: u64) -> Self {
        Self::new(mode, guild, HeatSubject::User(user_id), BUILTIN_HEAT)
    }

    pub fn channel(mode: Mode, guild: u64, channel_id: u64) -> Self {
        Self::new(mode, guild, HeatSubject::Channel(channel_id), BUILTIN_HEAT)
    }

    pub fn custom(mode: Mode, guild: u64, label: impl Into<String>) -> Self {
        Self::new(mode, guild, HeatSubject::Guild, label)
    }
}
