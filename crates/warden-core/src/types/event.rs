//! Trigger events.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Points in the host's lifecycle at which a rule may be evaluated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Event {
    OnMessage,
    OnMessageEdit,
    OnMessageDelete,
    OnUserJoin,
    OnUserLeave,
    OnEmergency,
    Manual,
    /// Scheduled by the host; requires a `run-every` interval.
    Periodic,
}

impl Event {
    /// The literal used in rule sources.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
