//! Action vocabulary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// An effect or scratchpad operation a rule can run from its `do` list.
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
pub enum Action {
    #[strum(serialize = "send-dm")]
    #[serde(rename = "send-dm")]
    Dm,
    DmUser,
    NotifyStaff,
    NotifyStaffAndPing,
    NotifyStaffWithEmbed,
    #[strum(serialize = "ban-user-and-delete")]
    #[serde(rename = "ban-user-and-delete")]
    BanAndDelete,
    #[strum(serialize = "kick-user")]
    #[serde(rename = "kick-user")]
    Kick,
    #[strum(serialize = "softban-user")]
    #[serde(rename = "softban-user")]
    Softban,
    PunishUser,
    PunishUserWithMessage,
    #[strum(serialize = "send-mod-log")]
    #[serde(rename = "send-mod-log")]
    Modlog,
    DeleteUserMessage,
    SendInChannel,
    SetChannelSlowmode,
    AddRolesToUser,
    RemoveRolesFromUser,
    EnableEmergencyMode,
    SetUserNickname,
    NoOp,
    SendToMonitor,
    SendToChannel,
    AddUserHeatpoint,
    AddUserHeatpoints,
    AddChannelHeatpoint,
    AddChannelHeatpoints,
    AddCustomHeatpoint,
    AddCustomHeatpoints,
    EmptyUserHeat,
    EmptyChannelHeat,
    EmptyCustomHeat,
    IssueCommand,
    DeleteLastMessageSentAfter,
    SendMessage,
    GetUserInfo,
    Exit,
    VarAssign,
    VarAssignRandom,
    VarReplace,
    VarSlice,
    VarSplit,
    VarTransform,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The action superseding a deprecated one, if this action is deprecated.
    pub fn replacement(self) -> Option<Action> {
        match self {
            Action::Dm | Action::DmUser | Action::SendInChannel | Action::SendToChannel => {
                Some(Action::SendMessage)
            }
            _ => None,
        }
    }

    pub fn is_deprecated(self) -> bool {
        self.replacement().is_some()
    }
}

/// Blocks in `do` gated on the most recent condition result.
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
pub enum ConditionalActionBlock {
    IfTrue,
    IfFalse,
}

impl ConditionalActionBlock {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the block body runs given the last condition result.
    pub fn runs_after(self, last: Option<bool>) -> bool {
        match (self, last) {
            (ConditionalActionBlock::IfTrue, Some(true)) => true,
            (ConditionalActionBlock::IfFalse, Some(false)) => true,
            _ => false,
        }
    }
}
