//! Parsed actions.

use chrono::Duration;
use serde_yaml::Value;

use super::condition::ConditionEntry;
use super::params::{
    from_value, ChannelMessageArgs, CustomHeatpoint, CustomHeatpoints, DmArgs,
    EmbedNotification, GetUserInfoArgs, Heatpoints, IdOrName, Int, IssueCommandArgs, NonEmpty,
    Nothing, SendMessageArgs, Text, Timedelta, VarAssignArgs, VarAssignRandomArgs,
    VarReplaceArgs, VarSliceArgs, VarSplitArgs, VarTransformArgs,
};
use crate::types::{Action, ConditionalActionBlock};

/// An action with its validated parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    Dm(DmArgs),
    DmUser(Text),
    NotifyStaff(Text),
    NotifyStaffAndPing(Text),
    NotifyStaffWithEmbed(EmbedNotification),
    /// Days of message history to delete.
    BanAndDelete(u32),
    Kick,
    Softban,
    PunishUser,
    PunishUserWithMessage,
    Modlog(Text),
    DeleteUserMessage,
    SendInChannel(Text),
    SetChannelSlowmode(Duration),
    AddRolesToUser(Vec<IdOrName>),
    RemoveRolesFromUser(Vec<IdOrName>),
    EnableEmergencyMode(bool),
    /// Empty clears the nickname.
    SetUserNickname(Text),
    NoOp,
    SendToMonitor(Text),
    SendToChannel(ChannelMessageArgs),
    AddUserHeatpoint(Duration),
    AddUserHeatpoints(Heatpoints),
    AddChannelHeatpoint(Duration),
    AddChannelHeatpoints(Heatpoints),
    AddCustomHeatpoint(CustomHeatpoint),
    AddCustomHeatpoints(CustomHeatpoints),
    EmptyUserHeat,
    EmptyChannelHeat,
    EmptyCustomHeat(Text),
    IssueCommand(IssueCommandArgs),
    DeleteLastMessageSentAfter(Duration),
    SendMessage(Box<SendMessageArgs>),
    GetUserInfo(GetUserInfoArgs),
    Exit,
    VarAssign(VarAssignArgs),
    VarAssignRandom(VarAssignRandomArgs),
    VarReplace(VarReplaceArgs),
    VarSlice(VarSliceArgs),
    VarSplit(VarSplitArgs),
    VarTransform(VarTransformArgs),
}

const MAX_BAN_DELETE_DAYS: i64 = 7;
const MAX_HEATPOINTS: i64 = 10_000;

impl ActionCall {
    /// Validate the raw parameter of `kind`.
    pub fn parse(kind: Action, value: &Value) -> Result<Self, String> {
        use Action as A;

        let call = match kind {
            A::Dm => Self::Dm(from_value(value)?),
            A::DmUser => Self::DmUser(from_value(value)?),
            A::NotifyStaff => Self::NotifyStaff(from_value(value)?),
            A::NotifyStaffAndPing => Self::NotifyStaffAndPing(from_value(value)?),
            A::NotifyStaffWithEmbed => Self::NotifyStaffWithEmbed(from_value(value)?),
            A::BanAndDelete => {
                let Int(days) = from_value(value)?;
                if !(0..=MAX_BAN_DELETE_DAYS).contains(&days) {
                    return Err(format!(
                        "days of messages to delete must be between 0 and {MAX_BAN_DELETE_DAYS}"
                    ));
                }
                Self::BanAndDelete(days as u32)
            }
            A::Kick => nothing(value, Self::Kick)?,
            A::Softban => nothing(value, Self::Softban)?,
            A::PunishUser => nothing(value, Self::PunishUser)?,
            A::PunishUserWithMessage => nothing(value, Self::PunishUserWithMessage)?,
            A::Modlog => Self::Modlog(from_value(value)?),
            A::DeleteUserMessage => nothing(value, Self::DeleteUserMessage)?,
            A::SendInChannel => Self::SendInChannel(from_value(value)?),
            A::SetChannelSlowmode => {
                let delay = delta(value)?;
                if delay > Duration::hours(6) {
                    return Err("slowmode must be between 0 seconds and 6 hours".to_string());
                }
                Self::SetChannelSlowmode(delay)
            }
            A::AddRolesToUser => Self::AddRolesToUser(from_value::<NonEmpty<_>>(value)?.0),
            A::RemoveRolesFromUser => {
                Self::RemoveRolesFromUser(from_value::<NonEmpty<_>>(value)?.0)
            }
            A::EnableEmergencyMode => Self::EnableEmergencyMode(from_value(value)?),
            A::SetUserNickname => Self::SetUserNickname(from_value(value)?),
            A::NoOp => nothing(value, Self::NoOp)?,
            A::SendToMonitor => Self::SendToMonitor(from_value(value)?),
            A::SendToChannel => Self::SendToChannel(from_value(value)?),
            A::AddUserHeatpoint => Self::AddUserHeatpoint(delta(value)?),
            A::AddUserHeatpoints => Self::AddUserHeatpoints(points(from_value(value)?)?),
            A::AddChannelHeatpoint => Self::AddChannelHeatpoint(delta(value)?),
            A::AddChannelHeatpoints => Self::AddChannelHeatpoints(points(from_value(value)?)?),
            A::AddCustomHeatpoint => Self::AddCustomHeatpoint(from_value(value)?),
            A::AddCustomHeatpoints => {
                let args: CustomHeatpoints = from_value(value)?;
                check_points(args.points)?;
                Self::AddCustomHeatpoints(args)
            }
            A::EmptyUserHeat => nothing(value, Self::EmptyUserHeat)?,
            A::EmptyChannelHeat => nothing(value, Self::EmptyChannelHeat)?,
            A::EmptyCustomHeat => Self::EmptyCustomHeat(from_value(value)?),
            A::IssueCommand => Self::IssueCommand(from_value(value)?),
            A::DeleteLastMessageSentAfter => Self::DeleteLastMessageSentAfter(delta(value)?),
            A::SendMessage => Self::SendMessage(Box::new(from_value(value)?)),
            A::GetUserInfo => Self::GetUserInfo(from_value(value)?),
            A::Exit => nothing(value, Self::Exit)?,
            A::VarAssign => Self::VarAssign(from_value(value)?),
            A::VarAssignRandom => Self::VarAssignRandom(from_value(value)?),
            A::VarReplace => Self::VarReplace(from_value(value)?),
            A::VarSlice => Self::VarSlice(from_value(value)?),
            A::VarSplit => Self::VarSplit(from_value(value)?),
            A::VarTransform => Self::VarTransform(from_value(value)?),
        };

        debug_assert_eq!(call.kind(), kind);
        Ok(call)
    }

    pub fn kind(&self) -> Action {
        use Action as A;

        match self {
            Self::Dm(_) => A::Dm,
            Self::DmUser(_) => A::DmUser,
            Self::NotifyStaff(_) => A::NotifyStaff,
            Self::NotifyStaffAndPing(_) => A::NotifyStaffAndPing,
            Self::NotifyStaffWithEmbed(_) => A::NotifyStaffWithEmbed,
            Self::BanAndDelete(_) => A::BanAndDelete,
            Self::Kick => A::Kick,
            Self::Softban => A::Softban,
            Self::PunishUser => A::PunishUser,
            Self::PunishUserWithMessage => A::PunishUserWithMessage,
            Self::Modlog(_) => A::Modlog,
            Self::DeleteUserMessage => A::DeleteUserMessage,
            Self::SendInChannel(_) => A::SendInChannel,
            Self::SetChannelSlowmode(_) => A::SetChannelSlowmode,
            Self::AddRolesToUser(_) => A::AddRolesToUser,
            Self::RemoveRolesFromUser(_) => A::RemoveRolesFromUser,
            Self::EnableEmergencyMode(_) => A::EnableEmergencyMode,
            Self::SetUserNickname(_) => A::SetUserNickname,
            Self::NoOp => A::NoOp,
            Self::SendToMonitor(_) => A::SendToMonitor,
            Self::SendToChannel(_) => A::SendToChannel,
            Self::AddUserHeatpoint(_) => A::AddUserHeatpoint,
            Self::AddUserHeatpoints(_) => A::AddUserHeatpoints,
            Self::AddChannelHeatpoint(_) => A::AddChannelHeatpoint,
            Self::AddChannelHeatpoints(_) => A::AddChannelHeatpoints,
            Self::AddCustomHeatpoint(_) => A::AddCustomHeatpoint,
            Self::AddCustomHeatpoints(_) => A::AddCustomHeatpoints,
            Self::EmptyUserHeat => A::EmptyUserHeat,
            Self::EmptyChannelHeat => A::EmptyChannelHeat,
            Self::EmptyCustomHeat(_) => A::EmptyCustomHeat,
            Self::IssueCommand(_) => A::IssueCommand,
            Self::DeleteLastMessageSentAfter(_) => A::DeleteLastMessageSentAfter,
            Self::SendMessage(_) => A::SendMessage,
            Self::GetUserInfo(_) => A::GetUserInfo,
            Self::Exit => A::Exit,
            Self::VarAssign(_) => A::VarAssign,
            Self::VarAssignRandom(_) => A::VarAssignRandom,
            Self::VarReplace(_) => A::VarReplace,
            Self::VarSlice(_) => A::VarSlice,
            Self::VarSplit(_) => A::VarSplit,
            Self::VarTransform(_) => A::VarTransform,
        }
    }
}

fn nothing(value: &Value, call: ActionCall) -> Result<ActionCall, String> {
    from_value::<Nothing>(value).map(|_| call)
}

fn delta(value: &Value) -> Result<Duration, String> {
    from_value::<Timedelta>(value).map(|Timedelta(d)| d)
}

fn points(args: Heatpoints) -> Result<Heatpoints, String> {
    check_points(args.points)?;
    Ok(args)
}

fn check_points(Int(points): Int) -> Result<(), String> {
    if points < 0 {
        return Err("points cannot be negative".to_string());
    }
    if points > MAX_HEATPOINTS {
        return Err(format!("points cannot be more than {MAX_HEATPOINTS}"));
    }
    Ok(())
}

/// An action together with the parameter as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionItem {
    pub call: ActionCall,
    pub(crate) raw: Value,
}

impl ActionItem {
    pub fn kind(&self) -> Action {
        self.call.kind()
    }
}

/// An entry of `do`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEntry {
    Action(ActionItem),
    /// Evaluated for its result, which gates the next `if-true`/`if-false`.
    Condition(ConditionEntry),
    Branch {
        block: ConditionalActionBlock,
        body: Vec<ActionEntry>,
    },
}
