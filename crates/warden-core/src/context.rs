//! Context classification.
//!
//! Every condition and action needs some subset of a subject to run: nothing
//! beyond the guild, a user, or a message. Every event supplies some subset.
//! A rule is legal only when each of its declared events supplies what each
//! of its items needs.

use std::fmt;

use strum::{Display, EnumIter};

use crate::types::{Action, Condition, Event};

/// What a condition or action needs from its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ContextKind {
    /// Guild-wide; no user or message required.
    Any,
    User,
    Message,
}

impl ContextKind {
    fn bit(self) -> u8 {
        match self {
            ContextKind::Any => 0b001,
            ContextKind::User => 0b010,
            ContextKind::Message => 0b100,
        }
    }
}

/// A set of [`ContextKind`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextSet(u8);

impl ContextSet {
    pub const EMPTY: ContextSet = ContextSet(0);
    pub const ANY: ContextSet = ContextSet(0b001);
    pub const ANY_USER: ContextSet = ContextSet(0b011);
    pub const ALL: ContextSet = ContextSet(0b111);

    pub fn contains(self, kind: ContextKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn intersection(self, other: ContextSet) -> ContextSet {
        ContextSet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<_> = [ContextKind::Any, ContextKind::User, ContextKind::Message]
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect();
        f.debug_set().entries(kinds).finish()
    }
}

/// Anything with a context requirement.
pub trait ContextRequirement {
    fn required_context(&self) -> ContextKind;
}

impl ContextRequirement for Condition {
    fn required_context(&self) -> ContextKind {
        use Condition::*;
        match self {
            InEmergencyMode | Compare => ContextKind::Any,

            UserIdMatchesAny
            | UsernameMatchesAny
            | UsernameMatchesRegex
            | NicknameMatchesAny
            | NicknameMatchesRegex
            | UserCreatedLessThan
            | UserJoinedLessThan
            | UserHasDefaultAvatar
            | UserHasSentLessThanMessages
            | UserHasAnyRoleIn
            | UserIsRank
            | IsStaff
            | IsHelper
            | UserHeatIs
            | UserHeatMoreThan
            | CustomHeatIs
            | CustomHeatMoreThan => ContextKind::User,

            MessageMatchesAny
            | MessageMatchesRegex
            | ChannelMatchesAny
            | CategoryMatchesAny
            | ChannelIsPublic
            | MessageHasAttachment
            | MessageContainsInvite
            | MessageContainsMedia
            | MessageContainsUrl
            | MessageContainsMoreThanMentions
            | MessageContainsMoreThanUniqueMentions
            | MessageContainsMoreThanRolePings
            | MessageContainsMoreThanEmojis
            | MessageHasMoreThanCharacters
            | ChannelHeatIs
            | ChannelHeatMoreThan => ContextKind::Message,
        }
    }
}

impl ContextRequirement for Action {
    fn required_context(&self) -> ContextKind {
        use Action::*;
        match self {
            Dm
            | NotifyStaff
            | NotifyStaffAndPing
            | NotifyStaffWithEmbed
            | EnableEmergencyMode
            | NoOp
            | SendToMonitor
            | SendToChannel
            | AddCustomHeatpoint
            | AddCustomHeatpoints
            | EmptyCustomHeat
            | IssueCommand
            | DeleteLastMessageSentAfter
            | SendMessage
            | GetUserInfo
            | Exit
            | VarAssign
            | VarAssignRandom
            | VarReplace
            | VarSlice
            | VarSplit
            | VarTransform => ContextKind::Any,

            DmUser
            | BanAndDelete
            | Kick
            | Softban
            | PunishUser
            | Modlog
            | AddRolesToUser
            | RemoveRolesFromUser
            | SetUserNickname
            | AddUserHeatpoint
            | AddUserHeatpoints
            | EmptyUserHeat => ContextKind::User,

            PunishUserWithMessage
            | DeleteUserMessage
            | SendInChannel
            | SetChannelSlowmode
            | AddChannelHeatpoint
            | AddChannelHeatpoints
            | EmptyChannelHeat => ContextKind::Message,
        }
    }
}

/// Context requirement of a condition or action.
pub fn context_of<T: ContextRequirement>(item: &T) -> ContextKind {
    item.required_context()
}

impl Event {
    /// Contexts this event supplies to conditions.
    pub fn condition_contexts(self) -> ContextSet {
        match self {
            Event::OnMessage | Event::OnMessageEdit | Event::OnMessageDelete => ContextSet::ALL,
            Event::OnUserJoin | Event::OnUserLeave | Event::Manual | Event::Periodic => {
                ContextSet::ANY_USER
            }
            Event::OnEmergency => ContextSet::ANY,
        }
    }

    /// Contexts this event supplies to actions.
    ///
    /// Identical to [`Event::condition_contexts`] except on user leave, where
    /// the user is gone and user-bound effects cannot run.
    pub fn action_contexts(self) -> ContextSet {
        match self {
            Event::OnUserLeave => ContextSet::ANY,
            other => other.condition_contexts(),
        }
    }
}

/// Condition contexts available under every one of `events`.
pub fn contexts_satisfied_by(events: &[Event]) -> ContextSet {
    fold(events, Event::condition_contexts)
}

/// Action contexts available under every one of `events`.
pub fn action_contexts_satisfied_by(events: &[Event]) -> ContextSet {
    fold(events, Event::action_contexts)
}

fn fold(events: &[Event], supply: fn(Event) -> ContextSet) -> ContextSet {
    if events.is_empty() {
        return ContextSet::EMPTY;
    }
    events
        .iter()
        .fold(ContextSet::ALL, |acc, e| acc.intersection(supply(*e)))
}
