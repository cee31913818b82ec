//! Condition vocabulary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A predicate a rule can test in its `if` list (or inline in `do`).
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
pub enum Condition {
    UserIdMatchesAny,
    UsernameMatchesAny,
    UsernameMatchesRegex,
    NicknameMatchesAny,
    NicknameMatchesRegex,
    MessageMatchesAny,
    MessageMatchesRegex,
    UserCreatedLessThan,
    UserJoinedLessThan,
    UserHasDefaultAvatar,
    UserHasSentLessThanMessages,
    ChannelMatchesAny,
    CategoryMatchesAny,
    ChannelIsPublic,
    MessageHasAttachment,
    InEmergencyMode,
    UserHasAnyRoleIn,
    MessageContainsInvite,
    MessageContainsMedia,
    MessageContainsUrl,
    MessageContainsMoreThanMentions,
    MessageContainsMoreThanUniqueMentions,
    MessageContainsMoreThanRolePings,
    MessageContainsMoreThanEmojis,
    MessageHasMoreThanCharacters,
    UserIsRank,
    IsStaff,
    IsHelper,
    UserHeatIs,
    UserHeatMoreThan,
    ChannelHeatIs,
    ChannelHeatMoreThan,
    CustomHeatIs,
    CustomHeatMoreThan,
    Compare,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Grouping constructs that combine several conditions into one result.
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
pub enum ConditionBlock {
    /// True when every inner condition is true.
    IfAll,
    /// True when at least one inner condition is true.
    IfAny,
    /// True when every inner condition is false.
    IfNot,
}

impl ConditionBlock {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Fold the inner results of a block.
    pub fn combine(self, results: &[bool]) -> bool {
        match self {
            ConditionBlock::IfAll => results.iter().all(|r| *r),
            ConditionBlock::IfAny => results.iter().any(|r| *r),
            ConditionBlock::IfNot => results.iter().all(|r| !*r),
        }
    }
}

/// Comparison operators accepted by `compare`.
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
#[strum(ascii_case_insensitive)]
pub enum Operator {
    #[strum(serialize = "==")]
    #[serde(rename = "==")]
    Equal,
    #[strum(serialize = "!=")]
    #[serde(rename = "!=")]
    NotEqual,
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Greater,
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Less,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    LessOrEqual,
    #[strum(serialize = "contains")]
    #[serde(rename = "contains")]
    Contains,
    #[strum(serialize = "contains-pattern")]
    #[serde(rename = "contains-pattern")]
    ContainsPattern,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether both operands must be numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Operator::Greater | Operator::Less | Operator::GreaterOrEqual | Operator::LessOrEqual
        )
    }
}
