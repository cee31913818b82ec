//! Parsed conditions.

use std::fmt;

use regex::Regex;
use serde_yaml::Value;

use super::params::{
    from_value, CompareArgs, CustomHeatCheck, Id, IdOrName, Int, NonEmpty, Text,
};
use crate::patterns::{compile_user_regex, Glob};
use crate::types::{Condition, ConditionBlock, Rank};

/// A regex written by a rule author, compiled when the rule is parsed.
#[derive(Clone)]
pub struct UserRegex(Regex);

impl UserRegex {
    fn parse(value: &Value) -> Result<Self, String> {
        let Text(source) = from_value(value)?;
        compile_user_regex(&source)
            .map(UserRegex)
            .map_err(|e| format!("invalid regex: {e}"))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for UserRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl fmt::Debug for UserRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserRegex").field(&self.0.as_str()).finish()
    }
}

/// A condition with its validated parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionCall {
    UserIdMatchesAny(Vec<u64>),
    UsernameMatchesAny(Vec<Glob>),
    UsernameMatchesRegex(UserRegex),
    NicknameMatchesAny(Vec<Glob>),
    NicknameMatchesRegex(UserRegex),
    MessageMatchesAny(Vec<Glob>),
    MessageMatchesRegex(UserRegex),
    /// Hours; zero always passes.
    UserCreatedLessThan(i64),
    /// Hours; zero always passes.
    UserJoinedLessThan(i64),
    UserHasDefaultAvatar(bool),
    UserHasSentLessThanMessages(i64),
    ChannelMatchesAny(Vec<IdOrName>),
    CategoryMatchesAny(Vec<IdOrName>),
    ChannelIsPublic(bool),
    MessageHasAttachment(bool),
    InEmergencyMode(bool),
    UserHasAnyRoleIn(Vec<IdOrName>),
    MessageContainsInvite(bool),
    MessageContainsMedia(bool),
    MessageContainsUrl(bool),
    MessageContainsMoreThanMentions(i64),
    MessageContainsMoreThanUniqueMentions(i64),
    MessageContainsMoreThanRolePings(i64),
    MessageContainsMoreThanEmojis(i64),
    MessageHasMoreThanCharacters(i64),
    UserIsRank(Rank),
    IsStaff(bool),
    IsHelper(bool),
    UserHeatIs(i64),
    UserHeatMoreThan(i64),
    ChannelHeatIs(i64),
    ChannelHeatMoreThan(i64),
    CustomHeatIs(CustomHeatCheck),
    CustomHeatMoreThan(CustomHeatCheck),
    Compare(CompareArgs),
}

impl ConditionCall {
    /// Validate the raw parameter of `kind`.
    pub fn parse(kind: Condition, value: &Value) -> Result<Self, String> {
        use Condition as C;

        let call = match kind {
            C::UserIdMatchesAny => {
                let NonEmpty(ids) = from_value::<NonEmpty<Id>>(value)?;
                Self::UserIdMatchesAny(ids.into_iter().map(|Id(id)| id).collect())
            }
            C::UsernameMatchesAny => Self::UsernameMatchesAny(globs(value)?),
            C::UsernameMatchesRegex => Self::UsernameMatchesRegex(UserRegex::parse(value)?),
            C::NicknameMatchesAny => Self::NicknameMatchesAny(globs(value)?),
            C::NicknameMatchesRegex => Self::NicknameMatchesRegex(UserRegex::parse(value)?),
            C::MessageMatchesAny => Self::MessageMatchesAny(globs(value)?),
            C::MessageMatchesRegex => Self::MessageMatchesRegex(UserRegex::parse(value)?),
            C::UserCreatedLessThan => Self::UserCreatedLessThan(int(value)?),
            C::UserJoinedLessThan => Self::UserJoinedLessThan(int(value)?),
            C::UserHasDefaultAvatar => Self::UserHasDefaultAvatar(from_value(value)?),
            C::UserHasSentLessThanMessages => Self::UserHasSentLessThanMessages(int(value)?),
            C::ChannelMatchesAny => Self::ChannelMatchesAny(refs(value)?),
            C::CategoryMatchesAny => Self::CategoryMatchesAny(refs(value)?),
            C::ChannelIsPublic => Self::ChannelIsPublic(from_value(value)?),
            C::MessageHasAttachment => Self::MessageHasAttachment(from_value(value)?),
            C::InEmergencyMode => Self::InEmergencyMode(from_value(value)?),
            C::UserHasAnyRoleIn => Self::UserHasAnyRoleIn(refs(value)?),
            C::MessageContainsInvite => Self::MessageContainsInvite(from_value(value)?),
            C::MessageContainsMedia => Self::MessageContainsMedia(from_value(value)?),
            C::MessageContainsUrl => Self::MessageContainsUrl(from_value(value)?),
            C::MessageContainsMoreThanMentions => {
                Self::MessageContainsMoreThanMentions(int(value)?)
            }
            C::MessageContainsMoreThanUniqueMentions => {
                Self::MessageContainsMoreThanUniqueMentions(int(value)?)
            }
            C::MessageContainsMoreThanRolePings => {
                Self::MessageContainsMoreThanRolePings(int(value)?)
            }
            C::MessageContainsMoreThanEmojis => Self::MessageContainsMoreThanEmojis(int(value)?),
            C::MessageHasMoreThanCharacters => Self::MessageHasMoreThanCharacters(int(value)?),
            C::UserIsRank => {
                let level = int(value)?;
                let rank = Rank::from_level(level)
                    .ok_or_else(|| format!("{level} is not a rank, must be 1-4"))?;
                Self::UserIsRank(rank)
            }
            C::IsStaff => Self::IsStaff(from_value(value)?),
            C::IsHelper => Self::IsHelper(from_value(value)?),
            C::UserHeatIs => Self::UserHeatIs(int(value)?),
            C::UserHeatMoreThan => Self::UserHeatMoreThan(int(value)?),
            C::ChannelHeatIs => Self::ChannelHeatIs(int(value)?),
            C::ChannelHeatMoreThan => Self::ChannelHeatMoreThan(int(value)?),
            C::CustomHeatIs => Self::CustomHeatIs(from_value(value)?),
            C::CustomHeatMoreThan => Self::CustomHeatMoreThan(from_value(value)?),
            C::Compare => Self::Compare(from_value(value)?),
        };

        debug_assert_eq!(call.kind(), kind);
        Ok(call)
    }

    pub fn kind(&self) -> Condition {
        use Condition as C;

        match self {
            Self::UserIdMatchesAny(_) => C::UserIdMatchesAny,
            Self::UsernameMatchesAny(_) => C::UsernameMatchesAny,
            Self::UsernameMatchesRegex(_) => C::UsernameMatchesRegex,
            Self::NicknameMatchesAny(_) => C::NicknameMatchesAny,
            Self::NicknameMatchesRegex(_) => C::NicknameMatchesRegex,
            Self::MessageMatchesAny(_) => C::MessageMatchesAny,
            Self::MessageMatchesRegex(_) => C::MessageMatchesRegex,
            Self::UserCreatedLessThan(_) => C::UserCreatedLessThan,
            Self::UserJoinedLessThan(_) => C::UserJoinedLessThan,
            Self::UserHasDefaultAvatar(_) => C::UserHasDefaultAvatar,
            Self::UserHasSentLessThanMessages(_) => C::UserHasSentLessThanMessages,
            Self::ChannelMatchesAny(_) => C::ChannelMatchesAny,
            Self::CategoryMatchesAny(_) => C::CategoryMatchesAny,
            Self::ChannelIsPublic(_) => C::ChannelIsPublic,
            Self::MessageHasAttachment(_) => C::MessageHasAttachment,
            Self::InEmergencyMode(_) => C::InEmergencyMode,
            Self::UserHasAnyRoleIn(_) => C::UserHasAnyRoleIn,
            Self::MessageContainsInvite(_) => C::MessageContainsInvite,
            Self::MessageContainsMedia(_) => C::MessageContainsMedia,
            Self::MessageContainsUrl(_) => C::MessageContainsUrl,
            Self::MessageContainsMoreThanMentions(_) => C::MessageContainsMoreThanMentions,
            Self::MessageContainsMoreThanUniqueMentions(_) => {
                C::MessageContainsMoreThanUniqueMentions
            }
            Self::MessageContainsMoreThanRolePings(_) => C::MessageContainsMoreThanRolePings,
            Self::MessageContainsMoreThanEmojis(_) => C::MessageContainsMoreThanEmojis,
            Self::MessageHasMoreThanCharacters(_) => C::MessageHasMoreThanCharacters,
            Self::UserIsRank(_) => C::UserIsRank,
            Self::IsStaff(_) => C::IsStaff,
            Self::IsHelper(_) => C::IsHelper,
            Self::UserHeatIs(_) => C::UserHeatIs,
            Self::UserHeatMoreThan(_) => C::UserHeatMoreThan,
            Self::ChannelHeatIs(_) => C::ChannelHeatIs,
            Self::ChannelHeatMoreThan(_) => C::ChannelHeatMoreThan,
            Self::CustomHeatIs(_) => C::CustomHeatIs,
            Self::CustomHeatMoreThan(_) => C::CustomHeatMoreThan,
            Self::Compare(_) => C::Compare,
        }
    }
}

fn int(value: &Value) -> Result<i64, String> {
    from_value::<Int>(value).map(|Int(n)| n)
}

fn globs(value: &Value) -> Result<Vec<Glob>, String> {
    let NonEmpty(patterns) = from_value::<NonEmpty<Text>>(value)?;
    patterns
        .iter()
        .map(|Text(p)| Glob::new(p, true).map_err(|e| e.to_string()))
        .collect()
}

fn refs(value: &Value) -> Result<Vec<IdOrName>, String> {
    from_value::<NonEmpty<IdOrName>>(value).map(|NonEmpty(r)| r)
}

/// A condition together with the parameter as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionItem {
    pub call: ConditionCall,
    pub(crate) raw: Value,
}

impl ConditionItem {
    pub fn kind(&self) -> Condition {
        self.call.kind()
    }
}

/// A root-level entry of `if`, also usable inline in `do`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEntry {
    Single(ConditionItem),
    Block {
        block: ConditionBlock,
        items: Vec<ConditionItem>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_parse_match_any() {
        let call =
            ConditionCall::parse(Condition::MessageMatchesAny, &yaml(r#"["*2626*", hi, 12345]"#))
                .unwrap();
        match call {
            ConditionCall::MessageMatchesAny(globs) => {
                assert_eq!(globs.len(), 3);
                assert_eq!(globs[2].as_str(), "12345");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(ConditionCall::parse(Condition::MessageMatchesAny, &yaml("[]")).is_err());
        assert!(ConditionCall::parse(Condition::MessageMatchesAny, &yaml("hi")).is_err());
    }

    #[test]
    fn test_parse_ids() {
        let call =
            ConditionCall::parse(Condition::UserIdMatchesAny, &yaml(r#"[12, "262626"]"#)).unwrap();
        assert_eq!(call, ConditionCall::UserIdMatchesAny(vec![12, 262626]));
        assert!(ConditionCall::parse(Condition::UserIdMatchesAny, &yaml("[abc]")).is_err());
    }

    #[test]
    fn test_parse_strict_bool() {
        assert_eq!(
            ConditionCall::parse(Condition::IsStaff, &yaml("true")).unwrap(),
            ConditionCall::IsStaff(true)
        );
        assert!(ConditionCall::parse(Condition::IsStaff, &yaml("yes please")).is_err());
    }

    #[test]
    fn test_parse_rank_and_regex() {
        assert_eq!(
            ConditionCall::parse(Condition::UserIsRank, &yaml("3")).unwrap(),
            ConditionCall::UserIsRank(Rank::Rank3)
        );
        assert!(ConditionCall::parse(Condition::UserIsRank, &yaml("5")).is_err());
        assert!(ConditionCall::parse(Condition::MessageMatchesRegex, &yaml("'^spider.*'")).is_ok());
        let err = ConditionCall::parse(Condition::MessageMatchesRegex, &yaml("'(unclosed'"))
            .unwrap_err();
        assert!(err.contains("invalid regex"));
    }
}
