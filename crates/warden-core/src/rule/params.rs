//! Parameter shapes for conditions and actions.
//!
//! Structured parameters derive `Deserialize` with `deny_unknown_fields`, so
//! they accept both the positional list form (`[label, 5]`) and the map
//! form (`{label: x, points: 5}`). Scalar wrappers are lenient the same way
//! rule authors expect: numbers are accepted where text is expected and
//! numeric text where an integer is expected.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Duration;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use super::duration::parse_timedelta;
use crate::types::Operator;

/// Text accepting any YAML scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text(pub String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Text(s)),
            Value::Number(n) => Ok(Text(n.to_string())),
            Value::Bool(b) => Ok(Text(b.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string, found {}",
                describe(&other)
            ))),
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integer accepting numeric text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int(pub i64);

impl<'de> Deserialize<'de> for Int {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .map(Int)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, found {}", describe(&value))))
    }
}

/// A snowflake id accepting numeric text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(pub u64);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed
            .map(Id)
            .ok_or_else(|| de::Error::custom(format!("expected an id, found {}", describe(&value))))
    }
}

/// Either an id or a name. Numbers are kept in their canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdOrName(pub String);

impl IdOrName {
    /// The id, when the reference is numeric.
    pub fn id(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn matches(&self, id: u64, name: &str) -> bool {
        self.id() == Some(id) || self.0 == name
    }
}

impl<'de> Deserialize<'de> for IdOrName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_u64() {
                Some(id) => Ok(IdOrName(id.to_string())),
                None => Err(de::Error::custom(format!("{n} is not a valid id"))),
            },
            Value::String(s) => Ok(IdOrName(s)),
            other => Err(de::Error::custom(format!(
                "expected an id or a name, found {}",
                describe(&other)
            ))),
        }
    }
}

/// A list with at least one element.
#[derive(Debug, Clone, PartialEq)]
pub struct NonEmpty<T>(pub Vec<T>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NonEmpty<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        if items.is_empty() {
            return Err(de::Error::custom("ensure this value has at least 1 item"));
        }
        Ok(NonEmpty(items))
    }
}

impl<T> std::ops::Deref for NonEmpty<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

/// A duration literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timedelta(pub Duration);

impl<'de> Deserialize<'de> for Timedelta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => parse_timedelta(&s)
                .map(Timedelta)
                .ok_or_else(|| de::Error::custom("Not a valid timedelta")),
            _ => Err(de::Error::custom("Not a valid timedelta")),
        }
    }
}

/// Explicitly empty parameter (`kick-user:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nothing;

impl<'de> Deserialize<'de> for Nothing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Nothing),
            other => Err(de::Error::custom(format!(
                "expected no value, found {}",
                describe(&other)
            ))),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a map",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Deserialize a parameter from its raw YAML value.
///
/// Goes through `serde_json::Value`, whose deserializer also hands sequences
/// to derived structs. `serde_yaml`'s only accepts maps there.
pub(crate) fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    let json = serde_json::to_value(value).map_err(|e| e.to_string())?;
    serde_json::from_value(json).map_err(|e| e.to_string())
}

// Condition parameters

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomHeatCheck {
    pub label: Text,
    pub points: Int,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareArgs {
    pub value1: Text,
    #[serde(deserialize_with = "operator")]
    pub operator: Operator,
    pub value2: Text,
}

fn operator<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Operator, D::Error> {
    let Text(raw) = Text::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| de::Error::custom(format!("Unknown operator `{raw}`")))
}

// Action parameters

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DmArgs {
    pub id: Id,
    pub content: Text,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelMessageArgs {
    pub id_or_name: IdOrName,
    pub content: Text,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedNotification {
    pub title: Text,
    pub content: Text,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomHeatpoint {
    pub label: Text,
    pub delta: Timedelta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomHeatpoints {
    pub label: Text,
    pub points: Int,
    pub delta: Timedelta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Heatpoints {
    pub points: Int,
    pub delta: Timedelta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueCommandArgs {
    pub id: Id,
    pub command: Text,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedFieldArgs {
    pub name: Text,
    pub value: Text,
    #[serde(default = "yes")]
    pub inline: bool,
}

fn yes() -> bool {
    true
}

/// `color` of `send-message`: `true` for the host default, `false` for none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorArg {
    Toggle(bool),
    Rgb(u32),
}

impl Default for ColorArg {
    fn default() -> Self {
        ColorArg::Toggle(true)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageArgs {
    /// Channel id, member id or channel name; templated.
    pub id: Text,
    #[serde(default)]
    pub content: Option<Text>,
    #[serde(default)]
    pub description: Option<Text>,
    #[serde(default)]
    pub title: Option<Text>,
    #[serde(default)]
    pub fields: Vec<EmbedFieldArgs>,
    #[serde(default)]
    pub footer_text: Option<Text>,
    #[serde(default)]
    pub footer_icon_url: Option<Text>,
    #[serde(default)]
    pub thumbnail: Option<Text>,
    #[serde(default)]
    pub author_name: Option<Text>,
    #[serde(default)]
    pub author_url: Option<Text>,
    #[serde(default)]
    pub author_icon_url: Option<Text>,
    #[serde(default)]
    pub image: Option<Text>,
    #[serde(default)]
    pub url: Option<Text>,
    #[serde(default)]
    pub color: ColorArg,
    #[serde(default)]
    pub add_timestamp: bool,
    #[serde(default)]
    pub allow_mass_mentions: bool,
    #[serde(default)]
    pub edit_message_id: Option<Text>,
}

impl SendMessageArgs {
    /// Whether any embed part is set.
    pub fn has_embed(&self) -> bool {
        !self.fields.is_empty()
            || [
                &self.description,
                &self.title,
                &self.footer_text,
                &self.footer_icon_url,
                &self.thumbnail,
                &self.author_name,
                &self.author_url,
                &self.author_icon_url,
                &self.image,
                &self.url,
            ]
            .iter()
            .any(|part| part.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetUserInfoArgs {
    pub id: Text,
    /// Scratch variable name to member attribute.
    pub mapping: BTreeMap<String, Text>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarAssignArgs {
    pub var_name: Text,
    pub value: Text,
    #[serde(default)]
    pub evaluate: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Choices {
    Uniform(Vec<Text>),
    Weighted(BTreeMap<String, u32>),
}

impl Choices {
    fn is_empty(&self) -> bool {
        match self {
            Choices::Uniform(c) => c.is_empty(),
            Choices::Weighted(c) => c.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarAssignRandomArgs {
    pub var_name: Text,
    #[serde(deserialize_with = "choices")]
    pub choices: Choices,
    #[serde(default)]
    pub evaluate: bool,
}

fn choices<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Choices, D::Error> {
    let choices = Choices::deserialize(deserializer)?;
    if choices.is_empty() {
        return Err(de::Error::custom("Choices cannot be empty"));
    }
    Ok(choices)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Text>),
    One(Text),
}

impl OneOrMany {
    pub fn items(&self) -> &[Text] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarReplaceArgs {
    pub var_name: Text,
    pub strings: OneOrMany,
    pub substring: Text,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarSliceArgs {
    pub var_name: Text,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub end_index: Option<i64>,
    #[serde(default)]
    pub slice_into: Option<Text>,
    #[serde(default)]
    pub step: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarSplitArgs {
    pub var_name: Text,
    pub separator: Text,
    pub split_into: NonEmpty<Text>,
    #[serde(default = "unlimited")]
    pub max_split: i64,
}

fn unlimited() -> i64 {
    -1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Transform {
    Capitalize,
    Lowercase,
    Reverse,
    Uppercase,
    Title,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarTransformArgs {
    pub var_name: Text,
    #[serde(deserialize_with = "transform")]
    pub operation: Transform,
}

fn transform<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Transform, D::Error> {
    let Text(raw) = Text::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| de::Error::custom(format!("Unknown operation `{raw}`")))
}
