//! Rule parsing and validation.
//!
//! Validation is fail-fast: the first problem found is reported as a single
//! [`WardenError::InvalidRule`] and no partial rule is returned.

use std::str::FromStr;

use chrono::Duration;
use serde_yaml::{Mapping, Value};
use strum::IntoEnumIterator;
use tracing::debug;

use super::action::{ActionCall, ActionEntry, ActionItem};
use super::condition::{ConditionCall, ConditionEntry, ConditionItem};
use super::duration::{parse_timedelta_with, TimeUnit};
use super::Rule;
use crate::context::{
    action_contexts_satisfied_by, context_of, contexts_satisfied_by, ContextSet,
};
use crate::error::{ErrorCode, WardenError, WardenResult};
use crate::types::{Action, Condition, ConditionBlock, ConditionalActionBlock, Event, Rank};

const REQUIRED_KEYS: [&str; 5] = ["name", "rank", "event", "if", "do"];
const OPTIONAL_KEYS: [&str; 2] = ["priority", "run-every"];

const MIN_PRIORITY: i64 = 1;
const MAX_PRIORITY: i64 = 999;

/// Options controlling how strictly a rule source is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// The rule is being written by someone right now, as opposed to being
    /// reloaded from storage. Deprecated actions are only refused then, so
    /// old stored rules keep loading.
    pub authored: bool,
    /// Whether rules with the `periodic` event may be created.
    pub periodic_allowed: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            authored: false,
            periodic_allowed: true,
        }
    }
}

impl ParseOptions {
    pub fn authored() -> Self {
        Self {
            authored: true,
            ..Self::default()
        }
    }
}

fn invalid(code: ErrorCode, message: impl Into<String>) -> WardenError {
    WardenError::invalid_rule(code, message)
}

pub(crate) fn parse(source: &str, options: &ParseOptions) -> WardenResult<Rule> {
    let document: Value = serde_yaml::from_str(source).map_err(|_| {
        WardenError::malformed(
            "Error parsing YAML. Please make sure the format is valid (a YAML validator may help)",
        )
    })?;
    let Value::Mapping(root) = document else {
        return Err(WardenError::malformed(
            "This rule doesn't seem to follow the expected format.",
        ));
    };

    let name = match root.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(WardenError::malformed("Rule has no 'name' parameter.")),
    };
    let name = name.to_lowercase().replace(' ', "-");

    for key in root.keys() {
        let known = key
            .as_str()
            .is_some_and(|k| REQUIRED_KEYS.contains(&k) || OPTIONAL_KEYS.contains(&k));
        if !known {
            return Err(WardenError::malformed(format!(
                "Unexpected key at root level: '{}'.",
                inline(key)
            )));
        }
    }
    for key in REQUIRED_KEYS {
        if !root.contains_key(key) {
            return Err(WardenError::malformed(format!(
                "Missing key at root level: '{key}'."
            )));
        }
    }

    let rank = parse_rank(&root["rank"])?;
    let events = parse_events(&root["event"])?;
    let priority = root.get("priority").map(parse_priority).transpose()?;
    let run_every = parse_schedule(&events, root.get("run-every"), options)?;

    let validator = Validator {
        options,
        condition_contexts: contexts_satisfied_by(&events),
        action_contexts: action_contexts_satisfied_by(&events),
    };

    let conditions = match &root["if"] {
        Value::Sequence(items) if !items.is_empty() => items
            .iter()
            .map(|raw| validator.condition_entry(raw))
            .collect::<WardenResult<Vec<_>>>()?,
        Value::Sequence(_) | Value::Null => {
            return Err(WardenError::malformed("Rule must have at least one condition."))
        }
        _ => {
            return Err(WardenError::malformed(
                "Invalid 'if' category. Must be a list of conditions.",
            ))
        }
    };

    let actions = match &root["do"] {
        Value::Sequence(items) if !items.is_empty() => items
            .iter()
            .map(|raw| validator.action_entry(raw))
            .collect::<WardenResult<Vec<_>>>()?,
        Value::Sequence(_) | Value::Null => {
            return Err(WardenError::malformed("Rule must have at least one action."))
        }
        _ => {
            return Err(WardenError::malformed(
                "Invalid 'do' category. Must be a list of maps.",
            ))
        }
    };

    debug!(rule = %name, events = events.len(), "parsed rule");

    Ok(Rule {
        name,
        rank,
        events,
        priority,
        run_every,
        conditions,
        actions,
        raw_rule: source.to_string(),
    })
}

fn parse_rank(value: &Value) -> WardenResult<Rank> {
    value
        .as_i64()
        .and_then(Rank::from_level)
        .ok_or_else(|| invalid(ErrorCode::RuleRank, "Invalid target rank. Must be 1-4."))
}

fn parse_events(value: &Value) -> WardenResult<Vec<Event>> {
    let events = match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().and_then(|s| Event::from_str(s).ok()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| invalid(ErrorCode::RuleEvent, "Invalid events."))?,
        other => {
            let event = other
                .as_str()
                .and_then(|s| Event::from_str(s).ok())
                .ok_or_else(|| invalid(ErrorCode::RuleEvent, "Invalid event."))?;
            vec![event]
        }
    };

    if events.is_empty() {
        return Err(invalid(
            ErrorCode::RuleEvent,
            "At least one event must be defined.",
        ));
    }

    let mut unique = Vec::with_capacity(events.len());
    for event in events {
        if !unique.contains(&event) {
            unique.push(event);
        }
    }
    Ok(unique)
}

fn parse_priority(value: &Value) -> WardenResult<u16> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .filter(|p| (MIN_PRIORITY..=MAX_PRIORITY).contains(p))
            .map(|p| p as u16),
        _ => None,
    }
    .ok_or_else(|| {
        invalid(
            ErrorCode::RuleNumber,
            "Priority must be a number between 1 and 999.",
        )
    })
}

fn parse_schedule(
    events: &[Event],
    run_every: Option<&Value>,
    options: &ParseOptions,
) -> WardenResult<Option<Duration>> {
    if !events.contains(&Event::Periodic) {
        if run_every.is_some() {
            return Err(invalid(
                ErrorCode::RulePeriodic,
                "The 'periodic' event must be specified for rules with a 'run-every' parameter.",
            ));
        }
        return Ok(None);
    }

    if !options.periodic_allowed {
        return Err(invalid(
            ErrorCode::RulePeriodic,
            "The creation of periodic Warden rules is currently disabled.",
        ));
    }

    let Some(raw) = run_every else {
        return Err(invalid(
            ErrorCode::RuleRunEvery,
            "The 'run-every' parameter is mandatory with periodic rules.",
        ));
    };

    parse_timedelta_with(&inline(raw), &[TimeUnit::Hours, TimeUnit::Minutes])
        .filter(|d| *d >= Duration::minutes(5) && *d <= Duration::hours(24))
        .map(Some)
        .ok_or_else(|| {
            invalid(
                ErrorCode::RuleRunEvery,
                "The 'run-every' parameter must be between 5 minutes and 24 hours.",
            )
        })
}

struct Validator<'a> {
    options: &'a ParseOptions,
    condition_contexts: ContextSet,
    action_contexts: ContextSet,
}

impl Validator<'_> {
    fn condition_entry(&self, raw: &Value) -> WardenResult<ConditionEntry> {
        let Some((key, param)) = single_entry(raw) else {
            return Err(if raw.is_mapping() {
                WardenError::malformed(
                    "Invalid format in the conditions. Make sure you've got the dashes right!",
                )
            } else {
                WardenError::malformed(format!(
                    "Invalid condition: `{}`. Expected map. Did you forget the colon?",
                    inline(raw)
                ))
            });
        };

        match ConditionBlock::from_str(key) {
            Ok(block) => self.condition_block(block, param),
            Err(_) => self.condition(key, param).map(ConditionEntry::Single),
        }
    }

    fn condition_block(&self, block: ConditionBlock, param: &Value) -> WardenResult<ConditionEntry> {
        let items = match param {
            Value::Sequence(items) if !items.is_empty() => items,
            Value::Sequence(_) | Value::Null => {
                return Err(WardenError::malformed("Condition blocks cannot be empty."))
            }
            _ => {
                return Err(WardenError::malformed(format!(
                    "`{}` must contain a list of conditions.",
                    block.as_str()
                )))
            }
        };

        let items = items
            .iter()
            .map(|raw| match single_entry(raw) {
                Some((key, param)) => self.condition(key, param),
                None => Err(WardenError::malformed(format!(
                    "Invalid condition: `{}`. Expected map. Did you forget the colon?",
                    inline(raw)
                ))),
            })
            .collect::<WardenResult<Vec<_>>>()?;

        Ok(ConditionEntry::Block { block, items })
    }

    fn condition(&self, key: &str, param: &Value) -> WardenResult<ConditionItem> {
        let Ok(condition) = Condition::from_str(key) else {
            if let Ok(block) = ConditionBlock::from_str(key) {
                return Err(WardenError::invalid_rule(
                    ErrorCode::RuleMalformed,
                    format!("Invalid: `{}` can only be at root level.", block.as_str()),
                ));
            }
            return Err(invalid(
                ErrorCode::RuleUnknownName,
                format!(
                    "Invalid condition: `{key}`.{}",
                    suggestion(key, Condition::iter().map(Condition::as_str))
                ),
            ));
        };

        if !self.condition_contexts.contains(context_of(&condition)) {
            return Err(invalid(
                ErrorCode::RuleNotAllowed,
                format!(
                    "Condition `{}` not allowed in the event(s) you have defined.",
                    condition.as_str()
                ),
            ));
        }

        let call = ConditionCall::parse(condition, param).map_err(|e| {
            invalid(
                ErrorCode::RuleParameter,
                format!("Condition `{}` invalid: {e}", condition.as_str()),
            )
        })?;

        Ok(ConditionItem {
            call,
            raw: param.clone(),
        })
    }

    fn action_entry(&self, raw: &Value) -> WardenResult<ActionEntry> {
        let Some((key, param)) = single_entry(raw) else {
            return Err(if raw.is_mapping() {
                WardenError::malformed(
                    "Invalid format in the actions. Make sure you've got the dashes right!",
                )
            } else {
                WardenError::malformed(format!(
                    "Invalid action: `{}`. Expected map.",
                    inline(raw)
                ))
            });
        };

        if let Ok(action) = Action::from_str(key) {
            return self.action(action, param).map(ActionEntry::Action);
        }
        if Condition::from_str(key).is_ok() {
            return self
                .condition(key, param)
                .map(|item| ActionEntry::Condition(ConditionEntry::Single(item)));
        }
        if let Ok(block) = ConditionBlock::from_str(key) {
            return self.condition_block(block, param).map(ActionEntry::Condition);
        }
        if let Ok(block) = ConditionalActionBlock::from_str(key) {
            return self.branch(block, param);
        }

        Err(invalid(
            ErrorCode::RuleUnknownName,
            format!(
                "Invalid action: `{key}`.{}",
                suggestion(
                    key,
                    Action::iter()
                        .filter(|a| !a.is_deprecated())
                        .map(Action::as_str)
                )
            ),
        ))
    }

    fn branch(&self, block: ConditionalActionBlock, param: &Value) -> WardenResult<ActionEntry> {
        let items = match param {
            Value::Sequence(items) if !items.is_empty() => items,
            Value::Sequence(_) | Value::Null => {
                return Err(WardenError::malformed(
                    "Conditional action blocks cannot be empty.",
                ))
            }
            _ => {
                return Err(WardenError::malformed(format!(
                    "`{}` must contain a list of actions.",
                    block.as_str()
                )))
            }
        };

        let mut body = Vec::with_capacity(items.len());
        for raw in items {
            if !raw.is_mapping() {
                return Err(WardenError::malformed(format!(
                    "`{}` contains a non-map. Did you forget the colon?",
                    block.as_str()
                )));
            }
            body.push(self.action_entry(raw)?);
        }

        Ok(ActionEntry::Branch { block, body })
    }

    fn action(&self, action: Action, param: &Value) -> WardenResult<ActionItem> {
        if self.options.authored && action.is_deprecated() {
            return Err(invalid(
                ErrorCode::RuleDeprecated,
                format!(
                    "Action `{}` is deprecated: check the documentation for a supported alternative.",
                    action.as_str()
                ),
            ));
        }

        if !self.action_contexts.contains(context_of(&action)) {
            return Err(invalid(
                ErrorCode::RuleNotAllowed,
                format!(
                    "Action `{}` not allowed in the event(s) you have defined.",
                    action.as_str()
                ),
            ));
        }

        let call = ActionCall::parse(action, param).map_err(|e| {
            invalid(
                ErrorCode::RuleParameter,
                format!("Action `{}` invalid: {e}", action.as_str()),
            )
        })?;

        Ok(ActionItem {
            call,
            raw: param.clone(),
        })
    }
}

/// The key and value of a one-key map.
fn single_entry(raw: &Value) -> Option<(&str, &Value)> {
    let map: &Mapping = raw.as_mapping()?;
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    Some((key.as_str()?, value))
}

/// Scalars as written; anything else as compact YAML.
pub(crate) fn inline(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().replace('\n', " "))
            .unwrap_or_default(),
    }
}

/// " Did you mean `x`?" for the closest candidate, or nothing.
fn suggestion<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> String {
    let threshold = (name.chars().count() / 3).max(2);
    candidates
        .map(|c| (levenshtein(name, c), c))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, c)| format!(" Did you mean `{c}`?"))
        .unwrap_or_default()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}
