//! Rules: parsing, validation and rendering back to source.

pub mod action;
pub mod condition;
pub mod duration;
pub mod params;
mod parser;

use chrono::{DateTime, Duration, Utc};
use serde_yaml::{Mapping, Value};

pub use action::{ActionCall, ActionEntry, ActionItem};
pub use condition::{ConditionCall, ConditionEntry, ConditionItem, UserRegex};
pub use duration::{format_timedelta, parse_timedelta, parse_timedelta_with, TimeUnit};
pub use parser::ParseOptions;

use crate::error::WardenResult;
use crate::types::{Event, Rank};

/// Priority of rules that don't declare one. Sorts after every explicit priority.
pub const DEFAULT_PRIORITY: u16 = 2666;

/// A validated rule. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Lowercased, with spaces replaced by dashes.
    pub name: String,
    pub rank: Rank,
    pub events: Vec<Event>,
    pub priority: Option<u16>,
    pub run_every: Option<Duration>,
    pub conditions: Vec<ConditionEntry>,
    pub actions: Vec<ActionEntry>,
    raw_rule: String,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.rank == other.rank
            && self.events == other.events
            && self.priority == other.priority
            && self.run_every == other.run_every
            && self.conditions == other.conditions
            && self.actions == other.actions
    }
}

impl Rule {
    /// Parse a stored rule.
    pub fn parse(source: &str) -> WardenResult<Self> {
        parser::parse(source, &ParseOptions::default())
    }

    pub fn parse_with(source: &str, options: &ParseOptions) -> WardenResult<Self> {
        parser::parse(source, options)
    }

    /// The source text this rule was parsed from.
    pub fn raw_rule(&self) -> &str {
        &self.raw_rule
    }

    pub fn priority(&self) -> u16 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn has_event(&self, event: Event) -> bool {
        self.events.contains(&event)
    }

    /// Whether an actor of `rank` is subject to this rule.
    pub fn applies_to(&self, rank: Rank) -> bool {
        rank >= self.rank
    }

    /// When a periodic rule is next due, given its last run.
    pub fn next_run(&self, last_run: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        let interval = self.run_every?;
        match last_run {
            Some(last) => last.checked_add_signed(interval),
            None => Some(Utc::now()),
        }
    }

    /// Render a YAML document that parses back into an equal rule.
    pub fn to_source(&self) -> WardenResult<String> {
        let mut root = Mapping::new();
        root.insert("name".into(), self.name.clone().into());
        root.insert("rank".into(), u64::from(self.rank.level()).into());

        let event = match self.events.as_slice() {
            [single] => Value::from(single.as_str()),
            events => Value::Sequence(events.iter().map(|e| e.as_str().into()).collect()),
        };
        root.insert("event".into(), event);

        if let Some(priority) = self.priority {
            root.insert("priority".into(), u64::from(priority).into());
        }
        if let Some(run_every) = self.run_every {
            root.insert("run-every".into(), format_timedelta(run_every).into());
        }

        root.insert(
            "if".into(),
            Value::Sequence(self.conditions.iter().map(condition_entry_source).collect()),
        );
        root.insert(
            "do".into(),
            Value::Sequence(self.actions.iter().map(action_entry_source).collect()),
        );

        Ok(serde_yaml::to_string(&Value::Mapping(root))?)
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Mapping::new();
    map.insert(key.into(), value);
    Value::Mapping(map)
}

fn condition_item_source(item: &ConditionItem) -> Value {
    single(item.kind().as_str(), item.raw.clone())
}

fn condition_entry_source(entry: &ConditionEntry) -> Value {
    match entry {
        ConditionEntry::Single(item) => condition_item_source(item),
        ConditionEntry::Block { block, items } => single(
            block.as_str(),
            Value::Sequence(items.iter().map(condition_item_source).collect()),
        ),
    }
}

fn action_entry_source(entry: &ActionEntry) -> Value {
    match entry {
        ActionEntry::Action(item) => single(item.kind().as_str(), item.raw.clone()),
        ActionEntry::Condition(entry) => condition_entry_source(entry),
        ActionEntry::Branch { block, body } => single(
            block.as_str(),
            Value::Sequence(body.iter().map(action_entry_source).collect()),
        ),
    }
}
