//! Evaluating conditions against a subject.

use std::collections::HashSet;
use std::fmt;

use chrono::{Duration, Utc};
use tracing::{debug, error};

use super::compare::compare;
use super::template::substitute;
use super::{Runtime, Variables};
use crate::error::{WardenError, WardenResult};
use crate::heat::{HeatKey, Mode};
use crate::patterns::{contains_url, count_emojis, visible_length};
use crate::rule::{ConditionCall, ConditionEntry, ConditionItem};
use crate::types::{Condition, ConditionBlock, Subject};

/// How one root-level entry evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionTrace {
    Single {
        condition: Condition,
        passed: bool,
    },
    Block {
        block: ConditionBlock,
        /// Inner results before any negation.
        results: Vec<(Condition, bool)>,
        passed: bool,
    },
}

impl ConditionTrace {
    pub fn passed(&self) -> bool {
        match self {
            ConditionTrace::Single { passed, .. } | ConditionTrace::Block { passed, .. } => *passed,
        }
    }
}

/// Outcome of a rule's `if` with the evaluations that led to it.
///
/// Evaluation stops at the first failing root entry, so `evaluations` ends
/// with the entry that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionResult {
    pub rule: String,
    pub mode: Mode,
    pub passed: bool,
    pub evaluations: Vec<ConditionTrace>,
}

impl fmt::Display for ConditionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rule '{}' ({}): {}", self.rule, self.mode, self.passed)?;
        for trace in &self.evaluations {
            match trace {
                ConditionTrace::Single { condition, passed } => {
                    writeln!(f, "- {condition}: {passed}")?;
                }
                ConditionTrace::Block {
                    block,
                    results,
                    passed,
                } => {
                    writeln!(f, "- {block}: {passed}")?;
                    for (condition, result) in results {
                        writeln!(f, "  - {condition}: {result}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn more_than(count: usize, threshold: i64) -> bool {
    i64::try_from(count).map_or(true, |count| count > threshold)
}

impl Runtime<'_> {
    /// Evaluate root-level entries as an AND, stopping at the first false.
    pub(crate) async fn evaluate_entries(
        &self,
        entries: &[ConditionEntry],
        subject: &Subject,
        vars: &Variables,
    ) -> WardenResult<(bool, Vec<ConditionTrace>)> {
        let mut traces = Vec::with_capacity(entries.len());
        for entry in entries {
            let trace = self.evaluate_entry(entry, subject, vars).await?;
            let passed = trace.passed();
            traces.push(trace);
            if !passed {
                return Ok((false, traces));
            }
        }
        Ok((true, traces))
    }

    /// Evaluate one entry. Every condition of a block is evaluated.
    pub(crate) async fn evaluate_entry(
        &self,
        entry: &ConditionEntry,
        subject: &Subject,
        vars: &Variables,
    ) -> WardenResult<ConditionTrace> {
        match entry {
            ConditionEntry::Single(item) => {
                let passed = self.evaluate_item(item, subject, vars).await?;
                Ok(ConditionTrace::Single {
                    condition: item.kind(),
                    passed,
                })
            }
            ConditionEntry::Block { block, items } => {
                let mut results = Vec::with_capacity(items.len());
                for item in items {
                    results.push((item.kind(), self.evaluate_item(item, subject, vars).await?));
                }
                let flags: Vec<bool> = results.iter().map(|(_, r)| *r).collect();
                let passed = block.combine(&flags);
                debug!(rule = self.rule, block = %block, passed, "condition block evaluated");
                Ok(ConditionTrace::Block {
                    block: *block,
                    results,
                    passed,
                })
            }
        }
    }

    async fn evaluate_item(
        &self,
        item: &ConditionItem,
        subject: &Subject,
        vars: &Variables,
    ) -> WardenResult<bool> {
        let passed = self.evaluate(&item.call, subject, vars).await?;
        debug!(
            rule = self.rule,
            guild_id = subject.guild.id,
            mode = %self.mode,
            condition = %item.kind(),
            passed,
            "condition evaluated"
        );
        Ok(passed)
    }

    async fn evaluate(
        &self,
        call: &ConditionCall,
        subject: &Subject,
        vars: &Variables,
    ) -> WardenResult<bool> {
        use ConditionCall as C;

        let kind = call.kind();
        let guild = &subject.guild;
        let member = || {
            subject
                .member()
                .ok_or_else(|| WardenError::missing_context("user", kind.as_str()))
        };
        let message = || {
            subject
                .msg()
                .ok_or_else(|| WardenError::missing_context("message", kind.as_str()))
        };
        let channel = || message().map(|m| &m.channel);

        let passed = match call {
            C::UserIdMatchesAny(ids) => ids.contains(&member()?.id),
            C::UsernameMatchesAny(patterns) => {
                let name = &member()?.name;
                patterns.iter().any(|p| p.is_match(name))
            }
            C::UsernameMatchesRegex(regex) => regex.is_match(&member()?.name),
            C::NicknameMatchesAny(patterns) => match &member()?.nick {
                Some(nick) => patterns.iter().any(|p| p.is_match(nick)),
                None => false,
            },
            C::NicknameMatchesRegex(regex) => {
                member()?.nick.as_deref().is_some_and(|nick| regex.is_match(nick))
            }
            C::MessageMatchesAny(patterns) => {
                let content = &message()?.content;
                patterns.iter().any(|p| p.is_match(content))
            }
            C::MessageMatchesRegex(regex) => regex.is_match(&message()?.content),
            C::UserCreatedLessThan(hours) => {
                let created_at = member()?.created_at;
                *hours == 0 || within_hours(created_at, *hours)
            }
            C::UserJoinedLessThan(hours) => match member()?.joined_at {
                Some(joined_at) => *hours == 0 || within_hours(joined_at, *hours),
                None => false,
            },
            C::UserHasDefaultAvatar(expected) => {
                self.patterns.is_default_avatar(&member()?.avatar_url) == *expected
            }
            C::UserHasSentLessThanMessages(threshold) => {
                let count = self.host.recorded_message_count(guild, member()?).await?;
                i64::try_from(count).map_or(false, |count| count < *threshold)
            }
            C::ChannelMatchesAny(refs) => {
                let channel = channel()?;
                refs.iter().any(|r| r.matches(channel.id, &channel.name))
            }
            C::CategoryMatchesAny(refs) => match &channel()?.category {
                Some(category) => refs.iter().any(|r| r.matches(category.id, &category.name)),
                None => false,
            },
            C::ChannelIsPublic(expected) => channel()?.is_public == *expected,
            C::MessageHasAttachment(expected) => {
                !message()?.attachments.is_empty() == *expected
            }
            C::InEmergencyMode(expected) => self.host.in_emergency_mode(guild).await? == *expected,
            C::UserHasAnyRoleIn(refs) => member()?
                .roles
                .iter()
                .any(|role| refs.iter().any(|r| r.matches(role.id, &role.name))),
            C::MessageContainsInvite(expected) => {
                let has_invite = match self.patterns.find_invite(&message()?.content) {
                    Some(code) => match self.host.is_own_invite(guild, code).await {
                        Ok(own) => !own,
                        Err(e) => {
                            error!(rule = self.rule, guild_id = guild.id, error = %e, "own invite check failed");
                            false
                        }
                    },
                    None => false,
                };
                has_invite == *expected
            }
            C::MessageContainsMedia(expected) => {
                self.patterns.contains_media(&message()?.content) == *expected
            }
            C::MessageContainsUrl(expected) => contains_url(&message()?.content) == *expected,
            C::MessageContainsMoreThanMentions(threshold) => {
                more_than(message()?.raw_mentions.len(), *threshold)
            }
            C::MessageContainsMoreThanUniqueMentions(threshold) => {
                let unique: HashSet<u64> = message()?.raw_mentions.iter().copied().collect();
                more_than(unique.len(), *threshold)
            }
            C::MessageContainsMoreThanRolePings(threshold) => {
                more_than(message()?.role_mentions.len(), *threshold)
            }
            C::MessageContainsMoreThanEmojis(threshold) => {
                more_than(count_emojis(&message()?.content), *threshold)
            }
            C::MessageHasMoreThanCharacters(threshold) => {
                more_than(visible_length(&message()?.clean_content), *threshold)
            }
            C::UserIsRank(rank) => self.host.resolve_rank(guild, member()?).await? == *rank,
            C::IsStaff(expected) => self.host.is_staff(guild, member()?).await? == *expected,
            C::IsHelper(expected) => self.host.is_helper(guild, member()?).await? == *expected,
            C::UserHeatIs(points) => {
                let key = HeatKey::user(self.mode, guild.id, member()?.id);
                i64::try_from(self.heat.get(&key)).ok() == Some(*points)
            }
            C::UserHeatMoreThan(points) => {
                let key = HeatKey::user(self.mode, guild.id, member()?.id);
                more_than(self.heat.get(&key), *points)
            }
            C::ChannelHeatIs(points) => {
                let key = HeatKey::channel(self.mode, guild.id, channel()?.id);
                i64::try_from(self.heat.get(&key)).ok() == Some(*points)
            }
            C::ChannelHeatMoreThan(points) => {
                let key = HeatKey::channel(self.mode, guild.id, channel()?.id);
                more_than(self.heat.get(&key), *points)
            }
            C::CustomHeatIs(check) => {
                let label = substitute(&check.label.0, vars);
                let key = HeatKey::custom(self.mode, guild.id, label);
                i64::try_from(self.heat.get(&key)).ok() == Some(check.points.0)
            }
            C::CustomHeatMoreThan(check) => {
                let label = substitute(&check.label.0, vars);
                let key = HeatKey::custom(self.mode, guild.id, label);
                more_than(self.heat.get(&key), check.points.0)
            }
            C::Compare(args) => compare(
                &substitute(&args.value1.0, vars),
                args.operator,
                &substitute(&args.value2.0, vars),
            )?,
        };

        Ok(passed)
    }
}

/// Whether `at` is less than `hours` hours ago.
fn within_hours(at: chrono::DateTime<Utc>, hours: i64) -> bool {
    Duration::try_hours(hours)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .map_or(true, |cutoff| at > cutoff)
}
