//! The engine facade hosts talk to.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::WardenConfig;
use crate::error::WardenResult;
use crate::eval::{
    action_variables, condition_variables, execute, ActionReport, ConditionResult, Runtime,
};
use crate::heat::{HeatKey, HeatStore, HeatSubject, Mode};
use crate::host::Host;
use crate::patterns::{PatternConfig, PatternSet};
use crate::rule::{ParseOptions, Rule};
use crate::types::Subject;

/// Parses rules and runs them against subjects supplied by the host.
///
/// Rules are plain values; one `Warden` evaluates any number of them
/// concurrently. Heat points live in the shared [`HeatStore`].
pub struct Warden {
    config: WardenConfig,
    host: Arc<dyn Host>,
    heat: Arc<HeatStore>,
    patterns: RwLock<Arc<PatternSet>>,
}

impl Warden {
    /// Create an engine with a fresh heat store.
    pub fn new(config: WardenConfig, host: Arc<dyn Host>) -> WardenResult<Self> {
        let patterns = PatternSet::compile(&config.patterns)?;
        let heat = Arc::new(HeatStore::new(config.heat.clone()));

        Ok(Self {
            config,
            host,
            heat,
            patterns: RwLock::new(Arc::new(patterns)),
        })
    }

    /// Share an existing heat store, e.g. between engines of several shards.
    pub fn with_heat_store(mut self, heat: Arc<HeatStore>) -> Self {
        self.heat = heat;
        self
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn heat(&self) -> &Arc<HeatStore> {
        &self.heat
    }

    /// Parse a stored rule.
    pub fn parse(&self, source: &str) -> WardenResult<Rule> {
        Rule::parse_with(source, &self.config.parse_options())
    }

    /// Parse a rule someone is writing right now. Deprecated actions are refused.
    pub fn parse_authored(&self, source: &str) -> WardenResult<Rule> {
        Rule::parse_with(
            source,
            &ParseOptions {
                authored: true,
                ..self.config.parse_options()
            },
        )
    }

    /// Whether the rule's conditions hold for `subject`.
    ///
    /// Subjects ranked below the rule's rank never satisfy it.
    pub async fn satisfies_conditions(
        &self,
        rule: &Rule,
        subject: &Subject,
        mode: Mode,
    ) -> WardenResult<bool> {
        Ok(self.explain_conditions(rule, subject, mode).await?.passed)
    }

    /// Like [`satisfies_conditions`](Self::satisfies_conditions), keeping
    /// the result of every evaluated entry.
    pub async fn explain_conditions(
        &self,
        rule: &Rule,
        subject: &Subject,
        mode: Mode,
    ) -> WardenResult<ConditionResult> {
        if !rule.applies_to(subject.rank) {
            debug!(
                rule = %rule.name,
                guild_id = subject.guild.id,
                rank = %subject.rank,
                "rank below rule rank"
            );
            return Ok(ConditionResult {
                rule: rule.name.clone(),
                mode,
                passed: false,
                evaluations: Vec::new(),
            });
        }

        let patterns = self.patterns.read().await.clone();
        let rt = self.runtime(rule, &patterns, mode);
        let vars = condition_variables(&rule.name, subject);
        let (passed, evaluations) = rt.evaluate_entries(&rule.conditions, subject, &vars).await?;

        debug!(rule = %rule.name, guild_id = subject.guild.id, mode = %mode, passed, "conditions evaluated");
        Ok(ConditionResult {
            rule: rule.name.clone(),
            mode,
            passed,
            evaluations,
        })
    }

    /// Run the rule's actions against `subject`.
    ///
    /// Scratch variables live only for this call. Heat changes are visible
    /// to later actions of the same call and persist in the store.
    pub async fn do_actions(
        &self,
        rule: &Rule,
        subject: &Subject,
        mode: Mode,
    ) -> WardenResult<ActionReport> {
        let patterns = self.patterns.read().await.clone();
        let rt = self.runtime(rule, &patterns, mode);
        let vars = action_variables(&rule.name, subject, &self.heat, mode);
        let report = execute(rt, &rule.actions, subject, vars).await?;

        info!(
            rule = %rule.name,
            guild_id = subject.guild.id,
            mode = %mode,
            executed = report.executed,
            failures = report.failures.len(),
            exited = report.exited,
            "actions executed"
        );
        Ok(report)
    }

    /// Current heat of a counter. Unknown counters read as zero.
    pub fn get_heat_points(
        &self,
        mode: Mode,
        guild: u64,
        subject: HeatSubject,
        name: &str,
    ) -> usize {
        self.heat.get(&HeatKey::new(mode, guild, subject, name))
    }

    /// Swap in new default-avatar, invite and media patterns. Evaluations
    /// already running finish with the old set.
    pub async fn refresh_patterns(&self, config: &PatternConfig) -> WardenResult<()> {
        let compiled = PatternSet::compile(config)?;
        *self.patterns.write().await = Arc::new(compiled);
        info!("patterns refreshed");
        Ok(())
    }

    fn runtime<'a>(&'a self, rule: &'a Rule, patterns: &'a PatternSet, mode: Mode) -> Runtime<'a> {
        Runtime {
            host: self.host.as_ref(),
            heat: &self.heat,
            patterns,
            rule: &rule.name,
            mode,
        }
    }
}
