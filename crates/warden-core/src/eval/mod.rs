//! Condition evaluation and action execution.

mod actions;
mod compare;
mod conditions;
mod template;

use std::collections::HashMap;

pub use actions::{ActionFailure, ActionReport};
pub use compare::compare;
pub use conditions::{ConditionResult, ConditionTrace};
pub use template::substitute;

pub(crate) use actions::execute;
pub(crate) use template::{action_variables, condition_variables};

use crate::heat::{HeatStore, Mode};
use crate::host::Host;
use crate::patterns::PatternSet;

/// Template variables of one invocation, scratch variables included.
pub type Variables = HashMap<String, String>;

/// What one evaluation of one rule runs against.
#[derive(Clone, Copy)]
pub(crate) struct Runtime<'a> {
    pub host: &'a dyn Host,
    pub heat: &'a HeatStore,
    pub patterns: &'a PatternSet,
    pub rule: &'a str,
    pub mode: Mode,
}
