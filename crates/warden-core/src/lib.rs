//! warden-core - Core library for warden.
//!
//! This crate provides the rule language, its validator, the condition
//! evaluator, the action executor and the heat-point store behind warden,
//! a declarative moderation engine for chat bots.
//!
//! # Example
//!
//! ```ignore
//! use warden_core::{Mode, Warden, WardenConfig};
//!
//! let warden = Warden::new(WardenConfig::default(), host)?;
//!
//! let rule = warden.parse(r#"
//! name: spam-heat
//! rank: 1
//! event: on-message
//! if:
//!   - message-contains-url: true
//! do:
//!   - add-user-heatpoint: 10m
//! "#)?;
//!
//! if warden.satisfies_conditions(&rule, &subject, Mode::Production).await? {
//!     warden.do_actions(&rule, &subject, Mode::Production).await?;
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod eval;
pub mod heat;
pub mod host;
pub mod patterns;
pub mod rule;
pub mod types;
mod warden;

// Re-export commonly used types
pub use config::{WardenConfig, WardenConfigBuilder};
pub use context::{context_of, contexts_satisfied_by, ContextKind, ContextSet};
pub use error::{ErrorCode, WardenError, WardenResult};
pub use eval::{ActionFailure, ActionReport, ConditionResult, ConditionTrace};
pub use heat::{HeatConfig, HeatKey, HeatStore, HeatSubject, Mode};
pub use host::{EffectContext, Host, SandboxedHost};
pub use patterns::{PatternConfig, PatternSet};
pub use rule::{ParseOptions, Rule};
pub use types::{
    Action, Condition, Event, Guild, Member, Message, Operator, Rank, Subject,
};
pub use warden::Warden;
