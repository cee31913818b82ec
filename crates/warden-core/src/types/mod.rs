//! Core vocabulary and data types.

pub mod action;
pub mod condition;
pub mod event;
pub mod rank;
pub mod subject;

pub use action::{Action, ConditionalActionBlock};
pub use condition::{Condition, ConditionBlock, Operator};
pub use event::Event;
pub use rank::Rank;
pub use subject::{Attachment, Category, Channel, Guild, Member, Message, Role, Subject};
