//! Error types for warden operations.
//!
//! Parsing and validation failures surface as [`WardenError::InvalidRule`],
//! runtime failures while evaluating conditions or running actions as
//! [`WardenError::Evaluation`]. Both carry a stable [`ErrorCode`] and a
//! human-readable message that callers are allowed to match substrings of.

use thiserror::Error;

/// Result type alias for warden operations.
pub type WardenResult<T> = Result<T, WardenError>;

/// Main error type for all warden operations.
#[derive(Error, Debug)]
pub enum WardenError {
    /// The rule source was rejected by the parser/validator.
    #[error("Invalid rule: {message}")]
    InvalidRule { message: String, code: ErrorCode },

    /// A condition or action could not be evaluated against the supplied context.
    #[error("Evaluation error: {message}")]
    Evaluation { message: String, code: ErrorCode },

    /// The host failed to carry out an external effect.
    #[error("Effect error: {message}")]
    Effect {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error outside of rule parsing (configuration, rendering).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Rule structure (RULE_xxx)
    RuleMalformed,
    RuleRank,
    RuleEvent,
    RuleNumber,
    RuleRunEvery,
    RulePeriodic,
    RuleNotAllowed,
    RuleUnknownName,
    RuleParameter,
    RuleDeprecated,

    // Evaluation (EVAL_xxx)
    EvalMissingContext,
    EvalNotNumeric,
    EvalUnknownVariable,
    EvalInvalidRegex,
    EvalFailed,

    // Effects (EFF_xxx)
    EffectFailed,
    EffectNotFound,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RuleMalformed => "RULE_001",
            ErrorCode::RuleRank => "RULE_002",
            ErrorCode::RuleEvent => "RULE_003",
            ErrorCode::RuleNumber => "RULE_004",
            ErrorCode::RuleRunEvery => "RULE_005",
            ErrorCode::RulePeriodic => "RULE_006",
            ErrorCode::RuleNotAllowed => "RULE_007",
            ErrorCode::RuleUnknownName => "RULE_008",
            ErrorCode::RuleParameter => "RULE_009",
            ErrorCode::RuleDeprecated => "RULE_010",
            ErrorCode::EvalMissingContext => "EVAL_001",
            ErrorCode::EvalNotNumeric => "EVAL_002",
            ErrorCode::EvalUnknownVariable => "EVAL_003",
            ErrorCode::EvalInvalidRegex => "EVAL_004",
            ErrorCode::EvalFailed => "EVAL_005",
            ErrorCode::EffectFailed => "EFF_001",
            ErrorCode::EffectNotFound => "EFF_002",
        }
    }
}

impl WardenError {
    /// Create an invalid rule error with an explicit code.
    pub fn invalid_rule(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            message: message.into(),
            code,
        }
    }

    /// Create an invalid rule error for a structurally malformed source.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::invalid_rule(ErrorCode::RuleMalformed, message)
    }

    /// Create an evaluation error with an explicit code.
    pub fn evaluation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
            code,
        }
    }

    /// Create an evaluation error for data the context should have carried.
    pub fn missing_context(what: &str, item: &str) -> Self {
        Self::evaluation(
            ErrorCode::EvalMissingContext,
            format!("`{item}` needs a {what} but none was supplied"),
        )
    }

    /// Create an effect error.
    pub fn effect(message: impl Into<String>) -> Self {
        Self::Effect {
            message: message.into(),
            code: ErrorCode::EffectFailed,
            source: None,
        }
    }

    /// Create an effect error wrapping the host's own error.
    pub fn effect_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Effect {
            message: message.into(),
            code: ErrorCode::EffectFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create an effect error for a recipient/target the host could not find.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Effect {
            message: message.into(),
            code: ErrorCode::EffectNotFound,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::InvalidRule { code, .. } => Some(*code),
            Self::Evaluation { code, .. } => Some(*code),
            Self::Effect { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is a parse/validation failure.
    pub fn is_invalid_rule(&self) -> bool {
        matches!(self, Self::InvalidRule { .. })
    }

    /// Whether this is a runtime evaluation failure.
    pub fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation { .. })
    }
}
