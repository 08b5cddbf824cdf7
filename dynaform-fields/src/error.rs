//! Error types for field definitions and the type registry

use thiserror::Error;

/// Result type for field registry operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors from registry lookups and registration
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Type tag has no registered handler
    #[error("unknown field type: {tag}")]
    UnknownFieldType { tag: String },
}

/// A raw value could not be converted to the field's normalized shape.
///
/// Reported to callers as the `invalid_type` error code; short-circuits all
/// rule checks on the field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct CoercionError {
    pub message: String,
}

impl CoercionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A normalized value failed a validator rule or an intrinsic type check.
///
/// Reported to callers as `rule_violation:<rule>`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RuleViolation {
    /// Stable rule name used in the error code (`max_length`, `choice`, ...).
    pub rule: String,
    pub message: String,
}

impl RuleViolation {
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
        }
    }
}
