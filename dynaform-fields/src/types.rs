//! Core field definition types.
//!
//! All types serialize to/from JSON via serde. A [`FieldDef`] describes one
//! named, typed attribute of a form; the form definition owns an ordered
//! sequence of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a field must, may, or must not be filled for a submission.
///
/// Every field resolves to exactly one of these per submission: the default
/// recorded here, possibly overridden by the first matching presence rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Presence {
    Required,
    #[default]
    Optional,
    Hidden,
}

/// A single selectable item of a choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A base validator attached to a field, applied in definition order.
///
/// The serde `rule` tag doubles as the stable name surfaced in
/// `rule_violation:<name>` error codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidatorRule {
    MinLength { value: usize },
    MaxLength { value: usize },
    Regex { pattern: String },
    Min { value: f64 },
    Max { value: f64 },
    After { value: NaiveDate },
    Before { value: NaiveDate },
}

impl ValidatorRule {
    /// Stable rule name used in error codes.
    pub fn name(&self) -> &'static str {
        match self {
            ValidatorRule::MinLength { .. } => "min_length",
            ValidatorRule::MaxLength { .. } => "max_length",
            ValidatorRule::Regex { .. } => "regex",
            ValidatorRule::Min { .. } => "min",
            ValidatorRule::Max { .. } => "max",
            ValidatorRule::After { .. } => "after",
            ValidatorRule::Before { .. } => "before",
        }
    }
}

/// A field definition — the complete schema for a single named attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Unique within the owning form definition.
    pub slug: String,
    /// Tag resolved through the [`crate::FieldTypeRegistry`] at load time.
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Selectable items for choice fields; empty for other types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    /// Choice fields only: accept a list of selections instead of one.
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidatorRule>,
    /// Default presence, before any presence rule fires.
    #[serde(default)]
    pub presence: Presence,
    /// Stored default value, used for optional absences and for values
    /// submitted by callers without the editable capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    /// A minimal field with everything else defaulted.
    pub fn new(slug: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            type_tag: type_tag.into(),
            label: None,
            description: None,
            options: Vec::new(),
            multiple: false,
            validations: Vec::new(),
            presence: Presence::default(),
            default: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_validations(mut self, validations: Vec<ValidatorRule>) -> Self {
        self.validations = validations;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// True if `value` is one of the declared options.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}
