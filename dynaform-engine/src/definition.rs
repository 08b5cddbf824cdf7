//! The form definition document.
//!
//! Everything here is plain serde data, shaped so a JSON document from the
//! persistence collaborator deserializes straight into the model. Ordering is
//! semantic: fields, presence rules, and validations apply in document order,
//! never in the iteration order of some unordered container.

use dynaform_conditions::Condition;
use dynaform_fields::{FieldDef, Presence};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One conditional presence override.
///
/// Many rules may target the same field; the first whose condition holds
/// wins, in definition order, and the field's default presence applies when
/// none match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRule {
    /// Slug of the field whose presence this rule governs.
    pub field: String,
    /// Condition over *other* fields' raw values.
    pub when: Condition,
    /// Presence state the field takes when the condition holds.
    pub then: Presence,
}

/// A capability granted to a role on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// The field appears in schema exports and validation results.
    Visible,
    /// Caller-submitted values are honored; without this the stored default
    /// is validated instead.
    Editable,
}

/// Grants a role an explicit capability set on one field.
///
/// Capabilities not listed are denied. Fields with no rule for a role fall
/// back to the form's [`AccessDefaults`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRule {
    pub role: String,
    pub field: String,
    pub capabilities: Vec<Capability>,
}

impl AccessRule {
    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Form-level access defaults for (role, field) pairs with no explicit rule.
/// Deployment-configurable; out of the box every authenticated role sees and
/// edits everything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessDefaults {
    pub visible: bool,
    pub editable: bool,
}

impl Default for AccessDefaults {
    fn default() -> Self {
        Self {
            visible: true,
            editable: true,
        }
    }
}

/// Right-hand side of a confirmation preset: another field or a fixed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetTarget {
    Field { field: String },
    Value { value: Value },
}

/// Ordering operator for comparison presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A form-level cross-field check, run over normalized values after the
/// per-field pipeline. Failures are form-level `preset:<name>` errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum Preset {
    /// One field must match another field's value or a fixed value
    /// (password/confirmation style).
    Confirmation {
        field: String,
        matches: PresetTarget,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Two fields must satisfy an ordering.
    Comparison {
        left: String,
        operator: PresetOp,
        right: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Preset {
    /// Stable name used in `preset:<name>` error codes.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::Confirmation { .. } => "confirmation",
            Preset::Comparison { .. } => "comparison",
        }
    }

    /// Field slugs this preset reads, for definition-time cohesion checks.
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Preset::Confirmation { field, matches, .. } => {
                let mut slugs = vec![field.as_str()];
                if let PresetTarget::Field { field } = matches {
                    slugs.push(field);
                }
                slugs
            }
            Preset::Comparison { left, right, .. } => vec![left, right],
        }
    }
}

/// The complete description of a dynamic form: identifier, ordered fields,
/// ordered presence rules, access policy, and form-level presets.
///
/// Immutable once validation begins for a submission; definitions may change
/// between submissions, never mid-evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PresenceRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accesses: Vec<AccessRule>,
    #[serde(default)]
    pub access_defaults: AccessDefaults,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<Preset>,
}
