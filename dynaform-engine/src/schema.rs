//! Role-filtered schema export.
//!
//! Produces the client-facing description of a form: what a caller with a
//! given role may see, with presence resolved against a partial submission
//! state. Fields the role cannot see and fields hidden by presence are
//! omitted entirely — a client can never learn of a field it may not see.

use dynaform_fields::{ChoiceOption, Presence, ValidatorRule};
use serde::Serialize;
use serde_json::Value;

use crate::form::{Form, ValueMap};

/// One exported field as a client sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub slug: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidatorRule>,
    /// Resolved for the given submission state, never `hidden`.
    pub presence: Presence,
    /// Whether the caller role may supply a value for this field.
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// The exported form: identity plus the visible fields, in definition order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldSchema>,
}

impl Form {
    /// Export the form as seen by a caller role, with presence resolved
    /// against `partial` (an empty map for a fresh form).
    pub fn export_schema(&self, role: Option<&str>, partial: &ValueMap) -> FormSchema {
        let access = self.effective_access(role);
        let presence = self.resolve_presence(partial);

        let fields = self
            .fields()
            .filter(|field| access[&field.slug].visible)
            .filter(|field| presence[&field.slug] != Presence::Hidden)
            .map(|field| FieldSchema {
                slug: field.slug.clone(),
                type_tag: field.type_tag.clone(),
                label: field.label.clone(),
                description: field.description.clone(),
                options: field.options.clone(),
                multiple: field.multiple,
                validations: field.validations.clone(),
                presence: presence[&field.slug],
                editable: access[&field.slug].editable,
                default: field.default.clone(),
            })
            .collect();

        FormSchema {
            id: self.id().to_string(),
            label: self.definition().label.clone(),
            description: self.definition().description.clone(),
            fields,
        }
    }
}
