//! The validator pipeline.
//!
//! Per visible field, in fixed order: requiredness, coercion, intrinsic
//! checks, base validator rules. The first failure stops that field; sibling
//! fields always continue independently, so the result addresses every
//! failing field at once. Submission failures are data, never errors.

use std::fmt;

use dynaform_fields::Presence;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::form::{Form, ValueMap};
use crate::presets::check_preset;

/// Stable, client-addressable error code for one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// Field is required for this submission and no value was supplied.
    MissingRequired,
    /// Raw value could not be coerced to the field's type; no rule checks
    /// were attempted.
    InvalidType,
    /// A validator rule or intrinsic type check failed; carries the rule
    /// name.
    RuleViolation(String),
    /// A form-level preset check failed; carries the preset name.
    Preset(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::MissingRequired => f.write_str("missing_required"),
            ErrorCode::InvalidType => f.write_str("invalid_type"),
            ErrorCode::RuleViolation(rule) => write!(f, "rule_violation:{rule}"),
            ErrorCode::Preset(name) => write!(f, "preset:{name}"),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One failure on one field (or on the form, for presets).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The aggregated outcome of validating one submission.
///
/// `valid` is true iff no field and no form-level error was recorded. Hidden
/// fields (by presence or by access) appear in neither map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Normalized values for fields that passed, in field definition order.
    pub values: IndexMap<String, Value>,
    /// Failures keyed by field slug.
    pub errors: IndexMap<String, Vec<FieldError>>,
    /// Form-level preset failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub form_errors: Vec<FieldError>,
}

impl Form {
    /// Validate a submitted payload for a caller role.
    ///
    /// Pure and request-scoped: the same (form, payload, role) triple always
    /// yields the same result, and concurrent calls share the form freely.
    pub fn validate(&self, payload: &ValueMap, role: Option<&str>) -> ValidationResult {
        let access = self.effective_access(role);

        // Effective raw submission. Only fields the caller may edit take the
        // submitted value; everything else falls back to the stored default,
        // silently — read-only clients may echo values back without tripping
        // errors. Presence below reads this map, so conditions see exactly
        // the values that will be validated.
        let mut raw: ValueMap = ValueMap::new();
        for field in self.fields() {
            let capability = access[&field.slug];
            let value = if capability.visible && capability.editable {
                payload.get(&field.slug).cloned()
            } else {
                if payload.contains_key(&field.slug) {
                    tracing::debug!(field = %field.slug, "discarding submitted value for non-editable field");
                }
                field.default.clone()
            };
            if let Some(value) = value {
                if !value.is_null() {
                    raw.insert(field.slug.clone(), value);
                }
            }
        }

        let presence = self.resolve_presence(&raw);

        let mut values = IndexMap::new();
        let mut errors: IndexMap<String, Vec<FieldError>> = IndexMap::new();

        for field in self.fields() {
            if !access[&field.slug].visible || presence[&field.slug] == Presence::Hidden {
                continue;
            }
            let handler = self.handler(&field.slug);
            match raw.get(&field.slug) {
                None => {
                    if presence[&field.slug] == Presence::Required {
                        errors.insert(
                            field.slug.clone(),
                            vec![FieldError::new(
                                ErrorCode::MissingRequired,
                                format!("required field '{}' is missing", field.slug),
                            )],
                        );
                    } else if let Some(default) = &field.default {
                        // Load-time checks guarantee defaults coerce.
                        if let Ok(normalized) = handler.coerce(default, field) {
                            values.insert(field.slug.clone(), normalized);
                        }
                    }
                }
                Some(raw_value) => match handler.coerce(raw_value, field) {
                    Err(coercion) => {
                        errors.insert(
                            field.slug.clone(),
                            vec![FieldError::new(ErrorCode::InvalidType, coercion.message)],
                        );
                    }
                    Ok(normalized) => {
                        let violation = handler.check(&normalized, field).err().or_else(|| {
                            field
                                .validations
                                .iter()
                                .find_map(|rule| handler.validate(&normalized, rule, field).err())
                        });
                        match violation {
                            Some(violation) => {
                                errors.insert(
                                    field.slug.clone(),
                                    vec![FieldError::new(
                                        ErrorCode::RuleViolation(violation.rule),
                                        violation.message,
                                    )],
                                );
                            }
                            None => {
                                values.insert(field.slug.clone(), normalized);
                            }
                        }
                    }
                },
            }
        }

        let form_errors: Vec<FieldError> = self
            .definition()
            .presets
            .iter()
            .filter_map(|preset| check_preset(preset, &values))
            .collect();

        let valid = errors.is_empty() && form_errors.is_empty();
        tracing::debug!(
            form = %self.id(),
            valid,
            failing_fields = errors.len(),
            "validated submission"
        );
        ValidationResult {
            valid,
            values,
            errors,
            form_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FormDefinition;
    use dynaform_fields::FieldTypeRegistry;
    use serde_json::json;

    fn load(doc: Value) -> Form {
        let definition: FormDefinition = serde_json::from_value(doc).unwrap();
        Form::load(definition, &FieldTypeRegistry::with_defaults()).unwrap()
    }

    fn payload(pairs: &[(&str, Value)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn age_form() -> Form {
        load(json!({
            "id": "profile",
            "fields": [
                {"slug": "age", "type": "number",
                 "validations": [{"rule": "max", "value": 120}]},
            ],
        }))
    }

    #[test]
    fn coercion_failure_skips_rule_checks() {
        let result = age_form().validate(&payload(&[("age", json!("abc"))]), None);
        assert!(!result.valid);
        let errs = &result.errors["age"];
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::InvalidType);
    }

    #[test]
    fn rule_violation_names_the_rule() {
        let result = age_form().validate(&payload(&[("age", json!(200))]), None);
        assert_eq!(
            result.errors["age"][0].code,
            ErrorCode::RuleViolation("max".into())
        );
        assert_eq!(result.errors["age"][0].code.to_string(), "rule_violation:max");
    }

    #[test]
    fn success_stores_normalized_value() {
        let result = age_form().validate(&payload(&[("age", json!(30))]), None);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.values["age"], json!(30));
    }

    #[test]
    fn numeric_string_normalizes_to_number() {
        let result = age_form().validate(&payload(&[("age", json!("30"))]), None);
        assert!(result.valid);
        assert_eq!(result.values["age"], json!(30));
    }

    #[test]
    fn optional_absent_field_takes_default() {
        let form = load(json!({
            "id": "f",
            "fields": [
                {"slug": "country", "type": "text", "default": "CH"},
                {"slug": "nickname", "type": "text"},
            ],
        }));
        let result = form.validate(&payload(&[]), None);
        assert!(result.valid);
        assert_eq!(result.values["country"], json!("CH"));
        assert!(!result.values.contains_key("nickname"));
    }

    #[test]
    fn sibling_fields_fail_independently() {
        let form = load(json!({
            "id": "f",
            "fields": [
                {"slug": "a", "type": "number", "presence": "required"},
                {"slug": "b", "type": "number"},
                {"slug": "c", "type": "text"},
            ],
        }));
        let result = form.validate(&payload(&[("b", json!("nope")), ("c", json!("fine"))]), None);
        assert!(!result.valid);
        assert_eq!(result.errors["a"][0].code, ErrorCode::MissingRequired);
        assert_eq!(result.errors["b"][0].code, ErrorCode::InvalidType);
        assert_eq!(result.values["c"], json!("fine"));
    }

    #[test]
    fn error_codes_serialize_as_flat_strings() {
        let codes = vec![
            ErrorCode::MissingRequired,
            ErrorCode::InvalidType,
            ErrorCode::RuleViolation("max_length".into()),
            ErrorCode::Preset("confirmation".into()),
        ];
        assert_eq!(
            serde_json::to_value(&codes).unwrap(),
            json!([
                "missing_required",
                "invalid_type",
                "rule_violation:max_length",
                "preset:confirmation"
            ])
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let form = age_form();
        let body = payload(&[("age", json!(200))]);
        assert_eq!(form.validate(&body, None), form.validate(&body, None));
    }
}
