//! The field type registry and its built-in types.
//!
//! Each field type implements the [`FieldType`] capability pair: `coerce` a
//! raw submitted value into the normalized shape, then `validate` it against
//! base rules. The registry maps type tags to handlers; the pipeline resolves
//! handlers once at definition load and never inspects types afterwards.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::error::{CoercionError, FieldsError, Result, RuleViolation};
use crate::types::{FieldDef, ValidatorRule};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The polymorphic contract of a field type.
///
/// Implementations are stateless and shared; all per-field data comes in
/// through the `FieldDef`.
pub trait FieldType: Send + Sync {
    /// Registry tag this handler answers to.
    fn tag(&self) -> &'static str;

    /// Convert a raw submitted value into the normalized representation.
    fn coerce(&self, raw: &Value, field: &FieldDef) -> std::result::Result<Value, CoercionError>;

    /// Intrinsic checks that apply to every field of this type, run after
    /// coercion and before base validator rules (choice membership, email
    /// format).
    fn check(&self, _normalized: &Value, _field: &FieldDef) -> std::result::Result<(), RuleViolation> {
        Ok(())
    }

    /// Apply one base validator rule to a normalized value.
    fn validate(
        &self,
        normalized: &Value,
        rule: &ValidatorRule,
        field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation>;

    /// Whether this type knows how to apply the given rule. Checked at
    /// definition load so a misattached rule is rejected before any
    /// submission is processed.
    fn supports_rule(&self, rule: &ValidatorRule) -> bool;

    /// Whether ordering comparisons (`greater-than`/`less-than`) make sense
    /// for values of this type.
    fn orderable(&self) -> bool {
        false
    }

    /// Whether a condition literal is comparable with values of this type.
    /// Checked at definition load; a mismatch is a definition error, never a
    /// silent false at evaluation time.
    fn literal_compatible(&self, literal: &Value) -> bool;
}

impl std::fmt::Debug for dyn FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldType").field("tag", &self.tag()).finish()
    }
}

/// Maps type tags to handlers. Cloning is cheap; handlers are shared `Arc`s.
#[derive(Clone, Default)]
pub struct FieldTypeRegistry {
    handlers: HashMap<&'static str, Arc<dyn FieldType>>,
}

impl FieldTypeRegistry {
    /// An empty registry. Most callers want [`FieldTypeRegistry::with_defaults`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in type registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextType { tag: "text" }));
        registry.register(Arc::new(TextType { tag: "paragraph" }));
        registry.register(Arc::new(EmailType));
        registry.register(Arc::new(NumberType));
        registry.register(Arc::new(BooleanType));
        registry.register(Arc::new(ChoiceType));
        registry.register(Arc::new(DateType));
        registry.register(Arc::new(FileReferenceType));
        registry
    }

    /// Register a handler, replacing any previous one for the same tag.
    /// Replacement is how deployments override a built-in.
    pub fn register(&mut self, handler: Arc<dyn FieldType>) {
        tracing::debug!(tag = handler.tag(), "registering field type");
        self.handlers.insert(handler.tag(), handler);
    }

    /// Resolve a tag to its handler.
    pub fn get(&self, tag: &str) -> Result<Arc<dyn FieldType>> {
        self.handlers
            .get(tag)
            .cloned()
            .ok_or_else(|| FieldsError::UnknownFieldType { tag: tag.into() })
    }

    /// Registered tags, unordered.
    pub fn tags(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

/// Shared string rule checks for the text-like types. Length counts chars,
/// not bytes.
fn validate_string_rule(
    text: &str,
    rule: &ValidatorRule,
) -> std::result::Result<(), RuleViolation> {
    let len = text.chars().count();
    match rule {
        ValidatorRule::MinLength { value } => {
            if len < *value {
                return Err(RuleViolation::new(
                    rule.name(),
                    format!("must be at least {value} characters long (got: {len})"),
                ));
            }
        }
        ValidatorRule::MaxLength { value } => {
            if len > *value {
                return Err(RuleViolation::new(
                    rule.name(),
                    format!("must be at most {value} characters long (got: {len})"),
                ));
            }
        }
        ValidatorRule::Regex { pattern } => {
            // Pattern validity is checked at definition load.
            if let Ok(regex) = Regex::new(pattern) {
                if !regex.is_match(text) {
                    return Err(RuleViolation::new(
                        rule.name(),
                        format!("value does not match required pattern '{pattern}'"),
                    ));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn expect_string(raw: &Value, tag: &str) -> std::result::Result<String, CoercionError> {
    raw.as_str().map(str::to_owned).ok_or_else(|| {
        CoercionError::new(format!(
            "{tag} field expects a string, got {}",
            value_type_name(raw)
        ))
    })
}

/// Single- and multi-line text. Two registrations share this handler, one
/// per tag, mirroring the original system's text/paragraph split.
pub struct TextType {
    tag: &'static str,
}

impl FieldType for TextType {
    fn tag(&self) -> &'static str {
        self.tag
    }

    fn coerce(&self, raw: &Value, _field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        expect_string(raw, self.tag).map(Value::String)
    }

    fn validate(
        &self,
        normalized: &Value,
        rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        validate_string_rule(normalized.as_str().unwrap_or_default(), rule)
    }

    fn supports_rule(&self, rule: &ValidatorRule) -> bool {
        matches!(
            rule,
            ValidatorRule::MinLength { .. }
                | ValidatorRule::MaxLength { .. }
                | ValidatorRule::Regex { .. }
        )
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.is_string()
    }
}

/// Text with an intrinsic email format check.
pub struct EmailType;

impl FieldType for EmailType {
    fn tag(&self) -> &'static str {
        "email"
    }

    fn coerce(&self, raw: &Value, _field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        expect_string(raw, "email").map(Value::String)
    }

    fn check(&self, normalized: &Value, _field: &FieldDef) -> std::result::Result<(), RuleViolation> {
        let text = normalized.as_str().unwrap_or_default();
        if !EMAIL_RE.is_match(text) {
            return Err(RuleViolation::new(
                "email",
                format!("'{text}' is not a valid email address"),
            ));
        }
        Ok(())
    }

    fn validate(
        &self,
        normalized: &Value,
        rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        validate_string_rule(normalized.as_str().unwrap_or_default(), rule)
    }

    fn supports_rule(&self, rule: &ValidatorRule) -> bool {
        matches!(
            rule,
            ValidatorRule::MinLength { .. } | ValidatorRule::MaxLength { .. }
        )
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.is_string()
    }
}

/// Numbers. Accepts JSON numbers and numeric strings; normalizes strings to
/// JSON numbers, keeping integral values integral.
pub struct NumberType;

impl FieldType for NumberType {
    fn tag(&self) -> &'static str {
        "number"
    }

    fn coerce(&self, raw: &Value, _field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        match raw {
            Value::Number(_) => Ok(raw.clone()),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(int) = trimmed.parse::<i64>() {
                    return Ok(Value::from(int));
                }
                if let Ok(float) = trimmed.parse::<f64>() {
                    if let Some(number) = serde_json::Number::from_f64(float) {
                        return Ok(Value::Number(number));
                    }
                }
                Err(CoercionError::new(format!("'{s}' is not a number")))
            }
            other => Err(CoercionError::new(format!(
                "number field expects a number, got {}",
                value_type_name(other)
            ))),
        }
    }

    fn validate(
        &self,
        normalized: &Value,
        rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        let number = normalized.as_f64().unwrap_or_default();
        match rule {
            ValidatorRule::Min { value } => {
                if number < *value {
                    return Err(RuleViolation::new(
                        rule.name(),
                        format!("value {number} is below the minimum {value}"),
                    ));
                }
            }
            ValidatorRule::Max { value } => {
                if number > *value {
                    return Err(RuleViolation::new(
                        rule.name(),
                        format!("value {number} is above the maximum {value}"),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn supports_rule(&self, rule: &ValidatorRule) -> bool {
        matches!(rule, ValidatorRule::Min { .. } | ValidatorRule::Max { .. })
    }

    fn orderable(&self) -> bool {
        true
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.is_number()
    }
}

/// Booleans. Accepts JSON booleans plus `"true"`/`"false"` strings.
pub struct BooleanType;

impl FieldType for BooleanType {
    fn tag(&self) -> &'static str {
        "boolean"
    }

    fn coerce(&self, raw: &Value, _field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        match raw {
            Value::Bool(_) => Ok(raw.clone()),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(CoercionError::new(format!(
                "boolean field expects true or false, got {}",
                value_type_name(other)
            ))),
        }
    }

    fn validate(
        &self,
        _normalized: &Value,
        _rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        Ok(())
    }

    fn supports_rule(&self, _rule: &ValidatorRule) -> bool {
        false
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.is_boolean()
    }
}

/// Single or multiple selection from the field's declared options.
/// Membership is an intrinsic check, not a base rule.
pub struct ChoiceType;

impl FieldType for ChoiceType {
    fn tag(&self) -> &'static str {
        "choice"
    }

    fn coerce(&self, raw: &Value, field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        if field.multiple {
            let items = raw.as_array().ok_or_else(|| {
                CoercionError::new(format!(
                    "multiple choice field expects an array, got {}",
                    value_type_name(raw)
                ))
            })?;
            for item in items {
                if !item.is_string() {
                    return Err(CoercionError::new(format!(
                        "multiple choice selections must be strings, got {}",
                        value_type_name(item)
                    )));
                }
            }
            Ok(raw.clone())
        } else {
            expect_string(raw, "choice").map(Value::String)
        }
    }

    fn check(&self, normalized: &Value, field: &FieldDef) -> std::result::Result<(), RuleViolation> {
        let selections: Vec<&str> = match normalized {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            other => other.as_str().into_iter().collect(),
        };
        for selection in selections {
            if !field.has_option(selection) {
                let choices: Vec<&str> = field.options.iter().map(|o| o.value.as_str()).collect();
                return Err(RuleViolation::new(
                    "choice",
                    format!("'{selection}' is not in allowed choices: {choices:?}"),
                ));
            }
        }
        Ok(())
    }

    fn validate(
        &self,
        _normalized: &Value,
        _rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        Ok(())
    }

    fn supports_rule(&self, _rule: &ValidatorRule) -> bool {
        false
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.is_string()
    }
}

/// ISO `YYYY-MM-DD` dates, normalized back to the same string form so the
/// lexicographic ordering used by condition evaluation stays correct.
pub struct DateType;

impl DateType {
    fn parse(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
    }
}

impl FieldType for DateType {
    fn tag(&self) -> &'static str {
        "date"
    }

    fn coerce(&self, raw: &Value, _field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        let text = expect_string(raw, "date")?;
        let date = Self::parse(&text)
            .ok_or_else(|| CoercionError::new(format!("'{text}' is not a YYYY-MM-DD date")))?;
        Ok(Value::String(date.format(DATE_FORMAT).to_string()))
    }

    fn validate(
        &self,
        normalized: &Value,
        rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        let Some(date) = normalized.as_str().and_then(Self::parse) else {
            return Ok(());
        };
        match rule {
            ValidatorRule::After { value } => {
                if date <= *value {
                    return Err(RuleViolation::new(
                        rule.name(),
                        format!("date {date} must be after {value}"),
                    ));
                }
            }
            ValidatorRule::Before { value } => {
                if date >= *value {
                    return Err(RuleViolation::new(
                        rule.name(),
                        format!("date {date} must be before {value}"),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn supports_rule(&self, rule: &ValidatorRule) -> bool {
        matches!(
            rule,
            ValidatorRule::After { .. } | ValidatorRule::Before { .. }
        )
    }

    fn orderable(&self) -> bool {
        true
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.as_str().and_then(Self::parse).is_some()
    }
}

/// An opaque reference to an uploaded file, issued by the storage
/// collaborator. The core only requires a non-empty token.
pub struct FileReferenceType;

impl FieldType for FileReferenceType {
    fn tag(&self) -> &'static str {
        "file-reference"
    }

    fn coerce(&self, raw: &Value, _field: &FieldDef) -> std::result::Result<Value, CoercionError> {
        let token = expect_string(raw, "file-reference")?;
        if token.is_empty() {
            return Err(CoercionError::new("file reference must not be empty"));
        }
        Ok(Value::String(token))
    }

    fn validate(
        &self,
        _normalized: &Value,
        _rule: &ValidatorRule,
        _field: &FieldDef,
    ) -> std::result::Result<(), RuleViolation> {
        Ok(())
    }

    fn supports_rule(&self, _rule: &ValidatorRule) -> bool {
        false
    }

    fn literal_compatible(&self, literal: &Value) -> bool {
        literal.is_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChoiceOption;
    use serde_json::json;

    fn registry() -> FieldTypeRegistry {
        FieldTypeRegistry::with_defaults()
    }

    #[test]
    fn defaults_cover_all_builtin_tags() {
        let registry = registry();
        for tag in [
            "text",
            "paragraph",
            "email",
            "number",
            "boolean",
            "choice",
            "date",
            "file-reference",
        ] {
            assert!(registry.get(tag).is_ok(), "missing built-in: {tag}");
        }
    }

    #[test]
    fn unknown_tag_errors() {
        let err = registry().get("telepathy").unwrap_err();
        assert!(matches!(err, FieldsError::UnknownFieldType { tag } if tag == "telepathy"));
    }

    #[test]
    fn registering_replaces_existing_tag() {
        struct LooseNumber;
        impl FieldType for LooseNumber {
            fn tag(&self) -> &'static str {
                "number"
            }
            fn coerce(
                &self,
                _raw: &Value,
                _field: &FieldDef,
            ) -> std::result::Result<Value, CoercionError> {
                Ok(json!(0))
            }
            fn validate(
                &self,
                _normalized: &Value,
                _rule: &ValidatorRule,
                _field: &FieldDef,
            ) -> std::result::Result<(), RuleViolation> {
                Ok(())
            }
            fn supports_rule(&self, _rule: &ValidatorRule) -> bool {
                false
            }
            fn literal_compatible(&self, _literal: &Value) -> bool {
                true
            }
        }

        let mut registry = registry();
        registry.register(Arc::new(LooseNumber));
        let handler = registry.get("number").unwrap();
        let field = FieldDef::new("n", "number");
        assert_eq!(handler.coerce(&json!("anything"), &field).unwrap(), json!(0));
    }

    #[test]
    fn number_coerces_numeric_strings() {
        let handler = registry().get("number").unwrap();
        let field = FieldDef::new("age", "number");
        assert_eq!(handler.coerce(&json!("200"), &field).unwrap(), json!(200));
        assert_eq!(handler.coerce(&json!("2.5"), &field).unwrap(), json!(2.5));
        assert_eq!(handler.coerce(&json!(30), &field).unwrap(), json!(30));
        assert!(handler.coerce(&json!("abc"), &field).is_err());
        assert!(handler.coerce(&json!(true), &field).is_err());
    }

    #[test]
    fn number_range_rules() {
        let handler = registry().get("number").unwrap();
        let field = FieldDef::new("age", "number");
        let max = ValidatorRule::Max { value: 120.0 };
        assert!(handler.validate(&json!(30), &max, &field).is_ok());
        let violation = handler.validate(&json!(200), &max, &field).unwrap_err();
        assert_eq!(violation.rule, "max");
    }

    #[test]
    fn boolean_accepts_string_forms() {
        let handler = registry().get("boolean").unwrap();
        let field = FieldDef::new("flag", "boolean");
        assert_eq!(handler.coerce(&json!(true), &field).unwrap(), json!(true));
        assert_eq!(handler.coerce(&json!("True"), &field).unwrap(), json!(true));
        assert_eq!(
            handler.coerce(&json!("false"), &field).unwrap(),
            json!(false)
        );
        assert!(handler.coerce(&json!(1), &field).is_err());
    }

    #[test]
    fn text_length_and_pattern_rules() {
        let handler = registry().get("text").unwrap();
        let field = FieldDef::new("name", "text");
        let max = ValidatorRule::MaxLength { value: 5 };
        assert!(handler.validate(&json!("abc"), &max, &field).is_ok());
        let violation = handler
            .validate(&json!("abcdef"), &max, &field)
            .unwrap_err();
        assert_eq!(violation.rule, "max_length");

        let pattern = ValidatorRule::Regex {
            pattern: "^[a-z]+$".into(),
        };
        assert!(handler.validate(&json!("abc"), &pattern, &field).is_ok());
        assert!(handler.validate(&json!("ABC"), &pattern, &field).is_err());
    }

    #[test]
    fn text_length_counts_chars_not_bytes() {
        let handler = registry().get("text").unwrap();
        let field = FieldDef::new("name", "text");
        let max = ValidatorRule::MaxLength { value: 4 };
        // Four chars, more than four bytes.
        assert!(handler.validate(&json!("éçàö"), &max, &field).is_ok());
    }

    #[test]
    fn email_intrinsic_check() {
        let handler = registry().get("email").unwrap();
        let field = FieldDef::new("contact", "email");
        assert!(handler.check(&json!("user@example.com"), &field).is_ok());
        let violation = handler.check(&json!("not-an-email"), &field).unwrap_err();
        assert_eq!(violation.rule, "email");
    }

    #[test]
    fn choice_membership_single_and_multiple() {
        let handler = registry().get("choice").unwrap();
        let field = FieldDef::new("env", "choice").with_options(vec![
            ChoiceOption {
                value: "dev".into(),
                label: None,
            },
            ChoiceOption {
                value: "prod".into(),
                label: None,
            },
        ]);
        assert!(handler.check(&json!("dev"), &field).is_ok());
        let violation = handler.check(&json!("staging"), &field).unwrap_err();
        assert_eq!(violation.rule, "choice");

        let multi = field.clone().multiple(true);
        assert!(handler
            .coerce(&json!(["dev", "prod"]), &multi)
            .is_ok_and(|v| v == json!(["dev", "prod"])));
        assert!(handler.coerce(&json!("dev"), &multi).is_err());
        assert!(handler.check(&json!(["dev", "staging"]), &multi).is_err());
    }

    #[test]
    fn date_coercion_and_bounds() {
        let handler = registry().get("date").unwrap();
        let field = FieldDef::new("start", "date");
        assert_eq!(
            handler.coerce(&json!("2026-03-01"), &field).unwrap(),
            json!("2026-03-01")
        );
        assert!(handler.coerce(&json!("03/01/2026"), &field).is_err());
        assert!(handler.coerce(&json!(20260301), &field).is_err());

        let after = ValidatorRule::After {
            value: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };
        assert!(handler
            .validate(&json!("2026-03-01"), &after, &field)
            .is_ok());
        let violation = handler
            .validate(&json!("2025-12-31"), &after, &field)
            .unwrap_err();
        assert_eq!(violation.rule, "after");
    }

    #[test]
    fn file_reference_requires_non_empty_token() {
        let handler = registry().get("file-reference").unwrap();
        let field = FieldDef::new("attachment", "file-reference");
        assert!(handler.coerce(&json!("blob:1234"), &field).is_ok());
        assert!(handler.coerce(&json!(""), &field).is_err());
        assert!(handler.coerce(&json!(42), &field).is_err());
    }
}
