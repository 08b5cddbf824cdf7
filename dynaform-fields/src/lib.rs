//! Field definitions and the field type registry
//!
//! `dynaform-fields` owns the schema side of a single form field: its slug,
//! type tag, base validator rules, default presence, and default value. The
//! behavioral side lives behind the [`FieldType`] trait — a `{coerce,
//! validate}` capability pair resolved through a [`FieldTypeRegistry`], so new
//! field types register without touching the validation pipeline.
//!
//! Coercion failures ([`CoercionError`]) are distinct from rule failures
//! ([`RuleViolation`]): a value that cannot be coerced is never rule-checked,
//! since a non-numeric string has no range to validate.

pub mod error;
pub mod registry;
pub mod types;

pub use error::{CoercionError, FieldsError, Result, RuleViolation};
pub use registry::{FieldType, FieldTypeRegistry};
pub use types::{ChoiceOption, FieldDef, Presence, ValidatorRule};
