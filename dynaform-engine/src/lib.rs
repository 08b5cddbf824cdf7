//! The dynamic form validation engine
//!
//! A [`FormDefinition`] is data: typed fields, per-field validator rules,
//! conditional presence rules, and per-role access rules, all built at
//! runtime from a JSON-shaped document. [`Form::load`] validates the
//! definition once (reject-at-write: duplicate slugs, unknown type tags,
//! dangling condition references, incompatible comparisons, presence
//! dependency cycles) and caches the resolved type handlers; the loaded form
//! then validates any number of submitted payloads.
//!
//! Validation is synchronous and request-scoped. A `Form` is an immutable
//! snapshot — concurrent validations share it freely with no coordination.
//!
//! ```
//! use dynaform_engine::{Form, FormDefinition};
//! use dynaform_fields::FieldTypeRegistry;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! let definition: FormDefinition = serde_json::from_value(json!({
//!     "id": "profile",
//!     "fields": [
//!         {"slug": "age", "type": "number", "presence": "required",
//!          "validations": [{"rule": "max", "value": 120}]},
//!     ],
//! })).unwrap();
//! let form = Form::load(definition, &FieldTypeRegistry::with_defaults()).unwrap();
//!
//! let payload: HashMap<_, _> = [("age".to_string(), json!(30))].into();
//! let result = form.validate(&payload, None);
//! assert!(result.valid);
//! assert_eq!(result.values["age"], json!(30));
//! ```

pub mod access;
pub mod definition;
pub mod error;
pub mod form;
pub mod pipeline;
pub mod presence;
pub mod presets;
pub mod schema;

pub use access::Access;
pub use definition::{
    AccessDefaults, AccessRule, Capability, FormDefinition, Preset, PresetOp, PresetTarget,
    PresenceRule,
};
pub use error::{DefinitionError, Result};
pub use form::Form;
pub use pipeline::{ErrorCode, FieldError, ValidationResult};
pub use schema::{FieldSchema, FormSchema};
