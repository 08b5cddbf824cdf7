//! The presence rule engine.
//!
//! Per-field state machine over {required, optional, hidden}. The engine is
//! single-step: a field's presence may depend on other fields' raw *values*,
//! never on their computed presence, so the full raw submission decides every
//! field independently and evaluation order cannot matter.

use dynaform_conditions::evaluate;
use dynaform_fields::Presence;
use indexmap::IndexMap;

use crate::form::{Form, ValueMap};

impl Form {
    /// Compute every field's presence for a submission state.
    ///
    /// For each field: iterate its presence rules in definition order, take
    /// the first whose condition holds, fall back to the field's default
    /// when none match. Total — every field maps to exactly one state.
    pub fn resolve_presence(&self, values: &ValueMap) -> IndexMap<String, Presence> {
        self.fields()
            .map(|field| {
                let state = self
                    .rules_for(&field.slug)
                    .find(|rule| evaluate(&rule.when, values))
                    .map(|rule| rule.then)
                    .unwrap_or(field.presence);
                tracing::trace!(field = %field.slug, ?state, "resolved presence");
                (field.slug.clone(), state)
            })
            .collect()
    }
}
