//! The access control layer.
//!
//! Applied before the validator pipeline and before schema export. Access
//! dominates presence: a field without the visible capability for the caller
//! role is treated as hidden no matter what the presence rules say, and it
//! is structurally absent from every output — never reported as an error.

use indexmap::IndexMap;
use serde::Serialize;

use crate::definition::{AccessDefaults, AccessRule, Capability};
use crate::form::Form;

/// The resolved capability pair for one (role, field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Access {
    pub visible: bool,
    pub editable: bool,
}

impl Access {
    pub(crate) fn from_rule(rule: &AccessRule) -> Self {
        Self {
            visible: rule.grants(Capability::Visible),
            editable: rule.grants(Capability::Editable),
        }
    }

    pub(crate) fn from_defaults(defaults: AccessDefaults) -> Self {
        Self {
            visible: defaults.visible,
            editable: defaults.editable,
        }
    }
}

impl Form {
    /// The effective capability per field for a caller role, in field
    /// definition order.
    ///
    /// A `None` role means the caller is not subject to role rules (internal
    /// callers, trusted services); every field then takes the form-level
    /// defaults.
    pub fn effective_access(&self, role: Option<&str>) -> IndexMap<String, Access> {
        let defaults = Access::from_defaults(self.definition().access_defaults);
        self.fields()
            .map(|field| {
                let access = role
                    .and_then(|role| self.explicit_access(role, &field.slug))
                    .unwrap_or(defaults);
                (field.slug.clone(), access)
            })
            .collect()
    }
}
