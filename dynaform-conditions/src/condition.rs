//! The condition expression tree.
//!
//! All nodes serialize to/from JSON via serde with a `kind` tag, so a form
//! definition document embeds conditions directly:
//!
//! ```json
//! { "kind": "comparison", "field": "has_pet", "operator": "equals", "value": true }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators usable at condition leaves.
///
/// `is-absent` is the only operator that matches a field with no submitted
/// value; it takes no literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    InSet,
    GreaterThan,
    LessThan,
    IsAbsent,
}

impl ComparisonOp {
    /// True for the ordering operators, which need an orderable literal.
    pub fn is_ordering(&self) -> bool {
        matches!(self, ComparisonOp::GreaterThan | ComparisonOp::LessThan)
    }

    /// True when the operator takes no literal at all.
    pub fn takes_no_value(&self) -> bool {
        matches!(self, ComparisonOp::IsAbsent)
    }
}

/// A boolean expression tree over other fields' submitted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Condition {
    /// Compare one field's value against a literal.
    Comparison {
        /// Slug of the field whose value is inspected.
        field: String,
        operator: ComparisonOp,
        /// The literal to compare against. An array for `in-set`, omitted
        /// for `is-absent`.
        #[serde(default, skip_serializing_if = "Value::is_null")]
        value: Value,
    },
    /// True when every child is true. Empty `and` is vacuously true.
    And { children: Vec<Condition> },
    /// True when any child is true. Empty `or` is false.
    Or { children: Vec<Condition> },
    /// Negation of the child.
    Not { child: Box<Condition> },
}

impl Condition {
    /// Every field slug referenced anywhere in the tree, in encounter order.
    ///
    /// Duplicates are not removed; callers building dependency graphs
    /// typically insert into a set anyway.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut slugs = Vec::new();
        self.collect_fields(&mut slugs);
        slugs
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Comparison { field, .. } => out.push(field),
            Condition::And { children } | Condition::Or { children } => {
                for child in children {
                    child.collect_fields(out);
                }
            }
            Condition::Not { child } => child.collect_fields(out),
        }
    }

    /// Visit every comparison leaf in the tree.
    pub fn for_each_comparison<'a>(&'a self, f: &mut impl FnMut(&'a str, ComparisonOp, &'a Value)) {
        match self {
            Condition::Comparison {
                field,
                operator,
                value,
            } => f(field, *operator, value),
            Condition::And { children } | Condition::Or { children } => {
                for child in children {
                    child.for_each_comparison(f);
                }
            }
            Condition::Not { child } => child.for_each_comparison(f),
        }
    }
}
