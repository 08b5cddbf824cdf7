//! Pure evaluation of condition trees against a value map.

use std::collections::HashMap;

use serde_json::Value;

use crate::condition::{ComparisonOp, Condition};

/// Evaluate a condition against the current submission values.
///
/// The value map holds raw submitted values keyed by field slug. A slug with
/// no entry (or an explicit JSON null) is "absent": it matches `is-absent`
/// and nothing else. `and`/`or` short-circuit; the function is pure, so this
/// is only an efficiency property.
pub fn evaluate(condition: &Condition, values: &HashMap<String, Value>) -> bool {
    match condition {
        Condition::Comparison {
            field,
            operator,
            value,
        } => {
            let actual = values.get(field).filter(|v| !v.is_null());
            evaluate_comparison(field, actual, *operator, value)
        }
        Condition::And { children } => children.iter().all(|c| evaluate(c, values)),
        Condition::Or { children } => children.iter().any(|c| evaluate(c, values)),
        Condition::Not { child } => !evaluate(child, values),
    }
}

fn evaluate_comparison(
    field: &str,
    actual: Option<&Value>,
    operator: ComparisonOp,
    expected: &Value,
) -> bool {
    if operator == ComparisonOp::IsAbsent {
        return actual.is_none();
    }
    let Some(actual) = actual else {
        // Absent values only match is-absent.
        return false;
    };
    match operator {
        ComparisonOp::Equals => loose_eq(actual, expected),
        ComparisonOp::NotEquals => !loose_eq(actual, expected),
        ComparisonOp::InSet => match expected.as_array() {
            Some(set) => set.iter().any(|candidate| loose_eq(actual, candidate)),
            None => {
                tracing::trace!(field, "in-set literal is not an array");
                false
            }
        },
        ComparisonOp::GreaterThan => ordered(field, actual, expected, |o| o.is_gt()),
        ComparisonOp::LessThan => ordered(field, actual, expected, |o| o.is_lt()),
        ComparisonOp::IsAbsent => unreachable!("handled above"),
    }
}

/// Equality that treats all JSON numbers alike (`30` equals `30.0`).
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering over numbers, or lexicographic over strings (ISO dates order
/// correctly this way). Anything else is not orderable and yields false;
/// definition-time checks keep orderings off fields where that could hide
/// a real mismatch.
fn ordered(field: &str, a: &Value, b: &Value, pick: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).map(&pick).unwrap_or(false);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return pick(x.cmp(y));
    }
    tracing::trace!(field, "ordering comparison on non-orderable values");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn compare(field: &str, operator: ComparisonOp, value: Value) -> Condition {
        Condition::Comparison {
            field: field.into(),
            operator,
            value,
        }
    }

    #[test]
    fn equals_matches_same_value() {
        let vals = values(&[("has_pet", json!(true))]);
        assert!(evaluate(
            &compare("has_pet", ComparisonOp::Equals, json!(true)),
            &vals
        ));
        assert!(!evaluate(
            &compare("has_pet", ComparisonOp::Equals, json!(false)),
            &vals
        ));
    }

    #[test]
    fn equals_treats_integer_and_float_alike() {
        let vals = values(&[("age", json!(30))]);
        assert!(evaluate(
            &compare("age", ComparisonOp::Equals, json!(30.0)),
            &vals
        ));
    }

    #[test]
    fn absent_matches_only_is_absent() {
        let vals = values(&[]);
        assert!(evaluate(
            &compare("nickname", ComparisonOp::IsAbsent, Value::Null),
            &vals
        ));
        assert!(!evaluate(
            &compare("nickname", ComparisonOp::Equals, json!("")),
            &vals
        ));
        assert!(!evaluate(
            &compare("nickname", ComparisonOp::NotEquals, json!("x")),
            &vals
        ));
        assert!(!evaluate(
            &compare("nickname", ComparisonOp::InSet, json!(["a", "b"])),
            &vals
        ));
    }

    #[test]
    fn explicit_null_counts_as_absent() {
        let vals = values(&[("nickname", Value::Null)]);
        assert!(evaluate(
            &compare("nickname", ComparisonOp::IsAbsent, Value::Null),
            &vals
        ));
    }

    #[test]
    fn present_value_does_not_match_is_absent() {
        let vals = values(&[("nickname", json!("zed"))]);
        assert!(!evaluate(
            &compare("nickname", ComparisonOp::IsAbsent, Value::Null),
            &vals
        ));
    }

    #[test]
    fn in_set_membership() {
        let vals = values(&[("env", json!("staging"))]);
        assert!(evaluate(
            &compare("env", ComparisonOp::InSet, json!(["dev", "staging", "prod"])),
            &vals
        ));
        assert!(!evaluate(
            &compare("env", ComparisonOp::InSet, json!(["dev", "prod"])),
            &vals
        ));
    }

    #[test]
    fn numeric_ordering() {
        let vals = values(&[("port", json!(8080))]);
        assert!(evaluate(
            &compare("port", ComparisonOp::GreaterThan, json!(1024)),
            &vals
        ));
        assert!(!evaluate(
            &compare("port", ComparisonOp::LessThan, json!(1024)),
            &vals
        ));
    }

    #[test]
    fn iso_date_strings_order_lexicographically() {
        let vals = values(&[("start", json!("2026-03-01"))]);
        assert!(evaluate(
            &compare("start", ComparisonOp::GreaterThan, json!("2026-01-15")),
            &vals
        ));
        assert!(evaluate(
            &compare("start", ComparisonOp::LessThan, json!("2026-12-31")),
            &vals
        ));
    }

    #[test]
    fn mismatched_ordering_is_false_not_error() {
        let vals = values(&[("age", json!("abc"))]);
        assert!(!evaluate(
            &compare("age", ComparisonOp::GreaterThan, json!(18)),
            &vals
        ));
    }

    #[test]
    fn and_or_not_compose() {
        let vals = values(&[("env", json!("prod")), ("confirm", json!(true))]);
        let both = Condition::And {
            children: vec![
                compare("env", ComparisonOp::Equals, json!("prod")),
                compare("confirm", ComparisonOp::Equals, json!(true)),
            ],
        };
        assert!(evaluate(&both, &vals));

        let either = Condition::Or {
            children: vec![
                compare("env", ComparisonOp::Equals, json!("dev")),
                compare("confirm", ComparisonOp::Equals, json!(true)),
            ],
        };
        assert!(evaluate(&either, &vals));

        let negated = Condition::Not {
            child: Box::new(compare("env", ComparisonOp::Equals, json!("dev"))),
        };
        assert!(evaluate(&negated, &vals));
    }

    #[test]
    fn empty_combinators() {
        let vals = values(&[]);
        assert!(evaluate(&Condition::And { children: vec![] }, &vals));
        assert!(!evaluate(&Condition::Or { children: vec![] }, &vals));
    }
}
