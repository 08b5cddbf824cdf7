//! Form-level preset checks, run over normalized values after the per-field
//! pipeline. A preset whose referenced values are absent (hidden, optional
//! and empty, or failed earlier) is skipped, not failed — it can only judge
//! values that actually validated.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde_json::Value;

use crate::definition::{Preset, PresetOp, PresetTarget};
use crate::pipeline::{ErrorCode, FieldError};

/// Returns the form-level error a preset produces, if any.
pub(crate) fn check_preset(preset: &Preset, values: &IndexMap<String, Value>) -> Option<FieldError> {
    match preset {
        Preset::Confirmation {
            field,
            matches,
            message,
        } => {
            let left = values.get(field)?;
            let right = match matches {
                PresetTarget::Field { field } => values.get(field)?,
                PresetTarget::Value { value } => value,
            };
            if loose_eq(left, right) {
                None
            } else {
                Some(preset_error(
                    preset,
                    message,
                    format!("'{field}' does not match the expected value"),
                ))
            }
        }
        Preset::Comparison {
            left,
            operator,
            right,
            message,
        } => {
            let ordering = compare(values.get(left)?, values.get(right)?)?;
            let holds = match operator {
                PresetOp::Eq => ordering.is_eq(),
                PresetOp::Neq => !ordering.is_eq(),
                PresetOp::Gt => ordering.is_gt(),
                PresetOp::Gte => ordering.is_ge(),
                PresetOp::Lt => ordering.is_lt(),
                PresetOp::Lte => ordering.is_le(),
            };
            if holds {
                None
            } else {
                Some(preset_error(
                    preset,
                    message,
                    format!("'{left}' and '{right}' do not satisfy the required ordering"),
                ))
            }
        }
    }
}

fn preset_error(preset: &Preset, message: &Option<String>, fallback: String) -> FieldError {
    FieldError {
        code: ErrorCode::Preset(preset.name().into()),
        message: message.clone().unwrap_or(fallback),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Numbers compare numerically, strings lexicographically (ISO dates order
/// correctly). Anything else is not comparable and skips the preset.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}
