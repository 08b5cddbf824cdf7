//! Condition trees for conditional field presence
//!
//! A [`Condition`] is a boolean expression over a submission's field values:
//! comparisons at the leaves, `and`/`or`/`not` combinators above them. Trees
//! are plain serde data so form definitions carry them as JSON, and
//! [`evaluate`] is a pure function over an immutable value map — no parsing,
//! no side effects, safe to run concurrently.
//!
//! Missing values are a distinguished "absent" state: only the `is-absent`
//! operator matches them, every other comparison on an absent value is false.

pub mod condition;
pub mod evaluator;

pub use condition::{ComparisonOp, Condition};
pub use evaluator::evaluate;
