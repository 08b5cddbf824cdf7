//! Definition-time errors.
//!
//! These reject a form definition at load, before any submission is
//! processed. Submission-level failures are never errors here — they are
//! data inside [`crate::ValidationResult`].

use thiserror::Error;

/// Result type for definition loading
pub type Result<T> = std::result::Result<T, DefinitionError>;

/// A form definition was rejected at load time.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Two fields share a slug
    #[error("duplicate field slug: {slug}")]
    DuplicateSlug { slug: String },

    /// Field uses a type tag with no registered handler
    #[error("field '{field}' has unknown type: {tag}")]
    UnknownFieldType { field: String, tag: String },

    /// A rule, condition, access rule, or preset references a field that
    /// does not exist in this form
    #[error("{context} references unknown field: {slug}")]
    UnknownSlug { slug: String, context: String },

    /// A base validator rule is not applicable to the field's type
    #[error("field '{field}' of type '{tag}' does not support rule '{rule}'")]
    IncompatibleRule {
        field: String,
        tag: String,
        rule: String,
    },

    /// A regex validator carries a pattern that does not compile
    #[error("field '{field}' has invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },

    /// A condition compares a field against a literal of an incompatible type
    #[error("condition for '{target}' compares field '{field}' badly: {detail}")]
    IncompatibleComparison {
        target: String,
        field: String,
        detail: String,
    },

    /// A field's stored default value does not coerce to its own type
    #[error("default value for field '{field}' is invalid: {message}")]
    InvalidDefault { field: String, message: String },

    /// Presence rules form a dependency cycle among fields
    #[error("presence dependency cycle detected: {path}")]
    PresenceCycle { path: String },

    /// Two access rules cover the same (role, field) pair
    #[error("duplicate access rule for role '{role}' on field '{field}'")]
    DuplicateAccessRule { role: String, field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_names_the_path() {
        let err = DefinitionError::PresenceCycle {
            path: "a -> b -> a".into(),
        };
        assert_eq!(
            err.to_string(),
            "presence dependency cycle detected: a -> b -> a"
        );
    }

    #[test]
    fn unknown_slug_names_context() {
        let err = DefinitionError::UnknownSlug {
            slug: "ghost".into(),
            context: "presence rule condition".into(),
        };
        assert!(err.to_string().contains("presence rule condition"));
        assert!(err.to_string().contains("ghost"));
    }
}
