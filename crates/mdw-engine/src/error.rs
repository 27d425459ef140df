//! Error types for the ordering engine.
//!
//! All failure modes of registration and sorting are expressed as a single
//! [`OrderingError`] sum type. Callers discriminate by variant; the engine
//! never logs and never panics on bad input.

use thiserror::Error;

/// Result type alias using [`OrderingError`].
pub type OrderingResult<T> = Result<T, OrderingError>;

/// Errors produced while registering middlewares or computing their order.
///
/// The first two variants are registration-time errors: the stack is left
/// unchanged when they occur. The remaining variants are sort-time errors;
/// no partial order is ever returned alongside them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// A middleware with this name is already registered.
    #[error("middleware '{name}' is already registered")]
    DuplicateName {
        /// The name that was registered twice.
        name: String,
    },

    /// A declaration was submitted with an empty name.
    #[error("middleware declarations must have a non-empty name")]
    EmptyName,

    /// A declaration's `requires` list references middlewares that are not
    /// registered.
    #[error("middleware '{declarer}' requires missing middleware: {}", .missing.join(", "))]
    MissingRequirement {
        /// The middleware that stated the requirement.
        declarer: String,
        /// The required names that are absent from the stack.
        missing: Vec<String>,
    },

    /// A subset of the registered middlewares cannot be placed: their
    /// constraints form a cycle or are otherwise unsatisfiable.
    #[error("cannot resolve an execution order for: {}", .remaining.join(", "))]
    UnresolvableOrder {
        /// Names of the middlewares that could not be placed, in
        /// registration order.
        remaining: Vec<String>,
    },

    /// In strict mode, a positioning hint referenced a middleware that is
    /// not registered.
    #[error("middleware '{declarer}' has hints for unknown middleware: {}", .unknown.join(", "))]
    UnknownHintTarget {
        /// The middleware whose hints are at fault.
        declarer: String,
        /// The hint targets that are absent from the stack.
        unknown: Vec<String>,
    },
}

impl OrderingError {
    /// Creates a [`OrderingError::DuplicateName`] error.
    #[must_use]
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Creates a [`OrderingError::MissingRequirement`] error.
    #[must_use]
    pub fn missing_requirement(declarer: impl Into<String>, missing: Vec<String>) -> Self {
        Self::MissingRequirement {
            declarer: declarer.into(),
            missing,
        }
    }

    /// Creates a [`OrderingError::UnresolvableOrder`] error.
    #[must_use]
    pub fn unresolvable_order(remaining: Vec<String>) -> Self {
        Self::UnresolvableOrder { remaining }
    }

    /// Creates a [`OrderingError::UnknownHintTarget`] error.
    #[must_use]
    pub fn unknown_hint_target(declarer: impl Into<String>, unknown: Vec<String>) -> Self {
        Self::UnknownHintTarget {
            declarer: declarer.into(),
            unknown,
        }
    }

    /// Returns `true` if this error was raised at registration time.
    ///
    /// Registration-time errors leave the stack unchanged; sort-time errors
    /// describe the current stack contents.
    #[must_use]
    pub const fn is_registration_error(&self) -> bool {
        matches!(self, Self::DuplicateName { .. } | Self::EmptyName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_display() {
        let err = OrderingError::duplicate_name("cookie");
        assert_eq!(err.to_string(), "middleware 'cookie' is already registered");
    }

    #[test]
    fn test_missing_requirement_display() {
        let err = OrderingError::missing_requirement(
            "flash",
            vec!["cookie".to_string(), "session".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "middleware 'flash' requires missing middleware: cookie, session"
        );
    }

    #[test]
    fn test_unresolvable_order_display() {
        let err = OrderingError::unresolvable_order(vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(err.to_string(), "cannot resolve an execution order for: X, Y");
    }

    #[test]
    fn test_unknown_hint_target_display() {
        let err = OrderingError::unknown_hint_target("solo", vec!["ghost".to_string()]);
        assert_eq!(
            err.to_string(),
            "middleware 'solo' has hints for unknown middleware: ghost"
        );
    }

    #[test]
    fn test_registration_error_classification() {
        assert!(OrderingError::duplicate_name("x").is_registration_error());
        assert!(OrderingError::EmptyName.is_registration_error());
        assert!(!OrderingError::unresolvable_order(vec![]).is_registration_error());
        assert!(!OrderingError::missing_requirement("x", vec![]).is_registration_error());
    }
}
