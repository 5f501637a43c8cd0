//! Metadata lookup and construction errors

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RttiError>;

/// Errors raised by repository lookups and descriptor construction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RttiError {
    /// No class descriptor and no native class for this name
    #[error("No such class: {name}")]
    NoSuchClass {
        /// Class name that was not found
        name: String,
    },

    /// Field name (or expression) does not resolve on the class
    #[error("No such field: {class}.{field}")]
    NoSuchField {
        /// Class that was searched
        class: String,
        /// Field name or dotted expression
        field: String,
    },

    /// Name is neither a field nor a method of the class
    #[error("No such member: {class}.{member}")]
    NoSuchMember {
        /// Class that was searched
        class: String,
        /// Member name
        member: String,
    },

    /// Method name or signature does not resolve on the class
    #[error("No such method: {class}.{method}")]
    NoSuchMethod {
        /// Class that was searched
        class: String,
        /// Bare name or signature-qualified name
        method: String,
    },

    /// A bare method name matches several overloads
    #[error("Ambiguous method name {class}.{method}: {candidates:?}")]
    AmbiguousMethodName {
        /// Class that was searched
        class: String,
        /// Bare method name
        method: String,
        /// Full names of the competing overloads
        candidates: Vec<String>,
    },

    /// Descriptor built over a native element of the wrong kind
    #[error("Invalid delegate for {item}: {reason}")]
    InvalidDelegate {
        /// Descriptor being built
        item: String,
        /// What was wrong with the native element
        reason: String,
    },

    /// Descriptor re-parented onto something that is not a class
    #[error("Invalid parent for {item}: {parent}")]
    InvalidParent {
        /// Descriptor being re-parented
        item: String,
        /// Offending parent
        parent: String,
    },

    /// Field info of a class was requested while it is being built
    #[error("Cyclic construction detected while building {class}")]
    CyclicConstruction {
        /// Class whose construction re-entered itself
        class: String,
    },

    /// Logical name already bound in the repository
    #[error("Class {name} is already registered")]
    AlreadyRegistered {
        /// Logical name
        name: String,
    },

    /// Regular expression or modifier filter could not be parsed
    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern {
        /// Pattern text
        pattern: String,
        /// Parser message
        reason: String,
    },
}

impl RttiError {
    pub(crate) fn no_such_class(name: impl Into<String>) -> Self {
        RttiError::NoSuchClass { name: name.into() }
    }

    pub(crate) fn no_such_field(class: impl Into<String>, field: impl Into<String>) -> Self {
        RttiError::NoSuchField {
            class: class.into(),
            field: field.into(),
        }
    }

    pub(crate) fn no_such_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        RttiError::NoSuchMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Whether this is a "not found" style error (class, field, member or method)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RttiError::NoSuchClass { .. }
                | RttiError::NoSuchField { .. }
                | RttiError::NoSuchMember { .. }
                | RttiError::NoSuchMethod { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RttiError::no_such_field("Bank", "balance");
        assert_eq!(err.to_string(), "No such field: Bank.balance");

        let err = RttiError::AmbiguousMethodName {
            class: "A".to_string(),
            method: "foo".to_string(),
            candidates: vec!["foo()".to_string(), "foo(int)".to_string()],
        };
        assert!(err.to_string().starts_with("Ambiguous method name A.foo"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(RttiError::no_such_class("X").is_not_found());
        assert!(RttiError::no_such_method("X", "m").is_not_found());
        assert!(!RttiError::CyclicConstruction {
            class: "X".to_string()
        }
        .is_not_found());
    }
}
