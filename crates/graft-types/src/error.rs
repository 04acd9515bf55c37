//! Declaration errors

use thiserror::Error;

/// Errors raised while declaring a capability interface or a class
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeclarationError {
    /// The owner or one of its properties was given an empty name
    #[error("Empty name in declaration of '{owner}'")]
    EmptyName {
        /// Interface or class being declared
        owner: String,
    },

    /// The same property name was declared twice
    #[error("Property '{property}' already declared on '{owner}'")]
    DuplicateProperty {
        /// Interface or class being declared
        owner: String,
        /// Offending property name
        property: String,
    },

    /// An initial value does not fit the declared value type
    #[error("Initial value for '{owner}.{property}' is {actual}, expected {expected}")]
    InitialValueMismatch {
        /// Class being declared
        owner: String,
        /// Property carrying the initial value
        property: String,
        /// Declared value type
        expected: String,
        /// Type of the supplied value
        actual: String,
    },
}

/// Result alias for declaration operations
pub type DeclarationResult<T> = Result<T, DeclarationError>;
