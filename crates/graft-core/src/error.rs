//! Errors raised by composite type synthesis and object access

use thiserror::Error;

/// Failure to synthesize a composite type.
///
/// Build errors are never cached: the next request for the same key
/// attempts the build again.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    /// A capability property has the same name as a property of the base class
    #[error("Capability '{capability}' property '{property}' collides with a member of '{base}'")]
    NameCollision {
        /// Base class name
        base: String,
        /// Capability interface name
        capability: String,
        /// Colliding property name
        property: String,
    },

    /// The base class cannot be constructed without arguments
    #[error("Class '{base}' has no no-argument constructor")]
    UnconstructableBaseType {
        /// Base class name
        base: String,
    },

    /// A capability property cannot be backed by a plain storage slot
    #[error("Capability '{capability}' property '{property}' has unsupported value type {value_type}")]
    UnsupportedValueType {
        /// Capability interface name
        capability: String,
        /// Offending property name
        property: String,
        /// Display form of the value type
        value_type: String,
    },
}

/// Failure to read, write or construct an object
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessError {
    /// No property with this name exists on the class
    #[error("Class '{class}' has no property '{property}'")]
    UnknownProperty {
        /// Class name
        class: String,
        /// Requested property
        property: String,
    },

    /// The property exists but is private
    #[error("Property '{class}.{property}' is not visible")]
    NotVisible {
        /// Class name
        class: String,
        /// Requested property
        property: String,
    },

    /// The property has no getter
    #[error("Property '{class}.{property}' is not readable")]
    NotReadable {
        /// Class or capability name
        class: String,
        /// Requested property
        property: String,
    },

    /// The property has no setter
    #[error("Property '{class}.{property}' is not writable")]
    NotWritable {
        /// Class or capability name
        class: String,
        /// Requested property
        property: String,
    },

    /// The value does not fit the property's type
    #[error("Type mismatch for '{class}.{property}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Class name
        class: String,
        /// Property being written
        property: String,
        /// Declared value type
        expected: String,
        /// Type of the supplied value
        actual: String,
    },

    /// The class does not implement the requested capability
    #[error("Class '{class}' does not implement '{capability}'")]
    NotImplemented {
        /// Class name
        class: String,
        /// Capability name
        capability: String,
    },

    /// The class has no no-argument construction path
    #[error("Class '{class}' cannot be constructed without arguments")]
    NotConstructible {
        /// Class name
        class: String,
    },
}

/// Failure of the extension facade
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtendError {
    /// The composite type could not be synthesized
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Instantiating the composite or copying values failed
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Result alias for synthesis
pub type BuildResult<T> = Result<T, BuildError>;

/// Result alias for object access
pub type AccessResult<T> = Result<T, AccessError>;

/// Result alias for the extension facade
pub type ExtendResult<T> = Result<T, ExtendError>;
