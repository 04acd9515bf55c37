//! Value types for declared properties

use std::fmt;

/// The type of a property's value
///
/// Scalars are stored inline. `List`, `Map` and `Object` values are shared
/// references, so copying a property of those types shares the referent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// Immutable UTF-8 string
    Str,
    /// Immutable byte buffer
    Bytes,
    /// UTC timestamp
    Timestamp,
    /// Nullable wrapper around another type
    Optional(Box<ValueType>),
    /// Growable list with elements of one type
    List(Box<ValueType>),
    /// String-keyed map with values of one type
    Map(Box<ValueType>),
    /// Reference to an instance of the named class (or a subclass)
    Object(String),
    /// Reference to an instance implementing the named capability
    Capability(String),
}

impl ValueType {
    /// `Optional(inner)`
    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    /// `List(element)`
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    /// `Map(value)`
    pub fn map(value: ValueType) -> Self {
        ValueType::Map(Box::new(value))
    }

    /// `Object(class_name)`
    pub fn object(class_name: impl Into<String>) -> Self {
        ValueType::Object(class_name.into())
    }

    /// `Capability(interface_name)`
    pub fn capability(interface_name: impl Into<String>) -> Self {
        ValueType::Capability(interface_name.into())
    }

    /// Whether values of this type are shared by reference when copied
    pub fn is_reference(&self) -> bool {
        match self {
            ValueType::List(_) | ValueType::Map(_) | ValueType::Object(_) => true,
            ValueType::Capability(_) => true,
            ValueType::Optional(inner) => inner.is_reference(),
            _ => false,
        }
    }

    /// Whether the type itself names a capability.
    ///
    /// Only the outermost layer counts: `List(Capability(..))` holds plain
    /// references and is not a capability type.
    pub fn is_capability(&self) -> bool {
        matches!(self, ValueType::Capability(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Str => write!(f, "string"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::Timestamp => write!(f, "timestamp"),
            ValueType::Optional(inner) => write!(f, "{}?", inner),
            ValueType::List(element) => write!(f, "list<{}>", element),
            ValueType::Map(value) => write!(f, "map<string, {}>", value),
            ValueType::Object(name) => write!(f, "{}", name),
            ValueType::Capability(name) => write!(f, "capability {}", name),
        }
    }
}
