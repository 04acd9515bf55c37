//! Property declarations shared by capability interfaces and classes

use crate::ty::ValueType;

/// Visibility of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible to any caller and to value copying
    #[default]
    Public,
    /// Visible only to the declaring class
    Private,
}

/// Declaration of a single property: name, value type and access flags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyDecl {
    /// Property name
    pub name: String,
    /// Value type
    pub value_type: ValueType,
    /// Visibility
    pub visibility: Visibility,
    /// Whether the property exposes a getter
    pub readable: bool,
    /// Whether the property exposes a setter
    pub writable: bool,
}

impl PropertyDecl {
    /// Create a public read-write property
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            visibility: Visibility::Public,
            readable: true,
            writable: true,
        }
    }

    /// Drop the setter
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Drop the getter
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Whether the property is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_decl_defaults() {
        let decl = PropertyDecl::new("client_id", ValueType::Int);
        assert!(decl.readable);
        assert!(decl.writable);
        assert!(decl.is_public());
    }

    #[test]
    fn test_property_decl_flags() {
        let decl = PropertyDecl::new("secret", ValueType::Str).private().read_only();
        assert!(!decl.is_public());
        assert!(decl.readable);
        assert!(!decl.writable);

        let sink = PropertyDecl::new("sink", ValueType::Int).write_only();
        assert!(!sink.readable);
        assert!(sink.writable);
    }
}
