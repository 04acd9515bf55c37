//! Capability interfaces
//!
//! A capability interface is a named, immutable list of property
//! declarations. Its identity is its qualified name; the declaration order
//! of its properties is preserved and used as the slot order whenever the
//! interface is grafted onto a class.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{DeclarationError, DeclarationResult};
use crate::property::{PropertyDecl, Visibility};
use crate::ty::ValueType;

/// An immutable capability interface
#[derive(Debug)]
pub struct CapabilityInterface {
    name: String,
    properties: Vec<PropertyDecl>,
    indices: FxHashMap<String, usize>,
}

impl CapabilityInterface {
    /// Start declaring an interface with the given qualified name
    pub fn builder(name: impl Into<String>) -> CapabilityBuilder {
        CapabilityBuilder::new(name)
    }

    /// Qualified name (the interface's identity)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.indices.get(name).map(|&i| &self.properties[i])
    }

    /// Declaration index of a property
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Whether the interface declares a property with this name
    pub fn has_property(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Number of declared properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the interface declares no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Builder for incrementally declaring a capability interface
#[derive(Debug, Clone)]
pub struct CapabilityBuilder {
    name: String,
    properties: Vec<PropertyDecl>,
}

impl CapabilityBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Declare a public read-write property
    pub fn property(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.declare(PropertyDecl::new(name, value_type))
    }

    /// Declare a public read-only property
    pub fn read_only(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.declare(PropertyDecl::new(name, value_type).read_only())
    }

    /// Declare a property from a full declaration.
    ///
    /// Interface members are always public; a private declaration is
    /// promoted.
    pub fn declare(mut self, mut decl: PropertyDecl) -> Self {
        decl.visibility = Visibility::Public;
        self.properties.push(decl);
        self
    }

    /// Validate and freeze the interface
    pub fn build(self) -> DeclarationResult<Arc<CapabilityInterface>> {
        if self.name.is_empty() {
            return Err(DeclarationError::EmptyName { owner: self.name });
        }

        let mut indices = FxHashMap::default();
        for (index, decl) in self.properties.iter().enumerate() {
            if decl.name.is_empty() {
                return Err(DeclarationError::EmptyName { owner: self.name });
            }
            if indices.insert(decl.name.clone(), index).is_some() {
                return Err(DeclarationError::DuplicateProperty {
                    owner: self.name,
                    property: decl.name.clone(),
                });
            }
        }

        Ok(Arc::new(CapabilityInterface {
            name: self.name,
            properties: self.properties,
            indices,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_preserved() {
        let iface = CapabilityInterface::builder("app.ITypeTest")
            .property("my_int", ValueType::Int)
            .property("my_float", ValueType::Float)
            .property("my_string", ValueType::Str)
            .build()
            .unwrap();

        let names: Vec<_> = iface.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["my_int", "my_float", "my_string"]);
        assert_eq!(iface.property_index("my_string"), Some(2));
        assert_eq!(iface.len(), 3);
    }

    #[test]
    fn test_duplicate_property_rejected() {
        let result = CapabilityInterface::builder("IClientId")
            .property("client_id", ValueType::Int)
            .property("client_id", ValueType::Str)
            .build();

        assert_eq!(
            result.unwrap_err(),
            DeclarationError::DuplicateProperty {
                owner: "IClientId".to_string(),
                property: "client_id".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(CapabilityInterface::builder("").build().is_err());
        assert!(CapabilityInterface::builder("IEmpty")
            .property("", ValueType::Int)
            .build()
            .is_err());
    }

    #[test]
    fn test_members_are_public() {
        let iface = CapabilityInterface::builder("IHidden")
            .declare(PropertyDecl::new("hidden", ValueType::Int).private())
            .read_only("label", ValueType::Str)
            .build()
            .unwrap();

        assert_eq!(iface.property("hidden").unwrap().visibility, Visibility::Public);
        assert!(!iface.property("label").unwrap().writable);
    }

    #[test]
    fn test_empty_interface_is_valid() {
        let iface = CapabilityInterface::builder("IMarker").build().unwrap();
        assert!(iface.is_empty());
        assert!(!iface.has_property("anything"));
    }
}
