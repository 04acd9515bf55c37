//! Runtime class descriptors
//!
//! A [`Class`] describes the slot layout and property table of its
//! instances. Every property is backed by exactly one slot and exposes a
//! getter and/or setter bound to that slot. Subclasses copy their parent's
//! layout and append their own slots, so a parent's slot indices stay valid
//! on every descendant.
//!
//! Classes are immutable once built and shared behind `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use graft_types::{
    CapabilityInterface, DeclarationError, DeclarationResult, PropertyDecl, ValueType, Visibility,
};
use rustc_hash::FxHashMap;

use crate::error::{AccessError, AccessResult};
use crate::object::Object;
use crate::value::Value;

/// Process-unique class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    /// Allocate a new unique ID
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ClassId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A storage slot in an instance's layout
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name (informational; slots are addressed by index)
    pub name: String,
    /// Value type stored in the slot
    pub value_type: ValueType,
    /// Value the slot starts with; the type's default when absent
    pub initial_value: Option<Value>,
    /// Class that introduced the slot
    pub declaring_class: ClassId,
    /// Slot index
    pub slot: usize,
}

impl FieldInfo {
    fn initial(&self) -> Value {
        match &self.initial_value {
            Some(value) => value.fresh_copy(),
            None => Value::default_for(&self.value_type),
        }
    }
}

/// Getter or setter bound to a single slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAccessor {
    slot: usize,
}

impl SlotAccessor {
    /// Bind to a slot
    pub fn new(slot: usize) -> Self {
        Self { slot }
    }

    /// Slot index
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Read the slot
    pub fn get(&self, slots: &[Value]) -> Value {
        // Objects are always allocated with their class's full layout.
        slots[self.slot].clone()
    }

    /// Write the slot
    pub fn set(&self, slots: &mut [Value], value: Value) {
        slots[self.slot] = value;
    }
}

/// A named property and its accessors
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    /// Property name
    pub name: String,
    /// Value type
    pub value_type: ValueType,
    /// Visibility
    pub visibility: Visibility,
    /// Getter, if the property is readable
    pub getter: Option<SlotAccessor>,
    /// Setter, if the property is writable
    pub setter: Option<SlotAccessor>,
    /// Class that introduced the property
    pub declaring_class: ClassId,
}

impl PropertyInfo {
    /// Whether the property is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the property has a getter
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether the property has a setter
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

/// How a class came to exist
#[derive(Debug, Clone)]
pub enum ClassOrigin {
    /// Declared with a [`ClassBuilder`] (or the registry root)
    Declared,
    /// Synthesized by grafting a capability onto the parent class
    Composite {
        /// The grafted capability
        capability: Arc<CapabilityInterface>,
    },
}

/// Immutable runtime class descriptor
#[derive(Debug)]
pub struct Class {
    id: ClassId,
    name: String,
    parent: Option<Arc<Class>>,
    fields: Vec<FieldInfo>,
    properties: Vec<PropertyInfo>,
    property_indices: FxHashMap<String, usize>,
    interfaces: Vec<Arc<CapabilityInterface>>,
    /// Interface name -> property index for each interface member, in
    /// interface declaration order
    bindings: FxHashMap<String, Vec<usize>>,
    constructible: bool,
    origin: ClassOrigin,
}

impl Class {
    /// Create an empty, constructible root class
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: ClassId::next(),
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            properties: Vec::new(),
            property_indices: FxHashMap::default(),
            interfaces: Vec::new(),
            bindings: FxHashMap::default(),
            constructible: true,
            origin: ClassOrigin::Declared,
        }
    }

    /// Get class ID
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Get class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get parent class
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Slot layout, inherited slots first
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Number of slots per instance
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Property table, inherited properties first
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.property_indices.get(name).map(|&i| &self.properties[i])
    }

    /// Implemented interfaces, inherited first
    pub fn interfaces(&self) -> &[Arc<CapabilityInterface>] {
        &self.interfaces
    }

    /// Whether the class (or an ancestor) implements the named interface
    pub fn implements(&self, interface_name: &str) -> bool {
        self.bindings.contains_key(interface_name)
    }

    /// Implemented interface by name
    pub fn interface(&self, interface_name: &str) -> Option<&Arc<CapabilityInterface>> {
        self.interfaces.iter().find(|i| i.name() == interface_name)
    }

    /// Property indices implementing an interface, in its declaration order
    pub fn binding(&self, interface_name: &str) -> Option<&[usize]> {
        self.bindings.get(interface_name).map(Vec::as_slice)
    }

    /// Whether instances can be created without arguments
    pub fn is_constructible(&self) -> bool {
        self.constructible
    }

    /// How the class was created
    pub fn origin(&self) -> &ClassOrigin {
        &self.origin
    }

    /// Whether the class was synthesized by grafting a capability
    pub fn is_composite(&self) -> bool {
        matches!(self.origin, ClassOrigin::Composite { .. })
    }

    /// Iterate over this class and its ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Whether this class is `class_name` or derives from it
    pub fn is_subclass_of(&self, class_name: &str) -> bool {
        self.ancestors().any(|class| class.name == class_name)
    }

    /// Create an instance with every slot at its initial value
    pub fn instantiate(self: &Arc<Self>) -> AccessResult<Object> {
        if !self.constructible {
            return Err(AccessError::NotConstructible {
                class: self.name.clone(),
            });
        }
        let slots = self.fields.iter().map(FieldInfo::initial).collect();
        Ok(Object::from_parts(Arc::clone(self), slots))
    }

    /// Derive a composite class from `base`.
    ///
    /// The caller has already checked the new properties against the base;
    /// this only assembles the layout.
    pub(crate) fn composite(
        name: String,
        base: &Arc<Class>,
        capability: &Arc<CapabilityInterface>,
        members: Vec<(FieldInfo, PropertyInfo)>,
        id: ClassId,
    ) -> Self {
        let mut fields = base.fields.clone();
        let mut properties = base.properties.clone();
        let mut property_indices = base.property_indices.clone();
        let mut binding = Vec::with_capacity(members.len());

        for (field, property) in members {
            fields.push(field);
            let index = properties.len();
            property_indices.insert(property.name.clone(), index);
            properties.push(property);
            binding.push(index);
        }

        let mut interfaces = base.interfaces.clone();
        let mut bindings = base.bindings.clone();
        if !base.implements(capability.name()) {
            interfaces.push(Arc::clone(capability));
        }
        bindings.insert(capability.name().to_string(), binding);

        Self {
            id,
            name,
            parent: Some(Arc::clone(base)),
            fields,
            properties,
            property_indices,
            interfaces,
            bindings,
            constructible: true,
            origin: ClassOrigin::Composite {
                capability: Arc::clone(capability),
            },
        }
    }
}

/// Builder for declaring a base class
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    parent: Option<Arc<Class>>,
    properties: Vec<(PropertyDecl, Option<Value>)>,
    constructible: bool,
}

impl ClassBuilder {
    /// Create a new class builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            constructible: true,
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &Arc<Class>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Add a public read-write property
    pub fn property(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.declare(PropertyDecl::new(name, value_type), None)
    }

    /// Add a public read-write property with an initial value
    pub fn property_with(
        self,
        name: impl Into<String>,
        value_type: ValueType,
        initial: impl Into<Value>,
    ) -> Self {
        self.declare(PropertyDecl::new(name, value_type), Some(initial.into()))
    }

    /// Add a property from a full declaration
    pub fn declare(mut self, decl: PropertyDecl, initial: Option<Value>) -> Self {
        self.properties.push((decl, initial));
        self
    }

    /// Remove the no-argument construction path
    pub fn without_default_constructor(mut self) -> Self {
        self.constructible = false;
        self
    }

    /// Validate the declaration and lay out the class
    pub fn build(self) -> DeclarationResult<Arc<Class>> {
        if self.name.is_empty() {
            return Err(DeclarationError::EmptyName { owner: self.name });
        }

        let mut class = match &self.parent {
            Some(parent) => Class {
                id: ClassId::next(),
                name: self.name.clone(),
                parent: Some(Arc::clone(parent)),
                fields: parent.fields.clone(),
                properties: parent.properties.clone(),
                property_indices: parent.property_indices.clone(),
                interfaces: parent.interfaces.clone(),
                bindings: parent.bindings.clone(),
                constructible: parent.constructible,
                origin: ClassOrigin::Declared,
            },
            None => Class::root(self.name.clone()),
        };
        class.constructible &= self.constructible;

        for (decl, initial) in self.properties {
            if decl.name.is_empty() {
                return Err(DeclarationError::EmptyName { owner: self.name });
            }
            if class.property_indices.contains_key(&decl.name) {
                return Err(DeclarationError::DuplicateProperty {
                    owner: self.name,
                    property: decl.name,
                });
            }
            if let Some(value) = &initial {
                if !value.conforms_to(&decl.value_type) {
                    return Err(DeclarationError::InitialValueMismatch {
                        owner: self.name,
                        property: decl.name,
                        expected: decl.value_type.to_string(),
                        actual: value.type_name().to_string(),
                    });
                }
            }

            let slot = class.fields.len();
            let accessor = SlotAccessor::new(slot);
            class.fields.push(FieldInfo {
                name: decl.name.clone(),
                value_type: decl.value_type.clone(),
                initial_value: initial,
                declaring_class: class.id,
                slot,
            });

            let index = class.properties.len();
            class.property_indices.insert(decl.name.clone(), index);
            class.properties.push(PropertyInfo {
                name: decl.name,
                value_type: decl.value_type,
                visibility: decl.visibility,
                getter: decl.readable.then_some(accessor),
                setter: decl.writable.then_some(accessor),
                declaring_class: class.id,
            });
        }

        Ok(Arc::new(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> Arc<Class> {
        ClassBuilder::new("Foo")
            .property("name", ValueType::Str)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_layout() {
        let class = ClassBuilder::new("Point")
            .property("x", ValueType::Int)
            .property_with("y", ValueType::Int, 7)
            .build()
            .unwrap();

        assert_eq!(class.name(), "Point");
        assert_eq!(class.field_count(), 2);
        assert_eq!(class.property("y").unwrap().getter, Some(SlotAccessor::new(1)));
        assert!(class.parent().is_none());
        assert!(!class.is_composite());
    }

    #[test]
    fn test_subclass_appends_slots() {
        let base = foo();
        let derived = ClassBuilder::new("Bar")
            .extends(&base)
            .property("age", ValueType::Int)
            .build()
            .unwrap();

        assert_eq!(derived.field_count(), 2);
        assert_eq!(derived.property("name").unwrap().getter.unwrap().slot(), 0);
        assert_eq!(derived.property("age").unwrap().getter.unwrap().slot(), 1);
        assert!(derived.is_subclass_of("Foo"));
        assert!(derived.is_subclass_of("Bar"));
        assert!(!base.is_subclass_of("Bar"));
        assert_eq!(derived.ancestors().count(), 2);
    }

    #[test]
    fn test_duplicate_property() {
        let result = ClassBuilder::new("Foo")
            .property("name", ValueType::Str)
            .property("name", ValueType::Int)
            .build();
        assert!(matches!(result, Err(DeclarationError::DuplicateProperty { .. })));

        let shadowing = ClassBuilder::new("Bar")
            .extends(&foo())
            .property("name", ValueType::Str)
            .build();
        assert!(matches!(shadowing, Err(DeclarationError::DuplicateProperty { .. })));
    }

    #[test]
    fn test_initial_value_checked() {
        let result = ClassBuilder::new("Foo")
            .property_with("count", ValueType::Int, "three")
            .build();
        assert_eq!(
            result.unwrap_err(),
            DeclarationError::InitialValueMismatch {
                owner: "Foo".to_string(),
                property: "count".to_string(),
                expected: "int".to_string(),
                actual: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_read_only_property_has_no_setter() {
        let class = ClassBuilder::new("Token")
            .declare(PropertyDecl::new("value", ValueType::Str).read_only(), None)
            .build()
            .unwrap();
        let prop = class.property("value").unwrap();
        assert!(prop.is_readable());
        assert!(!prop.is_writable());
    }

    #[test]
    fn test_constructibility_inherited() {
        let sealed = ClassBuilder::new("Sealed")
            .without_default_constructor()
            .build()
            .unwrap();
        let derived = ClassBuilder::new("Derived").extends(&sealed).build().unwrap();

        assert!(!sealed.is_constructible());
        assert!(!derived.is_constructible());
        assert_eq!(
            sealed.instantiate().unwrap_err(),
            AccessError::NotConstructible {
                class: "Sealed".to_string()
            }
        );
    }

    #[test]
    fn test_instantiate_uses_initial_values() {
        let class = ClassBuilder::new("Counter")
            .property_with("count", ValueType::Int, 5)
            .property("label", ValueType::Str)
            .build()
            .unwrap();

        let obj = class.instantiate().unwrap();
        assert_eq!(obj.get("count").unwrap(), Value::Int(5));
        assert_eq!(obj.get("label").unwrap(), Value::str(""));
    }

    #[test]
    fn test_class_ids_unique() {
        let a = Class::root("object");
        let b = Class::root("object");
        assert_ne!(a.id(), b.id());
    }
}
