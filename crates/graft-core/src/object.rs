//! Object model: instances, shared handles and capability views

use std::fmt;
use std::sync::Arc;

use graft_types::CapabilityInterface;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::class::{Class, ClassId, PropertyInfo};
use crate::error::{AccessError, AccessResult};
use crate::value::Value;

/// Object instance
///
/// Owns one slot per field of its class. Instances carry no internal
/// synchronization; wrap one in an [`ObjectRef`] to share it.
#[derive(Debug)]
pub struct Object {
    class: Arc<Class>,
    slots: Vec<Value>,
}

impl Object {
    pub(crate) fn from_parts(class: Arc<Class>, slots: Vec<Value>) -> Self {
        debug_assert_eq!(slots.len(), class.field_count());
        Self { class, slots }
    }

    /// Get the object's class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Get the object's class ID
    pub fn class_id(&self) -> ClassId {
        self.class.id()
    }

    /// Whether the object's class is `class_name` or derives from it
    pub fn is_instance_of(&self, class_name: &str) -> bool {
        self.class.is_subclass_of(class_name)
    }

    /// Whether the object's class implements the named capability
    pub fn implements(&self, capability: &str) -> bool {
        self.class.implements(capability)
    }

    /// Read a public property
    pub fn get(&self, name: &str) -> AccessResult<Value> {
        let prop = self.public_property(name)?;
        let getter = prop.getter.ok_or_else(|| AccessError::NotReadable {
            class: self.class.name().to_string(),
            property: name.to_string(),
        })?;
        Ok(getter.get(&self.slots))
    }

    /// Write a public property
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> AccessResult<()> {
        let value = value.into();
        let prop = self.public_property(name)?;
        let setter = prop.setter.ok_or_else(|| AccessError::NotWritable {
            class: self.class.name().to_string(),
            property: name.to_string(),
        })?;
        check_type(&self.class, prop, &value)?;
        setter.set(&mut self.slots, value);
        Ok(())
    }

    /// Public properties that have a getter
    pub fn readable_properties(&self) -> impl Iterator<Item = &PropertyInfo> {
        self.class
            .properties()
            .iter()
            .filter(|p| p.is_public() && p.is_readable())
    }

    /// View the object through a capability it implements
    pub fn as_capability<'a>(
        &'a self,
        capability: &'a CapabilityInterface,
    ) -> AccessResult<CapabilityRef<'a>> {
        self.ensure_implements(capability)?;
        Ok(CapabilityRef {
            object: self,
            capability,
        })
    }

    /// Mutable view through a capability the object implements
    pub fn as_capability_mut<'a>(
        &'a mut self,
        capability: &'a CapabilityInterface,
    ) -> AccessResult<CapabilityMut<'a>> {
        self.ensure_implements(capability)?;
        Ok(CapabilityMut {
            object: self,
            capability,
        })
    }

    /// Wrap the object in a shared handle
    pub fn into_shared(self) -> ObjectRef {
        ObjectRef::new(self)
    }

    /// Read a property through its getter, ignoring visibility
    pub(crate) fn read(&self, prop: &PropertyInfo) -> Option<Value> {
        prop.getter.map(|getter| getter.get(&self.slots))
    }

    fn public_property(&self, name: &str) -> AccessResult<&PropertyInfo> {
        let prop = self
            .class
            .property(name)
            .ok_or_else(|| AccessError::UnknownProperty {
                class: self.class.name().to_string(),
                property: name.to_string(),
            })?;
        if !prop.is_public() {
            return Err(AccessError::NotVisible {
                class: self.class.name().to_string(),
                property: name.to_string(),
            });
        }
        Ok(prop)
    }

    fn ensure_implements(&self, capability: &CapabilityInterface) -> AccessResult<()> {
        if self.class.implements(capability.name()) {
            Ok(())
        } else {
            Err(AccessError::NotImplemented {
                class: self.class.name().to_string(),
                capability: capability.name().to_string(),
            })
        }
    }
}

fn check_type(class: &Class, prop: &PropertyInfo, value: &Value) -> AccessResult<()> {
    if value.conforms_to(&prop.value_type) {
        Ok(())
    } else {
        Err(AccessError::TypeMismatch {
            class: class.name().to_string(),
            property: prop.name.clone(),
            expected: prop.value_type.to_string(),
            actual: value.type_name().to_string(),
        })
    }
}

fn bound_property<'c>(
    class: &'c Class,
    capability: &CapabilityInterface,
    name: &str,
) -> AccessResult<&'c PropertyInfo> {
    class
        .binding(capability.name())
        .zip(capability.property_index(name))
        .and_then(|(binding, i)| binding.get(i))
        .map(|&index| &class.properties()[index])
        .ok_or_else(|| AccessError::UnknownProperty {
            class: capability.name().to_string(),
            property: name.to_string(),
        })
}

/// Read-only view of an object as a capability
///
/// Only the capability's properties are reachable, with the capability's
/// own readable flags.
#[derive(Debug)]
pub struct CapabilityRef<'a> {
    object: &'a Object,
    capability: &'a CapabilityInterface,
}

impl<'a> CapabilityRef<'a> {
    /// The capability this view exposes
    pub fn capability(&self) -> &CapabilityInterface {
        self.capability
    }

    /// The underlying object
    pub fn object(&self) -> &Object {
        self.object
    }

    /// Read a capability property
    pub fn get(&self, name: &str) -> AccessResult<Value> {
        read_bound(self.object, self.capability, name)
    }
}

/// Read-write view of an object as a capability
#[derive(Debug)]
pub struct CapabilityMut<'a> {
    object: &'a mut Object,
    capability: &'a CapabilityInterface,
}

impl<'a> CapabilityMut<'a> {
    /// The capability this view exposes
    pub fn capability(&self) -> &CapabilityInterface {
        self.capability
    }

    /// Read a capability property
    pub fn get(&self, name: &str) -> AccessResult<Value> {
        read_bound(&*self.object, self.capability, name)
    }

    /// Write a capability property
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> AccessResult<()> {
        let value = value.into();
        let writable = self
            .capability
            .property(name)
            .map_or(true, |decl| decl.writable);
        if !writable {
            return Err(AccessError::NotWritable {
                class: self.capability.name().to_string(),
                property: name.to_string(),
            });
        }

        let class = Arc::clone(&self.object.class);
        let prop = bound_property(&class, self.capability, name)?;
        let setter = prop.setter.ok_or_else(|| AccessError::NotWritable {
            class: class.name().to_string(),
            property: name.to_string(),
        })?;
        check_type(&class, prop, &value)?;
        setter.set(&mut self.object.slots, value);
        Ok(())
    }
}

fn read_bound(object: &Object, capability: &CapabilityInterface, name: &str) -> AccessResult<Value> {
    let readable = capability.property(name).map_or(true, |decl| decl.readable);
    if !readable {
        return Err(AccessError::NotReadable {
            class: capability.name().to_string(),
            property: name.to_string(),
        });
    }
    let prop = bound_property(&object.class, capability, name)?;
    object.read(prop).ok_or_else(|| AccessError::NotReadable {
        class: object.class.name().to_string(),
        property: name.to_string(),
    })
}

/// Shared, lockable handle to an object
///
/// The class is kept outside the lock: an object's class never changes, and
/// type checks against a referenced object must not take its lock.
#[derive(Clone)]
pub struct ObjectRef(Arc<SharedObject>);

struct SharedObject {
    class: Arc<Class>,
    cell: RwLock<Object>,
}

impl ObjectRef {
    /// Wrap an object
    pub fn new(object: Object) -> Self {
        ObjectRef(Arc::new(SharedObject {
            class: Arc::clone(&object.class),
            cell: RwLock::new(object),
        }))
    }

    /// The referenced object's class
    pub fn class(&self) -> &Arc<Class> {
        &self.0.class
    }

    /// Lock for reading
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.cell.read()
    }

    /// Lock for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.cell.write()
    }

    /// Whether both handles point at the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.0.class.name(), Arc::as_ptr(&self.0))
    }
}
