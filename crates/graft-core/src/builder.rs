//! Composite type builder
//!
//! Grafts a capability interface onto a base class: the new class inherits
//! the base layout, appends one private backing slot per capability
//! property, and binds a bare getter/setter pair on that slot as the
//! implementation of the property.

use std::sync::Arc;

use graft_types::{CapabilityInterface, Visibility};
use tracing::trace;

use crate::class::{Class, ClassId, FieldInfo, PropertyInfo, SlotAccessor};
use crate::error::{BuildError, BuildResult};

/// Synthesizes composite classes for the registry
///
/// Called at most once per successful (base, capability) pair. A failed
/// build may be attempted again on a later request.
pub trait Synthesizer: Send + Sync {
    /// Build the class named `name` deriving from `base` and implementing `capability`
    fn build(
        &self,
        name: &str,
        base: &Arc<Class>,
        capability: &Arc<CapabilityInterface>,
    ) -> BuildResult<Class>;
}

/// Default synthesizer: storage-backed accessors, no extra behavior
#[derive(Debug, Clone)]
pub struct CompositeTypeBuilder {
    backing_field_prefix: String,
}

impl CompositeTypeBuilder {
    /// Create a builder naming backing fields `<prefix><lowercased property>`
    pub fn new(backing_field_prefix: impl Into<String>) -> Self {
        Self {
            backing_field_prefix: backing_field_prefix.into(),
        }
    }

    fn backing_field_name<'f>(
        &self,
        mut taken: impl Iterator<Item = &'f FieldInfo>,
        property: &str,
        slot: usize,
    ) -> String {
        let name = format!("{}{}", self.backing_field_prefix, property.to_lowercase());
        // Two properties differing only in case would share a field name.
        if taken.any(|f| f.name == name) {
            format!("{}_{}", name, slot)
        } else {
            name
        }
    }
}

impl Default for CompositeTypeBuilder {
    fn default() -> Self {
        Self::new("_")
    }
}

impl Synthesizer for CompositeTypeBuilder {
    fn build(
        &self,
        name: &str,
        base: &Arc<Class>,
        capability: &Arc<CapabilityInterface>,
    ) -> BuildResult<Class> {
        if !base.is_constructible() {
            return Err(BuildError::UnconstructableBaseType {
                base: base.name().to_string(),
            });
        }

        let class_id = ClassId::next();
        let first_slot = base.field_count();
        let mut members = Vec::with_capacity(capability.len());

        for (offset, decl) in capability.properties().iter().enumerate() {
            if decl.value_type.is_capability() {
                return Err(BuildError::UnsupportedValueType {
                    capability: capability.name().to_string(),
                    property: decl.name.clone(),
                    value_type: decl.value_type.to_string(),
                });
            }
            if base.property(&decl.name).is_some() {
                return Err(BuildError::NameCollision {
                    base: base.name().to_string(),
                    capability: capability.name().to_string(),
                    property: decl.name.clone(),
                });
            }

            let slot = first_slot + offset;
            let accessor = SlotAccessor::new(slot);
            let taken = base.fields().iter().chain(members.iter().map(|(f, _)| f));
            let field = FieldInfo {
                name: self.backing_field_name(taken, &decl.name, slot),
                value_type: decl.value_type.clone(),
                initial_value: None,
                declaring_class: class_id,
                slot,
            };
            let property = PropertyInfo {
                name: decl.name.clone(),
                value_type: decl.value_type.clone(),
                visibility: Visibility::Public,
                getter: Some(accessor),
                setter: Some(accessor),
                declaring_class: class_id,
            };

            trace!(
                class = name,
                property = %decl.name,
                field = %field.name,
                slot,
                "bound storage-backed property"
            );
            members.push((field, property));
        }

        Ok(Class::composite(
            name.to_string(),
            base,
            capability,
            members,
            class_id,
        ))
    }
}
