//! Extension facade
//!
//! `extend` produces a new instance of the composite (source class,
//! capability) type carrying the source's public values. The source is
//! left untouched.

use std::sync::Arc;

use graft_types::CapabilityInterface;
use tracing::trace;

use crate::builder::Synthesizer;
use crate::error::{AccessResult, ExtendResult};
use crate::object::Object;
use crate::registry::TypeRegistry;

/// Extend `source` with `capability`
///
/// The result is an instance of a class deriving from the source's class
/// (or the registry's root class when `source` is `None`) that also
/// implements `capability`. Capability properties start at their defaults.
pub fn extend<S: Synthesizer>(
    registry: &TypeRegistry<S>,
    source: Option<&Object>,
    capability: &Arc<CapabilityInterface>,
) -> ExtendResult<Object> {
    let base = source.map_or(registry.root_class(), |object| object.class());
    let composite = registry.resolve_or_build(base, capability)?;
    let mut extended = composite.instantiate()?;

    if let Some(source) = source {
        let copied = copy_values(source, &mut extended)?;
        trace!(
            source = source.class().name(),
            composite = composite.name(),
            copied,
            "copied source values"
        );
    }

    Ok(extended)
}

/// Copy every public readable property of `source` into the same-named
/// public writable property of `dest`
///
/// Reference values are shared, not cloned. Returns the number of
/// properties copied.
pub fn copy_values(source: &Object, dest: &mut Object) -> AccessResult<usize> {
    let mut copied = 0;
    for prop in source.readable_properties() {
        let writable = dest
            .class()
            .property(&prop.name)
            .map_or(false, |target| target.is_public() && target.is_writable());
        if !writable {
            continue;
        }
        if let Some(value) = source.read(prop) {
            dest.set(&prop.name, value)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Method-call form of [`extend`]
pub trait ExtendWith {
    /// Extend `self` with `capability`
    fn extend_with<S: Synthesizer>(
        &self,
        registry: &TypeRegistry<S>,
        capability: &Arc<CapabilityInterface>,
    ) -> ExtendResult<Object>;
}

impl ExtendWith for Object {
    fn extend_with<S: Synthesizer>(
        &self,
        registry: &TypeRegistry<S>,
        capability: &Arc<CapabilityInterface>,
    ) -> ExtendResult<Object> {
        extend(registry, Some(self), capability)
    }
}
