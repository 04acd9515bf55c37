//! Graft core runtime
//!
//! This crate grafts capability interfaces onto existing objects at runtime:
//! - Class descriptors and the object model
//! - Composite type synthesis (base class + capability)
//! - A concurrent, build-once registry of composite types
//! - The `extend` facade that copies an object into its extended form

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod class;
pub mod error;
pub mod facade;
pub mod object;
pub mod options;
pub mod registry;
pub mod value;

pub use builder::{CompositeTypeBuilder, Synthesizer};
pub use class::{Class, ClassBuilder, ClassId, ClassOrigin, FieldInfo, PropertyInfo, SlotAccessor};
pub use error::{AccessError, AccessResult, BuildError, BuildResult, ExtendError, ExtendResult};
pub use facade::{copy_values, extend, ExtendWith};
pub use object::{CapabilityMut, CapabilityRef, Object, ObjectRef};
pub use options::RegistryOptions;
pub use registry::{CompositeKey, CompositeType, RegistryStats, TypeRegistry};
pub use value::{ListRef, MapRef, Value};

pub use graft_types::{CapabilityBuilder, CapabilityInterface, PropertyDecl, ValueType, Visibility};
