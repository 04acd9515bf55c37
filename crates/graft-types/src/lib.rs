//! Graft Declarations
//!
//! Value types, property declarations and capability interfaces consumed by
//! the runtime in `graft-core`.

#![warn(missing_docs)]

pub mod error;
pub mod interface;
pub mod property;
pub mod ty;

pub use error::{DeclarationError, DeclarationResult};
pub use interface::{CapabilityBuilder, CapabilityInterface};
pub use property::{PropertyDecl, Visibility};
pub use ty::ValueType;
