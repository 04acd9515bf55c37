//! Registry configuration

use serde::{Deserialize, Serialize};

/// Options for a [`TypeRegistry`](crate::TypeRegistry)
///
/// Deserializable with every field optional, so a host application can
/// embed it in its own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Name of the member-less root class used when extending an absent source
    pub root_class_name: String,

    /// Separator between base and capability names in composite class names
    pub type_name_separator: String,

    /// Prefix of the private backing field generated for each capability property
    pub backing_field_prefix: String,

    /// Number of cache entries to reserve up front
    pub initial_capacity: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            root_class_name: "object".to_string(),
            type_name_separator: "_".to_string(),
            backing_field_prefix: "_".to_string(),
            initial_capacity: 0,
        }
    }
}

impl RegistryOptions {
    /// Options with a custom root class name
    pub fn with_root_class_name(name: impl Into<String>) -> Self {
        Self {
            root_class_name: name.into(),
            ..Default::default()
        }
    }

    /// Options with a custom composite name separator
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            type_name_separator: separator.into(),
            ..Default::default()
        }
    }

    /// Options reserving room for `capacity` composite types
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            ..Default::default()
        }
    }
}
