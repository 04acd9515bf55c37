//! Composite type registry
//!
//! Maps (base class, capability) keys to synthesized composite types. Each
//! key is built at most once per successful build: the map entry holds a
//! `OnceCell` that concurrent callers for the same key initialize together,
//! with exactly one of them running the synthesizer while the rest wait on
//! that cell only. A failed build leaves the cell empty, so the next caller
//! runs the synthesizer again; the last caller to fail on a cell removes
//! its entry.
//!
//! The shard lock of the map is held only long enough to fetch or insert
//! the cell, never during a build, so different keys never wait on each
//! other.
//!
//! Published entries are never evicted. The number of distinct keys is
//! bounded by the (class, capability) pairs a program uses, not by traffic.

use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use graft_types::CapabilityInterface;
use once_cell::sync::OnceCell;
use rustc_hash::FxHasher;
use tracing::{debug, trace, warn};

use crate::builder::{CompositeTypeBuilder, Synthesizer};
use crate::class::Class;
use crate::error::{AccessResult, BuildResult, ExtendResult};
use crate::facade;
use crate::object::Object;
use crate::options::RegistryOptions;

/// Cache key: (base class name, capability name)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    base: Arc<str>,
    capability: Arc<str>,
}

impl CompositeKey {
    /// Create a key from names
    pub fn new(base: &str, capability: &str) -> Self {
        Self {
            base: Arc::from(base),
            capability: Arc::from(capability),
        }
    }

    /// Key for grafting `capability` onto `base`
    pub fn of(base: &Class, capability: &CapabilityInterface) -> Self {
        Self::new(base.name(), capability.name())
    }

    /// Base class name
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Capability name
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Name of the composite class for this key
    pub fn composite_name(&self, separator: &str) -> String {
        format!("{}{}{}", self.base, separator, self.capability)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.base, self.capability)
    }
}

/// Handle to a published composite type
#[derive(Debug, Clone)]
pub struct CompositeType {
    key: CompositeKey,
    class: Arc<Class>,
}

impl CompositeType {
    /// The key this type was built for
    pub fn key(&self) -> &CompositeKey {
        &self.key
    }

    /// The synthesized class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Composite class name
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Create a fresh instance with all slots at their initial values
    pub fn instantiate(&self) -> AccessResult<Object> {
        self.class.instantiate()
    }

    /// Whether both handles refer to the same published type
    pub fn ptr_eq(&self, other: &CompositeType) -> bool {
        Arc::ptr_eq(&self.class, &other.class)
    }
}

/// Registry counters
#[derive(Debug, Default)]
struct RegistryCounters {
    hits: AtomicU64,
    builds: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of the registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Resolutions answered by an already published type
    pub hits: u64,
    /// Successful synthesizer runs
    pub builds: u64,
    /// Failed synthesizer runs
    pub failures: u64,
}

type BuildSlot = Arc<OnceCell<CompositeType>>;
type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Registry of synthesized composite types
///
/// Owned by the application and shared by reference; every test can build
/// its own.
pub struct TypeRegistry<S = CompositeTypeBuilder> {
    options: RegistryOptions,
    root: Arc<Class>,
    types: DashMap<CompositeKey, BuildSlot, FxBuildHasher>,
    synthesizer: S,
    counters: RegistryCounters,
}

impl TypeRegistry<CompositeTypeBuilder> {
    /// Create a registry with default options
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Create a registry with the default synthesizer
    pub fn with_options(options: RegistryOptions) -> Self {
        let synthesizer = CompositeTypeBuilder::new(options.backing_field_prefix.clone());
        Self::with_synthesizer(options, synthesizer)
    }
}

impl Default for TypeRegistry<CompositeTypeBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Synthesizer> TypeRegistry<S> {
    /// Create a registry with a custom synthesizer
    pub fn with_synthesizer(options: RegistryOptions, synthesizer: S) -> Self {
        let root = Arc::new(Class::root(options.root_class_name.clone()));
        let types = DashMap::with_capacity_and_hasher(options.initial_capacity, FxBuildHasher::default());
        Self {
            options,
            root,
            types,
            synthesizer,
            counters: RegistryCounters::default(),
        }
    }

    /// Options the registry was created with
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// The member-less root class
    pub fn root_class(&self) -> &Arc<Class> {
        &self.root
    }

    /// The synthesizer invoked for cache misses
    pub fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    /// Return the composite type for (`base`, `capability`), building it on
    /// first request
    pub fn resolve_or_build(
        &self,
        base: &Arc<Class>,
        capability: &Arc<CapabilityInterface>,
    ) -> BuildResult<CompositeType> {
        let key = CompositeKey::of(base, capability);

        if let Some(published) = self.lookup(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "composite type cache hit");
            return Ok(published);
        }

        // Clone the cell out so the shard guard is released before building.
        let slot: BuildSlot = self.types.entry(key.clone()).or_default().value().clone();

        let mut built_here = false;
        let published = slot
            .get_or_try_init(|| {
                built_here = true;
                self.build(&key, base, capability)
            })
            .cloned();

        match published {
            Ok(published) => {
                if !built_here {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(key = %key, "composite type published by concurrent build");
                }
                Ok(published)
            }
            Err(err) => {
                self.discard_empty(&key, slot);
                Err(err)
            }
        }
    }

    /// Published composite type for `key`, without building
    pub fn lookup(&self, key: &CompositeKey) -> Option<CompositeType> {
        self.types
            .get(key)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Extend `source` with `capability`; see [`facade::extend`]
    pub fn extend(
        &self,
        source: Option<&Object>,
        capability: &Arc<CapabilityInterface>,
    ) -> ExtendResult<Object> {
        facade::extend(self, source, capability)
    }

    /// Number of published composite types
    pub fn len(&self) -> usize {
        self.types
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Whether no composite type has been published
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of all published composite types
    pub fn keys(&self) -> Vec<CompositeKey> {
        self.types
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Snapshot of the registry counters
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Drop the entry for `key` if it still holds `slot`, empty and with no
    /// other caller holding it.
    ///
    /// Every caller releases its handle before trying, so the last caller to
    /// fail on a cell is the one that removes it.
    fn discard_empty(&self, key: &CompositeKey, slot: BuildSlot) {
        let cell_ptr = Arc::as_ptr(&slot);
        drop(slot);
        let removed = self.types.remove_if(key, |_, cell| {
            Arc::as_ptr(cell) == cell_ptr && cell.get().is_none() && Arc::strong_count(cell) == 1
        });
        if removed.is_some() {
            trace!(key = %key, "discarded failed build entry");
        }
    }

    fn build(
        &self,
        key: &CompositeKey,
        base: &Arc<Class>,
        capability: &Arc<CapabilityInterface>,
    ) -> BuildResult<CompositeType> {
        let name = key.composite_name(&self.options.type_name_separator);
        debug!(
            composite = %name,
            base = base.name(),
            capability = capability.name(),
            "synthesizing composite type"
        );

        match self.synthesizer.build(&name, base, capability) {
            Ok(class) => {
                self.counters.builds.fetch_add(1, Ordering::Relaxed);
                debug!(
                    composite = %name,
                    class_id = class.id().as_u64(),
                    fields = class.field_count(),
                    "published composite type"
                );
                Ok(CompositeType {
                    key: key.clone(),
                    class: Arc::new(class),
                })
            }
            Err(err) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(composite = %name, error = %err, "composite type build failed");
                Err(err)
            }
        }
    }
}

impl<S> fmt::Debug for TypeRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("options", &self.options)
            .field("root", &self.root.name())
            .field("entries", &self.types.len())
            .finish()
    }
}
