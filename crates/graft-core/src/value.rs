//! Runtime values stored in object slots
//!
//! Scalars (`Int`, `Float`, `Bool`, `Timestamp`) are stored inline. `Str` and
//! `Bytes` are immutable and cheaply shared. `List`, `Map` and `Object` are
//! shared reference cells: cloning a `Value` clones the handle, never the
//! referent, and two such values compare equal only when they point at the
//! same cell.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use graft_types::ValueType;
use parking_lot::RwLock;

use crate::object::ObjectRef;

/// A dynamically typed property value
#[derive(Clone)]
pub enum Value {
    /// Absent value (for optional and reference types)
    Null,
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Immutable string
    Str(Arc<str>),
    /// Immutable byte buffer
    Bytes(Arc<[u8]>),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Shared list
    List(ListRef),
    /// Shared string-keyed map
    Map(MapRef),
    /// Shared object
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Create a bytes value
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Value::Bytes(Arc::from(b.as_ref()))
    }

    /// The zero value for a type.
    ///
    /// Lists and maps get a fresh, empty cell on every call so that no two
    /// slots ever share a default collection.
    pub fn default_for(ty: &ValueType) -> Self {
        match ty {
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Str => Value::Str(Arc::from("")),
            ValueType::Bytes => Value::Bytes(Arc::from(&[][..])),
            ValueType::Timestamp => Value::Timestamp(DateTime::<Utc>::default()),
            ValueType::List(_) => Value::List(ListRef::new()),
            ValueType::Map(_) => Value::Map(MapRef::new()),
            ValueType::Optional(_) | ValueType::Object(_) | ValueType::Capability(_) => Value::Null,
        }
    }

    /// Whether this value may be stored in a slot of type `ty`.
    ///
    /// List elements and map values are checked one level deep; a nested
    /// collection is checked by shape only. `Null` fits optional, object and
    /// capability slots.
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Value::List(list), ValueType::List(inner)) => {
                list.0.read().iter().all(|v| v.conforms_shallow(inner))
            }
            (Value::Map(map), ValueType::Map(inner)) => {
                map.0.read().values().all(|v| v.conforms_shallow(inner))
            }
            (value, ValueType::Optional(inner)) if !value.is_null() => value.conforms_to(inner),
            _ => self.conforms_shallow(ty),
        }
    }

    fn conforms_shallow(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Value::Int(_), ValueType::Int)
            | (Value::Float(_), ValueType::Float)
            | (Value::Bool(_), ValueType::Bool)
            | (Value::Str(_), ValueType::Str)
            | (Value::Bytes(_), ValueType::Bytes)
            | (Value::Timestamp(_), ValueType::Timestamp)
            | (Value::List(_), ValueType::List(_))
            | (Value::Map(_), ValueType::Map(_)) => true,
            (Value::Null, ValueType::Optional(_))
            | (Value::Null, ValueType::Object(_))
            | (Value::Null, ValueType::Capability(_)) => true,
            (value, ValueType::Optional(inner)) => value.conforms_shallow(inner),
            (Value::Object(obj), ValueType::Object(class_name)) => {
                obj.class().is_subclass_of(class_name)
            }
            (Value::Object(obj), ValueType::Capability(iface)) => obj.class().implements(iface),
            _ => false,
        }
    }

    /// Copy used when an initial value seeds a new instance.
    ///
    /// Lists and maps are re-created (elements shared) so instances never
    /// share a collection through a class-level initializer.
    pub(crate) fn fresh_copy(&self) -> Self {
        match self {
            Value::List(list) => Value::List(ListRef::from_vec(list.to_vec())),
            Value::Map(map) => Value::Map(MapRef::from_map(map.to_map())),
            other => other.clone(),
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Extract a byte slice
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(&**b),
            _ => None,
        }
    }

    /// Extract a timestamp
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extract a list handle
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Extract a map handle
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Extract an object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "int({})", i),
            Value::Float(x) => write!(f, "float({})", x),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::Str(s) => write!(f, "string({:?})", s),
            Value::Bytes(b) => write!(f, "bytes(len={})", b.len()),
            Value::Timestamp(t) => write!(f, "timestamp({})", t.to_rfc3339()),
            Value::List(l) => fmt::Debug::fmt(l, f),
            Value::Map(m) => fmt::Debug::fmt(m, f),
            Value::Object(o) => fmt::Debug::fmt(o, f),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Arc::from(b))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<ListRef> for Value {
    fn from(l: ListRef) -> Self {
        Value::List(l)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Value::Map(m)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Shared, growable list
#[derive(Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing elements
    pub fn from_vec(elements: Vec<Value>) -> Self {
        ListRef(Arc::new(RwLock::new(elements)))
    }

    /// Append an element
    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    /// Get element at index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace element at index, returning false when out of bounds
    pub fn set(&self, index: usize, value: impl Into<Value>) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Get list length
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if list is empty
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Whether both handles point at the same list
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ListRef {
    // Elements are not printed: a list may contain an object that refers back to it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list@{:p}(len={})", Arc::as_ptr(&self.0), self.len())
    }
}

/// Shared map with string keys, iterated in key order
#[derive(Clone, Default)]
pub struct MapRef(Arc<RwLock<BTreeMap<String, Value>>>);

impl MapRef {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing entries
    pub fn from_map(entries: BTreeMap<String, Value>) -> Self {
        MapRef(Arc::new(RwLock::new(entries)))
    }

    /// Insert an entry, returning the previous value
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().insert(key.into(), value.into())
    }

    /// Get value by key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Remove an entry
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().remove(key)
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if map is empty
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Keys in order
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Snapshot of the entries
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.0.read().clone()
    }

    /// Whether both handles point at the same map
    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map@{:p}(len={})", Arc::as_ptr(&self.0), self.len())
    }
}
