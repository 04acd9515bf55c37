//! End-to-end behavior of the extend facade

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use graft_core::{
    extend, CapabilityInterface, Class, ClassBuilder, ExtendWith, ListRef, MapRef, TypeRegistry,
    Value, ValueType,
};

fn foo() -> Arc<Class> {
    ClassBuilder::new("Foo")
        .property("name", ValueType::Str)
        .build()
        .unwrap()
}

fn client_id() -> Arc<CapabilityInterface> {
    CapabilityInterface::builder("IClientId")
        .property("ClientId", ValueType::Int)
        .build()
        .unwrap()
}

fn tenant() -> Arc<CapabilityInterface> {
    CapabilityInterface::builder("ITenant")
        .property("Tenant", ValueType::Str)
        .build()
        .unwrap()
}

fn named_foo(name: &str) -> graft_core::Object {
    let mut obj = foo().instantiate().unwrap();
    obj.set("name", name).unwrap();
    obj
}

#[test]
fn test_bare_instance_round_trip() {
    let registry = TypeRegistry::new();
    let iface = client_id();

    let mut extended = extend(&registry, None, &iface).unwrap();
    extended
        .as_capability_mut(&iface)
        .unwrap()
        .set("ClientId", 10)
        .unwrap();

    let view = extended.as_capability(&iface).unwrap();
    assert_eq!(view.get("ClientId").unwrap(), Value::Int(10));
}

#[test]
fn test_two_sources_stay_isolated() {
    let registry = TypeRegistry::new();
    let iface = client_id();

    let bob = named_foo("Bob");
    let fred = named_foo("Fred");
    let mut bob_ext = bob.extend_with(&registry, &iface).unwrap();
    let mut fred_ext = fred.extend_with(&registry, &iface).unwrap();
    bob_ext.set("ClientId", 10).unwrap();
    fred_ext.set("ClientId", 11).unwrap();

    assert!(Arc::ptr_eq(bob_ext.class(), fred_ext.class()));
    assert_eq!(registry.len(), 1);

    assert_eq!(bob_ext.get("name").unwrap(), Value::str("Bob"));
    assert_eq!(bob_ext.get("ClientId").unwrap(), Value::Int(10));
    assert_eq!(fred_ext.get("name").unwrap(), Value::str("Fred"));
    assert_eq!(fred_ext.get("ClientId").unwrap(), Value::Int(11));
}

#[test]
fn test_extended_is_distinct_from_source() {
    let registry = TypeRegistry::new();
    let mut source = named_foo("Bob");
    let mut extended = source.extend_with(&registry, &client_id()).unwrap();

    extended.set("name", "Robert").unwrap();
    source.set("name", "Bobby").unwrap();

    assert_eq!(source.get("name").unwrap(), Value::str("Bobby"));
    assert_eq!(extended.get("name").unwrap(), Value::str("Robert"));
    assert!(source.get("ClientId").is_err());
}

#[test]
fn test_values_preserved_capability_defaulted() {
    let registry = TypeRegistry::new();
    let account = ClassBuilder::new("Account")
        .property("owner", ValueType::Str)
        .property("balance", ValueType::Float)
        .property("active", ValueType::Bool)
        .build()
        .unwrap();
    let mut source = account.instantiate().unwrap();
    source.set("owner", "Alice").unwrap();
    source.set("balance", 12.5).unwrap();
    source.set("active", true).unwrap();

    let extended = source.extend_with(&registry, &client_id()).unwrap();

    for prop in source.readable_properties() {
        assert_eq!(
            extended.get(&prop.name).unwrap(),
            source.get(&prop.name).unwrap(),
            "property {}",
            prop.name
        );
    }
    assert_eq!(extended.get("ClientId").unwrap(), Value::Int(0));
}

#[test]
fn test_chained_facets_are_independent() {
    let registry = TypeRegistry::new();
    let ids = client_id();
    let tenants = tenant();

    let source = named_foo("Bob");
    let once = source.extend_with(&registry, &ids).unwrap();
    let mut twice = once.extend_with(&registry, &tenants).unwrap();

    assert!(twice.is_instance_of("Foo"));
    assert!(twice.is_instance_of("Foo_IClientId"));
    assert!(twice.implements("IClientId"));
    assert!(twice.implements("ITenant"));

    twice.set("name", "Fred").unwrap();
    twice.as_capability_mut(&ids).unwrap().set("ClientId", 42).unwrap();
    twice
        .as_capability_mut(&tenants)
        .unwrap()
        .set("Tenant", "acme")
        .unwrap();

    assert_eq!(twice.get("name").unwrap(), Value::str("Fred"));
    assert_eq!(
        twice.as_capability(&ids).unwrap().get("ClientId").unwrap(),
        Value::Int(42)
    );
    assert_eq!(
        twice.as_capability(&tenants).unwrap().get("Tenant").unwrap(),
        Value::str("acme")
    );
}

#[test]
fn test_chaining_keeps_earlier_capability_values() {
    let registry = TypeRegistry::new();
    let mut once = named_foo("Bob").extend_with(&registry, &client_id()).unwrap();
    once.set("ClientId", 7).unwrap();

    let twice = once.extend_with(&registry, &tenant()).unwrap();
    assert_eq!(twice.get("ClientId").unwrap(), Value::Int(7));
    assert_eq!(twice.get("Tenant").unwrap(), Value::str(""));
}

#[test]
fn test_copy_is_shallow() {
    let registry = TypeRegistry::new();
    let holder = ClassBuilder::new("Holder")
        .property("items", ValueType::list(ValueType::Int))
        .build()
        .unwrap();
    let source = holder.instantiate().unwrap();
    let items = source.get("items").unwrap().as_list().cloned().unwrap();
    items.push(1);

    let extended = source.extend_with(&registry, &client_id()).unwrap();
    let shared = extended.get("items").unwrap().as_list().cloned().unwrap();
    assert!(shared.ptr_eq(&items));

    shared.push(2);
    assert_eq!(items.to_vec(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_instances_do_not_share_default_collections() {
    let registry = TypeRegistry::new();
    let tags = CapabilityInterface::builder("ITags")
        .property("tags", ValueType::list(ValueType::Str))
        .build()
        .unwrap();

    let a = extend(&registry, None, &tags).unwrap();
    let b = extend(&registry, None, &tags).unwrap();
    let a_tags = a.get("tags").unwrap();
    let b_tags = b.get("tags").unwrap();
    assert!(!a_tags.as_list().unwrap().ptr_eq(b_tags.as_list().unwrap()));
}

fn type_test() -> Arc<CapabilityInterface> {
    CapabilityInterface::builder("ITypeTest")
        .property("Int", ValueType::Int)
        .property("Float", ValueType::Float)
        .property("Text", ValueType::Str)
        .property("Blob", ValueType::Bytes)
        .property("When", ValueType::Timestamp)
        .property("MaybeInt", ValueType::optional(ValueType::Int))
        .property("Ints", ValueType::list(ValueType::Int))
        .property("Children", ValueType::list(ValueType::capability("ITypeTest")))
        .property("Counts", ValueType::map(ValueType::Int))
        .property("ByName", ValueType::map(ValueType::capability("ITypeTest")))
        .build()
        .unwrap()
}

#[test]
fn test_every_value_type_defaults() {
    let registry = TypeRegistry::new();
    let iface = type_test();
    let obj = extend(&registry, None, &iface).unwrap();
    let view = obj.as_capability(&iface).unwrap();

    assert_eq!(view.get("Int").unwrap(), Value::Int(0));
    assert_eq!(view.get("Float").unwrap(), Value::Float(0.0));
    assert_eq!(view.get("Text").unwrap(), Value::str(""));
    assert_eq!(view.get("Blob").unwrap().as_bytes(), Some(&[][..]));
    assert_eq!(
        view.get("When").unwrap().as_timestamp(),
        Some(Utc.timestamp_opt(0, 0).unwrap())
    );
    assert!(view.get("MaybeInt").unwrap().is_null());
    assert!(view.get("Ints").unwrap().as_list().unwrap().is_empty());
    assert!(view.get("Children").unwrap().as_list().unwrap().is_empty());
    assert!(view.get("Counts").unwrap().as_map().unwrap().is_empty());
    assert!(view.get("ByName").unwrap().as_map().unwrap().is_empty());
}

#[test]
fn test_every_value_type_round_trips() {
    let registry = TypeRegistry::new();
    let iface = type_test();
    let mut obj = extend(&registry, None, &iface).unwrap();
    let child = extend(&registry, None, &iface).unwrap().into_shared();

    let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    let ints = ListRef::from_vec(vec![Value::Int(1), Value::Int(2)]);
    let children = ListRef::from_vec(vec![Value::Object(child.clone())]);
    let counts = MapRef::from_map(BTreeMap::from([("a".to_string(), Value::Int(1))]));
    let by_name = MapRef::new();
    by_name.insert("first", child.clone());

    let values = vec![
        ("Int", Value::Int(-5)),
        ("Float", Value::Float(2.5)),
        ("Text", Value::str("hello")),
        ("Blob", Value::bytes([1u8, 2, 3])),
        ("When", Value::from(when)),
        ("MaybeInt", Value::Int(9)),
        ("Ints", Value::from(ints)),
        ("Children", Value::from(children)),
        ("Counts", Value::from(counts)),
        ("ByName", Value::from(by_name)),
    ];

    {
        let mut view = obj.as_capability_mut(&iface).unwrap();
        for (name, value) in &values {
            view.set(name, value.clone()).unwrap();
        }
    }

    let view = obj.as_capability(&iface).unwrap();
    for (name, value) in &values {
        assert_eq!(&view.get(name).unwrap(), value, "property {}", name);
    }

    obj.set("MaybeInt", Value::Null).unwrap();
    assert!(obj.get("MaybeInt").unwrap().is_null());

    let first = obj.get("ByName").unwrap().as_map().unwrap().get("first").unwrap();
    assert!(first.as_object().unwrap().ptr_eq(&child));
    assert!(first.as_object().unwrap().class().implements("ITypeTest"));
}
