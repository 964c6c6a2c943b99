// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::too_many_lines)] // Test code
#![allow(clippy::similar_names)] // Test variable naming

//! Round-trip tests over whole object graphs: cycles, shared objects,
//! every container shape, generic records and polymorphic slots.

use std::sync::Arc;
use xport::{
    ClassSchema, EnumSchema, ExportSession, Graph, ImportSession, Object, PrimitiveKind, Record,
    TypeDescriptor, TypeRef, TypeRegistry, Value,
};

fn prim(kind: PrimitiveKind) -> TypeRef {
    TypeDescriptor::primitive(kind)
}

/// Export every root into one session, import them back in a fresh one.
fn roundtrip(graph: &Graph, roots: &[Value], registry: &Arc<TypeRegistry>) -> (Vec<Value>, Graph) {
    let mut export = ExportSession::new(Vec::new(), Arc::clone(registry));
    for root in roots {
        export.write(graph, root).expect("export");
    }
    let bytes = export.into_inner();

    let mut import = ImportSession::new(bytes.as_slice(), Arc::clone(registry));
    let mut values = Vec::new();
    while let Some(decoded) = import.read().expect("import") {
        assert!(!decoded.is_degraded(), "warnings: {:?}", decoded.warnings());
        values.push(decoded.into_value());
    }
    assert_eq!(values.len(), roots.len());
    (values, import.into_graph())
}

fn node_schema() -> Arc<ClassSchema> {
    ClassSchema::builder("graph.Node")
        .field("label", TypeDescriptor::string())
        .field("next", TypeDescriptor::reflective("graph.Node", false))
        .field("weight", prim(PrimitiveKind::F64))
        .build()
        .expect("node schema")
}

#[test]
fn test_cyclic_records() {
    let schema = node_schema();
    let registry = TypeRegistry::builder().class(Arc::clone(&schema)).build();

    let mut graph = Graph::new();
    let a = graph.record(&schema);
    let b = graph.record(&schema);
    graph.set_field(a, "label", "a").expect("label");
    graph.set_field(b, "label", "b").expect("label");
    graph.set_field(a, "next", b).expect("a -> b");
    graph.set_field(b, "next", a).expect("b -> a");
    graph.set_field(b, "weight", 0.25).expect("weight");

    let (values, decoded) = roundtrip(&graph, &[Value::Ref(a)], &registry);
    assert!(graph.structurally_equal(&Value::Ref(a), &decoded, &values[0]));

    let a2 = values[0].as_object().expect("a");
    let b2 = decoded
        .get_record(a2)
        .and_then(|r| r.get("next"))
        .and_then(Value::as_object)
        .expect("b");
    let back = decoded
        .get_record(b2)
        .and_then(|r| r.get("next"))
        .and_then(Value::as_object);
    assert_eq!(back, Some(a2));
    assert_eq!(
        decoded.get_record(b2).and_then(|r| r.get("weight")).and_then(Value::as_f64),
        Some(0.25)
    );
}

#[test]
fn test_shared_object_across_roots() {
    let mut graph = Graph::new();
    let shared = graph.list(TypeDescriptor::string(), vec![Value::from("x")]);
    let holder = graph.list(TypeDescriptor::any(), vec![shared.clone(), shared.clone()]);

    let (values, decoded) = roundtrip(&graph, &[holder, shared], &TypeRegistry::empty());
    let items = &decoded
        .sequence(values[0].as_object().expect("holder"))
        .expect("list")
        .items;
    assert_eq!(items[0], items[1]);
    assert_eq!(items[0], values[1]);
    // one list for the holder, one for the shared list
    assert_eq!(decoded.len(), 2);
}

#[test]
fn test_every_container_shape() {
    let mut graph = Graph::new();
    let array = graph.array(
        prim(PrimitiveKind::I16),
        vec![Value::I16(-1), Value::I16(300)],
    );
    let set = graph.set(
        TypeDescriptor::string(),
        vec![Value::from("b"), Value::from("a")],
    );
    let dict = graph.dictionary(
        TypeDescriptor::string(),
        TypeDescriptor::any(),
        vec![
            (Value::from("n"), Value::I64(1 << 40)),
            (Value::from("s"), set.clone()),
            (Value::from("none"), Value::Null),
        ],
    );
    let bag = graph.multiset(
        prim(PrimitiveKind::Char),
        vec![(Value::Char(u16::from(b'z')), 3), (Value::Char(0x263a), 1)],
    );
    let nested = graph.list(
        TypeDescriptor::list_of(prim(PrimitiveKind::Bool)),
        Vec::new(),
    );
    let inner = graph.list(
        prim(PrimitiveKind::Bool),
        vec![Value::Bool(true), Value::Bool(false)],
    );
    if let Some(Object::List(seq)) = graph.get_mut(nested.as_object().expect("nested")) {
        seq.items.push(inner);
        seq.items.push(Value::Null);
    }

    let roots = [array, set, dict, bag, nested];
    let (values, decoded) = roundtrip(&graph, &roots, &TypeRegistry::empty());
    for (original, back) in roots.iter().zip(&values) {
        assert!(
            graph.structurally_equal(original, &decoded, back),
            "{} did not survive",
            graph.describe(original)
        );
    }
    match decoded.get(values[3].as_object().expect("bag")) {
        Some(Object::Multiset(m)) => assert_eq!(m.entries[0].1, 3),
        other => panic!("expected multiset, got {:?}", other),
    }
}

#[test]
fn test_polymorphic_slots_box_primitives() {
    let mut graph = Graph::new();
    let mixed = graph.list(
        TypeDescriptor::any(),
        vec![
            Value::I32(7),
            Value::I32(7),
            Value::F32(f32::NAN),
            Value::I8(-8),
            Value::from("7"),
            Value::Null,
        ],
    );

    let (values, decoded) = roundtrip(&graph, &[mixed], &TypeRegistry::empty());
    let items = &decoded
        .sequence(values[0].as_object().expect("list"))
        .expect("items")
        .items;
    assert_eq!(items[0], Value::I32(7));
    assert_eq!(items[1], Value::I32(7));
    assert!(matches!(items[2], Value::F32(v) if v.is_nan()));
    assert_eq!(items[3], Value::I8(-8));
    assert_eq!(items[4], Value::from("7"));
    assert!(items[5].is_null());
}

#[test]
fn test_generic_record_with_nested_arguments() {
    let pair = ClassSchema::builder("util.Pair")
        .type_params(2)
        .field("left", TypeDescriptor::param(0))
        .field("right", TypeDescriptor::param(1))
        .build()
        .expect("pair");
    let registry = TypeRegistry::builder().class(Arc::clone(&pair)).build();

    let mut graph = Graph::new();
    let numbers = graph.list(prim(PrimitiveKind::I64), vec![Value::I64(1), Value::I64(2)]);
    let mut record = Record::with_type_args(
        Arc::clone(&pair),
        vec![TypeDescriptor::string(), TypeDescriptor::list_of(prim(PrimitiveKind::I64))],
    );
    if let Some(slot) = record.field_mut(0) {
        *slot = Value::from("ids");
    }
    if let Some(slot) = record.field_mut(1) {
        *slot = numbers;
    }
    let first = Value::Ref(graph.alloc(Object::Record(record)));

    // same instantiation again: type and field ids are all back-references
    let mut again = Record::with_type_args(
        Arc::clone(&pair),
        vec![TypeDescriptor::string(), TypeDescriptor::list_of(prim(PrimitiveKind::I64))],
    );
    if let Some(slot) = again.field_mut(0) {
        *slot = Value::from("ids");
    }
    let second = Value::Ref(graph.alloc(Object::Record(again)));

    let (values, decoded) = roundtrip(&graph, &[first.clone(), second.clone()], &registry);
    assert!(graph.structurally_equal(&first, &decoded, &values[0]));
    assert!(graph.structurally_equal(&second, &decoded, &values[1]));
    let record = decoded
        .get_record(values[0].as_object().expect("pair"))
        .expect("record");
    assert_eq!(record.descriptor().to_string(), "util.Pair<string, List<i64>>");
}

#[test]
fn test_enum_fields_and_interned_strings() {
    let suit = EnumSchema::new("cards.Suit", ["HEARTS", "SPADES"]);
    let card = ClassSchema::builder("cards.Card")
        .final_type(true)
        .field("suit", suit.descriptor())
        .field("rank", prim(PrimitiveKind::I8))
        .field("note", TypeDescriptor::string())
        .build()
        .expect("card");
    let registry = TypeRegistry::builder()
        .class(Arc::clone(&card))
        .enum_type(suit)
        .build();

    let mut graph = Graph::new();
    let ace = graph.record(&card);
    graph
        .set_field(ace, "suit", Value::enumeration("cards.Suit", "SPADES"))
        .expect("suit");
    graph.set_field(ace, "rank", 1i8).expect("rank");
    graph.set_field(ace, "note", "top").expect("note");
    // default suit (null) is still written for enum fields
    let blank = graph.record(&card);
    graph.set_field(blank, "note", "top").expect("note");

    let hand = graph.list(
        card.descriptor(),
        vec![Value::Ref(ace), Value::Ref(blank)],
    );
    let (values, decoded) = roundtrip(&graph, &[hand.clone()], &registry);
    assert!(graph.structurally_equal(&hand, &decoded, &values[0]));
}

#[test]
fn test_declared_root_type() {
    let mut export = ExportSession::new(Vec::new(), TypeRegistry::empty());
    let graph = Graph::new();
    let declared = prim(PrimitiveKind::F64);
    export
        .write_as(&graph, &Value::F64(-0.5), &declared)
        .expect("inline f64");
    export
        .write_as(&graph, &Value::from("s"), &TypeDescriptor::string())
        .expect("final string");
    let bytes = export.into_inner();
    // inline double, then object id and string with no type id
    assert_eq!(bytes.len(), 8 + 3);

    let mut import = ImportSession::new(bytes.as_slice(), TypeRegistry::empty());
    let first = import.read_as(&declared).expect("f64").expect("value");
    assert_eq!(first.into_value(), Value::F64(-0.5));
    let second = import
        .read_as(&TypeDescriptor::string())
        .expect("string")
        .expect("value");
    assert_eq!(second.into_value(), Value::from("s"));
    assert!(import
        .read_as(&TypeDescriptor::string())
        .expect("end")
        .is_none());
}
