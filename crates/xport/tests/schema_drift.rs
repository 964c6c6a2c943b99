// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::too_many_lines)] // Test code

//! Schema drift: data written with one version of a class read back with
//! another. Old and new fields, renamed constants, changed field types,
//! unknown classes and renamed packages.

use std::sync::Arc;
use xport::{
    ClassSchema, Decoded, EnumSchema, Error, ExportSession, Graph, ImportConfig, ImportSession,
    NameTable, Object, PrimitiveKind, TypeDescriptor, TypeRegistry, Value, Warning, WarningKind,
    WarningPolicy,
};

fn i32_type() -> xport::TypeRef {
    TypeDescriptor::primitive(PrimitiveKind::I32)
}

/// Item as the writer knows it.
fn item_v1() -> Arc<ClassSchema> {
    ClassSchema::builder("inv.Item")
        .field("name", TypeDescriptor::string())
        .field("count", i32_type())
        .field("legacy", TypeDescriptor::string())
        .build()
        .expect("v1")
}

/// Item as the reader knows it: `legacy` dropped, `price` added.
fn item_v2() -> Arc<ClassSchema> {
    ClassSchema::builder("inv.Item")
        .field("name", TypeDescriptor::string())
        .field("count", i32_type())
        .field_with_default(
            "price",
            TypeDescriptor::primitive(PrimitiveKind::F64),
            Value::F64(1.5),
        )
        .build()
        .expect("v2")
}

/// Two items (the second reusing the field table) followed by a marker string.
fn write_items(schema: &Arc<ClassSchema>, fields: &[(&str, Value)]) -> Vec<u8> {
    let registry = TypeRegistry::builder().class(Arc::clone(schema)).build();
    let mut graph = Graph::new();
    let first = graph.record(schema);
    let second = graph.record(schema);
    for (name, value) in fields {
        graph.set_field(first, name, value.clone()).expect("field");
        graph.set_field(second, name, value.clone()).expect("field");
    }
    let mut session = ExportSession::new(Vec::new(), registry);
    session.write(&graph, &Value::Ref(first)).expect("first");
    session.write(&graph, &Value::Ref(second)).expect("second");
    session.write(&graph, &Value::from("end")).expect("marker");
    session.into_inner()
}

fn reader(bytes: &[u8], registry: Arc<TypeRegistry>, config: ImportConfig) -> ImportSession<&[u8]> {
    ImportSession::with_config(bytes, registry, config)
}

#[test]
fn test_removed_and_added_fields() {
    let bytes = write_items(
        &item_v1(),
        &[
            ("name", Value::from("rope")),
            ("count", Value::I32(3)),
            ("legacy", Value::from("old")),
        ],
    );
    let registry = TypeRegistry::builder().class(item_v2()).build();
    let mut session = reader(&bytes, registry, ImportConfig::default());

    let first = session.read().expect("first").expect("value");
    assert_eq!(
        first.warnings(),
        &[Warning::UnresolvedField {
            type_name: "inv.Item".into(),
            field: "legacy".into(),
        }]
    );
    // the field table is negotiated once, so the second item is clean
    let second = session.read().expect("second").expect("value");
    assert!(!second.is_degraded());

    for decoded in [first, second] {
        let record = session
            .graph()
            .get_record(decoded.value().as_object().expect("ref"))
            .expect("record");
        assert_eq!(record.get("name").and_then(Value::as_str), Some("rope"));
        assert_eq!(record.get("count").and_then(Value::as_i32), Some(3));
        assert_eq!(record.get("price").and_then(Value::as_f64), Some(1.5));
    }
    let marker = session.read().expect("marker").map(Decoded::into_value);
    assert_eq!(marker, Some(Value::from("end")));
}

#[test]
fn test_unknown_enum_constant_degrades_to_null() {
    let writer_enum = EnumSchema::new("ui.Mode", ["LIGHT", "DARK", "SEPIA"]);
    let writer_class = ClassSchema::builder("ui.Prefs")
        .field("mode", writer_enum.descriptor())
        .field("size", i32_type())
        .build()
        .expect("writer");
    let writer = TypeRegistry::builder()
        .class(Arc::clone(&writer_class))
        .enum_type(writer_enum)
        .build();

    let mut graph = Graph::new();
    let prefs = graph.record(&writer_class);
    graph
        .set_field(prefs, "mode", Value::enumeration("ui.Mode", "SEPIA"))
        .expect("mode");
    graph.set_field(prefs, "size", 12).expect("size");
    let mut session = ExportSession::new(Vec::new(), writer);
    session.write(&graph, &Value::Ref(prefs)).expect("prefs");
    let bytes = session.into_inner();

    let reader_enum = EnumSchema::new("ui.Mode", ["LIGHT", "DARK"]);
    let reader_class = ClassSchema::builder("ui.Prefs")
        .field("mode", reader_enum.descriptor())
        .field("size", i32_type())
        .build()
        .expect("reader");
    let registry = TypeRegistry::builder()
        .class(reader_class)
        .enum_type(reader_enum)
        .build();

    let mut import = reader(&bytes, registry, ImportConfig::default());
    let decoded = import.read().expect("read").expect("value");
    assert_eq!(
        decoded.warnings(),
        &[Warning::UnresolvedEnumValue {
            type_name: "ui.Mode".into(),
            constant: "SEPIA".into(),
        }]
    );
    let record = import
        .graph()
        .get_record(decoded.value().as_object().expect("ref"))
        .expect("record");
    assert!(record.get("mode").expect("mode").is_null());
    assert_eq!(record.get("size").and_then(Value::as_i32), Some(12));
}

#[test]
fn test_changed_field_type_keeps_default() {
    let writer = ClassSchema::builder("inv.Item")
        .field("name", TypeDescriptor::string())
        .field("count", TypeDescriptor::string())
        .build()
        .expect("writer");
    let bytes = write_items(
        &writer,
        &[("name", Value::from("nail")), ("count", Value::from("many"))],
    );

    let registry = TypeRegistry::builder().class(item_v2()).build();
    let mut session = reader(&bytes, registry, ImportConfig::default());
    let decoded = session.read().expect("read").expect("value");
    assert_eq!(decoded.warnings().len(), 1);
    assert!(matches!(
        &decoded.warnings()[0],
        Warning::FieldAssignmentFailed { field, .. } if field == "count"
    ));
    let record = session
        .graph()
        .get_record(decoded.value().as_object().expect("ref"))
        .expect("record");
    assert_eq!(record.get("count").and_then(Value::as_i32), Some(0));
    assert_eq!(record.get("name").and_then(Value::as_str), Some("nail"));

    // stream stays aligned after the rejected value
    assert!(session.read().expect("second").is_some());
    assert_eq!(
        session.read().expect("marker").map(Decoded::into_value),
        Some(Value::from("end"))
    );
}

#[test]
fn test_unknown_class_is_skipped_or_retained() {
    let bytes = write_items(
        &item_v1(),
        &[("name", Value::from("rope")), ("count", Value::I32(2))],
    );

    let mut dropped = reader(&bytes, TypeRegistry::empty(), ImportConfig::default());
    let first = dropped.read().expect("first").expect("value");
    assert_eq!(
        first.warnings(),
        &[Warning::UnresolvedType {
            name: "inv.Item".into()
        }]
    );
    assert!(first.value().is_null());
    assert!(dropped.read().expect("second").expect("value").value().is_null());
    assert_eq!(
        dropped.read().expect("marker").map(Decoded::into_value),
        Some(Value::from("end"))
    );

    let config = ImportConfig::default().retain_unresolved(true);
    let mut kept = reader(&bytes, TypeRegistry::empty(), config);
    let first = kept.read().expect("first").expect("value").into_value();
    match kept.graph().resolve(&first) {
        Some(Object::Unresolved(u)) => {
            assert_eq!(u.type_name, "inv.Item");
            assert_eq!(
                u.fields,
                vec![
                    ("name".to_string(), Value::from("rope")),
                    ("count".to_string(), Value::I32(2)),
                ]
            );
        }
        other => panic!("expected an unresolved record, got {:?}", other),
    }
}

#[test]
fn test_policies() {
    let bytes = write_items(
        &item_v1(),
        &[("name", Value::from("rope")), ("legacy", Value::from("x"))],
    );
    let registry = TypeRegistry::builder().class(item_v2()).build();

    let quiet = ImportConfig::default().policy(WarningKind::UnresolvedField, WarningPolicy::Suppress);
    let mut session = reader(&bytes, Arc::clone(&registry), quiet);
    assert!(!session.read().expect("read").expect("value").is_degraded());

    let strict = ImportConfig::default().all_policies(WarningPolicy::Fail);
    let mut session = reader(&bytes, registry, strict);
    match session.read() {
        Err(Error::Rejected(Warning::UnresolvedField { field, .. })) => assert_eq!(field, "legacy"),
        other => panic!("expected a rejected warning, got {:?}", other),
    }
    assert!(session.is_poisoned());
    assert!(matches!(session.read(), Err(Error::SessionPoisoned)));
}

#[test]
fn test_name_translation_between_peers() {
    let local = ClassSchema::builder("game::Item")
        .field("name", TypeDescriptor::string())
        .build()
        .expect("writer");
    let writer = TypeRegistry::builder()
        .class(Arc::clone(&local))
        .names(NameTable::new().prefix("game::", "com.example.").separators("::", "."))
        .build();

    let mut graph = Graph::new();
    let item = graph.record(&local);
    graph.set_field(item, "name", "axe").expect("name");
    let mut session = ExportSession::new(Vec::new(), writer);
    session.write(&graph, &Value::Ref(item)).expect("item");
    let bytes = session.into_inner();
    let wire_name = b"com.example.Item";
    assert!(bytes.windows(wire_name.len()).any(|w| w == wire_name));

    let remote = ClassSchema::builder("app.Item")
        .field("name", TypeDescriptor::string())
        .build()
        .expect("reader");
    let registry = TypeRegistry::builder()
        .class(remote)
        .names(NameTable::new().map("app.Item", "com.example.Item"))
        .build();
    let mut import = ImportSession::new(bytes.as_slice(), registry);
    let decoded = import.read().expect("read").expect("value");
    assert!(!decoded.is_degraded());
    let record = import
        .graph()
        .get_record(decoded.value().as_object().expect("ref"))
        .expect("record");
    assert_eq!(record.class().name(), "app.Item");
    assert_eq!(record.get("name").and_then(Value::as_str), Some("axe"));
}
