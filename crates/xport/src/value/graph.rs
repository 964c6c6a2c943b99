// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Arena of containers and records.
//!
//! Every graph carries a process-unique id. Export sessions key object
//! identity on `(graph id, index)`, so handles from two different graphs
//! can never alias in one stream.

use super::Value;
use crate::types::{ClassSchema, ReflectiveType, TypeDescriptor, TypeRef};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to an object inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(usize);

impl ObjectRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Array, List or Set contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub element: TypeRef,
    pub items: Vec<Value>,
}

impl Sequence {
    pub fn new(element: TypeRef) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }
}

/// Key/value pairs in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    pub key: TypeRef,
    pub value: TypeRef,
    pub entries: Vec<(Value, Value)>,
}

/// Distinct elements with occurrence counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Multiset {
    pub element: TypeRef,
    pub entries: Vec<(Value, usize)>,
}

/// Instance of a registered class.
#[derive(Debug, Clone)]
pub struct Record {
    class: Arc<ClassSchema>,
    type_args: Vec<TypeRef>,
    fields: Vec<Value>,
}

impl Record {
    /// New instance holding the schema's defaults.
    pub fn new(class: Arc<ClassSchema>) -> Self {
        let fields = class.defaults();
        Self {
            class,
            type_args: Vec::new(),
            fields,
        }
    }

    /// New instance of a generic class applied to `type_args`.
    pub fn with_type_args(class: Arc<ClassSchema>, type_args: Vec<TypeRef>) -> Self {
        let mut record = Self::new(class);
        record.type_args = type_args;
        record
    }

    pub fn class(&self) -> &Arc<ClassSchema> {
        &self.class
    }

    pub fn type_args(&self) -> &[TypeRef] {
        &self.type_args
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.fields.get_mut(index)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.class.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Runtime type: reflective, or the generic base applied to the type args.
    pub fn descriptor(&self) -> TypeRef {
        let own = self.class.descriptor();
        if self.class.is_generic() {
            let args = (0..self.class.type_params())
                .map(|i| {
                    self.type_args
                        .get(i)
                        .cloned()
                        .unwrap_or_else(TypeDescriptor::any)
                })
                .collect();
            Arc::new(TypeDescriptor::Parameterized { base: own, args })
        } else {
            own
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.class.name() == other.class.name()
            && self.type_args == other.type_args
            && self.fields == other.fields
    }
}

/// Fields of a record whose type was not known locally.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedRecord {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

/// Heap object stored in a [`Graph`].
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Array(Sequence),
    List(Sequence),
    Set(Sequence),
    Dictionary(Dictionary),
    Multiset(Multiset),
    Record(Record),
    Unresolved(UnresolvedRecord),
}

impl Object {
    /// Concrete runtime type written before the payload.
    pub fn descriptor(&self) -> TypeRef {
        match self {
            Object::Array(s) => TypeDescriptor::array_of(Arc::clone(&s.element)),
            Object::List(s) => TypeDescriptor::list_of(Arc::clone(&s.element)),
            Object::Set(s) => TypeDescriptor::set_of(Arc::clone(&s.element)),
            Object::Dictionary(d) => {
                TypeDescriptor::dictionary_of(Arc::clone(&d.key), Arc::clone(&d.value))
            }
            Object::Multiset(m) => TypeDescriptor::multiset_of(Arc::clone(&m.element)),
            Object::Record(r) => r.descriptor(),
            Object::Unresolved(u) => Arc::new(TypeDescriptor::Reflective(ReflectiveType {
                name: u.type_name.clone(),
                is_final: false,
                schema: None,
            })),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Array(_) => "Array",
            Object::List(_) => "List",
            Object::Set(_) => "Set",
            Object::Dictionary(_) => "Dictionary",
            Object::Multiset(_) => "Multiset",
            Object::Record(_) => "Record",
            Object::Unresolved(_) => "Unresolved",
        }
    }
}

/// Object arena.
#[derive(Debug)]
pub struct Graph {
    id: u64,
    objects: Vec<Object>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Graph {
    /// The clone gets a fresh identity: it is a different graph.
    fn clone(&self) -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            objects: self.objects.clone(),
        }
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            objects: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn alloc(&mut self, object: Object) -> ObjectRef {
        self.objects.push(object);
        ObjectRef(self.objects.len() - 1)
    }

    pub fn get(&self, r: ObjectRef) -> Option<&Object> {
        self.objects.get(r.0)
    }

    pub fn get_mut(&mut self, r: ObjectRef) -> Option<&mut Object> {
        self.objects.get_mut(r.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectRef(i), o))
    }

    /// Object behind a value, if it is a reference into this graph.
    pub fn resolve(&self, value: &Value) -> Option<&Object> {
        value.as_object().and_then(|r| self.get(r))
    }

    // ------------------------------------------------------------------------
    // Construction helpers
    // ------------------------------------------------------------------------

    pub fn list(&mut self, element: TypeRef, items: Vec<Value>) -> Value {
        Value::Ref(self.alloc(Object::List(Sequence { element, items })))
    }

    pub fn array(&mut self, element: TypeRef, items: Vec<Value>) -> Value {
        Value::Ref(self.alloc(Object::Array(Sequence { element, items })))
    }

    pub fn set(&mut self, element: TypeRef, items: Vec<Value>) -> Value {
        Value::Ref(self.alloc(Object::Set(Sequence { element, items })))
    }

    pub fn dictionary(&mut self, key: TypeRef, value: TypeRef, entries: Vec<(Value, Value)>) -> Value {
        Value::Ref(self.alloc(Object::Dictionary(Dictionary { key, value, entries })))
    }

    pub fn multiset(&mut self, element: TypeRef, entries: Vec<(Value, usize)>) -> Value {
        Value::Ref(self.alloc(Object::Multiset(Multiset { element, entries })))
    }

    /// Allocate a default-valued instance of `class`.
    pub fn record(&mut self, class: &Arc<ClassSchema>) -> ObjectRef {
        self.alloc(Object::Record(Record::new(Arc::clone(class))))
    }

    pub fn get_record(&self, r: ObjectRef) -> Option<&Record> {
        match self.get(r)? {
            Object::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn get_record_mut(&mut self, r: ObjectRef) -> Option<&mut Record> {
        match self.get_mut(r)? {
            Object::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Sequence contents of an Array, List or Set.
    pub fn sequence(&self, r: ObjectRef) -> Option<&Sequence> {
        match self.get(r)? {
            Object::Array(s) | Object::List(s) | Object::Set(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn sequence_mut(&mut self, r: ObjectRef) -> Option<&mut Sequence> {
        match self.get_mut(r)? {
            Object::Array(s) | Object::List(s) | Object::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Assign a record field by name, validating the value's shape.
    pub fn set_field(
        &mut self,
        target: ObjectRef,
        name: &str,
        value: impl Into<Value>,
    ) -> core::result::Result<(), String> {
        let index = self
            .get_record(target)
            .ok_or_else(|| format!("#{} is not a record", target.0))?
            .class()
            .field_index(name)
            .ok_or_else(|| format!("no field named {}", name))?;
        self.assign_field(target, index, value.into())
    }

    /// Assign a record field by index, validating the value's shape.
    pub fn assign_field(
        &mut self,
        target: ObjectRef,
        index: usize,
        value: Value,
    ) -> core::result::Result<(), String> {
        let record = self
            .get_record(target)
            .ok_or_else(|| format!("#{} is not a record", target.0))?;
        let spec = record
            .class()
            .fields()
            .get(index)
            .ok_or_else(|| format!("field index {} out of range", index))?;
        let declared = spec.declared.substitute(record.type_args());
        self.conforms(&declared, &value)?;
        match self.get_record_mut(target).and_then(|r| r.field_mut(index)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("field index {} out of range", index)),
        }
    }

    /// Check that `value` can be stored in a slot declared as `declared`.
    pub fn conforms(&self, declared: &TypeDescriptor, value: &Value) -> core::result::Result<(), String> {
        let reject = || format!("expected {}, found {}", declared, self.describe(value));
        match (declared, value) {
            (TypeDescriptor::Primitive(kind), _) => {
                if value.primitive_kind() == Some(*kind) {
                    Ok(())
                } else {
                    Err(reject())
                }
            }
            (_, Value::Null) | (TypeDescriptor::Any, _) => Ok(()),
            (TypeDescriptor::String, Value::String(_)) => Ok(()),
            (TypeDescriptor::Enum(e), Value::Enum(v)) if *v.type_name == *e.name => Ok(()),
            (TypeDescriptor::Reflective(r), Value::Ref(h)) => match self.get(*h) {
                Some(Object::Record(rec)) if rec.class().name() == r.name => Ok(()),
                Some(Object::Unresolved(u)) if u.type_name == r.name => Ok(()),
                _ => Err(reject()),
            },
            (TypeDescriptor::Parameterized { .. }, Value::Ref(h)) => {
                let actual = self.get(*h).map(Object::descriptor).ok_or_else(reject)?;
                if parameterized_accepts(declared, &actual) {
                    Ok(())
                } else {
                    Err(reject())
                }
            }
            (
                TypeDescriptor::GenericBase { .. }
                | TypeDescriptor::Param(_)
                | TypeDescriptor::Array
                | TypeDescriptor::List
                | TypeDescriptor::Set
                | TypeDescriptor::Dictionary
                | TypeDescriptor::Multiset,
                Value::Ref(_),
            ) => Ok(()),
            _ => Err(reject()),
        }
    }

    /// Short human-readable description of a value.
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Ref(r) => match self.get(*r) {
                Some(object) => object.descriptor().to_string(),
                None => format!("dangling #{}", r.0),
            },
            Value::Null => "null".into(),
            Value::String(_) => "string".into(),
            Value::Enum(e) => e.type_name.to_string(),
            other => other
                .primitive_kind()
                .map_or_else(|| format!("{:?}", other), |k| k.name().to_string()),
        }
    }
}

/// Same base, and every declared argument is `Any` or equal to the actual one.
fn parameterized_accepts(declared: &TypeDescriptor, actual: &TypeDescriptor) -> bool {
    match (declared, actual) {
        (
            TypeDescriptor::Parameterized { base: db, args: da },
            TypeDescriptor::Parameterized { base: ab, args: aa },
        ) => {
            db == ab
                && da.len() == aa.len()
                && da
                    .iter()
                    .zip(aa)
                    .all(|(d, a)| matches!(**d, TypeDescriptor::Any) || d == a)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumSchema, PrimitiveKind};

    fn point_schema() -> Arc<ClassSchema> {
        ClassSchema::builder("geo.Point")
            .field("x", TypeDescriptor::primitive(PrimitiveKind::I32))
            .field("label", TypeDescriptor::string())
            .field(
                "tags",
                TypeDescriptor::list_of(TypeDescriptor::string()),
            )
            .build()
            .expect("schema")
    }

    #[test]
    fn test_graph_ids_are_unique() {
        let a = Graph::new();
        let b = Graph::new();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.clone().id(), a.id());
    }

    #[test]
    fn test_record_defaults_and_assignment() {
        let schema = point_schema();
        let mut graph = Graph::new();
        let p = graph.record(&schema);
        assert_eq!(graph.get_record(p).and_then(|r| r.get("x")), Some(&Value::I32(0)));

        graph.set_field(p, "x", 42).expect("i32 into i32");
        assert_eq!(graph.get_record(p).and_then(|r| r.get("x")), Some(&Value::I32(42)));

        let err = graph.set_field(p, "x", "nope").expect_err("string into i32");
        assert!(err.contains("expected i32"), "{}", err);
        assert!(graph.set_field(p, "x", Value::Null).is_err());
        assert!(graph.set_field(p, "missing", 1).is_err());
    }

    #[test]
    fn test_container_shape_validation() {
        let schema = point_schema();
        let mut graph = Graph::new();
        let p = graph.record(&schema);

        let strings = graph.list(TypeDescriptor::string(), vec![Value::from("a")]);
        graph.set_field(p, "tags", strings).expect("List<string>");

        let ints = graph.list(TypeDescriptor::primitive(PrimitiveKind::I32), vec![]);
        assert!(graph.set_field(p, "tags", ints).is_err());

        let set = graph.set(TypeDescriptor::string(), vec![]);
        assert!(graph.set_field(p, "tags", set).is_err());

        assert!(graph.set_field(p, "tags", Value::Null).is_ok());
    }

    #[test]
    fn test_any_argument_accepts_concrete() {
        let graph_decl = TypeDescriptor::list_of(TypeDescriptor::any());
        let mut graph = Graph::new();
        let v = graph.list(TypeDescriptor::string(), vec![]);
        assert!(graph.conforms(&graph_decl, &v).is_ok());
    }

    #[test]
    fn test_enum_and_record_conformance() {
        let colors = EnumSchema::new("gfx.Color", ["RED"]);
        let graph = Graph::new();
        let red = Value::enumeration("gfx.Color", "RED");
        assert!(graph.conforms(&colors.descriptor(), &red).is_ok());
        let other = Value::enumeration("gfx.Shade", "RED");
        assert!(graph.conforms(&colors.descriptor(), &other).is_err());

        let schema = point_schema();
        let mut graph = Graph::new();
        let p = graph.record(&schema);
        assert!(graph.conforms(&schema.descriptor(), &Value::Ref(p)).is_ok());
        assert!(graph
            .conforms(&TypeDescriptor::string(), &Value::Ref(p))
            .is_err());
    }

    #[test]
    fn test_generic_record_descriptor() {
        let pair = ClassSchema::builder("util.Pair")
            .type_params(2)
            .field("left", TypeDescriptor::param(0))
            .field("right", TypeDescriptor::param(1))
            .build()
            .expect("schema");
        let mut graph = Graph::new();
        let r = graph.alloc(Object::Record(Record::with_type_args(
            Arc::clone(&pair),
            vec![TypeDescriptor::string(), TypeDescriptor::primitive(PrimitiveKind::I32)],
        )));
        let desc = graph.get(r).map(Object::descriptor).expect("record");
        assert_eq!(desc.to_string(), "util.Pair<string, i32>");

        assert!(graph.set_field(r, "right", 5).is_ok());
        assert!(graph.set_field(r, "right", "five").is_err());
        assert!(graph.set_field(r, "left", "ok").is_ok());
    }
}
