// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Export session: object, type and field id tables plus the value encoder.
//!
//! # Stream layout per value
//!
//! ```text
//! value-type slot : payload
//! other slots     : object-id [type-id] payload     (0 = null, seen id = back-reference)
//! final slot      : the type id is omitted
//! ```

use super::fields::ExportFields;
use crate::codec::WireWriter;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::stack;
use crate::types::{bootstrap, PrimitiveKind, TypeDescriptor, TypeRef, TypeRegistry};
use crate::value::{Graph, Object, ObjectRef, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// Identity of a written object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ObjectKey {
    Object { graph: u64, index: usize },
    String(Arc<str>),
    Enum(Arc<str>, Arc<str>),
}

/// Encoder for a sequence of root values sharing one set of id tables.
pub struct ExportSession<W: Write> {
    out: WireWriter<W>,
    registry: Arc<TypeRegistry>,
    object_ids: HashMap<ObjectKey, usize>,
    next_object_id: usize,
    type_ids: HashMap<TypeRef, usize>,
    next_type_id: usize,
    field_tables: Vec<ExportFields>,
    table_index: HashMap<TypeRef, usize>,
    max_depth: usize,
    depth: usize,
    poisoned: bool,
}

impl<W: Write> ExportSession<W> {
    pub fn new(out: W, registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(out, registry, &ExportConfig::default())
    }

    /// Session honoring `config.max_depth`; compression is the envelope's concern.
    pub fn with_config(out: W, registry: Arc<TypeRegistry>, config: &ExportConfig) -> Self {
        let type_ids: HashMap<TypeRef, usize> = bootstrap()
            .iter()
            .enumerate()
            .map(|(id, t)| (Arc::clone(t), id))
            .collect();
        Self {
            out: WireWriter::new(out),
            registry,
            next_type_id: type_ids.len(),
            type_ids,
            object_ids: HashMap::new(),
            next_object_id: 1,
            field_tables: Vec::new(),
            table_index: HashMap::new(),
            max_depth: config.max_depth,
            depth: 0,
            poisoned: false,
        }
    }

    /// Write one root value, declared as `Any`.
    pub fn write(&mut self, graph: &Graph, value: &Value) -> Result<()> {
        self.write_as(graph, value, &TypeDescriptor::any())
    }

    /// Write one root value against an explicit declared type.
    ///
    /// The reader must use the same declared type for the matching read.
    pub fn write_as(&mut self, graph: &Graph, value: &Value, declared: &TypeRef) -> Result<()> {
        if self.poisoned {
            return Err(Error::SessionPoisoned);
        }
        let result = self.write_object(graph, value, declared);
        if let Err(e) = &result {
            log::debug!("[ExportSession::write] poisoning session: {}", e);
            self.poisoned = true;
        }
        result
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Bytes written so far (before any outer compression).
    pub fn bytes_written(&self) -> u64 {
        self.out.written()
    }

    /// Object ids handed out, null excluded.
    pub fn object_count(&self) -> usize {
        self.next_object_id - 1
    }

    /// Type ids in use, bootstrap included.
    pub fn type_count(&self) -> usize {
        self.next_type_id
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    fn write_object(&mut self, graph: &Graph, value: &Value, expected: &TypeRef) -> Result<()> {
        if expected.is_value_type() {
            return self.write_value(graph, value, expected);
        }
        let key = match value {
            Value::Null => return self.out.write_id(0),
            Value::String(s) => Some(ObjectKey::String(Arc::clone(s))),
            Value::Enum(e) => Some(ObjectKey::Enum(
                Arc::clone(&e.type_name),
                Arc::clone(&e.constant),
            )),
            Value::Ref(r) => {
                if graph.get(*r).is_none() {
                    return Err(Error::DanglingReference(r.index()));
                }
                Some(ObjectKey::Object {
                    graph: graph.id(),
                    index: r.index(),
                })
            }
            // boxed primitive in a reference slot: no identity to share
            _ => None,
        };
        if let Some(&id) = key.as_ref().and_then(|k| self.object_ids.get(k)) {
            return self.out.write_id(id);
        }
        let id = self.next_object_id;
        self.next_object_id += 1;
        if let Some(key) = key {
            self.object_ids.insert(key, id);
        }
        self.out.write_id(id)?;
        self.write_value(graph, value, expected)
    }

    fn write_value(&mut self, graph: &Graph, value: &Value, expected: &TypeRef) -> Result<()> {
        self.enter()?;
        let result = stack::grow(|| self.write_value_at_depth(graph, value, expected));
        self.depth -= 1;
        result
    }

    fn write_value_at_depth(&mut self, graph: &Graph, value: &Value, expected: &TypeRef) -> Result<()> {
        let actual = match (&**expected, value) {
            (TypeDescriptor::Enum(e), Value::Enum(v)) if *e.name == *v.type_name => {
                Arc::clone(expected)
            }
            _ => self.type_of(graph, value)?,
        };
        if expected.is_final() {
            if actual != *expected {
                return Err(Error::mismatch(expected, graph.describe(value)));
            }
        } else {
            self.write_type(&actual)?;
        }
        self.write_payload(graph, value, &actual)
    }

    /// Concrete runtime type of a non-null value.
    fn type_of(&self, graph: &Graph, value: &Value) -> Result<TypeRef> {
        match value {
            Value::Null => Err(Error::mismatch("a non-null value", value)),
            Value::String(_) => Ok(TypeDescriptor::string()),
            Value::Enum(e) => self
                .registry
                .enum_schema(&e.type_name)
                .map(|schema| schema.descriptor())
                .ok_or_else(|| Error::UnregisteredType(e.type_name.to_string())),
            Value::Ref(r) => graph
                .get(*r)
                .map(Object::descriptor)
                .ok_or(Error::DanglingReference(r.index())),
            other => match other.primitive_kind() {
                Some(kind) => Ok(TypeDescriptor::primitive(kind)),
                None => Err(Error::mismatch("a known value", other)),
            },
        }
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    fn write_type(&mut self, t: &TypeRef) -> Result<()> {
        if let Some(&id) = self.type_ids.get(t) {
            return self.out.write_id(id);
        }
        // kind: 0 named, 1 generic instance, 2 container instance, 3 generic base
        let (kind, is_final, args) = match &**t {
            TypeDescriptor::Parameterized { base, args } if base.is_builtin_container() => {
                (2, false, args.len())
            }
            TypeDescriptor::Parameterized { base, .. }
                if matches!(**base, TypeDescriptor::GenericBase { .. }) =>
            {
                (1, false, 0)
            }
            TypeDescriptor::GenericBase { arity, .. } => (3, false, *arity),
            TypeDescriptor::Reflective(r) => (0, r.is_final, 0),
            TypeDescriptor::Enum(_) => (0, true, 0),
            other => {
                return Err(Error::UnregisteredType(format!(
                    "{} cannot be described on the wire",
                    other
                )))
            }
        };

        self.enter()?;
        let result = stack::grow(|| self.write_new_type(t, kind, is_final, args));
        self.depth -= 1;
        result
    }

    fn write_new_type(&mut self, t: &TypeRef, kind: usize, is_final: bool, args: usize) -> Result<()> {
        let id = self.next_type_id;
        self.next_type_id += 1;
        self.type_ids.insert(Arc::clone(t), id);
        log::debug!("[ExportSession::write_type] #{} = {}", id, t);

        self.out
            .write_id(id + kind + (usize::from(is_final) << 2) + (args << 3))?;
        match &**t {
            TypeDescriptor::Parameterized { base, args } => {
                self.write_type(base)?;
                for arg in args {
                    self.write_type(arg)?;
                }
                Ok(())
            }
            named => {
                let local = named.type_name().unwrap_or_default();
                let wire = self.registry.names().to_wire(local).into_owned();
                self.out.write_string(&wire)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Payloads
    // ------------------------------------------------------------------------

    fn write_payload(&mut self, graph: &Graph, value: &Value, t: &TypeRef) -> Result<()> {
        match &**t {
            TypeDescriptor::Primitive(kind) => self.write_primitive(*kind, value),
            TypeDescriptor::String => match value {
                Value::String(s) => self.out.write_string(s),
                other => Err(Error::mismatch(t, other)),
            },
            TypeDescriptor::Enum(e) => match value {
                Value::Enum(v) => {
                    if let Some(schema) = &e.schema {
                        if !schema.contains(&v.constant) {
                            return Err(Error::InvalidArgument(format!(
                                "{} has no constant named {}",
                                e.name, v.constant
                            )));
                        }
                    }
                    self.out.write_string(&v.constant)
                }
                other => Err(Error::mismatch(t, other)),
            },
            TypeDescriptor::Parameterized { base, args } => match &**base {
                TypeDescriptor::Array | TypeDescriptor::List | TypeDescriptor::Set => {
                    let element = type_arg(t, args, 0)?;
                    let seq = self.handle(value).and_then(|r| {
                        graph
                            .sequence(r)
                            .ok_or_else(|| Error::mismatch(t, graph.describe(value)))
                    })?;
                    self.out.write_length(seq.items.len())?;
                    for item in &seq.items {
                        self.write_object(graph, item, &element)?;
                    }
                    Ok(())
                }
                TypeDescriptor::Dictionary => {
                    let (key_type, value_type) = (type_arg(t, args, 0)?, type_arg(t, args, 1)?);
                    let r = self.handle(value)?;
                    let Some(Object::Dictionary(dict)) = graph.get(r) else {
                        return Err(Error::mismatch(t, graph.describe(value)));
                    };
                    self.out.write_length(dict.entries.len())?;
                    for (k, v) in &dict.entries {
                        self.write_object(graph, k, &key_type)?;
                        self.write_object(graph, v, &value_type)?;
                    }
                    Ok(())
                }
                TypeDescriptor::Multiset => {
                    let element = type_arg(t, args, 0)?;
                    let r = self.handle(value)?;
                    let Some(Object::Multiset(bag)) = graph.get(r) else {
                        return Err(Error::mismatch(t, graph.describe(value)));
                    };
                    self.out.write_length(bag.entries.len())?;
                    for (item, count) in &bag.entries {
                        self.write_object(graph, item, &element)?;
                        self.out.write_length(*count)?;
                    }
                    Ok(())
                }
                TypeDescriptor::GenericBase { .. } => self.write_record(graph, value, t),
                _ => Err(Error::UnregisteredType(t.to_string())),
            },
            TypeDescriptor::Reflective(_) => self.write_record(graph, value, t),
            _ => Err(Error::UnregisteredType(t.to_string())),
        }
    }

    fn write_primitive(&mut self, kind: PrimitiveKind, value: &Value) -> Result<()> {
        match (kind, value) {
            (PrimitiveKind::Bool, Value::Bool(v)) => self.out.write_bool(*v),
            (PrimitiveKind::I32, Value::I32(v)) => self.out.write_i32(*v),
            (PrimitiveKind::I64, Value::I64(v)) => self.out.write_i64(*v),
            (PrimitiveKind::I16, Value::I16(v)) => self.out.write_i16(*v),
            (PrimitiveKind::I8, Value::I8(v)) => self.out.write_i8(*v),
            (PrimitiveKind::Char, Value::Char(v)) => self.out.write_char(*v),
            (PrimitiveKind::F32, Value::F32(v)) => self.out.write_f32(*v),
            (PrimitiveKind::F64, Value::F64(v)) => self.out.write_f64(*v),
            (kind, other) => Err(Error::mismatch(kind.name(), other)),
        }
    }

    /// Changed fields only: count, then per field `id [name type] value`.
    fn write_record(&mut self, graph: &Graph, value: &Value, t: &TypeRef) -> Result<()> {
        let r = self.handle(value)?;
        let Some(Object::Record(record)) = graph.get(r) else {
            return Err(Error::mismatch(t, graph.describe(value)));
        };

        let table = match self.table_index.get(t) {
            Some(&i) => i,
            None => {
                self.field_tables
                    .push(ExportFields::new(record.class(), record.type_args()));
                self.table_index
                    .insert(Arc::clone(t), self.field_tables.len() - 1);
                self.field_tables.len() - 1
            }
        };
        if self.field_tables[table].fields.len() != record.fields().len() {
            return Err(Error::UnregisteredType(format!(
                "conflicting schemas registered for {}",
                t
            )));
        }

        let changed = self.field_tables[table].changed(record);
        self.out.write_length(changed.len())?;
        for index in changed {
            let (id, first) = self.field_tables[table]
                .claim(index)
                .ok_or_else(|| Error::malformed(format!("field {} missing from {}", index, t)))?;
            self.out.write_id(id)?;
            let declared = Arc::clone(&self.field_tables[table].fields[index].declared);
            if first {
                let name = self.field_tables[table].fields[index].name.clone();
                self.out.write_string(&name)?;
                self.write_type(&declared)?;
            }
            self.write_object(graph, &record.fields()[index], &declared)?;
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::InvalidArgument(format!(
                "graph nests deeper than {} levels",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn handle(&self, value: &Value) -> Result<ObjectRef> {
        value
            .as_object()
            .ok_or_else(|| Error::mismatch("an object reference", value))
    }
}

fn type_arg(t: &TypeRef, args: &[TypeRef], index: usize) -> Result<TypeRef> {
    args.get(index)
        .cloned()
        .ok_or_else(|| Error::InvalidArgument(format!("{} is missing type argument {}", t, index)))
}
