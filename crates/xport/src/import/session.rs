// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Import session: mirrors the writer's id tables while decoding into a [`Graph`].
//!
//! Anything that would desynchronize the tables or the byte position is a
//! fatal [`Error`] and poisons the session. Unknown types, fields and enum
//! constants are consumed and reported as [`Warning`]s.

use super::fields::{ImportField, ImportFields};
use crate::codec::WireReader;
use crate::config::{ImportConfig, WarningPolicy};
use crate::error::{Decoded, Error, Result, Warning};
use crate::stack;
use crate::types::{
    bootstrap, ClassSchema, EnumType, PrimitiveKind, ReflectiveType, Resolved, TypeDescriptor,
    TypeRef, TypeRegistry,
};
use crate::value::{
    Dictionary, EnumValue, Graph, Multiset, Object, ObjectRef, Record, Sequence,
    UnresolvedRecord, Value,
};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

/// Elements preallocated per collection before any data has been read.
const PREALLOC_LIMIT: usize = 1024;

/// Decoder for a sequence of root values sharing one set of id tables.
pub struct ImportSession<R: Read> {
    input: WireReader<R>,
    registry: Arc<TypeRegistry>,
    config: ImportConfig,
    graph: Graph,
    objects: Vec<Value>,
    types: Vec<TypeRef>,
    field_tables: Vec<ImportFields>,
    table_index: HashMap<TypeRef, usize>,
    /// Declared types looked up in the registry, keyed by the caller's descriptor.
    declared: HashMap<TypeRef, TypeRef>,
    warnings: Vec<Warning>,
    depth: usize,
    poisoned: bool,
}

impl<R: Read> ImportSession<R> {
    pub fn new(input: R, registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(input, registry, ImportConfig::default())
    }

    pub fn with_config(input: R, registry: Arc<TypeRegistry>, config: ImportConfig) -> Self {
        Self {
            input: WireReader::new(input),
            registry,
            config,
            graph: Graph::new(),
            objects: vec![Value::Null],
            types: bootstrap().to_vec(),
            field_tables: Vec::new(),
            table_index: HashMap::new(),
            declared: HashMap::new(),
            warnings: Vec::new(),
            depth: 0,
            poisoned: false,
        }
    }

    /// Read the next root value.
    ///
    /// `Ok(None)` means the source ended cleanly between values. Objects are
    /// decoded into [`graph`](Self::graph), which accumulates across reads so
    /// back-references to earlier roots resolve.
    pub fn read(&mut self) -> Result<Option<Decoded<Value>>> {
        if self.poisoned {
            return Err(Error::SessionPoisoned);
        }
        let result = self.read_root();
        match result {
            Ok(Some(value)) => {
                let warnings = std::mem::take(&mut self.warnings);
                Ok(Some(Decoded::from_parts(value, warnings)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                log::debug!("[ImportSession::read] poisoning session: {}", e);
                self.poisoned = true;
                self.warnings.clear();
                Err(e)
            }
        }
    }

    /// Read one root value against an explicit declared type.
    ///
    /// Must mirror the writer's `write_as`; a value-type root never hits a
    /// clean end, so `Ok(None)` is only returned for reference slots.
    pub fn read_as(&mut self, declared: &TypeRef) -> Result<Option<Decoded<Value>>> {
        if self.poisoned {
            return Err(Error::SessionPoisoned);
        }
        let result = if declared.is_value_type() {
            self.read_value(declared, None).map(Some)
        } else {
            match self.input.read_id_or_end() {
                Ok(Some(id)) => self.read_object_with_id(id, declared).map(Some),
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            }
        };
        match result {
            Ok(Some(value)) => {
                let warnings = std::mem::take(&mut self.warnings);
                Ok(Some(Decoded::from_parts(value, warnings)))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.poisoned = true;
                self.warnings.clear();
                Err(e)
            }
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Object ids seen so far, null excluded.
    pub fn object_count(&self) -> usize {
        self.objects.len() - 1
    }

    /// Type ids known so far, bootstrap included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Type known under a wire id.
    pub fn type_at(&self, id: usize) -> Option<&TypeRef> {
        self.types.get(id)
    }

    pub fn bytes_read(&self) -> u64 {
        self.input.consumed()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn read_root(&mut self) -> Result<Option<Value>> {
        match self.input.read_id_or_end()? {
            Some(id) => self.read_object_with_id(id, &TypeDescriptor::any()).map(Some),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    fn read_object(&mut self, expected: &TypeRef) -> Result<Value> {
        if expected.is_value_type() {
            return self.read_value(expected, None);
        }
        let id = self.input.read_id()?;
        self.read_object_with_id(id, expected)
    }

    fn read_object_with_id(&mut self, id: usize, expected: &TypeRef) -> Result<Value> {
        let next = self.objects.len();
        if id < next {
            return Ok(self.objects[id].clone());
        }
        if id > next {
            return Err(Error::UnexpectedObjectId {
                expected: next,
                found: id,
            });
        }
        // reserve the slot first so self-references resolve
        self.objects.push(Value::Null);
        let value = self.read_value(expected, Some(id))?;
        self.objects[id] = value.clone();
        Ok(value)
    }

    fn read_value(&mut self, expected: &TypeRef, slot: Option<usize>) -> Result<Value> {
        self.enter()?;
        let result = stack::grow(|| {
            let t = if expected.is_final() {
                self.resolve_declared(expected)?
            } else {
                self.read_type()?
            };
            self.read_payload(&t, slot)
        });
        self.depth -= 1;
        result
    }

    /// Bind a schema-less declared type (as derived types describe themselves)
    /// to the registry's schema. The type id is never on the wire for final
    /// slots, so this is the only chance to notice the type is unknown.
    fn resolve_declared(&mut self, declared: &TypeRef) -> Result<TypeRef> {
        let name = match &**declared {
            TypeDescriptor::Reflective(ReflectiveType { name, schema: None, .. })
            | TypeDescriptor::Enum(EnumType { name, schema: None }) => name.clone(),
            _ => return Ok(Arc::clone(declared)),
        };
        if let Some(t) = self.declared.get(declared) {
            return Ok(Arc::clone(t));
        }
        let resolved = match (&**declared, self.registry.resolve(&name)) {
            (TypeDescriptor::Reflective(r), Some(Resolved::Class(class))) if !class.is_generic() => {
                Some(TypeDescriptor::Reflective(ReflectiveType {
                    name: name.clone(),
                    is_final: r.is_final,
                    schema: Some(Arc::clone(class)),
                }))
            }
            (TypeDescriptor::Enum(_), Some(Resolved::Enum(schema))) => {
                Some(TypeDescriptor::Enum(EnumType {
                    name: name.clone(),
                    schema: Some(Arc::clone(schema)),
                }))
            }
            _ => None,
        };
        let t = match resolved {
            Some(t) => Arc::new(t),
            None => {
                self.warn(Warning::UnresolvedType { name })?;
                Arc::clone(declared)
            }
        };
        self.declared.insert(Arc::clone(declared), Arc::clone(&t));
        Ok(t)
    }

    fn register(&mut self, slot: Option<usize>, value: Value) {
        if let Some(id) = slot {
            self.objects[id] = value;
        }
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    fn read_type(&mut self) -> Result<TypeRef> {
        let id = self.input.read_id()?;
        let known = self.types.len();
        if id < known {
            return Ok(Arc::clone(&self.types[id]));
        }
        let info = id - known;
        let (kind, is_final, args) = (info & 0x3, info & 0x4 != 0, info >> 3);

        // placeholder keeps ids aligned while nested descriptors are read
        self.types.push(TypeDescriptor::any());
        self.enter()?;
        let result = stack::grow(|| self.read_type_body(kind, is_final, args));
        self.depth -= 1;
        let t = result?;
        log::debug!("[ImportSession::read_type] #{} = {}", known, t);
        self.types[known] = Arc::clone(&t);
        Ok(t)
    }

    fn read_type_body(&mut self, kind: usize, is_final: bool, args: usize) -> Result<TypeRef> {
        match kind {
            0 => {
                let name = self.read_type_name()?;
                let resolved = match self.registry.resolve(&name) {
                    Some(Resolved::Class(class)) if !class.is_generic() => {
                        Some(TypeDescriptor::Reflective(ReflectiveType {
                            name: name.clone(),
                            is_final,
                            schema: Some(Arc::clone(class)),
                        }))
                    }
                    Some(Resolved::Enum(schema)) => Some(TypeDescriptor::Enum(EnumType {
                        name: name.clone(),
                        schema: Some(Arc::clone(schema)),
                    })),
                    _ => None,
                };
                match resolved {
                    Some(t) => Ok(Arc::new(t)),
                    None => {
                        self.warn(Warning::UnresolvedType { name: name.clone() })?;
                        Ok(Arc::new(TypeDescriptor::Reflective(ReflectiveType {
                            name,
                            is_final,
                            schema: None,
                        })))
                    }
                }
            }
            1 => {
                let base = self.read_type()?;
                let TypeDescriptor::GenericBase { arity, .. } = &*base else {
                    return Err(Error::malformed(format!(
                        "generic instance over non-generic base {}",
                        base
                    )));
                };
                let arity = *arity;
                let type_args = self.read_type_args(arity)?;
                Ok(Arc::new(TypeDescriptor::Parameterized {
                    base,
                    args: type_args,
                }))
            }
            2 => {
                let base = self.read_type()?;
                if !base.is_builtin_container() || base.arity() != Some(args) {
                    return Err(Error::malformed(format!(
                        "container {} cannot take {} type argument(s)",
                        base, args
                    )));
                }
                let type_args = self.read_type_args(args)?;
                Ok(Arc::new(TypeDescriptor::Parameterized {
                    base,
                    args: type_args,
                }))
            }
            _ => {
                let name = self.read_type_name()?;
                let known = self
                    .registry
                    .class(&name)
                    .is_some_and(|c| c.type_params() == args);
                if !known {
                    self.warn(Warning::UnresolvedType { name: name.clone() })?;
                }
                Ok(Arc::new(TypeDescriptor::GenericBase { name, arity: args }))
            }
        }
    }

    fn read_type_args(&mut self, count: usize) -> Result<Vec<TypeRef>> {
        let mut args = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            args.push(self.read_type()?);
        }
        Ok(args)
    }

    fn read_type_name(&mut self) -> Result<String> {
        let wire = self.input.read_string()?;
        Ok(self.registry.names().from_wire(&wire).into_owned())
    }

    // ------------------------------------------------------------------------
    // Payloads
    // ------------------------------------------------------------------------

    fn read_payload(&mut self, t: &TypeRef, slot: Option<usize>) -> Result<Value> {
        match &**t {
            TypeDescriptor::Primitive(kind) => self.read_primitive(*kind),
            TypeDescriptor::String => Ok(Value::String(self.input.read_string()?.into())),
            TypeDescriptor::Enum(e) => {
                let constant = self.input.read_string()?;
                match &e.schema {
                    Some(schema) if !schema.contains(&constant) => {
                        self.warn(Warning::UnresolvedEnumValue {
                            type_name: e.name.clone(),
                            constant,
                        })?;
                        Ok(Value::Null)
                    }
                    _ => Ok(Value::Enum(EnumValue::new(e.name.as_str(), constant))),
                }
            }
            TypeDescriptor::Parameterized { base, args } => match &**base {
                TypeDescriptor::Array | TypeDescriptor::List | TypeDescriptor::Set => {
                    self.read_sequence(base, arg(t, args, 0)?, slot)
                }
                TypeDescriptor::Dictionary => {
                    self.read_dictionary(arg(t, args, 0)?, arg(t, args, 1)?, slot)
                }
                TypeDescriptor::Multiset => self.read_multiset(arg(t, args, 0)?, slot),
                TypeDescriptor::GenericBase { name, arity } => {
                    let class = self
                        .registry
                        .class(name)
                        .filter(|c| c.type_params() == *arity)
                        .cloned();
                    self.read_record(t, class, args.clone(), slot)
                }
                _ => Err(Error::malformed(format!("cannot decode a value of type {}", t))),
            },
            TypeDescriptor::Reflective(r) => {
                let class = r.schema.clone();
                self.read_record(t, class, Vec::new(), slot)
            }
            _ => Err(Error::malformed(format!("cannot decode a value of type {}", t))),
        }
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value> {
        Ok(match kind {
            PrimitiveKind::Bool => Value::Bool(self.input.read_bool()?),
            PrimitiveKind::I32 => Value::I32(self.input.read_i32()?),
            PrimitiveKind::I64 => Value::I64(self.input.read_i64()?),
            PrimitiveKind::I16 => Value::I16(self.input.read_i16()?),
            PrimitiveKind::I8 => Value::I8(self.input.read_i8()?),
            PrimitiveKind::Char => Value::Char(self.input.read_char()?),
            PrimitiveKind::F32 => Value::F32(self.input.read_f32()?),
            PrimitiveKind::F64 => Value::F64(self.input.read_f64()?),
        })
    }

    fn read_sequence(&mut self, base: &TypeRef, element: TypeRef, slot: Option<usize>) -> Result<Value> {
        let len = self.input.read_length()?;
        let shell = Sequence::new(Arc::clone(&element));
        let handle = self.graph.alloc(match **base {
            TypeDescriptor::Array => Object::Array(shell),
            TypeDescriptor::Set => Object::Set(shell),
            _ => Object::List(shell),
        });
        self.register(slot, Value::Ref(handle));

        let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            items.push(self.read_object(&element)?);
        }
        let seq = self
            .graph
            .sequence_mut(handle)
            .ok_or(Error::DanglingReference(handle.index()))?;
        seq.items = items;
        Ok(Value::Ref(handle))
    }

    fn read_dictionary(&mut self, key: TypeRef, value: TypeRef, slot: Option<usize>) -> Result<Value> {
        let len = self.input.read_length()?;
        let handle = self.graph.alloc(Object::Dictionary(Dictionary {
            key: Arc::clone(&key),
            value: Arc::clone(&value),
            entries: Vec::new(),
        }));
        self.register(slot, Value::Ref(handle));

        let mut entries = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            let k = self.read_object(&key)?;
            let v = self.read_object(&value)?;
            entries.push((k, v));
        }
        match self.graph.get_mut(handle) {
            Some(Object::Dictionary(dict)) => dict.entries = entries,
            _ => return Err(Error::DanglingReference(handle.index())),
        }
        Ok(Value::Ref(handle))
    }

    fn read_multiset(&mut self, element: TypeRef, slot: Option<usize>) -> Result<Value> {
        let len = self.input.read_length()?;
        let handle = self.graph.alloc(Object::Multiset(Multiset {
            element: Arc::clone(&element),
            entries: Vec::new(),
        }));
        self.register(slot, Value::Ref(handle));

        let mut entries = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            let item = self.read_object(&element)?;
            let count = self.input.read_length()?;
            entries.push((item, count));
        }
        match self.graph.get_mut(handle) {
            Some(Object::Multiset(bag)) => bag.entries = entries,
            _ => return Err(Error::DanglingReference(handle.index())),
        }
        Ok(Value::Ref(handle))
    }

    fn read_record(
        &mut self,
        t: &TypeRef,
        class: Option<Arc<ClassSchema>>,
        type_args: Vec<TypeRef>,
        slot: Option<usize>,
    ) -> Result<Value> {
        let target = match &class {
            Some(class) => Some(self.graph.alloc(Object::Record(Record::with_type_args(
                Arc::clone(class),
                type_args,
            )))),
            None if self.config.retain_unresolved => {
                Some(self.graph.alloc(Object::Unresolved(UnresolvedRecord {
                    type_name: t.to_string(),
                    fields: Vec::new(),
                })))
            }
            None => None,
        };
        if let Some(handle) = target {
            self.register(slot, Value::Ref(handle));
        }

        let table = match self.table_index.get(t) {
            Some(&i) => i,
            None => {
                self.field_tables.push(ImportFields::default());
                self.table_index
                    .insert(Arc::clone(t), self.field_tables.len() - 1);
                self.field_tables.len() - 1
            }
        };

        let count = self.input.read_length()?;
        for _ in 0..count {
            let field_id = self.input.read_id()?;
            let known = self.field_tables[table].slots.len();
            let field = if field_id < known {
                self.field_tables[table].slots[field_id].clone()
            } else if field_id == known {
                let name = self.input.read_string()?;
                let declared = self.read_type()?;
                let local = class.as_ref().and_then(|c| c.field_index(&name));
                if class.is_some() && local.is_none() {
                    self.warn(Warning::UnresolvedField {
                        type_name: t.to_string(),
                        field: name.clone(),
                    })?;
                }
                let field = ImportField {
                    name,
                    declared,
                    local,
                };
                self.field_tables[table].slots.push(field.clone());
                field
            } else {
                return Err(Error::UnexpectedFieldId {
                    type_name: t.to_string(),
                    expected: known,
                    found: field_id,
                });
            };

            // always consume the value, even when it has nowhere to go
            let value = self.read_object(&field.declared)?;
            if let Some(handle) = target {
                self.apply(t, handle, &field, value)?;
            }
        }
        Ok(target.map_or(Value::Null, Value::Ref))
    }

    fn apply(&mut self, t: &TypeRef, handle: ObjectRef, field: &ImportField, value: Value) -> Result<()> {
        if let Some(Object::Unresolved(unresolved)) = self.graph.get_mut(handle) {
            unresolved.fields.push((field.name.clone(), value));
            return Ok(());
        }
        let Some(index) = field.local else {
            return Ok(());
        };
        match self.graph.assign_field(handle, index, value) {
            Ok(()) => Ok(()),
            Err(reason) => self.warn(Warning::FieldAssignmentFailed {
                type_name: t.to_string(),
                field: field.name.clone(),
                reason,
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------------

    fn warn(&mut self, warning: Warning) -> Result<()> {
        match self.config.policy_for(warning.kind()) {
            WarningPolicy::Suppress => Ok(()),
            WarningPolicy::Log => {
                log::warn!("[xport::import] {}", warning);
                self.warnings.push(warning);
                Ok(())
            }
            WarningPolicy::Fail => Err(Error::Rejected(warning)),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(Error::malformed(format!(
                "nesting deeper than {} levels",
                self.config.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }
}

fn arg(t: &TypeRef, args: &[TypeRef], index: usize) -> Result<TypeRef> {
    args.get(index)
        .cloned()
        .ok_or_else(|| Error::malformed(format!("{} is missing type argument {}", t, index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write_varint;
    use crate::config::DEFAULT_MAX_DEPTH;
    use crate::error::WarningKind;

    fn session(bytes: &[u8]) -> ImportSession<&[u8]> {
        ImportSession::new(bytes, TypeRegistry::empty())
    }

    #[test]
    fn test_reads_concrete_scenario() {
        let bytes = [
            1, 3, 0, 0, 0, 5, // 5
            2, 1, 2, b'h', b'i', // "hi"
            3, 25, 11, 3, 2, 0, 0, 0, 1, 0, 0, 0, 2, // List<i32> [1, 2]
        ];
        let mut s = session(&bytes);
        assert_eq!(s.read().expect("int").map(Decoded::into_value), Some(Value::I32(5)));
        assert_eq!(
            s.read().expect("string").map(Decoded::into_value),
            Some(Value::string("hi"))
        );
        let list = s.read().expect("list").expect("some").into_value();
        let seq = s.graph().sequence(list.as_object().expect("ref")).expect("list");
        assert_eq!(seq.items, vec![Value::I32(1), Value::I32(2)]);
        assert_eq!(
            s.type_at(15).map(ToString::to_string).as_deref(),
            Some("List<i32>")
        );
        assert!(s.read().expect("end").is_none());
    }

    #[test]
    fn test_back_reference_to_string() {
        let bytes = [1, 1, 2, b'h', b'i', 1];
        let mut s = session(&bytes);
        let first = s.read().expect("first").expect("some").into_value();
        let second = s.read().expect("second").expect("some").into_value();
        assert_eq!(first, second);
        assert_eq!(s.object_count(), 1);
    }

    #[test]
    fn test_skipped_object_id_is_fatal() {
        let bytes = [5, 3, 0, 0, 0, 1];
        let mut s = session(&bytes);
        assert!(matches!(
            s.read(),
            Err(Error::UnexpectedObjectId {
                expected: 1,
                found: 5
            })
        ));
        assert!(matches!(s.read(), Err(Error::SessionPoisoned)));
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        let bytes = [1, 3, 0, 0];
        assert!(matches!(
            session(&bytes).read(),
            Err(Error::MalformedStream(_))
        ));
    }

    #[test]
    fn test_unknown_named_type_is_consumed() {
        // id 1, new type 15 kind 0 "x.Gone", one field "a": i32 = 7, then root 5
        let mut bytes = vec![1, 15, 6];
        bytes.extend_from_slice(b"x.Gone");
        bytes.extend_from_slice(&[1, 0, 1, b'a', 3, 0, 0, 0, 7]);
        bytes.extend_from_slice(&[2, 3, 0, 0, 0, 5]);

        let mut s = session(&bytes);
        let dropped = s.read().expect("unknown type").expect("some");
        assert!(dropped.is_degraded());
        assert_eq!(dropped.value(), &Value::Null);
        assert_eq!(dropped.warnings()[0].kind(), WarningKind::UnresolvedType);

        let next = s.read().expect("stream still aligned").expect("some");
        assert_eq!(next, Decoded::Ok(Value::I32(5)));
    }

    #[test]
    fn test_retain_unresolved() {
        let mut bytes = vec![1, 15, 6];
        bytes.extend_from_slice(b"x.Gone");
        bytes.extend_from_slice(&[1, 0, 1, b'a', 3, 0, 0, 0, 7]);

        let config = ImportConfig::default().retain_unresolved(true);
        let mut s = ImportSession::with_config(&bytes[..], TypeRegistry::empty(), config);
        let value = s.read().expect("read").expect("some").into_value();
        match s.graph().resolve(&value) {
            Some(Object::Unresolved(u)) => {
                assert_eq!(u.type_name, "x.Gone");
                assert_eq!(u.fields, vec![("a".to_string(), Value::I32(7))]);
            }
            other => panic!("expected unresolved record, got {:?}", other),
        }
    }

    #[test]
    fn test_fail_policy_escalates() {
        let mut bytes = vec![1, 15, 6];
        bytes.extend_from_slice(b"x.Gone");
        bytes.push(0);
        let config =
            ImportConfig::default().policy(WarningKind::UnresolvedType, WarningPolicy::Fail);
        let mut s = ImportSession::with_config(&bytes[..], TypeRegistry::empty(), config);
        assert!(matches!(s.read(), Err(Error::Rejected(Warning::UnresolvedType { .. }))));
    }

    #[test]
    fn test_max_depth() {
        // List<any> containing itself-shaped nesting: [[[...]]]
        let mut bytes = vec![1, 25, 11, 0, 1];
        for id in 2..6 {
            bytes.extend_from_slice(&[id, 15, 1]);
        }
        bytes.extend_from_slice(&[6, 15, 0]);
        let config = ImportConfig::default().max_depth(3);
        let mut s = ImportSession::with_config(&bytes[..], TypeRegistry::empty(), config);
        assert!(matches!(s.read(), Err(Error::MalformedStream(_))));

        let mut s = session(&bytes);
        assert!(s.read().expect("within default depth").is_some());
    }

    #[test]
    fn test_field_id_ahead_of_table_is_fatal() {
        // record x.P announces field 0, then jumps to field id 3
        let mut bytes = vec![1, 15, 3];
        bytes.extend_from_slice(b"x.P");
        bytes.extend_from_slice(&[2, 0, 1, b'a', 3, 0, 0, 0, 7, 3]);

        let config = ImportConfig::default().all_policies(WarningPolicy::Suppress);
        let mut s = ImportSession::with_config(&bytes[..], TypeRegistry::empty(), config);
        match s.read() {
            Err(Error::UnexpectedFieldId {
                type_name,
                expected,
                found,
            }) => {
                assert_eq!(type_name, "x.P");
                assert_eq!((expected, found), (1, 3));
            }
            other => panic!("expected an unexpected field id, got {:?}", other),
        }
        assert!(s.is_poisoned());
        assert!(matches!(s.read(), Err(Error::SessionPoisoned)));
    }

    #[test]
    fn test_schema_less_declared_type_uses_registry() {
        let class = ClassSchema::builder("x.P")
            .final_type(true)
            .field("a", TypeDescriptor::primitive(PrimitiveKind::I32))
            .build()
            .expect("schema");
        let registry = TypeRegistry::builder().class(class).build();
        let declared = TypeDescriptor::reflective("x.P", true);
        // id 1, no type id (final), field 0 "a": i32 = 7
        let bytes = [1, 1, 0, 1, b'a', 3, 0, 0, 0, 7];

        let mut s = ImportSession::new(&bytes[..], registry);
        let decoded = s.read_as(&declared).expect("read").expect("some");
        assert!(!decoded.is_degraded());
        let record = s
            .graph()
            .get_record(decoded.value().as_object().expect("ref"))
            .expect("record");
        assert_eq!(record.get("a"), Some(&Value::I32(7)));

        let mut s = session(&bytes);
        let decoded = s.read_as(&declared).expect("read").expect("some");
        assert_eq!(
            decoded.warnings(),
            &[Warning::UnresolvedType {
                name: "x.P".into()
            }]
        );
        assert!(decoded.value().is_null());
    }

    #[test]
    fn test_nesting_past_limit_is_malformed() {
        // List<any> nested far past the default limit
        let depth = DEFAULT_MAX_DEPTH * 8;
        let mut bytes = Vec::new();
        for id in 1..=depth {
            write_varint(&mut bytes, id).expect("id");
            if id == 1 {
                bytes.extend_from_slice(&[25, 11, 0]);
            } else {
                bytes.push(15);
            }
            bytes.push(u8::from(id < depth));
        }
        let mut s = session(&bytes);
        assert!(matches!(s.read(), Err(Error::MalformedStream(_))));

        let config = ImportConfig::default().max_depth(depth + 1);
        let mut s = ImportSession::with_config(&bytes[..], TypeRegistry::empty(), config);
        assert!(s.read().expect("within a raised limit").is_some());
    }

    #[test]
    fn test_bad_container_arity() {
        // kind 2 with two args over List
        let bytes = [1, 15 + 2 + (2 << 3), 11, 3, 3];
        assert!(matches!(
            session(&bytes).read(),
            Err(Error::MalformedStream(_))
        ));
    }
}
