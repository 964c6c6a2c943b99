// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class and enum schemas: the explicit registration that replaces runtime
//! reflection.
//!
//! A [`ClassSchema`] lists the exportable fields of a record type in a stable
//! order, each with its declared [`TypeRef`] and the value a freshly built
//! instance holds. Fields equal to their default are not written.

use super::descriptor::{EnumType, ReflectiveType, TypeDescriptor, TypeRef};
use crate::error::{Error, Result};
use crate::value::{Graph, ObjectRef, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// One exportable field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub declared: TypeRef,
    /// Value of the field in a default-constructed instance.
    pub default: Value,
}

/// Exportable shape of a record type.
#[derive(Debug)]
pub struct ClassSchema {
    name: String,
    is_final: bool,
    type_params: usize,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl ClassSchema {
    pub fn builder(name: impl Into<String>) -> ClassSchemaBuilder {
        ClassSchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn type_params(&self) -> usize {
        self.type_params
    }

    pub fn is_generic(&self) -> bool {
        self.type_params > 0
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Assignment handle for a named field.
    pub fn accessor(&self, name: &str) -> Option<FieldAccessor> {
        self.field_index(name).map(|index| FieldAccessor { index })
    }

    /// Descriptor of the type itself: reflective, or a generic base.
    pub fn descriptor(self: &Arc<Self>) -> TypeRef {
        if self.is_generic() {
            Arc::new(TypeDescriptor::GenericBase {
                name: self.name.clone(),
                arity: self.type_params,
            })
        } else {
            Arc::new(TypeDescriptor::Reflective(ReflectiveType {
                name: self.name.clone(),
                is_final: self.is_final,
                schema: Some(Arc::clone(self)),
            }))
        }
    }

    /// Descriptor of this generic class applied to `args`.
    pub fn instantiate(self: &Arc<Self>, args: Vec<TypeRef>) -> Result<TypeRef> {
        if !self.is_generic() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a generic class",
                self.name
            )));
        }
        TypeDescriptor::instantiate(&self.descriptor(), args)
    }

    /// Fresh field values for a new instance.
    pub fn defaults(&self) -> Vec<Value> {
        self.fields.iter().map(|f| f.default.clone()).collect()
    }
}

/// Fluent builder for [`ClassSchema`].
#[derive(Debug)]
pub struct ClassSchemaBuilder {
    name: String,
    is_final: bool,
    type_params: usize,
    fields: Vec<FieldSpec>,
}

impl ClassSchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_final: false,
            type_params: 0,
            fields: Vec::new(),
        }
    }

    /// Final classes have no subtypes, so slots declared with them omit the type id.
    pub fn final_type(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    /// Declare the class generic over `count` parameters, referenced by
    /// [`TypeDescriptor::param`] in field types.
    pub fn type_params(mut self, count: usize) -> Self {
        self.type_params = count;
        self
    }

    /// Add a field whose default is the zero of its declared type.
    pub fn field(self, name: impl Into<String>, declared: TypeRef) -> Self {
        let default = declared.default_value();
        self.field_with_default(name, declared, default)
    }

    /// Add a field with an explicit default.
    ///
    /// Defaults are inline values: a graph reference collapses to null, and a
    /// null default for a primitive field becomes that primitive's zero.
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        declared: TypeRef,
        default: Value,
    ) -> Self {
        let default = match default {
            Value::Ref(_) | Value::Null => declared.default_value(),
            other => other,
        };
        self.fields.push(FieldSpec {
            name: name.into(),
            declared,
            default,
        });
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<Arc<ClassSchema>> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "duplicate field name {}.{}",
                    self.name, field.name
                )));
            }
            if let Some(p) = max_param(&field.declared) {
                if p >= self.type_params {
                    return Err(Error::InvalidArgument(format!(
                        "field {}.{} uses type parameter {} but the class declares {}",
                        self.name, field.name, p, self.type_params
                    )));
                }
            }
        }
        Ok(Arc::new(ClassSchema {
            name: self.name,
            is_final: self.is_final,
            type_params: self.type_params,
            fields: self.fields,
            index,
        }))
    }
}

fn max_param(declared: &TypeDescriptor) -> Option<usize> {
    match declared {
        TypeDescriptor::Param(i) => Some(*i),
        TypeDescriptor::Parameterized { args, .. } => {
            args.iter().filter_map(|a| max_param(a)).max()
        }
        _ => None,
    }
}

/// Handle that assigns one field of records built from a schema.
///
/// Assignment validates the value against the field's declared type; a
/// rejected value leaves the field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAccessor {
    index: usize,
}

impl FieldAccessor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get<'g>(&self, graph: &'g Graph, target: ObjectRef) -> Option<&'g Value> {
        graph.get_record(target)?.field(self.index)
    }

    pub fn set(
        &self,
        graph: &mut Graph,
        target: ObjectRef,
        value: Value,
    ) -> core::result::Result<(), String> {
        graph.assign_field(target, self.index, value)
    }
}

/// Exportable enumeration: a name and its constants.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumSchema {
    name: String,
    constants: Vec<String>,
}

impl EnumSchema {
    pub fn new<I, S>(name: impl Into<String>, constants: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    pub fn contains(&self, constant: &str) -> bool {
        self.constants.iter().any(|c| c == constant)
    }

    pub fn descriptor(self: &Arc<Self>) -> TypeRef {
        Arc::new(TypeDescriptor::Enum(EnumType {
            name: self.name.clone(),
            schema: Some(Arc::clone(self)),
        }))
    }
}
