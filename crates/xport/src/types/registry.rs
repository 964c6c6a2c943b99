// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: name to schema lookup shared by every session.
//!
//! A registry is built once, frozen in an `Arc`, and handed to exporters and
//! importers. Sessions never mutate it.

use super::names::{IdentityNames, NameMapper};
use super::schema::{ClassSchema, EnumSchema};
use crate::typed::ExportType;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a name lookup.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Class(&'a Arc<ClassSchema>),
    Enum(&'a Arc<EnumSchema>),
}

/// Frozen set of known record and enum types.
#[derive(Debug)]
pub struct TypeRegistry {
    classes: HashMap<String, Arc<ClassSchema>>,
    enums: HashMap<String, Arc<EnumSchema>>,
    names: Arc<dyn NameMapper>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            classes: HashMap::new(),
            enums: HashMap::new(),
            names: Arc::new(IdentityNames),
        }
    }
}

impl TypeRegistry {
    /// Empty registry with identity naming.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassSchema>> {
        self.classes.get(name)
    }

    pub fn enum_schema(&self, name: &str) -> Option<&Arc<EnumSchema>> {
        self.enums.get(name)
    }

    pub fn resolve(&self, name: &str) -> Option<Resolved<'_>> {
        self.classes
            .get(name)
            .map(Resolved::Class)
            .or_else(|| self.enums.get(name).map(Resolved::Enum))
    }

    pub fn names(&self) -> &dyn NameMapper {
        self.names.as_ref()
    }

    /// Number of registered classes and enums.
    pub fn len(&self) -> usize {
        self.classes.len() + self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    inner: TypeRegistry,
}

impl TypeRegistryBuilder {
    /// Register a class schema. A later schema with the same name replaces the earlier one.
    pub fn class(mut self, schema: Arc<ClassSchema>) -> Self {
        self.add_class(schema);
        self
    }

    pub fn enum_type(mut self, schema: Arc<EnumSchema>) -> Self {
        self.add_enum(schema);
        self
    }

    /// Register a typed value's schema and everything its fields reach.
    pub fn register<T: ExportType>(mut self) -> Self {
        T::register(&mut self);
        self
    }

    pub fn names(mut self, mapper: impl NameMapper + 'static) -> Self {
        self.inner.names = Arc::new(mapper);
        self
    }

    /// Add a class; `false` if that name was already present.
    pub fn add_class(&mut self, schema: Arc<ClassSchema>) -> bool {
        let name = schema.name().to_string();
        let fresh = !self.inner.classes.contains_key(&name);
        if !fresh {
            log::debug!("[xport::registry] replacing class schema {}", name);
        }
        self.inner.classes.insert(name, schema);
        fresh
    }

    /// Add an enum; `false` if that name was already present.
    pub fn add_enum(&mut self, schema: Arc<EnumSchema>) -> bool {
        let name = schema.name().to_string();
        self.inner.enums.insert(name, schema).is_none()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.resolve(name).is_some()
    }

    pub fn build(self) -> Arc<TypeRegistry> {
        log::debug!(
            "[xport::registry] frozen with {} classes, {} enums",
            self.inner.classes.len(),
            self.inner.enums.len()
        );
        Arc::new(self.inner)
    }
}
