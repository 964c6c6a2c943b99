// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type model: descriptors, schemas, registry and name translation.

mod descriptor;
mod names;
mod registry;
mod schema;

pub use descriptor::{
    bootstrap, ids, EnumType, PrimitiveKind, ReflectiveType, TypeDescriptor, TypeRef,
    BOOTSTRAP_LEN,
};
pub use names::{IdentityNames, NameMapper, NameTable};
pub use registry::{Resolved, TypeRegistry, TypeRegistryBuilder};
pub use schema::{ClassSchema, ClassSchemaBuilder, EnumSchema, FieldAccessor, FieldSpec};
