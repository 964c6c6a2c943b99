// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed layer: converting Rust values to and from [`Value`]s.
//!
//! Primitives, strings, options, boxes and the standard collections are
//! covered here. User structs and fieldless enums get their implementation
//! from `#[derive(Exportable)]`:
//!
//! ```
//! use xport::{BinaryExporter, BinaryImporter, Exportable, TypeRegistry};
//!
//! #[derive(Debug, Default, PartialEq, Exportable)]
//! #[export(name = "demo.Point", final)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let registry = TypeRegistry::builder().register::<Point>().build();
//! let mut exporter = BinaryExporter::new(Vec::new(), registry.clone());
//! exporter.write_typed(&Point { x: 1, y: 2 })?;
//! let bytes = exporter.finish()?;
//!
//! let mut importer = BinaryImporter::new(bytes.as_slice(), registry)?;
//! let point = importer.read_typed::<Point>()?.map(|d| d.into_value());
//! assert_eq!(point, Some(Point { x: 1, y: 2 }));
//! # Ok::<(), xport::Error>(())
//! ```

mod impls;

use crate::error::Error;
use crate::types::{ClassSchema, EnumSchema, TypeRef, TypeRegistryBuilder};
use crate::value::{Graph, Object, Record, Value};
use std::fmt;
use std::sync::Arc;

/// A Rust type with a wire representation.
pub trait ExportType: Sized {
    /// Declared type of slots holding this type.
    fn descriptor() -> TypeRef;

    /// Build the dynamic representation, allocating objects in `graph`.
    fn to_value(&self, graph: &mut Graph) -> Value;

    /// Rebuild from a dynamic value whose objects live in `graph`.
    fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError>;

    /// Register the schemas this type needs, recursively.
    fn register(_registry: &mut TypeRegistryBuilder) {}
}

/// Record type with a class schema. Implemented by `#[derive(Exportable)]` on structs.
pub trait Exportable: ExportType {
    fn class_schema() -> Arc<ClassSchema>;
}

/// Enumeration with an enum schema. Implemented by `#[derive(Exportable)]` on fieldless enums.
pub trait ExportEnum: ExportType {
    fn enum_schema() -> Arc<EnumSchema>;
}

/// A dynamic value did not have the shape a typed value needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertError {
    pub expected: String,
    pub found: String,
}

impl ConvertError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Error describing `value` as it appears in `graph`.
    pub fn unexpected(expected: impl Into<String>, value: &Value, graph: &Graph) -> Self {
        Self::new(expected, graph.describe(value))
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} into {}", self.found, self.expected)
    }
}

impl std::error::Error for ConvertError {}

impl From<ConvertError> for Error {
    fn from(e: ConvertError) -> Self {
        Error::ValueMismatch {
            expected: e.expected,
            found: e.found,
        }
    }
}

/// Record behind `value`, checked against a class name. Used by derived code.
pub fn expect_record<'g>(
    value: &Value,
    graph: &'g Graph,
    class_name: &str,
) -> Result<&'g Record, ConvertError> {
    match graph.resolve(value) {
        Some(Object::Record(record)) if record.class().name() == class_name => Ok(record),
        _ => Err(ConvertError::unexpected(class_name, value, graph)),
    }
}
