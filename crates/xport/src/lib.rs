// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # xport - binary object-graph serialization
//!
//! xport writes arbitrary object graphs (shared references, cycles, user
//! record types, enumerations, generic containers) into a compact,
//! self-describing binary stream and reads them back, tolerating schema drift
//! between the writer and the reader.
//!
//! ## Quick Start
//!
//! ```rust
//! use xport::{BinaryExporter, BinaryImporter, Graph, TypeDescriptor, TypeRegistry, Value};
//!
//! let mut graph = Graph::new();
//! let list = graph.list(TypeDescriptor::string(), vec![Value::from("a"), Value::from("b")]);
//!
//! let mut exporter = BinaryExporter::new(Vec::new(), TypeRegistry::empty());
//! exporter.write(&graph, &list)?;
//! let bytes = exporter.finish()?;
//!
//! let mut importer = BinaryImporter::new(bytes.as_slice(), TypeRegistry::empty())?;
//! let back = importer.read()?.expect("one value").into_value();
//! assert!(graph.structurally_equal(&list, importer.graph(), &back));
//! # Ok::<(), xport::Error>(())
//! ```
//!
//! ## Layers
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  typed        ExportType / #[derive(Exportable)]                    |
//! +---------------------------------------------------------------------+
//! |  binary       envelope: magic, version, flags, optional zlib        |
//! +---------------------------------------------------------------------+
//! |  export / import sessions: object ids, type ids, field diffs        |
//! +---------------------------------------------------------------------+
//! |  value        Graph arena of objects, Value slots                   |
//! |  types        TypeDescriptor, ClassSchema, TypeRegistry, names      |
//! +---------------------------------------------------------------------+
//! |  codec        varints, big-endian primitives                        |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Graph`] | Arena holding the objects a [`Value`] can reference |
//! | [`TypeRegistry`] | Local class and enum schemas plus the name mapper |
//! | [`ExportSession`] / [`ImportSession`] | One stream of values, sharing ids across calls |
//! | [`BinaryExporter`] / [`BinaryImporter`] | Sessions inside the envelope |
//! | [`Decoded`] | An imported value plus the warnings raised while decoding it |

// Derived code refers to `::xport`, including inside this crate's tests.
extern crate self as xport;

pub mod binary;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod framing;
pub mod import;
mod stack;
pub mod typed;
pub mod types;
pub mod value;

pub use binary::{BinaryExporter, BinaryImporter, COMPRESSED_FORMAT_FLAG, MAGIC_NUMBER, VERSION};
pub use config::{ExportConfig, ImportConfig, WarningPolicy, DEFAULT_MAX_DEPTH};
pub use error::{Decoded, Error, Result, Warning, WarningKind};
pub use export::ExportSession;
pub use import::ImportSession;
pub use typed::{ConvertError, ExportEnum, ExportType, Exportable};
pub use types::{
    ClassSchema, ClassSchemaBuilder, EnumSchema, FieldAccessor, FieldSpec, IdentityNames,
    NameMapper, NameTable, PrimitiveKind, TypeDescriptor, TypeRef, TypeRegistry,
    TypeRegistryBuilder,
};
pub use value::{
    Dictionary, EnumValue, Graph, Multiset, Object, ObjectRef, Record, Sequence, UnresolvedRecord,
    Value,
};

pub use xport_codegen::Exportable; // Derive macro (for #[derive(xport::Exportable)])
