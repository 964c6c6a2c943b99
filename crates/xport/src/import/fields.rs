// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type field tables on the import side.

use crate::types::TypeRef;

/// A field as announced by the writer.
#[derive(Debug, Clone)]
pub(crate) struct ImportField {
    pub name: String,
    pub declared: TypeRef,
    /// Index of the matching local field, if any.
    pub local: Option<usize>,
}

/// Fields announced so far for one wire type, indexed by field id.
#[derive(Debug, Default)]
pub(crate) struct ImportFields {
    pub slots: Vec<ImportField>,
}
