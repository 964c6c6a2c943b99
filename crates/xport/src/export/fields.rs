// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type field tables on the export side.

use crate::types::{ClassSchema, TypeDescriptor, TypeRef};
use crate::value::{Record, Value};

/// One field of a concrete record type.
#[derive(Debug)]
pub(crate) struct ExportField {
    pub name: String,
    /// Declared type with the record's type arguments substituted.
    pub declared: TypeRef,
    pub default: Value,
    /// Enum-typed fields are written even when they hold the default.
    pub always: bool,
    /// Session-local id, assigned the first time the field is written.
    pub wire_id: Option<usize>,
}

/// Field table of one concrete record type within one session.
#[derive(Debug)]
pub(crate) struct ExportFields {
    pub fields: Vec<ExportField>,
    pub next_id: usize,
}

impl ExportFields {
    pub fn new(class: &ClassSchema, type_args: &[TypeRef]) -> Self {
        let fields = class
            .fields()
            .iter()
            .map(|spec| {
                let declared = spec.declared.substitute(type_args);
                ExportField {
                    name: spec.name.clone(),
                    always: matches!(*declared, TypeDescriptor::Enum(_)),
                    declared,
                    default: spec.default.clone(),
                    wire_id: None,
                }
            })
            .collect();
        Self { fields, next_id: 0 }
    }

    /// Indices of the fields of `record` that must be written, in schema order.
    pub fn changed(&self, record: &Record) -> Vec<usize> {
        self.fields
            .iter()
            .zip(record.fields())
            .enumerate()
            .filter(|(_, (field, value))| field.always || !value.same(&field.default))
            .map(|(i, _)| i)
            .collect()
    }

    /// Id of field `index`, and whether this is its first appearance.
    pub fn claim(&mut self, index: usize) -> Option<(usize, bool)> {
        let field = self.fields.get_mut(index)?;
        match field.wire_id {
            Some(id) => Some((id, false)),
            None => {
                let id = self.next_id;
                self.next_id += 1;
                field.wire_id = Some(id);
                Some((id, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumSchema, PrimitiveKind};
    use std::sync::Arc;

    fn schema() -> Arc<ClassSchema> {
        ClassSchema::builder("t.Unit")
            .field("hp", TypeDescriptor::primitive(PrimitiveKind::I32))
            .field_with_default(
                "speed",
                TypeDescriptor::primitive(PrimitiveKind::F64),
                Value::F64(1.0),
            )
            .field("team", EnumSchema::new("t.Team", ["RED", "BLUE"]).descriptor())
            .build()
            .expect("schema")
    }

    #[test]
    fn test_changed_skips_defaults_but_keeps_enums() {
        let schema = schema();
        let table = ExportFields::new(&schema, &[]);
        let mut record = Record::new(Arc::clone(&schema));
        assert_eq!(table.changed(&record), vec![2]);

        if let Some(hp) = record.field_mut(0) {
            *hp = Value::I32(10);
        }
        assert_eq!(table.changed(&record), vec![0, 2]);
    }

    #[test]
    fn test_ids_follow_first_use() {
        let schema = schema();
        let mut table = ExportFields::new(&schema, &[]);
        assert_eq!(table.claim(2), Some((0, true)));
        assert_eq!(table.claim(0), Some((1, true)));
        assert_eq!(table.claim(2), Some((0, false)));
        assert_eq!(table.claim(9), None);
    }
}
