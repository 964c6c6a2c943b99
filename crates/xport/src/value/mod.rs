// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values and the object graph they point into.
//!
//! Inline values (primitives, strings, enum constants, null) live directly
//! in a [`Value`]. Containers and records live in a [`Graph`] arena and are
//! addressed by [`ObjectRef`], which is what lets a graph share objects and
//! contain cycles.

mod compare;
mod graph;

pub use graph::{
    Dictionary, Graph, Multiset, Object, ObjectRef, Record, Sequence, UnresolvedRecord,
};

use crate::types::PrimitiveKind;
use std::sync::Arc;

/// Enum constant, identified by type name and constant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: Arc<str>,
    pub constant: Arc<str>,
}

impl EnumValue {
    pub fn new(type_name: impl Into<Arc<str>>, constant: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            constant: constant.into(),
        }
    }
}

/// A dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    /// UTF-16 code unit.
    Char(u16),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    Enum(EnumValue),
    /// Container or record stored in a [`Graph`].
    Ref(ObjectRef),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn enumeration(type_name: impl Into<Arc<str>>, constant: impl Into<Arc<str>>) -> Self {
        Value::Enum(EnumValue::new(type_name, constant))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Bool),
            Value::I8(_) => Some(PrimitiveKind::I8),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::I16(_) => Some(PrimitiveKind::I16),
            Value::I32(_) => Some(PrimitiveKind::I32),
            Value::I64(_) => Some(PrimitiveKind::I64),
            Value::F32(_) => Some(PrimitiveKind::F32),
            Value::F64(_) => Some(PrimitiveKind::F64),
            _ => None,
        }
    }

    /// Equality used for default-diffing: floats compare by bit pattern,
    /// so `NaN` equals itself and `-0.0` differs from `0.0`.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Value::Ref(r) => Some(*r),
            _ => None,
        }
    }
}

macro_rules! impl_from_primitive {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from_primitive!(bool, Bool);
impl_from_primitive!(i8, I8);
impl_from_primitive!(i16, I16);
impl_from_primitive!(i32, I32);
impl_from_primitive!(i64, I64);
impl_from_primitive!(f32, F32);
impl_from_primitive!(f64, F64);
impl_from_primitive!(ObjectRef, Ref);
impl_from_primitive!(EnumValue, Enum);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_compares_float_bits() {
        assert!(Value::F64(f64::NAN).same(&Value::F64(f64::NAN)));
        assert_ne!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert!(!Value::F32(-0.0).same(&Value::F32(0.0)));
        assert!(Value::from("a").same(&Value::string("a")));
        assert!(!Value::I32(1).same(&Value::I64(1)));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(7i32).as_i32(), Some(7));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")).as_str(), Some("x"));
        assert_eq!(Value::from(true).primitive_kind(), Some(PrimitiveKind::Bool));
        assert_eq!(Value::string("s").primitive_kind(), None);
        let e = Value::enumeration("gfx.Color", "RED");
        assert_eq!(e.as_enum().map(|e| &*e.constant), Some("RED"));
    }
}
