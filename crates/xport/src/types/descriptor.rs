// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: the runtime type information that travels on the wire.
//!
//! A [`TypeRef`] is an `Arc<TypeDescriptor>` compared structurally, so two
//! independently built `List<i32>` descriptors are the same table key in
//! every session.

use super::schema::{ClassSchema, EnumSchema};
use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Shared, structurally compared type descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// Fixed-width primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I32,
    I64,
    I16,
    I8,
    /// UTF-16 code unit.
    Char,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::I8 => 1,
            Self::I16 | Self::Char => 2,
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::Char => "char",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Zero value, used as the default of primitive fields.
    pub fn zero(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::I16 => Value::I16(0),
            Self::I8 => Value::I8(0),
            Self::Char => Value::Char(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
        }
    }
}

/// Enumeration type. The schema is absent only for names nobody registered.
#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub schema: Option<Arc<EnumSchema>>,
}

/// Record type described field by field.
#[derive(Debug, Clone)]
pub struct ReflectiveType {
    pub name: String,
    pub is_final: bool,
    /// `None` when the type came off the wire and nothing local matches.
    pub schema: Option<Arc<ClassSchema>>,
}

/// A complete type descriptor.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// Polymorphic slot: every value carries its own type.
    Any,
    String,
    Primitive(PrimitiveKind),
    Array,
    List,
    Set,
    Dictionary,
    Multiset,
    Enum(EnumType),
    Reflective(ReflectiveType),
    /// Uninstantiated user generic class.
    GenericBase { name: String, arity: usize },
    /// Container or generic class applied to type arguments.
    Parameterized { base: TypeRef, args: Vec<TypeRef> },
    /// Type parameter of the enclosing generic class, by position.
    Param(usize),
}

// ============================================================================
// Bootstrap table
// ============================================================================

/// Type ids every session starts with, in wire order.
pub mod ids {
    pub const ANY: usize = 0;
    pub const STRING: usize = 1;
    pub const BOOL: usize = 2;
    pub const I32: usize = 3;
    pub const I64: usize = 4;
    pub const I16: usize = 5;
    pub const I8: usize = 6;
    pub const CHAR: usize = 7;
    pub const F32: usize = 8;
    pub const F64: usize = 9;
    pub const ARRAY: usize = 10;
    pub const LIST: usize = 11;
    pub const SET: usize = 12;
    pub const DICTIONARY: usize = 13;
    pub const MULTISET: usize = 14;
}

/// Number of pre-assigned type ids.
pub const BOOTSTRAP_LEN: usize = 15;

/// The pre-assigned types, indexed by id.
pub fn bootstrap() -> &'static [TypeRef] {
    static TABLE: OnceLock<Vec<TypeRef>> = OnceLock::new();
    TABLE.get_or_init(|| {
        use PrimitiveKind::*;
        vec![
            Arc::new(TypeDescriptor::Any),
            Arc::new(TypeDescriptor::String),
            Arc::new(TypeDescriptor::Primitive(Bool)),
            Arc::new(TypeDescriptor::Primitive(I32)),
            Arc::new(TypeDescriptor::Primitive(I64)),
            Arc::new(TypeDescriptor::Primitive(I16)),
            Arc::new(TypeDescriptor::Primitive(I8)),
            Arc::new(TypeDescriptor::Primitive(Char)),
            Arc::new(TypeDescriptor::Primitive(F32)),
            Arc::new(TypeDescriptor::Primitive(F64)),
            Arc::new(TypeDescriptor::Array),
            Arc::new(TypeDescriptor::List),
            Arc::new(TypeDescriptor::Set),
            Arc::new(TypeDescriptor::Dictionary),
            Arc::new(TypeDescriptor::Multiset),
        ]
    })
}

fn bootstrap_entry(id: usize) -> TypeRef {
    Arc::clone(&bootstrap()[id])
}

impl TypeDescriptor {
    // ------------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------------

    pub fn any() -> TypeRef {
        bootstrap_entry(ids::ANY)
    }

    pub fn string() -> TypeRef {
        bootstrap_entry(ids::STRING)
    }

    pub fn primitive(kind: PrimitiveKind) -> TypeRef {
        let id = match kind {
            PrimitiveKind::Bool => ids::BOOL,
            PrimitiveKind::I32 => ids::I32,
            PrimitiveKind::I64 => ids::I64,
            PrimitiveKind::I16 => ids::I16,
            PrimitiveKind::I8 => ids::I8,
            PrimitiveKind::Char => ids::CHAR,
            PrimitiveKind::F32 => ids::F32,
            PrimitiveKind::F64 => ids::F64,
        };
        bootstrap_entry(id)
    }

    pub fn array_of(element: TypeRef) -> TypeRef {
        Self::parameterized(bootstrap_entry(ids::ARRAY), vec![element])
    }

    pub fn list_of(element: TypeRef) -> TypeRef {
        Self::parameterized(bootstrap_entry(ids::LIST), vec![element])
    }

    pub fn set_of(element: TypeRef) -> TypeRef {
        Self::parameterized(bootstrap_entry(ids::SET), vec![element])
    }

    pub fn multiset_of(element: TypeRef) -> TypeRef {
        Self::parameterized(bootstrap_entry(ids::MULTISET), vec![element])
    }

    pub fn dictionary_of(key: TypeRef, value: TypeRef) -> TypeRef {
        Self::parameterized(bootstrap_entry(ids::DICTIONARY), vec![key, value])
    }

    /// Reflective type known only by name, as used in declared slots.
    pub fn reflective(name: impl Into<String>, is_final: bool) -> TypeRef {
        Arc::new(TypeDescriptor::Reflective(ReflectiveType {
            name: name.into(),
            is_final,
            schema: None,
        }))
    }

    pub fn param(index: usize) -> TypeRef {
        Arc::new(TypeDescriptor::Param(index))
    }

    fn parameterized(base: TypeRef, args: Vec<TypeRef>) -> TypeRef {
        Arc::new(TypeDescriptor::Parameterized { base, args })
    }

    /// Apply a generic base or built-in container to arguments, checking arity.
    pub fn instantiate(base: &TypeRef, args: Vec<TypeRef>) -> Result<TypeRef> {
        let expected = base.arity().ok_or_else(|| {
            Error::InvalidArgument(format!("{} does not take type arguments", base))
        })?;
        if args.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "{} takes {} type argument(s), got {}",
                base,
                expected,
                args.len()
            )));
        }
        Ok(Self::parameterized(Arc::clone(base), args))
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    /// A final slot never carries a type id: the static type is the runtime type.
    pub fn is_final(&self) -> bool {
        match self {
            Self::String | Self::Primitive(_) | Self::Enum(_) => true,
            Self::Reflective(r) => r.is_final,
            _ => false,
        }
    }

    /// Value types are written inline, without an object id.
    pub fn is_value_type(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Array, List, Set, Dictionary or Multiset without arguments.
    pub fn is_builtin_container(&self) -> bool {
        matches!(
            self,
            Self::Array | Self::List | Self::Set | Self::Dictionary | Self::Multiset
        )
    }

    /// Number of type arguments this descriptor expects, if it is a base.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::Array | Self::List | Self::Set | Self::Multiset => Some(1),
            Self::Dictionary => Some(2),
            Self::GenericBase { arity, .. } => Some(*arity),
            _ => None,
        }
    }

    pub fn base(&self) -> Option<&TypeRef> {
        match self {
            Self::Parameterized { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[TypeRef] {
        match self {
            Self::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    /// Name used on the wire for named types (before name translation).
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(&e.name),
            Self::Reflective(r) => Some(&r.name),
            Self::GenericBase { name, .. } => Some(name),
            Self::Parameterized { base, .. } => base.type_name(),
            _ => None,
        }
    }

    /// Local class schema behind a reflective type.
    pub fn class_schema(&self) -> Option<&Arc<ClassSchema>> {
        match self {
            Self::Reflective(r) => r.schema.as_ref(),
            _ => None,
        }
    }

    pub fn contains_param(&self) -> bool {
        match self {
            Self::Param(_) => true,
            Self::Parameterized { args, .. } => args.iter().any(|a| a.contains_param()),
            _ => false,
        }
    }

    /// Replace `Param(i)` with `args[i]`. Parameters past the end become `Any`.
    pub fn substitute(self: &Arc<Self>, args: &[TypeRef]) -> TypeRef {
        match &**self {
            Self::Param(i) => args.get(*i).cloned().unwrap_or_else(Self::any),
            Self::Parameterized { base, args: inner } if self.contains_param() => {
                Self::parameterized(
                    Arc::clone(base),
                    inner.iter().map(|a| a.substitute(args)).collect(),
                )
            }
            _ => Arc::clone(self),
        }
    }

    /// Default value of a field declared with this type.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Primitive(kind) => kind.zero(),
            _ => Value::Null,
        }
    }
}

// ============================================================================
// Structural equality
// ============================================================================

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        use TypeDescriptor::*;
        match (self, other) {
            (Any, Any)
            | (String, String)
            | (Array, Array)
            | (List, List)
            | (Set, Set)
            | (Dictionary, Dictionary)
            | (Multiset, Multiset) => true,
            (Primitive(a), Primitive(b)) => a == b,
            (Enum(a), Enum(b)) => a.name == b.name,
            (Reflective(a), Reflective(b)) => a.name == b.name && a.is_final == b.is_final,
            (
                GenericBase { name: a, arity: x },
                GenericBase { name: b, arity: y },
            ) => a == b && x == y,
            (
                Parameterized { base: a, args: x },
                Parameterized { base: b, args: y },
            ) => a == b && x == y,
            (Param(a), Param(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Primitive(kind) => kind.hash(state),
            Self::Enum(e) => e.name.hash(state),
            Self::Reflective(r) => {
                r.name.hash(state);
                r.is_final.hash(state);
            }
            Self::GenericBase { name, arity } => {
                name.hash(state);
                arity.hash(state);
            }
            Self::Parameterized { base, args } => {
                base.hash(state);
                args.hash(state);
            }
            Self::Param(i) => i.hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::String => f.write_str("string"),
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::Array => f.write_str("Array"),
            Self::List => f.write_str("List"),
            Self::Set => f.write_str("Set"),
            Self::Dictionary => f.write_str("Dictionary"),
            Self::Multiset => f.write_str("Multiset"),
            Self::Enum(e) => f.write_str(&e.name),
            Self::Reflective(r) => f.write_str(&r.name),
            Self::GenericBase { name, arity } => {
                write!(f, "{}<{}>", name, vec!["_"; *arity].join(", "))
            }
            Self::Parameterized { base, args } => {
                match &**base {
                    Self::GenericBase { name, .. } => f.write_str(name)?,
                    other => write!(f, "{}", other)?,
                }
                f.write_str("<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            Self::Param(i) => write!(f, "${}", i),
        }
    }
}
