// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`ExportType`] for primitives, strings and the standard containers.

use super::{ConvertError, ExportType};
use crate::types::{PrimitiveKind, TypeDescriptor, TypeRef, TypeRegistryBuilder};
use crate::value::{Graph, Object, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

macro_rules! impl_primitive {
    ($type:ty, $variant:ident, $kind:ident) => {
        impl ExportType for $type {
            fn descriptor() -> TypeRef {
                TypeDescriptor::primitive(PrimitiveKind::$kind)
            }

            fn to_value(&self, _graph: &mut Graph) -> Value {
                Value::$variant(*self)
            }

            fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
                match value {
                    Value::$variant(v) => Ok(*v),
                    other => Err(ConvertError::unexpected(stringify!($type), other, graph)),
                }
            }
        }
    };
}

impl_primitive!(bool, Bool, Bool);
impl_primitive!(i8, I8, I8);
impl_primitive!(i16, I16, I16);
impl_primitive!(i32, I32, I32);
impl_primitive!(i64, I64, I64);
impl_primitive!(f32, F32, F32);
impl_primitive!(f64, F64, F64);

impl ExportType for String {
    fn descriptor() -> TypeRef {
        TypeDescriptor::string()
    }

    fn to_value(&self, _graph: &mut Graph) -> Value {
        Value::string(self.as_str())
    }

    fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => Ok(s.to_string()),
            other => Err(ConvertError::unexpected("string", other, graph)),
        }
    }
}

impl<T: ExportType> ExportType for Option<T> {
    /// Optional primitives are boxed, so they sit in a polymorphic slot.
    fn descriptor() -> TypeRef {
        let inner = T::descriptor();
        if inner.is_value_type() {
            TypeDescriptor::any()
        } else {
            inner
        }
    }

    fn to_value(&self, graph: &mut Graph) -> Value {
        match self {
            Some(v) => v.to_value(graph),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, graph).map(Some),
        }
    }

    fn register(registry: &mut TypeRegistryBuilder) {
        T::register(registry);
    }
}

impl<T: ExportType> ExportType for Box<T> {
    fn descriptor() -> TypeRef {
        T::descriptor()
    }

    fn to_value(&self, graph: &mut Graph) -> Value {
        (**self).to_value(graph)
    }

    fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
        T::from_value(value, graph).map(Box::new)
    }

    fn register(registry: &mut TypeRegistryBuilder) {
        T::register(registry);
    }
}

/// Items of any Array, List or Set.
fn sequence_items<'g>(value: &Value, graph: &'g Graph, expected: &str) -> Result<&'g [Value], ConvertError> {
    match graph.resolve(value) {
        Some(Object::Array(s) | Object::List(s) | Object::Set(s)) => Ok(&s.items),
        _ => Err(ConvertError::unexpected(expected, value, graph)),
    }
}

fn dictionary_entries<'g>(
    value: &Value,
    graph: &'g Graph,
    expected: &str,
) -> Result<&'g [(Value, Value)], ConvertError> {
    match graph.resolve(value) {
        Some(Object::Dictionary(d)) => Ok(&d.entries),
        _ => Err(ConvertError::unexpected(expected, value, graph)),
    }
}

impl<T: ExportType> ExportType for Vec<T> {
    fn descriptor() -> TypeRef {
        TypeDescriptor::list_of(T::descriptor())
    }

    fn to_value(&self, graph: &mut Graph) -> Value {
        let items = self.iter().map(|v| v.to_value(graph)).collect();
        graph.list(T::descriptor(), items)
    }

    fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
        sequence_items(value, graph, "List")?
            .iter()
            .map(|v| T::from_value(v, graph))
            .collect()
    }

    fn register(registry: &mut TypeRegistryBuilder) {
        T::register(registry);
    }
}

macro_rules! impl_set {
    ($set:ident, $($bound:path),+) => {
        impl<T: ExportType $(+ $bound)+> ExportType for $set<T> {
            fn descriptor() -> TypeRef {
                TypeDescriptor::set_of(T::descriptor())
            }

            fn to_value(&self, graph: &mut Graph) -> Value {
                let items = self.iter().map(|v| v.to_value(graph)).collect();
                graph.set(T::descriptor(), items)
            }

            fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
                sequence_items(value, graph, "Set")?
                    .iter()
                    .map(|v| T::from_value(v, graph))
                    .collect()
            }

            fn register(registry: &mut TypeRegistryBuilder) {
                T::register(registry);
            }
        }
    };
}

impl_set!(HashSet, Eq, Hash);
impl_set!(BTreeSet, Ord);

macro_rules! impl_map {
    ($map:ident, $($bound:path),+) => {
        impl<K: ExportType $(+ $bound)+, V: ExportType> ExportType for $map<K, V> {
            fn descriptor() -> TypeRef {
                TypeDescriptor::dictionary_of(K::descriptor(), V::descriptor())
            }

            fn to_value(&self, graph: &mut Graph) -> Value {
                let entries = self
                    .iter()
                    .map(|(k, v)| (k.to_value(graph), v.to_value(graph)))
                    .collect();
                graph.dictionary(K::descriptor(), V::descriptor(), entries)
            }

            fn from_value(value: &Value, graph: &Graph) -> Result<Self, ConvertError> {
                dictionary_entries(value, graph, "Dictionary")?
                    .iter()
                    .map(|(k, v)| Ok::<_, ConvertError>((K::from_value(k, graph)?, V::from_value(v, graph)?)))
                    .collect()
            }

            fn register(registry: &mut TypeRegistryBuilder) {
                K::register(registry);
                V::register(registry);
            }
        }
    };
}

impl_map!(HashMap, Eq, Hash);
impl_map!(BTreeMap, Ord);

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: ExportType>(value: &T) -> T {
        let mut graph = Graph::new();
        let v = value.to_value(&mut graph);
        T::from_value(&v, &graph).expect("convert back")
    }

    #[test]
    fn test_option_of_primitive_is_polymorphic() {
        assert_eq!(*<Option<i32>>::descriptor(), TypeDescriptor::Any);
        assert_eq!(<Option<String>>::descriptor(), TypeDescriptor::string());
        assert_eq!(roundtrip(&Some(4i32)), Some(4));
        assert_eq!(roundtrip(&None::<String>), None);
    }

    #[test]
    fn test_nested_collections() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), vec![1i64, 2]);
        map.insert("b".to_string(), Vec::new());
        assert_eq!(roundtrip(&map), map);
        assert_eq!(
            <BTreeMap<String, Vec<i64>>>::descriptor().to_string(),
            "Dictionary<string, List<i64>>"
        );

        let set: HashSet<i16> = [3, 1, 2].into_iter().collect();
        assert_eq!(roundtrip(&set), set);
    }

    #[test]
    fn test_wrong_shape() {
        let mut graph = Graph::new();
        let list = graph.list(TypeDescriptor::string(), vec![Value::from("x")]);
        let err = <Vec<i32>>::from_value(&list, &graph).expect_err("strings are not ints");
        assert_eq!(err.expected, "i32");
        assert!(<HashMap<String, i32>>::from_value(&list, &graph).is_err());
        assert!(i32::from_value(&Value::Null, &graph).is_err());
    }
}
