// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural equality across graphs.
//!
//! Two values are structurally equal when they have the same shape, and
//! the sharing and cycles reachable from them line up. Floats compare by
//! bit pattern. Records compare by class name and field names, so a record
//! decoded against a different schema instance still matches.

use super::graph::{Graph, Object, ObjectRef};
use super::Value;
use std::collections::HashMap;

impl Graph {
    /// Compare `a` (in `self`) with `b` (in `other`).
    pub fn structurally_equal(&self, a: &Value, other: &Graph, b: &Value) -> bool {
        Matcher {
            left: self,
            right: other,
            pairs: HashMap::new(),
            reverse: HashMap::new(),
        }
        .values(a, b)
    }
}

struct Matcher<'a> {
    left: &'a Graph,
    right: &'a Graph,
    pairs: HashMap<ObjectRef, ObjectRef>,
    reverse: HashMap<ObjectRef, ObjectRef>,
}

impl Matcher<'_> {
    fn values(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Ref(x), Value::Ref(y)) => self.objects(*x, *y),
            (Value::Ref(_), _) | (_, Value::Ref(_)) => false,
            _ => a.same(b),
        }
    }

    fn objects(&mut self, x: ObjectRef, y: ObjectRef) -> bool {
        // A pair already under comparison is assumed equal; a handle paired
        // with someone else means the sharing differs.
        match (self.pairs.get(&x), self.reverse.get(&y)) {
            (Some(&py), Some(&px)) => return py == y && px == x,
            (None, None) => {}
            _ => return false,
        }
        self.pairs.insert(x, y);
        self.reverse.insert(y, x);

        let (left, right) = (self.left, self.right);
        let (Some(ox), Some(oy)) = (left.get(x), right.get(y)) else {
            return false;
        };
        match (ox, oy) {
            (Object::Array(a), Object::Array(b))
            | (Object::List(a), Object::List(b))
            | (Object::Set(a), Object::Set(b)) => {
                a.element == b.element && self.sequences(&a.items, &b.items)
            }
            (Object::Dictionary(a), Object::Dictionary(b)) => {
                a.key == b.key
                    && a.value == b.value
                    && a.entries.len() == b.entries.len()
                    && a
                        .entries
                        .iter()
                        .zip(&b.entries)
                        .all(|((ka, va), (kb, vb))| self.values(ka, kb) && self.values(va, vb))
            }
            (Object::Multiset(a), Object::Multiset(b)) => {
                a.element == b.element
                    && a.entries.len() == b.entries.len()
                    && a
                        .entries
                        .iter()
                        .zip(&b.entries)
                        .all(|((ea, ca), (eb, cb))| ca == cb && self.values(ea, eb))
            }
            (Object::Record(a), Object::Record(b)) => {
                a.class().name() == b.class().name()
                    && a.type_args() == b.type_args()
                    && a.fields().len() == b.fields().len()
                    && a.class().fields().iter().zip(a.fields()).all(|(spec, va)| {
                        b.get(&spec.name)
                            .is_some_and(|vb| self.values(va, vb))
                    })
            }
            (Object::Unresolved(a), Object::Unresolved(b)) => {
                a.type_name == b.type_name
                    && a.fields.len() == b.fields.len()
                    && a
                        .fields
                        .iter()
                        .zip(&b.fields)
                        .all(|((na, va), (nb, vb))| na == nb && self.values(va, vb))
            }
            _ => false,
        }
    }

    fn sequences(&mut self, a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.values(x, y))
    }
}
