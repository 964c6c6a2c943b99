// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Translation between local type names and the names written on the wire.
//!
//! Peers that name the same class differently (`game::items::Sword` here,
//! `com.example.game.items.Sword` there) agree through a [`NameMapper`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Bidirectional type-name translation.
pub trait NameMapper: Send + Sync + fmt::Debug {
    /// Local name to wire name.
    fn to_wire<'a>(&self, local: &'a str) -> Cow<'a, str>;
    /// Wire name to local name.
    fn from_wire<'a>(&self, wire: &'a str) -> Cow<'a, str>;
}

/// Names are written exactly as registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityNames;

impl NameMapper for IdentityNames {
    fn to_wire<'a>(&self, local: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(local)
    }

    fn from_wire<'a>(&self, wire: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(wire)
    }
}

/// Table-driven translation.
///
/// Lookup order: explicit pairs, then one namespace prefix rewrite, then a
/// path separator swap on whatever follows the prefix.
///
/// ```
/// use xport::{NameMapper, NameTable};
///
/// let names = NameTable::new()
///     .prefix("game::", "com.example.game.")
///     .separators("::", ".")
///     .map("std::Vec", "java.util.ArrayList");
///
/// assert_eq!(names.to_wire("game::items::Sword"), "com.example.game.items.Sword");
/// assert_eq!(names.from_wire("com.example.game.items.Sword"), "game::items::Sword");
/// assert_eq!(names.from_wire("java.util.ArrayList"), "std::Vec");
/// ```
#[derive(Debug, Default, Clone)]
pub struct NameTable {
    local_to_wire: HashMap<String, String>,
    wire_to_local: HashMap<String, String>,
    prefixes: Vec<(String, String)>,
    separators: Option<(String, String)>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact pair, used in both directions.
    pub fn map(mut self, local: impl Into<String>, wire: impl Into<String>) -> Self {
        let (local, wire) = (local.into(), wire.into());
        self.local_to_wire.insert(local.clone(), wire.clone());
        self.wire_to_local.insert(wire, local);
        self
    }

    /// Extra wire name accepted on import only (several remote names, one local type).
    pub fn alias(mut self, wire: impl Into<String>, local: impl Into<String>) -> Self {
        self.wire_to_local.insert(wire.into(), local.into());
        self
    }

    /// Namespace prefix rewrite. The first matching prefix wins.
    pub fn prefix(mut self, local: impl Into<String>, wire: impl Into<String>) -> Self {
        self.prefixes.push((local.into(), wire.into()));
        self
    }

    /// Path separator swap, e.g. `("::", ".")`.
    pub fn separators(mut self, local: impl Into<String>, wire: impl Into<String>) -> Self {
        self.separators = Some((local.into(), wire.into()));
        self
    }

    fn rewrite<'a>(
        &self,
        name: &'a str,
        prefix_of: impl Fn(&(String, String)) -> (&str, &str),
        sep_of: impl Fn(&(String, String)) -> (&str, &str),
    ) -> Cow<'a, str> {
        let (head, rest) = self
            .prefixes
            .iter()
            .map(&prefix_of)
            .find_map(|(from, to)| name.strip_prefix(from).map(|rest| (Some(to), rest)))
            .unwrap_or((None, name));
        let rest: Cow<'a, str> = match self.separators.as_ref().map(&sep_of) {
            Some((from, to)) if !from.is_empty() && rest.contains(from) => {
                Cow::Owned(rest.replace(from, to))
            }
            _ => Cow::Borrowed(rest),
        };
        match head {
            Some(to) => Cow::Owned(format!("{}{}", to, rest)),
            None => rest,
        }
    }
}

impl NameMapper for NameTable {
    fn to_wire<'a>(&self, local: &'a str) -> Cow<'a, str> {
        if let Some(wire) = self.local_to_wire.get(local) {
            return Cow::Owned(wire.clone());
        }
        self.rewrite(
            local,
            |(l, w)| (l.as_str(), w.as_str()),
            |(l, w)| (l.as_str(), w.as_str()),
        )
    }

    fn from_wire<'a>(&self, wire: &'a str) -> Cow<'a, str> {
        if let Some(local) = self.wire_to_local.get(wire) {
            return Cow::Owned(local.clone());
        }
        self.rewrite(
            wire,
            |(l, w)| (w.as_str(), l.as_str()),
            |(l, w)| (w.as_str(), l.as_str()),
        )
    }
}
