// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session configuration.
//!
//! Export decides whether the envelope body is compressed and how deep a graph
//! may nest. Import decides what happens to each kind of recoverable warning
//! and how deep a value may nest before the stream is rejected.
//!
//! # Exemple
//!
//! ```
//! use xport::{ImportConfig, WarningKind, WarningPolicy};
//!
//! let config = ImportConfig::default()
//!     .policy(WarningKind::UnresolvedField, WarningPolicy::Suppress)
//!     .policy(WarningKind::UnresolvedType, WarningPolicy::Fail)
//!     .max_depth(64);
//! assert_eq!(config.policy_for(WarningKind::UnresolvedType), WarningPolicy::Fail);
//! ```

use crate::error::WarningKind;
use std::collections::HashMap;

/// Default nesting limit for encoded and decoded values.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// What an import session does with a recoverable warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarningPolicy {
    /// Drop silently; the warning is not attached to the result either.
    Suppress,
    /// Log through `log::warn!` and attach to the result.
    #[default]
    Log,
    /// Escalate to [`Error::Rejected`](crate::Error::Rejected) and poison the session.
    Fail,
}

/// Exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Wrap everything after the envelope header in a zlib stream.
    pub compress: bool,
    /// Maximum nesting of values and type descriptors.
    pub max_depth: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compress: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ExportConfig {
    pub fn uncompressed() -> Self {
        Self {
            compress: false,
            ..Self::default()
        }
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Importer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    policies: HashMap<WarningKind, WarningPolicy>,
    /// Keep the fields of unresolved reflective types as
    /// [`Object::Unresolved`](crate::Object::Unresolved) instead of dropping them.
    pub retain_unresolved: bool,
    /// Maximum nesting of values and type descriptors.
    pub max_depth: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            policies: HashMap::new(),
            retain_unresolved: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ImportConfig {
    /// Set the policy for one warning kind.
    pub fn policy(mut self, kind: WarningKind, policy: WarningPolicy) -> Self {
        self.policies.insert(kind, policy);
        self
    }

    /// Set the same policy for every warning kind.
    pub fn all_policies(mut self, policy: WarningPolicy) -> Self {
        for kind in WarningKind::ALL {
            self.policies.insert(kind, policy);
        }
        self
    }

    pub fn retain_unresolved(mut self, retain: bool) -> Self {
        self.retain_unresolved = retain;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn policy_for(&self, kind: WarningKind) -> WarningPolicy {
        self.policies.get(&kind).copied().unwrap_or_default()
    }
}
