// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error and warning types for export/import sessions.
//!
//! Two tiers:
//!
//! - [`Error`] is fatal. Anything that threatens the shared integer-id
//!   bookkeeping (object ids, type ids, field ids) or the byte alignment of
//!   the stream ends up here, and the session that produced it is poisoned.
//! - [`Warning`] is recoverable. Drift that can be isolated to one field or
//!   one type is reported, the value is still consumed from the stream, and
//!   decoding continues with a best-effort result.

use std::fmt;

/// Fatal session error.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Stream Errors
    // ========================================================================
    /// Truncated data, bad varint padding, invalid UTF-8, impossible type shape.
    MalformedStream(String),
    /// An object id skipped ahead of the next sequential id.
    UnexpectedObjectId { expected: usize, found: usize },
    /// A field id arrived out of the monotonic per-type sequence.
    UnexpectedFieldId {
        type_name: String,
        expected: usize,
        found: usize,
    },
    /// The envelope does not start with the format's magic number.
    BadMagic(u32),
    /// The envelope carries a format version this build cannot read.
    UnsupportedVersion(u8),

    // ========================================================================
    // Export Errors
    // ========================================================================
    /// Caller handed the codec something it cannot represent (negative varint, huge length).
    InvalidArgument(String),
    /// A value's class has no schema the session can describe.
    UnregisteredType(String),
    /// A value does not conform to the statically expected type descriptor.
    ValueMismatch { expected: String, found: String },
    /// A graph handle that does not address an object of the graph being written.
    DanglingReference(usize),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// A recoverable warning escalated by [`WarningPolicy::Fail`](crate::WarningPolicy::Fail).
    Rejected(Warning),
    /// The session already failed once; its tables can no longer be trusted.
    SessionPoisoned,
    /// Underlying byte source/sink failure.
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedStream(reason.into())
    }

    pub(crate) fn mismatch(expected: impl fmt::Display, found: impl fmt::Debug) -> Self {
        Error::ValueMismatch {
            expected: expected.to_string(),
            found: format!("{:?}", found),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedStream(reason) => write!(f, "Malformed stream: {}", reason),
            Error::UnexpectedObjectId { expected, found } => write!(
                f,
                "Unexpected object id: expected at most {}, found {}",
                expected, found
            ),
            Error::UnexpectedFieldId {
                type_name,
                expected,
                found,
            } => write!(
                f,
                "Unexpected field id for {}: expected at most {}, found {}",
                type_name, expected, found
            ),
            Error::BadMagic(magic) => write!(f, "Bad magic number: {:#010x}", magic),
            Error::UnsupportedVersion(version) => {
                write!(f, "Unsupported format version: {}", version)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::UnregisteredType(name) => write!(f, "Unregistered type: {}", name),
            Error::ValueMismatch { expected, found } => {
                write!(f, "Value mismatch: expected {}, found {}", expected, found)
            }
            Error::DanglingReference(index) => write!(f, "Dangling object reference #{}", index),
            Error::Rejected(warning) => write!(f, "Rejected by policy: {}", warning),
            Error::SessionPoisoned => write!(f, "Session poisoned by an earlier failure"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for session results.
pub type Result<T> = core::result::Result<T, Error>;

/// Recoverable import condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A type name on the wire has no local counterpart; its values are read and dropped.
    UnresolvedType { name: String },
    /// A field on the wire has no local counterpart; its value is read and dropped.
    UnresolvedField { type_name: String, field: String },
    /// An enum constant on the wire is unknown locally; the value degrades to null.
    UnresolvedEnumValue { type_name: String, constant: String },
    /// The local accessor rejected a decoded value; the field keeps its default.
    FieldAssignmentFailed {
        type_name: String,
        field: String,
        reason: String,
    },
}

impl Warning {
    pub fn kind(&self) -> WarningKind {
        match self {
            Warning::UnresolvedType { .. } => WarningKind::UnresolvedType,
            Warning::UnresolvedField { .. } => WarningKind::UnresolvedField,
            Warning::UnresolvedEnumValue { .. } => WarningKind::UnresolvedEnumValue,
            Warning::FieldAssignmentFailed { .. } => WarningKind::FieldAssignmentFailed,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedType { name } => {
                write!(f, "unknown type will be dropped: {}", name)
            }
            Warning::UnresolvedField { type_name, field } => {
                write!(f, "unknown field {}.{} will be dropped", type_name, field)
            }
            Warning::UnresolvedEnumValue {
                type_name,
                constant,
            } => write!(
                f,
                "could not find enum constant '{}' in type {}",
                constant, type_name
            ),
            Warning::FieldAssignmentFailed {
                type_name,
                field,
                reason,
            } => write!(
                f,
                "unable to assign value to field {}.{}: {}",
                type_name, field, reason
            ),
        }
    }
}

/// Discriminant of [`Warning`], used to key policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    UnresolvedType,
    UnresolvedField,
    UnresolvedEnumValue,
    FieldAssignmentFailed,
}

impl WarningKind {
    pub const ALL: [WarningKind; 4] = [
        WarningKind::UnresolvedType,
        WarningKind::UnresolvedField,
        WarningKind::UnresolvedEnumValue,
        WarningKind::FieldAssignmentFailed,
    ];
}

/// Outcome of decoding one root value.
///
/// `Degraded` carries the value together with every warning raised while it
/// was being decoded, so callers can detect lossy imports without scraping logs.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Ok(T),
    Degraded(T, Vec<Warning>),
}

impl<T> Decoded<T> {
    pub(crate) fn from_parts(value: T, warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            Decoded::Ok(value)
        } else {
            Decoded::Degraded(value, warnings)
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Decoded::Degraded(..))
    }

    pub fn value(&self) -> &T {
        match self {
            Decoded::Ok(value) | Decoded::Degraded(value, _) => value,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Decoded::Ok(_) => &[],
            Decoded::Degraded(_, warnings) => warnings,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Decoded::Ok(value) | Decoded::Degraded(value, _) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Ok(value) => Decoded::Ok(f(value)),
            Decoded::Degraded(value, warnings) => Decoded::Degraded(f(value), warnings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_variants() {
        let err = Error::UnexpectedFieldId {
            type_name: "game.Player".into(),
            expected: 2,
            found: 5,
        };
        assert_eq!(
            err.to_string(),
            "Unexpected field id for game.Player: expected at most 2, found 5"
        );
        assert_eq!(
            Error::BadMagic(0x1234_5678).to_string(),
            "Bad magic number: 0x12345678"
        );
        assert_eq!(
            Error::malformed("Invalid length prefix").to_string(),
            "Malformed stream: Invalid length prefix"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert!(err.source().is_some());
        assert!(Error::SessionPoisoned.source().is_none());
    }

    #[test]
    fn test_decoded_tagging() {
        let clean = Decoded::from_parts(7, Vec::new());
        assert!(!clean.is_degraded());
        assert!(clean.warnings().is_empty());

        let warning = Warning::UnresolvedType {
            name: "gone.Type".into(),
        };
        let lossy = Decoded::from_parts(7, vec![warning.clone()]);
        assert!(lossy.is_degraded());
        assert_eq!(lossy.warnings(), &[warning]);
        assert_eq!(lossy.map(|v| v * 2).into_value(), 14);
    }

    #[test]
    fn test_warning_kind_roundtrip() {
        let w = Warning::FieldAssignmentFailed {
            type_name: "T".into(),
            field: "f".into(),
            reason: "expected i32".into(),
        };
        assert_eq!(w.kind(), WarningKind::FieldAssignmentFailed);
        assert!(w.to_string().contains("T.f"));
    }
}
