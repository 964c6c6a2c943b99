// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-level encoding: varints and big-endian primitives.

pub mod varint;
pub mod wire;

pub use varint::{
    read_varint, read_varlong, read_varstring, write_varint, write_varlong, write_varstring,
    MAX_VARINT, MAX_VARLONG_BYTES,
};
pub use wire::{WireReader, WireWriter};
