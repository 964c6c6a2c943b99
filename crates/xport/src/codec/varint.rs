// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian base-128 variable-length integers.
//!
//! Every id, length and string size in the format goes through this codec.
//! Each byte carries 7 bits of payload plus a continuation bit, so any value
//! in `[0, 2^63)` fits in 1 to 9 bytes.
//!
//! ```text
//!   300 = 0b10_0101100
//!   -> 0xAC (0101100 | continuation) 0x02 (10)
//! ```

use crate::error::{Error, Result};
use std::io::{ErrorKind, Read, Write};

/// Longest encoding of a non-negative `i64`.
pub const MAX_VARLONG_BYTES: usize = 9;

/// Largest id/length the format allows (lengths are 31-bit on every writer).
pub const MAX_VARINT: usize = i32::MAX as usize;

const PAYLOAD_MASK: u8 = 0x7f;
const CONTINUATION: u8 = 0x80;

/// Write a non-negative `i64`. Negative values are rejected.
pub fn write_varlong<W: Write + ?Sized>(out: &mut W, value: i64) -> Result<()> {
    if value < 0 {
        return Err(Error::InvalidArgument(format!(
            "varlong must be non-negative, got {}",
            value
        )));
    }
    let mut remaining = value as u64;
    let mut buf = [0u8; MAX_VARLONG_BYTES];
    let mut len = 0;
    loop {
        let bite = (remaining & u64::from(PAYLOAD_MASK)) as u8;
        remaining >>= 7;
        if remaining == 0 {
            buf[len] = bite;
            len += 1;
            break;
        }
        buf[len] = bite | CONTINUATION;
        len += 1;
    }
    out.write_all(&buf[..len])?;
    Ok(())
}

/// Read a varlong.
///
/// Returns `Ok(None)` when the source is exhausted before the first byte:
/// that is the normal end-of-sequence signal. Running out mid-value, a tenth
/// byte, or a zero-padded terminal byte are all `MalformedStream`.
pub fn read_varlong<R: Read + ?Sized>(input: &mut R) -> Result<Option<i64>> {
    let mut value = 0u64;
    let mut shift = 0u32;
    while shift < 63 {
        let Some(bite) = read_byte(input)? else {
            if shift == 0 {
                return Ok(None);
            }
            return Err(Error::malformed("truncated varint"));
        };
        value |= u64::from(bite & PAYLOAD_MASK) << shift;
        if bite & CONTINUATION == 0 {
            if shift > 0 && bite & PAYLOAD_MASK == 0 {
                return Err(Error::malformed("invalid zero padding in varint"));
            }
            return Ok(Some(value as i64));
        }
        shift += 7;
    }
    Err(Error::malformed("Invalid length prefix"))
}

/// Write an id or length.
pub fn write_varint<W: Write + ?Sized>(out: &mut W, value: usize) -> Result<()> {
    if value > MAX_VARINT {
        return Err(Error::InvalidArgument(format!(
            "length {} exceeds the format limit of {}",
            value, MAX_VARINT
        )));
    }
    write_varlong(out, value as i64)
}

/// Read an id or length, `Ok(None)` at a clean end of source.
pub fn read_varint<R: Read + ?Sized>(input: &mut R) -> Result<Option<usize>> {
    match read_varlong(input)? {
        None => Ok(None),
        Some(value) if value as u64 <= MAX_VARINT as u64 => Ok(Some(value as usize)),
        Some(value) => Err(Error::malformed(format!(
            "varint {} exceeds the format limit of {}",
            value, MAX_VARINT
        ))),
    }
}

/// Write a UTF-8 string prefixed by its byte length.
pub fn write_varstring<W: Write + ?Sized>(out: &mut W, value: &str) -> Result<()> {
    write_varint(out, value.len())?;
    out.write_all(value.as_bytes())?;
    Ok(())
}

/// Read a UTF-8 string prefixed by its byte length.
pub fn read_varstring<R: Read + ?Sized>(input: &mut R) -> Result<String> {
    let len = read_varint(input)?.ok_or_else(|| Error::malformed("truncated string length"))?;
    let bytes = read_bytes(input, len)?;
    String::from_utf8(bytes).map_err(|e| Error::malformed(format!("invalid UTF-8: {}", e)))
}

/// Read exactly `len` bytes.
///
/// The buffer grows as data arrives, so a corrupted length cannot force a
/// huge allocation up front.
pub fn read_bytes<R: Read + ?Sized>(input: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(8 * 1024));
    let got = input.take(len as u64).read_to_end(&mut buf)?;
    if got != len {
        return Err(Error::malformed(format!(
            "unexpected end of stream: wanted {} bytes, got {}",
            len, got
        )));
    }
    Ok(buf)
}

/// Number of bytes `value` occupies once encoded.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

fn read_byte<R: Read + ?Sized>(input: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
