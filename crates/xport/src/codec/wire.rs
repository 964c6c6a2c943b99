// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-level writer/reader over `io::Write` / `io::Read`.
//!
//! Fixed-width primitives are big-endian. Ids, lengths and string sizes are
//! varints. Both sides count bytes so errors can report an offset.

use super::varint;
use crate::error::{Error, Result};
use std::io::{self, ErrorKind, Read, Write};

/// Generate big-endian write methods for primitive types.
macro_rules! impl_write_be {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) -> Result<()> {
            self.write_bytes(&value.to_be_bytes())
        }
    };
}

/// Generate big-endian read methods for primitive types.
///
/// Running out of input mid-value is a `MalformedStream`, never a clean end.
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            self.read_fixed(&mut bytes)?;
            Ok(<$type>::from_be_bytes(bytes))
        }
    };
}

/// Writer for the primitive wire vocabulary.
pub struct WireWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> WireWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    impl_write_be!(write_u8, u8);
    impl_write_be!(write_i8, i8);
    impl_write_be!(write_i16, i16);
    impl_write_be!(write_u16, u16);
    impl_write_be!(write_i32, i32);
    impl_write_be!(write_u32, u32);
    impl_write_be!(write_i64, i64);

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    /// UTF-16 code unit.
    pub fn write_char(&mut self, value: u16) -> Result<()> {
        self.write_u16(value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_bytes(&value.to_bits().to_be_bytes())
    }

    /// Object, type or field id.
    pub fn write_id(&mut self, id: usize) -> Result<()> {
        varint::write_varint(self, id)
    }

    /// Collection length or field count.
    pub fn write_length(&mut self, len: usize) -> Result<()> {
        varint::write_varint(self, len)
    }

    pub fn write_varlong(&mut self, value: i64) -> Result<()> {
        varint::write_varlong(self, value)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        varint::write_varstring(self, value)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.write_all(data)?;
        Ok(())
    }

    /// Total bytes handed to the sink so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for WireWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader for the primitive wire vocabulary.
pub struct WireReader<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    impl_read_be!(read_u8, u8, 1);
    impl_read_be!(read_i8, i8, 1);
    impl_read_be!(read_i16, i16, 2);
    impl_read_be!(read_u16, u16, 2);
    impl_read_be!(read_i32, i32, 4);
    impl_read_be!(read_u32, u32, 4);
    impl_read_be!(read_i64, i64, 8);
    impl_read_be!(read_u64, u64, 8);

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_char(&mut self) -> Result<u16> {
        self.read_u16()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Id at a position where the stream may legitimately end.
    pub fn read_id_or_end(&mut self) -> Result<Option<usize>> {
        varint::read_varint(self)
    }

    /// Id in the middle of a value: the stream must not end here.
    pub fn read_id(&mut self) -> Result<usize> {
        let offset = self.consumed;
        varint::read_varint(self)?
            .ok_or_else(|| Error::malformed(format!("stream ended at offset {} inside a value", offset)))
    }

    pub fn read_length(&mut self) -> Result<usize> {
        self.read_id()
    }

    pub fn read_varlong(&mut self) -> Result<Option<i64>> {
        varint::read_varlong(self)
    }

    pub fn read_string(&mut self) -> Result<String> {
        varint::read_varstring(self)
    }

    /// Bytes pulled from the source so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_fixed(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.consumed;
        self.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::malformed(format!(
                "unexpected end of stream at offset {} (wanted {} bytes)",
                offset,
                buf.len()
            )),
            _ => Error::Io(e),
        })
    }
}

impl<R: Read> Read for WireReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}
