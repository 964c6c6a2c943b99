// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Length-prefixed frames for carrying several independent streams over one
//! byte channel.
//!
//! Each frame is a varlong byte count followed by that many bytes. Writers
//! buffer the whole frame, since the length must be known before the body.

use crate::codec::varint;
use crate::error::{Error, Result};
use std::io::{self, Read, Write};

/// Read one frame. `Ok(None)` when the source ends cleanly before a frame.
pub fn read_frame<R: Read + ?Sized>(source: &mut R) -> Result<Option<Vec<u8>>> {
    let Some(len) = varint::read_varlong(source)? else {
        return Ok(None);
    };
    let len = usize::try_from(len)
        .map_err(|_| Error::malformed(format!("frame length {} does not fit in memory", len)))?;
    varint::read_bytes(source, len).map(Some)
}

/// Write one frame.
pub fn write_frame<W: Write + ?Sized>(dest: &mut W, bytes: &[u8]) -> Result<()> {
    let len = i64::try_from(bytes.len())
        .map_err(|_| Error::InvalidArgument(format!("frame of {} bytes is too large", bytes.len())))?;
    varint::write_varlong(dest, len)?;
    dest.write_all(bytes)?;
    Ok(())
}

/// Buffers everything written to it, then emits it as a single frame on
/// [`finish`](FrameWriter::finish).
pub struct FrameWriter<W: Write> {
    dest: W,
    buffer: Vec<u8>,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            dest,
            buffer: Vec::new(),
        }
    }

    /// Bytes buffered so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write the length prefix and the buffered body, then return the destination.
    pub fn finish(mut self) -> Result<W> {
        write_frame(&mut self.dest, &self.buffer)?;
        self.dest.flush()?;
        Ok(self.dest)
    }
}

impl<W: Write> Write for FrameWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Iterator over the frames of a source.
pub struct Frames<R> {
    source: R,
    failed: bool,
}

impl<R: Read> Frames<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            failed: false,
        }
    }
}

impl<R: Read> Iterator for Frames<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match read_frame(&mut self.source) {
            Ok(frame) => frame.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
