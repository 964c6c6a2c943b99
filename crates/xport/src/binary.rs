// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary envelope around an export/import session.
//!
//! ```text
//! +------------+---------+--------------+--------------------------------+
//! | magic (4B) | version | flags varint | session stream (zlib if bit 0) |
//! | 0xFACEAF0E |   0x00  |              |                                |
//! +------------+---------+--------------+--------------------------------+
//! ```
//!
//! The exporter writes the header lazily on the first value, so an exporter
//! that never writes anything leaves its sink untouched.

use crate::codec::{WireReader, WireWriter};
use crate::config::{ExportConfig, ImportConfig};
use crate::error::{Decoded, Error, Result};
use crate::export::ExportSession;
use crate::import::ImportSession;
use crate::typed::ExportType;
use crate::types::{TypeRef, TypeRegistry};
use crate::value::{Graph, Value};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;

/// First four bytes of every envelope.
pub const MAGIC_NUMBER: u32 = 0xFACE_AF0E;

/// Format version written by this build.
pub const VERSION: u8 = 0;

/// Flag bit: the session stream is zlib-compressed.
pub const COMPRESSED_FORMAT_FLAG: usize = 1 << 0;

// ============================================================================
// Sink / Source
// ============================================================================

enum Sink<W: Write> {
    Plain(W),
    Zlib(ZlibEncoder<W>),
}

impl<W: Write> Sink<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Sink::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Sink::Zlib(encoder) => {
                let mut w = encoder.finish()?;
                w.flush()?;
                Ok(w)
            }
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Zlib(z) => z.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Zlib(z) => z.flush(),
        }
    }
}

enum Source<R: Read> {
    Plain(R),
    Zlib(ZlibDecoder<R>),
    /// Zero-byte input: a stream holding no values.
    Empty,
}

impl<R: Read> Read for Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Plain(r) => r.read(buf),
            Source::Zlib(z) => z.read(buf),
            Source::Empty => Ok(0),
        }
    }
}

// ============================================================================
// Exporter
// ============================================================================

enum ExporterState<W: Write> {
    Pending(W),
    Active(ExportSession<Sink<W>>),
    Closed,
}

/// Writes values into an enveloped, optionally compressed stream.
pub struct BinaryExporter<W: Write> {
    registry: Arc<TypeRegistry>,
    config: ExportConfig,
    state: ExporterState<W>,
}

impl<W: Write> BinaryExporter<W> {
    pub fn new(out: W, registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(out, registry, ExportConfig::default())
    }

    pub fn with_config(out: W, registry: Arc<TypeRegistry>, config: ExportConfig) -> Self {
        Self {
            registry,
            config,
            state: ExporterState::Pending(out),
        }
    }

    /// Write one root value.
    pub fn write(&mut self, graph: &Graph, value: &Value) -> Result<()> {
        self.session()?.write(graph, value)
    }

    /// Write one root value against an explicit declared type.
    pub fn write_as(&mut self, graph: &Graph, value: &Value, declared: &TypeRef) -> Result<()> {
        self.session()?.write_as(graph, value, declared)
    }

    /// Write a typed value through a scratch graph.
    pub fn write_typed<T: ExportType>(&mut self, value: &T) -> Result<()> {
        let mut graph = Graph::new();
        let root = value.to_value(&mut graph);
        self.write(&graph, &root)
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.state {
            ExporterState::Active(session) => session.flush(),
            ExporterState::Pending(out) => Ok(out.flush()?),
            ExporterState::Closed => Err(Error::SessionPoisoned),
        }
    }

    /// Terminate the compressed stream (if any) and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        match std::mem::replace(&mut self.state, ExporterState::Closed) {
            ExporterState::Pending(out) => Ok(out),
            ExporterState::Active(session) => Ok(session.into_inner().finish()?),
            ExporterState::Closed => Err(Error::SessionPoisoned),
        }
    }

    fn session(&mut self) -> Result<&mut ExportSession<Sink<W>>> {
        if let ExporterState::Pending(_) = self.state {
            let ExporterState::Pending(out) = std::mem::replace(&mut self.state, ExporterState::Closed)
            else {
                return Err(Error::SessionPoisoned);
            };
            let mut header = WireWriter::new(out);
            header.write_u32(MAGIC_NUMBER)?;
            header.write_u8(VERSION)?;
            let flags = if self.config.compress {
                COMPRESSED_FORMAT_FLAG
            } else {
                0
            };
            header.write_length(flags)?;
            let out = header.into_inner();
            log::debug!(
                "[BinaryExporter] header written (compressed: {})",
                self.config.compress
            );
            let sink = if self.config.compress {
                Sink::Zlib(ZlibEncoder::new(out, Compression::default()))
            } else {
                Sink::Plain(out)
            };
            self.state = ExporterState::Active(ExportSession::with_config(
                sink,
                Arc::clone(&self.registry),
                &self.config,
            ));
        }
        match &mut self.state {
            ExporterState::Active(session) => Ok(session),
            _ => Err(Error::SessionPoisoned),
        }
    }
}

// ============================================================================
// Importer
// ============================================================================

/// Reads values back from an enveloped stream.
pub struct BinaryImporter<R: Read> {
    session: ImportSession<Source<R>>,
    compressed: bool,
}

impl<R: Read> BinaryImporter<R> {
    /// Validate the envelope header. An empty source is a stream with no values.
    pub fn new(input: R, registry: Arc<TypeRegistry>) -> Result<Self> {
        Self::with_config(input, registry, ImportConfig::default())
    }

    pub fn with_config(mut input: R, registry: Arc<TypeRegistry>, config: ImportConfig) -> Result<Self> {
        let mut magic = [0u8; 4];
        let got = read_up_to(&mut input, &mut magic)?;
        if got == 0 {
            log::debug!("[BinaryImporter] empty source");
            return Ok(Self {
                session: ImportSession::with_config(Source::Empty, registry, config),
                compressed: false,
            });
        }
        if got < magic.len() {
            return Err(Error::malformed("stream ended inside the envelope header"));
        }
        let magic = u32::from_be_bytes(magic);
        if magic != MAGIC_NUMBER {
            return Err(Error::BadMagic(magic));
        }

        let mut header = WireReader::new(&mut input);
        let version = header.read_u8()?;
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let flags = header.read_length()?;
        if flags & !COMPRESSED_FORMAT_FLAG != 0 {
            log::warn!("[BinaryImporter] ignoring unknown envelope flags {:#x}", flags);
        }
        let compressed = flags & COMPRESSED_FORMAT_FLAG != 0;
        let source = if compressed {
            Source::Zlib(ZlibDecoder::new(input))
        } else {
            Source::Plain(input)
        };
        Ok(Self {
            session: ImportSession::with_config(source, registry, config),
            compressed,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Next root value, or `None` at the end of the stream.
    pub fn read(&mut self) -> Result<Option<Decoded<Value>>> {
        self.session.read()
    }

    /// Next root value against an explicit declared type.
    pub fn read_as(&mut self, declared: &TypeRef) -> Result<Option<Decoded<Value>>> {
        self.session.read_as(declared)
    }

    /// Next root value converted to a typed value.
    pub fn read_typed<T: ExportType>(&mut self) -> Result<Option<Decoded<T>>> {
        let Some(decoded) = self.session.read()? else {
            return Ok(None);
        };
        let graph = self.session.graph();
        Ok(Some(match decoded {
            Decoded::Ok(value) => Decoded::Ok(T::from_value(&value, graph)?),
            Decoded::Degraded(value, warnings) => {
                Decoded::Degraded(T::from_value(&value, graph)?, warnings)
            }
        }))
    }

    /// Graph holding every object decoded so far.
    pub fn graph(&self) -> &Graph {
        self.session.graph()
    }

    pub fn session(&self) -> &ImportSession<impl Read> {
        &self.session
    }

    pub fn into_graph(self) -> Graph {
        self.session.into_graph()
    }
}

fn read_up_to<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
