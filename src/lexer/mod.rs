// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streaming MCAP lexer.
//!
//! [`Lexer`] turns any [`Read`] source of MCAP bytes into a flat stream of
//! typed, framed byte tokens, transparently descending into chunk records
//! unless configured otherwise. Record bodies are opaque to the lexer; it
//! frames them, it does not parse them.
//!
//! The lexer is a two-state machine. Outside a chunk it reads record frames
//! from the base reader. When it meets a chunk record (and de-chunking is
//! enabled) it bounds the chunk's records region, routes it through the
//! matching decompressor, and keeps reading frames from the interior until
//! the interior hits EOF, at which point the base reader resumes. Chunk
//! interiors therefore appear flattened, in place, in the token stream.

use std::io::{self, Cursor, Read};
use std::mem;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace, warn};

use crate::constants::{
    CHUNK_PREFIX_LEN, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_ZSTD, MCAP_MAGIC, OP_CHUNK,
    OP_RESERVED, RECORD_FRAME_LEN, SCRATCH_LEN,
};
use crate::core::{LexError, Result};

mod options;
mod source;
mod token;

pub use options::LexerOptions;
pub use token::Token;

use source::{drain_bounded, read_exact_active, ChunkSource, DecoderRegistry, Source, ZstdReader};

/// Low-level streaming reader for MCAP data that emits tokenized byte
/// strings without parsing or interpreting them, except in the case of
/// chunks, which may be optionally de-chunked.
pub struct Lexer<R: Read> {
    source: Source<R>,
    in_chunk: bool,
    scratch: [u8; SCRATCH_LEN],
    chunk_buf: Vec<u8>,
    decoders: DecoderRegistry,
    options: LexerOptions,
}

impl<R: Read> std::fmt::Debug for Lexer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("in_chunk", &self.in_chunk)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: Read> Lexer<R> {
    /// Create a lexer with default options, consuming and verifying the
    /// leading magic bytes.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, LexerOptions::default())
    }

    /// Create a lexer with the given options.
    ///
    /// Unless `skip_magic` is set, the leading magic is consumed and
    /// verified here; a mismatch or short read yields
    /// [`LexError::BadMagic`]. Setting both `validate_crc` and
    /// `emit_chunks` is rejected: with chunks emitted opaque there is
    /// nothing to validate.
    pub fn with_options(mut reader: R, options: LexerOptions) -> Result<Self> {
        if options.validate_crc && options.emit_chunks {
            return Err(LexError::incompatible_options("validate_crc", "emit_chunks"));
        }
        if !options.skip_magic {
            let mut magic = [0u8; 8];
            if reader.read_exact(&mut magic).is_err() || magic != MCAP_MAGIC {
                return Err(LexError::BadMagic { found: magic });
            }
        }
        Ok(Self {
            source: Source::Base(reader),
            in_chunk: false,
            scratch: [0u8; SCRATCH_LEN],
            chunk_buf: Vec::new(),
            decoders: DecoderRegistry::default(),
            options,
        })
    }

    /// Read the next token from the stream.
    ///
    /// On `Ok(Some(token))` the caller's `buf` holds exactly the record
    /// body; it is grown only when too small and is reused otherwise, so
    /// bytes from a previous call must not be read after the next one.
    /// `Ok(None)` is clean end-of-stream. All failures end the current call;
    /// the lexer does not recover on its own, the caller decides whether to
    /// keep going.
    pub fn next_token(&mut self, buf: &mut Vec<u8>) -> Result<Option<Token>> {
        loop {
            let (opcode, record_len) = match self.read_frame() {
                Ok(frame) => frame,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    if self.in_chunk {
                        // Interior EOF is the chunk-end signal, not an error.
                        self.leave_chunk()?;
                        continue;
                    }
                    return Ok(None);
                }
                Err(err) => return Err(LexError::Io(err)),
            };

            if self.options.max_record_size > 0 && record_len > self.options.max_record_size {
                return Err(LexError::RecordTooLarge {
                    len: record_len,
                    max: self.options.max_record_size,
                });
            }

            if opcode == OP_CHUNK && !self.options.emit_chunks {
                match self.load_chunk() {
                    Ok(()) => continue,
                    Err(LexError::InvalidChunkCrc { expected, actual })
                        if self.options.emit_invalid_chunks =>
                    {
                        warn!(
                            context = "Lexer",
                            expected, actual, "chunk failed CRC validation"
                        );
                        buf.clear();
                        return Ok(Some(Token::InvalidChunk { expected, actual }));
                    }
                    Err(err) => return Err(err),
                }
            }

            self.fill_body(buf, record_len)?;

            if opcode == OP_RESERVED {
                return Err(LexError::ReservedOpcode);
            }
            match Token::from_opcode(opcode) {
                Some(token) => return Ok(Some(token)),
                None => {
                    trace!(
                        context = "Lexer",
                        opcode,
                        len = record_len,
                        "skipping unknown opcode"
                    );
                    continue;
                }
            }
        }
    }

    /// Consume the lexer into an iterator over owned `(Token, body)` pairs.
    pub fn records(self) -> Records<R> {
        Records {
            lexer: self,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Read the 9-byte record frame from the active source.
    fn read_frame(&mut self) -> io::Result<(u8, u64)> {
        read_exact_active(
            &mut self.source,
            &self.chunk_buf,
            &mut self.scratch[..RECORD_FRAME_LEN],
        )?;
        let opcode = self.scratch[0];
        let mut cursor = Cursor::new(&self.scratch[1..RECORD_FRAME_LEN]);
        let record_len = cursor.read_u64::<LittleEndian>()?;
        Ok((opcode, record_len))
    }

    /// Size `buf` to exactly `record_len` bytes and fill it from the active
    /// source. Growth is cap-checked by the caller and overflow-safe here.
    fn fill_body(&mut self, buf: &mut Vec<u8>, record_len: u64) -> Result<()> {
        let len =
            usize::try_from(record_len).map_err(|_| LexError::allocation(record_len))?;
        if buf.capacity() < len {
            buf.clear();
            buf.try_reserve_exact(len)
                .map_err(|_| LexError::allocation(record_len))?;
        }
        buf.resize(len, 0);
        read_exact_active(&mut self.source, &self.chunk_buf, buf.as_mut_slice())
            .map_err(LexError::Io)?;
        Ok(())
    }

    /// Enter the chunk whose frame was just read: parse the fixed prefix,
    /// bound the records region, install the matching decompressor as the
    /// active source, and optionally buffer + CRC-validate the interior.
    fn load_chunk(&mut self) -> Result<()> {
        if self.in_chunk {
            return Err(LexError::NestedChunk);
        }

        read_exact_active(
            &mut self.source,
            &self.chunk_buf,
            &mut self.scratch[..CHUNK_PREFIX_LEN],
        )
        .map_err(LexError::Io)?;
        let mut cursor = Cursor::new(&self.scratch[..CHUNK_PREFIX_LEN]);
        let _message_start_time = cursor.read_u64::<LittleEndian>().map_err(LexError::Io)?;
        let _message_end_time = cursor.read_u64::<LittleEndian>().map_err(LexError::Io)?;
        let uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(LexError::Io)?;
        let uncompressed_crc = cursor.read_u32::<LittleEndian>().map_err(LexError::Io)?;
        let compression_len = cursor.read_u32::<LittleEndian>().map_err(LexError::Io)? as usize;

        // The compression name and records length run through the scratch
        // window; no supported scheme comes anywhere near its size.
        if compression_len > SCRATCH_LEN - 8 {
            return Err(LexError::unsupported_compression(format!(
                "<{compression_len}-byte name>"
            )));
        }
        read_exact_active(
            &mut self.source,
            &self.chunk_buf,
            &mut self.scratch[..compression_len + 8],
        )
        .map_err(LexError::Io)?;
        let mut name_buf = [0u8; SCRATCH_LEN];
        name_buf[..compression_len].copy_from_slice(&self.scratch[..compression_len]);
        let name = &name_buf[..compression_len];
        let mut cursor = Cursor::new(&self.scratch[compression_len..compression_len + 8]);
        let records_len = cursor.read_u64::<LittleEndian>().map_err(LexError::Io)?;

        if name != COMPRESSION_NONE && name != COMPRESSION_ZSTD && name != COMPRESSION_LZ4 {
            return Err(LexError::unsupported_compression(
                String::from_utf8_lossy(name),
            ));
        }

        debug!(
            context = "Lexer",
            compression = %String::from_utf8_lossy(name),
            uncompressed_size,
            records_len,
            "entering chunk"
        );

        let base = match mem::replace(&mut self.source, Source::Swapping) {
            Source::Base(base) => base,
            other => {
                self.source = other;
                return Err(LexError::Io(io::Error::other(
                    "chunk loader invoked while not on the base reader",
                )));
            }
        };
        // All interior I/O goes through this bounded sub-reader; EOF on the
        // region boundary terminates the chunk cleanly.
        let bounded = base.take(records_len);

        let interior = if name == COMPRESSION_ZSTD {
            let state = match self.decoders.take_zstd() {
                Ok(state) => state,
                Err(err) => {
                    self.source = Source::Base(bounded.into_inner());
                    return Err(LexError::Io(err));
                }
            };
            ChunkSource::Zstd(ZstdReader::new(state, bounded))
        } else if name == COMPRESSION_LZ4 {
            ChunkSource::Lz4(self.decoders.wrap_lz4(bounded))
        } else {
            ChunkSource::Raw(bounded)
        };
        self.source = Source::Chunk(interior);
        self.in_chunk = true;

        if self.options.validate_crc {
            let is_lz4 = name == COMPRESSION_LZ4;
            if let Err(err) = self.buffer_and_validate(uncompressed_size, uncompressed_crc, is_lz4)
            {
                // Realign: whatever failed, the base reader must end up
                // positioned past the full chunk body so a caller that keeps
                // lexing resumes at the next record.
                let _ = self.leave_chunk();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Decompress the whole chunk interior into the reusable buffer, verify
    /// its CRC32, and replay the validated bytes as the active source.
    fn buffer_and_validate(
        &mut self,
        uncompressed_size: u64,
        uncompressed_crc: u32,
        is_lz4: bool,
    ) -> Result<()> {
        let max = self.options.max_decompressed_chunk_size;
        if max > 0 && uncompressed_size > max {
            return Err(LexError::ChunkTooLarge {
                size: uncompressed_size,
                max,
            });
        }
        let size =
            usize::try_from(uncompressed_size).map_err(|_| LexError::allocation(uncompressed_size))?;
        if self.chunk_buf.capacity() < size {
            // Amortised doubling: grow to twice the requested size.
            let target = size.saturating_mul(2);
            self.chunk_buf.clear();
            self.chunk_buf
                .try_reserve_exact(target)
                .map_err(|_| LexError::allocation(target as u64))?;
        }
        self.chunk_buf.resize(size, 0);

        self.read_interior_into_chunk_buf(size)
            .map_err(LexError::Io)?;

        // LZ4 frames may carry a checksum tail that the exact-size read
        // above leaves inside the decoder. Drain it; any decoded output
        // past the declared size is corruption.
        if is_lz4 {
            let mut tail = [0u8; 64];
            loop {
                let n = match &mut self.source {
                    Source::Chunk(ChunkSource::Lz4(reader)) => {
                        reader.read(&mut tail).map_err(LexError::Io)?
                    }
                    _ => 0,
                };
                if n == 0 {
                    break;
                }
                return Err(LexError::TrailingChunkData { count: n });
            }
        }

        let actual = crc32fast::hash(&self.chunk_buf[..size]);
        if uncompressed_crc != 0 && actual != uncompressed_crc {
            return Err(LexError::InvalidChunkCrc {
                expected: uncompressed_crc,
                actual,
            });
        }

        // Replay the validated bytes; the base reader idles until the
        // buffer is exhausted.
        let (base, drain_err) = self.reclaim_base()?;
        self.source = Source::Chunk(ChunkSource::Buffered { base, pos: 0 });
        match drain_err {
            Some(err) => Err(LexError::Io(err)),
            None => Ok(()),
        }
    }

    /// Read exactly `size` decompressed bytes from the chunk interior into
    /// the chunk buffer.
    fn read_interior_into_chunk_buf(&mut self, size: usize) -> io::Result<()> {
        match &mut self.source {
            Source::Chunk(ChunkSource::Raw(reader)) => reader.read_exact(&mut self.chunk_buf[..size]),
            Source::Chunk(ChunkSource::Zstd(reader)) => {
                reader.read_exact(&mut self.chunk_buf[..size])
            }
            Source::Chunk(ChunkSource::Lz4(reader)) => {
                reader.read_exact(&mut self.chunk_buf[..size])
            }
            _ => Err(io::Error::other("no streaming chunk interior to buffer")),
        }
    }

    /// Dismantle the active chunk interior: recycle decoder state, discard
    /// the unread remainder of the chunk region, and hand back the base
    /// reader. Secondary failures are reported alongside the reader so the
    /// lexer never loses its source.
    fn reclaim_base(&mut self) -> Result<(R, Option<io::Error>)> {
        let interior = match mem::replace(&mut self.source, Source::Swapping) {
            Source::Chunk(interior) => interior,
            other => {
                self.source = other;
                return Err(LexError::Io(io::Error::other(
                    "no chunk interior to dismantle",
                )));
            }
        };
        let mut first_err: Option<io::Error> = None;
        let base = match interior {
            ChunkSource::Raw(bounded) => drain_bounded(bounded, &mut first_err),
            ChunkSource::Zstd(reader) => {
                let (bounded, state) = reader.into_parts();
                if let Err(err) = self.decoders.store_zstd(state) {
                    first_err.get_or_insert(err);
                }
                drain_bounded(bounded, &mut first_err)
            }
            ChunkSource::Lz4(reader) => drain_bounded(reader.into_inner(), &mut first_err),
            ChunkSource::Buffered { base, .. } => base,
        };
        Ok((base, first_err))
    }

    /// Restore the base reader as the active source at chunk end.
    fn leave_chunk(&mut self) -> Result<()> {
        let (base, drain_err) = self.reclaim_base()?;
        self.source = Source::Base(base);
        self.in_chunk = false;
        match drain_err {
            Some(err) => Err(LexError::Io(err)),
            None => Ok(()),
        }
    }
}

/// Owning iterator over `(Token, body)` pairs.
///
/// Stops after the first error; callers that want to lex past failures
/// should drive [`Lexer::next_token`] directly.
pub struct Records<R: Read> {
    lexer: Lexer<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<(Token, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lexer.next_token(&mut self.buf) {
            Ok(Some(token)) => Some(Ok((token, self.buf.clone()))),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
