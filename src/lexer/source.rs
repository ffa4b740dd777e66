// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte sources feeding the lexer.
//!
//! The lexer reads from exactly one source at a time: the caller's base
//! reader, or the interior of the chunk currently being de-chunked. Chunk
//! interiors are bounded to the chunk's `records` region with
//! [`std::io::Take`] and optionally routed through a decompressor.
//!
//! Decoder state that the backing crates allow to be reset is owned by
//! [`DecoderRegistry`] and recycled across chunks, so chunk-heavy files do
//! not pay a decoder allocation per chunk.

use std::io::{self, Read, Take};

use lz4_flex::frame::FrameDecoder;
use zstd::stream::raw::{Decoder as RawZstdDecoder, InBuffer, Operation, OutBuffer};

/// Size of the compressed staging buffer for the zstd pull adapter.
const ZSTD_STAGING_LEN: usize = 32 * 1024;

/// The byte source currently supplying the lexer.
pub(crate) enum Source<R: Read> {
    /// Reading records directly from the caller's reader.
    Base(R),
    /// Reading the interior of one chunk.
    Chunk(ChunkSource<R>),
    /// Transient placeholder while ownership moves between variants.
    Swapping,
}

/// The interior of the chunk currently being lexed.
pub(crate) enum ChunkSource<R: Read> {
    /// Uncompressed records streamed through the bounded sub-reader.
    Raw(Take<R>),
    /// Zstd records streamed through the reusable raw decoder.
    Zstd(ZstdReader<R>),
    /// Lz4 records streamed through a frame decoder.
    Lz4(FrameDecoder<Take<R>>),
    /// Validated records replayed from the lexer's uncompressed buffer;
    /// the base reader idles here until the buffer is exhausted.
    Buffered { base: R, pos: usize },
}

/// Read exactly `out.len()` bytes from the active source.
///
/// `chunk_buf` backs the `Buffered` variant; the cursor into it lives in the
/// variant itself so the buffer allocation can be reused across chunks.
pub(crate) fn read_exact_active<R: Read>(
    source: &mut Source<R>,
    chunk_buf: &[u8],
    out: &mut [u8],
) -> io::Result<()> {
    match source {
        Source::Base(reader) => reader.read_exact(out),
        Source::Chunk(ChunkSource::Raw(reader)) => reader.read_exact(out),
        Source::Chunk(ChunkSource::Zstd(reader)) => reader.read_exact(out),
        Source::Chunk(ChunkSource::Lz4(reader)) => reader.read_exact(out),
        Source::Chunk(ChunkSource::Buffered { pos, .. }) => {
            let avail = chunk_buf.len().saturating_sub(*pos);
            if avail < out.len() {
                *pos = chunk_buf.len();
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "chunk buffer exhausted",
                ));
            }
            out.copy_from_slice(&chunk_buf[*pos..*pos + out.len()]);
            *pos += out.len();
            Ok(())
        }
        Source::Swapping => Err(io::Error::other("byte source detached")),
    }
}

/// Discard whatever remains of a bounded chunk region and hand back the
/// underlying reader, positioned at the first byte after the region.
///
/// A drain failure is recorded in `err` rather than returned so callers can
/// always recover the base reader.
pub(crate) fn drain_bounded<R: Read>(mut bounded: Take<R>, err: &mut Option<io::Error>) -> R {
    if let Err(drain_err) = io::copy(&mut bounded, &mut io::sink()) {
        err.get_or_insert(drain_err);
    }
    bounded.into_inner()
}

/// Reusable zstd decoding state: the raw decoder context plus the compressed
/// staging buffer. One instance serves every zstd chunk in a file.
pub(crate) struct ZstdState {
    raw: RawZstdDecoder<'static>,
    staging: Vec<u8>,
    start: usize,
    end: usize,
}

impl ZstdState {
    fn new() -> io::Result<Self> {
        Ok(Self {
            raw: RawZstdDecoder::new()?,
            staging: vec![0u8; ZSTD_STAGING_LEN],
            start: 0,
            end: 0,
        })
    }

    /// Reset for the next frame, keeping the context and staging allocation.
    fn reset(&mut self) -> io::Result<()> {
        self.raw.reinit()?;
        self.start = 0;
        self.end = 0;
        Ok(())
    }
}

/// Pull-`Read` adapter decoding one zstd frame from a bounded chunk region.
pub(crate) struct ZstdReader<R> {
    inner: Take<R>,
    state: ZstdState,
    inner_eof: bool,
}

impl<R: Read> ZstdReader<R> {
    pub(crate) fn new(state: ZstdState, inner: Take<R>) -> Self {
        Self {
            inner,
            state,
            inner_eof: false,
        }
    }

    /// Take the adapter apart so the bounded reader can be drained and the
    /// decoder state recycled.
    pub(crate) fn into_parts(self) -> (Take<R>, ZstdState) {
        (self.inner, self.state)
    }
}

impl<R: Read> Read for ZstdReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            if self.state.start == self.state.end && !self.inner_eof {
                self.state.start = 0;
                self.state.end = self.inner.read(&mut self.state.staging)?;
                if self.state.end == 0 {
                    self.inner_eof = true;
                }
            }
            let mut input = InBuffer::around(&self.state.staging[self.state.start..self.state.end]);
            let mut output = OutBuffer::around(out);
            self.state.raw.run(&mut input, &mut output)?;
            self.state.start += input.pos;
            let wrote = output.pos();
            if wrote > 0 {
                return Ok(wrote);
            }
            if self.inner_eof {
                return Ok(0);
            }
        }
    }
}

/// Owns at most one reusable decoder instance per compression scheme.
///
/// Instances are created lazily on first use, taken while a chunk is active,
/// and reset on return. The `none` scheme needs no state here: the lexer's
/// uncompressed buffer plus a position cursor already reset without
/// reallocation. `lz4_flex` exposes no reset-in-place, so lz4 frame decoders
/// are rebuilt per chunk.
#[derive(Default)]
pub(crate) struct DecoderRegistry {
    zstd: Option<ZstdState>,
}

impl DecoderRegistry {
    /// Hand out the zstd decoding state, creating it on first use.
    pub(crate) fn take_zstd(&mut self) -> io::Result<ZstdState> {
        match self.zstd.take() {
            Some(state) => Ok(state),
            None => ZstdState::new(),
        }
    }

    /// Reset the zstd state and keep it for the next chunk.
    pub(crate) fn store_zstd(&mut self, mut state: ZstdState) -> io::Result<()> {
        state.reset()?;
        self.zstd = Some(state);
        Ok(())
    }

    /// Wrap a bounded chunk region in an lz4 frame decoder.
    pub(crate) fn wrap_lz4<R: Read>(&self, inner: Take<R>) -> FrameDecoder<Take<R>> {
        FrameDecoder::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn zstd_compress(data: &[u8]) -> Vec<u8> {
        zstd::stream::encode_all(data, 0).unwrap()
    }

    #[test]
    fn test_zstd_reader_roundtrip() {
        let plain: Vec<u8> = (0..200u8).cycle().take(10_000).collect();
        let compressed = zstd_compress(&plain);
        let compressed_len = compressed.len() as u64;

        let mut registry = DecoderRegistry::default();
        let bounded = Cursor::new(compressed).take(compressed_len);
        let mut reader = ZstdReader::new(registry.take_zstd().unwrap(), bounded);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn test_zstd_state_reused_across_frames() {
        let first = b"first chunk of records".repeat(50);
        let second = b"second chunk, different content".repeat(50);

        let mut registry = DecoderRegistry::default();

        for plain in [&first, &second] {
            let compressed = zstd_compress(plain);
            let len = compressed.len() as u64;
            let bounded = Cursor::new(compressed).take(len);
            let mut reader = ZstdReader::new(registry.take_zstd().unwrap(), bounded);

            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            assert_eq!(out.as_slice(), plain.as_slice());

            let (bounded, state) = reader.into_parts();
            let mut drain_err = None;
            drain_bounded(bounded, &mut drain_err);
            assert!(drain_err.is_none());
            registry.store_zstd(state).unwrap();
        }
    }

    #[test]
    fn test_drain_bounded_positions_past_region() {
        let data = b"0123456789abcdef";
        let cursor = Cursor::new(&data[..]);
        let mut bounded = cursor.take(10);

        let mut first = [0u8; 4];
        bounded.read_exact(&mut first).unwrap();
        assert_eq!(&first, b"0123");

        let mut drain_err = None;
        let mut cursor = drain_bounded(bounded, &mut drain_err);
        assert!(drain_err.is_none());

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"abcdef");
    }

    #[test]
    fn test_lz4_frame_decoder_roundtrip() {
        use lz4_flex::frame::FrameEncoder;
        use std::io::Write;

        let plain = b"lz4 framed records".repeat(100);
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.write_all(&plain).unwrap();
        let compressed = encoder.finish().unwrap();
        let len = compressed.len() as u64;

        let registry = DecoderRegistry::default();
        let mut decoder = registry.wrap_lz4(Cursor::new(compressed).take(len));
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn test_read_exact_active_buffered() {
        let chunk_buf = b"abcdefgh".to_vec();
        let mut source: Source<Cursor<Vec<u8>>> = Source::Chunk(ChunkSource::Buffered {
            base: Cursor::new(Vec::new()),
            pos: 0,
        });

        let mut out = [0u8; 3];
        read_exact_active(&mut source, &chunk_buf, &mut out).unwrap();
        assert_eq!(&out, b"abc");

        let mut out = [0u8; 5];
        read_exact_active(&mut source, &chunk_buf, &mut out).unwrap();
        assert_eq!(&out, b"defgh");

        // exhausted: next read reports EOF
        let mut out = [0u8; 1];
        let err = read_exact_active(&mut source, &chunk_buf, &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_exact_active_buffered_partial_is_eof() {
        let chunk_buf = b"ab".to_vec();
        let mut source: Source<Cursor<Vec<u8>>> = Source::Chunk(ChunkSource::Buffered {
            base: Cursor::new(Vec::new()),
            pos: 0,
        });

        let mut out = [0u8; 4];
        let err = read_exact_active(&mut source, &chunk_buf, &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
