// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Lexer configuration surface.

/// Options tuning how the lexer treats magic bytes, chunks, and size caps.
///
/// `validate_crc` and `emit_chunks` cannot be combined: emitting chunks as
/// opaque tokens means the chunk loader never runs, so there is nothing to
/// validate. [`Lexer::with_options`](crate::Lexer::with_options) rejects the
/// combination.
#[derive(Debug, Default, Clone)]
pub struct LexerOptions {
    /// Do not consume or verify magic bytes at construction.
    pub skip_magic: bool,
    /// Buffer each chunk fully and verify its CRC32 before emitting interior
    /// records.
    pub validate_crc: bool,
    /// Emit chunk records as opaque tokens instead of de-chunking them.
    pub emit_chunks: bool,
    /// Emit an `InvalidChunk` token on CRC mismatch instead of an error.
    pub emit_invalid_chunks: bool,
    /// Reject any record frame longer than this, before allocation.
    /// Zero means uncapped.
    pub max_record_size: u64,
    /// Reject any chunk whose declared uncompressed size exceeds this,
    /// before allocation. Zero means uncapped.
    pub max_decompressed_chunk_size: u64,
}

impl LexerOptions {
    /// Create options with all defaults (de-chunking on, no validation,
    /// no caps).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether leading magic bytes are skipped.
    pub fn with_skip_magic(mut self, skip_magic: bool) -> Self {
        self.skip_magic = skip_magic;
        self
    }

    /// Set whether chunk CRCs are validated.
    pub fn with_validate_crc(mut self, validate_crc: bool) -> Self {
        self.validate_crc = validate_crc;
        self
    }

    /// Set whether chunk records are emitted without de-chunking.
    pub fn with_emit_chunks(mut self, emit_chunks: bool) -> Self {
        self.emit_chunks = emit_chunks;
        self
    }

    /// Set whether CRC mismatches yield `InvalidChunk` tokens.
    pub fn with_emit_invalid_chunks(mut self, emit_invalid_chunks: bool) -> Self {
        self.emit_invalid_chunks = emit_invalid_chunks;
        self
    }

    /// Set the maximum accepted record body length (0 = uncapped).
    pub fn with_max_record_size(mut self, max_record_size: u64) -> Self {
        self.max_record_size = max_record_size;
        self
    }

    /// Set the maximum accepted uncompressed chunk size (0 = uncapped).
    pub fn with_max_decompressed_chunk_size(mut self, max_decompressed_chunk_size: u64) -> Self {
        self.max_decompressed_chunk_size = max_decompressed_chunk_size;
        self
    }
}
