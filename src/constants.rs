// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP wire-format constants.
//!
//! This module contains the MCAP magic bytes, record opcodes, compression
//! names, and fixed frame sizes as defined by the
//! [MCAP specification](https://mcap.dev/spec).
//!
//! Keeping a single source of truth for these values prevents bugs from
//! opcode mismatches between the lexer and its callers.

/// MCAP file magic bytes (at start and end of file).
pub const MCAP_MAGIC: [u8; 8] = [0x89, 0x4D, 0x43, 0x41, 0x50, 0x30, 0x0D, 0x0A];

// MCAP Record Opcodes per specification
// https://mcap.dev/spec#opcodes

/// Reserved opcode - never valid on the wire.
pub const OP_RESERVED: u8 = 0x00;
/// Header record - must be first record after magic.
pub const OP_HEADER: u8 = 0x01;
/// Footer record - contains summary section offsets.
pub const OP_FOOTER: u8 = 0x02;
/// Schema record - defines message schemas.
pub const OP_SCHEMA: u8 = 0x03;
/// Channel record - defines channels/topics.
pub const OP_CHANNEL: u8 = 0x04;
/// Message record - contains message data.
pub const OP_MESSAGE: u8 = 0x05;
/// Chunk record - contains compressed records.
pub const OP_CHUNK: u8 = 0x06;
/// Message index record - indexes messages within a chunk.
pub const OP_MESSAGE_INDEX: u8 = 0x07;
/// Chunk index record - indexes chunks in summary section.
pub const OP_CHUNK_INDEX: u8 = 0x08;
/// Attachment record - contains file attachments.
pub const OP_ATTACHMENT: u8 = 0x09;
/// Attachment index record - indexes attachments in summary.
pub const OP_ATTACHMENT_INDEX: u8 = 0x0A;
/// Statistics record - contains file-level statistics.
pub const OP_STATISTICS: u8 = 0x0B;
/// Metadata record - contains key-value metadata.
pub const OP_METADATA: u8 = 0x0C;
/// Metadata index record - indexes metadata in summary.
pub const OP_METADATA_INDEX: u8 = 0x0D;
/// Summary offset record - indexes summary section records.
pub const OP_SUMMARY_OFFSET: u8 = 0x0E;
/// Data end record - marks end of data section.
pub const OP_DATA_END: u8 = 0x0F;

// Compression names carried in chunk records.

/// No compression (empty name).
pub const COMPRESSION_NONE: &[u8] = b"";
/// Zstandard compression.
pub const COMPRESSION_ZSTD: &[u8] = b"zstd";
/// LZ4 frame compression.
pub const COMPRESSION_LZ4: &[u8] = b"lz4";

/// Record frame size: opcode (u8) + body length (u64 LE).
pub const RECORD_FRAME_LEN: usize = 1 + 8;

/// Fixed chunk body prefix: message_start_time (u64) + message_end_time (u64)
/// + uncompressed_size (u64) + uncompressed_crc (u32) + compression_name_len (u32).
pub const CHUNK_PREFIX_LEN: usize = 8 + 8 + 8 + 4 + 4;

/// Scratch buffer size, sized to hold the largest fixed wire structure
/// (the chunk prefix).
pub const SCRATCH_LEN: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcap_magic() {
        assert_eq!(
            &MCAP_MAGIC,
            &[0x89, b'M', b'C', b'A', b'P', 0x30, b'\r', b'\n']
        );
    }

    #[test]
    fn test_chunk_prefix_fits_scratch() {
        assert!(CHUNK_PREFIX_LEN <= SCRATCH_LEN);
        assert!(RECORD_FRAME_LEN <= SCRATCH_LEN);
    }
}
