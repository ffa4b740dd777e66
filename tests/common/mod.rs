// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests: byte-level MCAP file builders.

#![allow(dead_code)]

use std::io::Write;

use robolex::constants::{MCAP_MAGIC, OP_CHUNK};

/// Assemble one record frame: opcode + u64 LE length + body.
pub fn record(opcode: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![opcode];
    out.extend_from_slice(&(body.len() as u64).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Assemble a file: leading magic followed by the given records.
pub fn file_with(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = MCAP_MAGIC.to_vec();
    for rec in records {
        out.extend_from_slice(rec);
    }
    out
}

/// Compress with zstd at the default level.
pub fn zstd_compress(data: &[u8]) -> Vec<u8> {
    zstd::stream::encode_all(data, 0).expect("zstd compression failed")
}

/// Compress into an lz4 frame.
pub fn lz4_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder.write_all(data).expect("lz4 compression failed");
    encoder.finish().expect("lz4 frame finish failed")
}

/// CRC32 of the uncompressed records region.
pub fn records_crc(uncompressed: &[u8]) -> u32 {
    crc32fast::hash(uncompressed)
}

/// Assemble a chunk record body around the given records region.
///
/// `declared_size` and `declared_crc` are written verbatim so tests can lie
/// about either; `payload` is the (possibly compressed) on-wire region.
pub fn chunk_body(
    declared_size: u64,
    declared_crc: u32,
    compression: &str,
    payload: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&100u64.to_le_bytes()); // message_start_time
    body.extend_from_slice(&200u64.to_le_bytes()); // message_end_time
    body.extend_from_slice(&declared_size.to_le_bytes());
    body.extend_from_slice(&declared_crc.to_le_bytes());
    body.extend_from_slice(&(compression.len() as u32).to_le_bytes());
    body.extend_from_slice(compression.as_bytes());
    body.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    body.extend_from_slice(payload);
    body
}

/// Assemble a well-formed chunk record for the given uncompressed records,
/// compressing the payload per `compression` ("", "zstd", or "lz4").
pub fn chunk_record(uncompressed: &[u8], compression: &str, declared_crc: u32) -> Vec<u8> {
    let payload = match compression {
        "" => uncompressed.to_vec(),
        "zstd" => zstd_compress(uncompressed),
        "lz4" => lz4_compress(uncompressed),
        other => panic!("unsupported test compression: {other}"),
    };
    let body = chunk_body(
        uncompressed.len() as u64,
        declared_crc,
        compression,
        &payload,
    );
    record(OP_CHUNK, &body)
}
