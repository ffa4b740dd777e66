// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for robolex.
//!
//! Provides error kinds for lexing operations:
//! - Construction-time magic validation
//! - Structural chunk errors (nesting, compression, CRC)
//! - Size-cap and allocation enforcement
//! - Underlying I/O failures

use std::fmt;

/// Errors that can occur while lexing an MCAP stream.
#[derive(Debug)]
pub enum LexError {
    /// Leading magic bytes absent or wrong
    BadMagic {
        /// Bytes found where the magic was expected
        found: [u8; 8],
    },

    /// Chunk record encountered inside a chunk
    NestedChunk,

    /// Declared uncompressed chunk size exceeds the configured cap
    ChunkTooLarge {
        /// Declared uncompressed size
        size: u64,
        /// Configured maximum
        max: u64,
    },

    /// Declared record length exceeds the configured cap
    RecordTooLarge {
        /// Declared body length
        len: u64,
        /// Configured maximum
        max: u64,
    },

    /// Chunk CRC32 validation failed
    InvalidChunkCrc {
        /// CRC declared by the chunk record
        expected: u32,
        /// CRC computed over the decompressed records
        actual: u32,
    },

    /// Compression name not among the supported schemes
    UnsupportedCompression {
        /// Name found in the chunk record
        name: String,
    },

    /// Reserved zero opcode encountered
    ReservedOpcode,

    /// Decompressor produced output past the declared chunk end
    TrailingChunkData {
        /// Number of unexpected bytes observed
        count: usize,
    },

    /// Output or chunk buffer could not be grown
    Allocation {
        /// Requested size in bytes
        bytes: u64,
    },

    /// Two options that cannot be combined were both set
    IncompatibleOptions {
        /// First option name
        first: &'static str,
        /// Second option name
        second: &'static str,
    },

    /// Underlying reader error, surfaced unmodified
    Io(std::io::Error),
}

impl LexError {
    /// Create an "unsupported compression" error.
    pub fn unsupported_compression(name: impl Into<String>) -> Self {
        LexError::UnsupportedCompression { name: name.into() }
    }

    /// Create an allocation failure error.
    pub fn allocation(bytes: u64) -> Self {
        LexError::Allocation { bytes }
    }

    /// Create an incompatible-options error.
    pub fn incompatible_options(first: &'static str, second: &'static str) -> Self {
        LexError::IncompatibleOptions { first, second }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            LexError::BadMagic { found } => vec![("found", hex::encode(found))],
            LexError::NestedChunk => vec![],
            LexError::ChunkTooLarge { size, max } => {
                vec![("size", size.to_string()), ("max", max.to_string())]
            }
            LexError::RecordTooLarge { len, max } => {
                vec![("len", len.to_string()), ("max", max.to_string())]
            }
            LexError::InvalidChunkCrc { expected, actual } => vec![
                ("expected", format!("{expected:08x}")),
                ("actual", format!("{actual:08x}")),
            ],
            LexError::UnsupportedCompression { name } => vec![("name", name.clone())],
            LexError::ReservedOpcode => vec![],
            LexError::TrailingChunkData { count } => vec![("count", count.to_string())],
            LexError::Allocation { bytes } => vec![("bytes", bytes.to_string())],
            LexError::IncompatibleOptions { first, second } => {
                vec![("first", first.to_string()), ("second", second.to_string())]
            }
            LexError::Io(err) => vec![("error", err.to_string())],
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::BadMagic { found } => {
                write!(f, "not an MCAP stream: bad magic {}", hex::encode(found))
            }
            LexError::NestedChunk => write!(f, "detected nested chunk"),
            LexError::ChunkTooLarge { size, max } => write!(
                f,
                "chunk of {size} uncompressed bytes exceeds configured maximum of {max}"
            ),
            LexError::RecordTooLarge { len, max } => write!(
                f,
                "record of {len} bytes exceeds configured maximum of {max}"
            ),
            LexError::InvalidChunkCrc { expected, actual } => {
                write!(f, "invalid chunk CRC: {actual:08x} != {expected:08x}")
            }
            LexError::UnsupportedCompression { name } => {
                write!(f, "unsupported compression: '{name}'")
            }
            LexError::ReservedOpcode => write!(f, "invalid zero opcode"),
            LexError::TrailingChunkData { count } => {
                write!(f, "encountered {count} unexpected bytes after chunk records")
            }
            LexError::Allocation { bytes } => {
                write!(f, "failed to allocate {bytes} bytes")
            }
            LexError::IncompatibleOptions { first, second } => {
                write!(f, "options '{first}' and '{second}' cannot be combined")
            }
            LexError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for LexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LexError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LexError {
    fn from(err: std::io::Error) -> Self {
        LexError::Io(err)
    }
}

/// Result type for robolex operations.
pub type Result<T> = std::result::Result<T, LexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic_display() {
        let err = LexError::BadMagic {
            found: [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x00, 0x00],
        };
        assert_eq!(
            err.to_string(),
            "not an MCAP stream: bad magic deadbeef00000000"
        );
    }

    #[test]
    fn test_nested_chunk_display() {
        assert_eq!(LexError::NestedChunk.to_string(), "detected nested chunk");
    }

    #[test]
    fn test_chunk_too_large_display() {
        let err = LexError::ChunkTooLarge {
            size: 2048,
            max: 1024,
        };
        assert_eq!(
            err.to_string(),
            "chunk of 2048 uncompressed bytes exceeds configured maximum of 1024"
        );
    }

    #[test]
    fn test_record_too_large_display() {
        let err = LexError::RecordTooLarge {
            len: 10_000_000,
            max: 1_000_000,
        };
        assert_eq!(
            err.to_string(),
            "record of 10000000 bytes exceeds configured maximum of 1000000"
        );
    }

    #[test]
    fn test_invalid_chunk_crc_display() {
        let err = LexError::InvalidChunkCrc {
            expected: 0x1234,
            actual: 0xABCD,
        };
        assert_eq!(err.to_string(), "invalid chunk CRC: 0000abcd != 00001234");
    }

    #[test]
    fn test_unsupported_compression() {
        let err = LexError::unsupported_compression("brotli");
        assert!(matches!(err, LexError::UnsupportedCompression { .. }));
        assert_eq!(err.to_string(), "unsupported compression: 'brotli'");
    }

    #[test]
    fn test_reserved_opcode_display() {
        assert_eq!(LexError::ReservedOpcode.to_string(), "invalid zero opcode");
    }

    #[test]
    fn test_allocation_display() {
        let err = LexError::allocation(1 << 40);
        assert_eq!(err.to_string(), "failed to allocate 1099511627776 bytes");
    }

    #[test]
    fn test_incompatible_options_display() {
        let err = LexError::incompatible_options("validate_crc", "emit_chunks");
        assert_eq!(
            err.to_string(),
            "options 'validate_crc' and 'emit_chunks' cannot be combined"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LexError = io_err.into();
        assert!(matches!(err, LexError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: gone");
    }

    #[test]
    fn test_io_source_chain() {
        use std::error::Error;
        let err = LexError::Io(std::io::Error::other("inner"));
        assert!(err.source().is_some());
        assert!(LexError::NestedChunk.source().is_none());
    }

    #[test]
    fn test_log_fields_invalid_chunk_crc() {
        let err = LexError::InvalidChunkCrc {
            expected: 0x10,
            actual: 0x20,
        };
        let fields = err.log_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "expected");
        assert_eq!(fields[0].1, "00000010");
        assert_eq!(fields[1].0, "actual");
        assert_eq!(fields[1].1, "00000020");
    }

    #[test]
    fn test_log_fields_record_too_large() {
        let err = LexError::RecordTooLarge { len: 100, max: 50 };
        let fields = err.log_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].1, "100");
        assert_eq!(fields[1].1, "50");
    }

    #[test]
    fn test_trailing_chunk_data_display() {
        let err = LexError::TrailingChunkData { count: 4 };
        assert_eq!(
            err.to_string(),
            "encountered 4 unexpected bytes after chunk records"
        );
    }
}
