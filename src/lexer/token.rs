// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Token kinds emitted by the lexer.
//!
//! A [`Token`] tags one record body produced by
//! [`Lexer::next_token`](crate::lexer::Lexer::next_token). Variants appear in
//! wire-opcode order. Record tokens carry their body in the caller's buffer;
//! [`Token::InvalidChunk`] carries the CRC mismatch instead and has no body.

use std::fmt;

use crate::constants::{
    OP_ATTACHMENT, OP_ATTACHMENT_INDEX, OP_CHANNEL, OP_CHUNK, OP_CHUNK_INDEX, OP_DATA_END,
    OP_FOOTER, OP_HEADER, OP_MESSAGE, OP_MESSAGE_INDEX, OP_METADATA, OP_METADATA_INDEX, OP_SCHEMA,
    OP_STATISTICS, OP_SUMMARY_OFFSET,
};

/// A typed view of one record from the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Header record
    Header,
    /// Footer record
    Footer,
    /// Schema record
    Schema,
    /// Channel record
    Channel,
    /// Message record
    Message,
    /// Chunk record (only emitted when de-chunking is disabled)
    Chunk,
    /// Message index record
    MessageIndex,
    /// Chunk index record
    ChunkIndex,
    /// Attachment record
    Attachment,
    /// Attachment index record
    AttachmentIndex,
    /// Statistics record
    Statistics,
    /// Metadata record
    Metadata,
    /// Metadata index record
    MetadataIndex,
    /// Summary offset record
    SummaryOffset,
    /// Data end record
    DataEnd,
    /// Chunk that failed CRC validation; carries the mismatch, no body
    InvalidChunk {
        /// CRC declared by the chunk record
        expected: u32,
        /// CRC computed over the decompressed records
        actual: u32,
    },
}

impl Token {
    /// Map a wire opcode to its token kind.
    ///
    /// Returns `None` for unknown opcodes, which the lexer skips for forward
    /// compatibility. The reserved zero opcode is rejected before this
    /// mapping is consulted.
    pub(crate) fn from_opcode(opcode: u8) -> Option<Token> {
        match opcode {
            OP_HEADER => Some(Token::Header),
            OP_FOOTER => Some(Token::Footer),
            OP_SCHEMA => Some(Token::Schema),
            OP_CHANNEL => Some(Token::Channel),
            OP_MESSAGE => Some(Token::Message),
            OP_CHUNK => Some(Token::Chunk),
            OP_MESSAGE_INDEX => Some(Token::MessageIndex),
            OP_CHUNK_INDEX => Some(Token::ChunkIndex),
            OP_ATTACHMENT => Some(Token::Attachment),
            OP_ATTACHMENT_INDEX => Some(Token::AttachmentIndex),
            OP_STATISTICS => Some(Token::Statistics),
            OP_METADATA => Some(Token::Metadata),
            OP_METADATA_INDEX => Some(Token::MetadataIndex),
            OP_SUMMARY_OFFSET => Some(Token::SummaryOffset),
            OP_DATA_END => Some(Token::DataEnd),
            _ => None,
        }
    }

    /// String name of this token kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Header => "header",
            Token::Footer => "footer",
            Token::Schema => "schema",
            Token::Channel => "channel",
            Token::Message => "message",
            Token::Chunk => "chunk",
            Token::MessageIndex => "message index",
            Token::ChunkIndex => "chunk index",
            Token::Attachment => "attachment",
            Token::AttachmentIndex => "attachment index",
            Token::Statistics => "statistics",
            Token::Metadata => "metadata",
            Token::MetadataIndex => "metadata index",
            Token::SummaryOffset => "summary offset",
            Token::DataEnd => "data end",
            Token::InvalidChunk { .. } => "invalid chunk",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
