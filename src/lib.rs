// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robolex
//!
//! Streaming lexer for the MCAP container format.
//!
//! This crate provides the low-level tokenizer underneath MCAP readers: it
//! turns any [`std::io::Read`] source of MCAP bytes into a flat stream of
//! typed, framed byte tokens, transparently expanding chunk records in
//! place. Record bodies are opaque byte strings; parsing them is the
//! caller's concern.
//!
//! ## Architecture
//!
//! - [`constants`] - Magic bytes, opcodes, and wire sizes (single source of
//!   truth)
//! - [`core`] - Error handling
//! - [`lexer`] - The [`Lexer`] state machine, decompressor plumbing, token
//!   kinds, and options
//!
//! ## Example: lexing a stream
//!
//! ```rust
//! # fn main() -> robolex::Result<()> {
//! use robolex::{Lexer, Token};
//!
//! // magic + empty header record + empty data-end record
//! let mut data = robolex::constants::MCAP_MAGIC.to_vec();
//! data.push(0x01);
//! data.extend_from_slice(&0u64.to_le_bytes());
//! data.push(0x0F);
//! data.extend_from_slice(&0u64.to_le_bytes());
//!
//! let mut lexer = Lexer::new(std::io::Cursor::new(data))?;
//! let mut buf = Vec::new();
//! assert_eq!(lexer.next_token(&mut buf)?, Some(Token::Header));
//! assert_eq!(lexer.next_token(&mut buf)?, Some(Token::DataEnd));
//! assert_eq!(lexer.next_token(&mut buf)?, None);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: iterating records
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robolex::Lexer;
//!
//! let file = std::fs::File::open("input.mcap")?;
//! let lexer = Lexer::new(std::io::BufReader::new(file))?;
//! for result in lexer.records() {
//!     let (token, body) = result?;
//!     println!("{token}: {} bytes", body.len());
//! }
//! # Ok(())
//! # }
//! ```

// Wire-format constants
pub mod constants;

// Core types
pub mod core;

// Re-export core types for convenience
pub use crate::core::{LexError, Result};

// The lexer itself
pub mod lexer;

pub use lexer::{Lexer, LexerOptions, Records, Token};
