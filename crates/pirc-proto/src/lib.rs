//! # pirc-proto
//!
//! Parsing and serialization of the line-oriented IRC subset spoken by
//! `pircd`.
//!
//! ## Features
//!
//! - Whitespace-tolerant message parsing with prefix, command, and arguments
//! - Trailing-parameter handling (`:`-introduced final argument)
//! - Lossless serialization via `Display` (CRLF-terminated wire lines)
//! - Optional Tokio codec integration for framed async I/O
//!
//! ## Quick Start
//!
//! ```rust
//! use pirc_proto::{Command, Message};
//!
//! let msg = Message::parse(":alice PRIVMSG #rust :hello there").unwrap();
//! assert_eq!(msg.command, Command::Privmsg);
//! assert_eq!(msg.args, vec!["#rust", "hello there"]);
//!
//! // Serializing renders the canonical wire form.
//! assert_eq!(msg.to_string(), ":alice PRIVMSG #rust :hello there\r\n");
//! ```
//!
//! Parsing is total: malformed input degrades to [`Command::Unknown`] or a
//! short argument list, never an error. Only the framing codec can fail.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
#[cfg(feature = "tokio")]
pub mod codec;
pub mod error;
pub mod message;
pub mod prefix;
pub mod response;

pub use self::command::Command;
#[cfg(feature = "tokio")]
pub use self::codec::IrcCodec;
pub use self::error::ProtocolError;
pub use self::message::Message;
pub use self::prefix::Prefix;
pub use self::response::Response;

/// Maximum length of a single wire line in bytes, including CRLF.
pub const MAX_LINE_LEN: usize = 512;
