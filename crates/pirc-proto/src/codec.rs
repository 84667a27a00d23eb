//! Tokio codec for framed IRC message streams.
//!
//! Splits the byte stream on `\n`, decodes lossily as UTF-8, and parses
//! each line into a [`Message`]. Lines that parse to nothing (blank or
//! prefix-only) are skipped rather than surfaced as errors.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::MAX_LINE_LEN;

/// Tokio codec for encoding/decoding IRC messages.
pub struct IrcCodec {
    max_len: usize,
}

impl IrcCodec {
    /// Create a codec with the standard [`MAX_LINE_LEN`] limit.
    pub fn new() -> Self {
        Self {
            max_len: MAX_LINE_LEN,
        }
    }

    /// Create a codec with a custom line length limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                // No full line buffered; refuse to buffer without bound.
                if src.len() > self.max_len {
                    return Err(ProtocolError::LineTooLong {
                        actual: src.len(),
                        limit: self.max_len,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(pos + 1);
            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let text = String::from_utf8_lossy(line.chunk());
            match Message::parse(&text) {
                Some(msg) => return Ok(Some(msg)),
                None => {
                    debug!(line = %text.trim_end(), "skipping empty line");
                }
            }
        }
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<()> {
        let wire = msg.to_string();
        dst.put_slice(wire.as_bytes());
        Ok(())
    }
}
