//! IRC command names.
//!
//! The relay understands a small fixed command set. Anything outside it
//! parses to [`Command::Unknown`] with the raw token preserved, so the
//! server can log exactly what the client sent.

use std::fmt;

use crate::response::Response;

/// A wire command.
///
/// Command tokens match case-insensitively on input; `Display` renders
/// the canonical upper-case name. Numeric replies carry their
/// [`Response`] code and render as a zero-padded three-digit number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// NICK - set or change nickname
    Nick,
    /// USER - supply registration details
    User,
    /// PRIVMSG - message a nick or channel
    Privmsg,
    /// JOIN - join a channel
    Join,
    /// QUIT - leave the server
    Quit,
    /// NAMES - list channel members
    Names,
    /// PING - liveness probe
    Ping,
    /// PONG - liveness response
    Pong,
    /// A numeric server reply.
    Reply(Response),
    /// Anything else, raw token preserved verbatim.
    Unknown(String),
}

impl Command {
    /// Map a wire token to a command, case-insensitively.
    ///
    /// Never fails: an unrecognized token becomes [`Command::Unknown`].
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "NICK" => Command::Nick,
            "USER" => Command::User,
            "PRIVMSG" => Command::Privmsg,
            "JOIN" => Command::Join,
            "QUIT" => Command::Quit,
            "NAMES" => Command::Names,
            "PING" => Command::Ping,
            "PONG" => Command::Pong,
            _ => Command::Unknown(token.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Nick => f.write_str("NICK"),
            Command::User => f.write_str("USER"),
            Command::Privmsg => f.write_str("PRIVMSG"),
            Command::Join => f.write_str("JOIN"),
            Command::Quit => f.write_str("QUIT"),
            Command::Names => f.write_str("NAMES"),
            Command::Ping => f.write_str("PING"),
            Command::Pong => f.write_str("PONG"),
            Command::Reply(resp) => write!(f, "{:03}", resp.code()),
            Command::Unknown(token) => f.write_str(token),
        }
    }
}
