//! Message prefix types.
//!
//! A prefix identifies the origin of a message: either the server itself
//! or a user given as `nick['!'user]['@'host]`.

use std::fmt;

/// The origin of a message.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// The server's own name, used on replies it originates.
    ServerName(String),
    /// User origin: (nickname, username, hostname). The user and host
    /// parts may be empty for a bare-nick origin.
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a wire prefix token (leading `:` already stripped).
    ///
    /// Splits on the first `@`, then the first `!`. Lenient: a token
    /// with neither separator is a nick-only origin. Client input is
    /// always a user origin, so this never yields `ServerName`.
    pub fn parse(token: &str) -> Self {
        let (front, host) = match token.split_once('@') {
            Some((front, host)) => (front, host),
            None => (token, ""),
        };
        let (nick, user) = match front.split_once('!') {
            Some((nick, user)) => (nick, user),
            None => (front, ""),
        };
        Prefix::Nickname(nick.to_string(), user.to_string(), host.to_string())
    }

    /// Get the nickname if this is a user origin.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) if !nick.is_empty() => Some(nick),
            _ => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{user}")?;
                }
                if !host.is_empty() {
                    write!(f, "@{host}")?;
                }
                Ok(())
            }
        }
    }
}
