//! The wire message type: parsing and serialization.
//!
//! A message is an optional prefix, a command, and a flat list of
//! arguments. The trailing parameter (`:`-introduced final argument)
//! exists only on the wire; after parsing it is an ordinary entry of
//! `args` and the serializer reintroduces the `:` when needed.

use std::fmt;

use crate::command::Command;
use crate::prefix::Prefix;

/// A parsed IRC message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Origin of the message, if any.
    pub prefix: Option<Prefix>,
    /// The command.
    pub command: Command,
    /// Command arguments, trailing parameter last.
    pub args: Vec<String>,
}

impl Message {
    /// Construct a message with no prefix.
    pub fn new(command: Command, args: Vec<String>) -> Self {
        Self {
            prefix: None,
            command,
            args,
        }
    }

    /// Attach a prefix, builder-style.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Parse one wire line.
    ///
    /// Total: returns `None` only for blank lines and prefix-only lines;
    /// everything else yields a message, falling back to
    /// [`Command::Unknown`] and however many arguments were present.
    ///
    /// Tokenization is ASCII-whitespace splitting, so runs of spaces
    /// collapse. The first argument token starting with `:` opens the
    /// trailing parameter: it and every later token are re-joined with
    /// single spaces into one final argument.
    pub fn parse(line: &str) -> Option<Message> {
        let mut tokens = line.split_ascii_whitespace().peekable();

        let prefix = match tokens.peek() {
            Some(tok) if tok.starts_with(':') => {
                let tok = tokens.next()?;
                Some(Prefix::parse(&tok[1..]))
            }
            _ => None,
        };

        let command = Command::from_token(tokens.next()?);

        let mut args = Vec::new();
        while let Some(tok) = tokens.next() {
            if let Some(first) = tok.strip_prefix(':') {
                let mut trailing = first.to_string();
                for rest in tokens.by_ref() {
                    trailing.push(' ');
                    trailing.push_str(rest);
                }
                args.push(trailing);
                break;
            }
            args.push(tok.to_string());
        }

        Some(Message {
            prefix,
            command,
            args,
        })
    }
}

/// The final argument needs a `:` introducer when it would otherwise be
/// ambiguous on re-parse.
fn needs_colon(arg: &str) -> bool {
    arg.is_empty() || arg.contains(' ') || arg.starts_with(':')
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.command)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i + 1 == self.args.len() && needs_colon(arg) {
                write!(f, " :{arg}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        f.write_str("\r\n")
    }
}
