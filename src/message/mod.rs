//! Zero-copy IRC message types.
//!
//! This module provides [`MessageRef<'a>`], a borrowed message type that
//! holds references into the original line, avoiding allocations while a
//! message is dispatched.
//!
//! # Example
//!
//! ```
//! use slirc_client::message::MessageRef;
//!
//! let msg = MessageRef::parse(":nick!user@host PRIVMSG #channel :Hello!").unwrap();
//!
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.args(), &["#channel", "Hello!"]);
//! assert_eq!(msg.prefix, Some("nick!user@host"));
//! ```

mod parse;

use std::fmt::{self, Display, Formatter};

use smallvec::SmallVec;

use crate::error::MessageParseError;
use crate::prefix::UserRef;

pub use parse::MAX_ARGS;

/// A borrowed IRC message that references the original input line.
///
/// All string data is borrowed from the input, making parsing fast with no
/// allocations. The dispatcher promotes fields to owned strings only where
/// it retains state (the tracker).
#[derive(Clone, PartialEq, Debug)]
pub struct MessageRef<'a> {
    /// The message prefix (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command verb, or a 3-digit numeric as text (`"353"`, not 353).
    pub command: &'a str,
    /// Positional arguments, at most [`MAX_ARGS`].
    pub args: SmallVec<[&'a str; MAX_ARGS]>,
}

impl<'a> MessageRef<'a> {
    /// Parse an IRC line into a borrowed `MessageRef`.
    ///
    /// Trailing `\r`/`\n` are tolerated. A line consisting of a `:` prefix
    /// with no following space fails with
    /// [`MessageParseError::UnterminatedPrefix`].
    ///
    /// # Example
    ///
    /// ```
    /// use slirc_client::message::MessageRef;
    ///
    /// let msg = MessageRef::parse("PING 123456").unwrap();
    /// assert_eq!(msg.command, "PING");
    /// assert_eq!(msg.args(), &["123456"]);
    /// ```
    #[must_use = "parsing result should be handled"]
    pub fn parse(s: &'a str) -> Result<MessageRef<'a>, MessageParseError> {
        let trimmed = s.trim_end_matches(['\r', '\n']);

        if trimmed.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }
        if trimmed.starts_with(':') && !trimmed.contains(' ') {
            return Err(MessageParseError::UnterminatedPrefix);
        }

        let raw = parse::parse_line(trimmed)
            .map_err(|_| MessageParseError::InvalidCommand)?
            .1;

        Ok(MessageRef {
            prefix: raw.prefix,
            command: raw.command,
            args: raw.args,
        })
    }

    /// Get the arguments as a slice.
    #[inline]
    pub fn args(&self) -> &[&'a str] {
        &self.args
    }

    /// Get a specific argument by index.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    /// Get an argument by index, or `""` when absent.
    #[inline]
    pub fn arg_or_empty(&self, index: usize) -> &'a str {
        self.arg(index).unwrap_or("")
    }

    /// The last argument, or `""` when the message has none.
    ///
    /// Most numerics carry their human-readable text in the trailing
    /// position, so this is the common accessor in reply handling.
    #[inline]
    pub fn trailing(&self) -> &'a str {
        self.args.last().copied().unwrap_or("")
    }

    /// Check if this is a numeric reply (3-digit command).
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.chars().all(|c| c.is_ascii_digit())
    }

    /// Parse the origin of this message as a `nick!user@host` identity.
    ///
    /// Returns `None` when the message carries no prefix.
    pub fn source_user(&self) -> Option<UserRef<'a>> {
        self.prefix.map(UserRef::parse)
    }

    /// The nickname portion of the prefix, if any.
    pub fn source_nick(&self) -> Option<&'a str> {
        self.prefix.map(|p| UserRef::parse(p).nick)
    }
}

impl Display for MessageRef<'_> {
    /// Serialize the message back to IRC wire format, without the CRLF.
    ///
    /// The trailing argument is re-quoted with `:` when it contains a
    /// space, is empty, or itself starts with `:`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;
        for (i, arg) in self.args.iter().enumerate() {
            let is_last = i == self.args.len() - 1;
            let needs_colon =
                is_last && (arg.contains(' ') || arg.is_empty() || arg.starts_with(':'));
            if needs_colon {
                write!(f, " :{}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
