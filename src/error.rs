//! Error types for the IRC client core.
//!
//! This module defines error types for client operations, transport
//! failures, and message parsing issues.

use thiserror::Error;

/// Convenience type alias for Results using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level client errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An operation required a live connection but none exists.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called while a connection is already established.
    #[error("already connected")]
    AlreadyConnected,

    /// A caller-supplied argument was rejected before anything hit the wire.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A channel-list operation named a mode outside the server's list modes.
    #[error("not a channel list mode: {0}")]
    BadMode(char),

    /// I/O error on the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Server-originated failure (`ERROR` message, or an unhandled 433).
    ///
    /// The connection is closed before this is returned.
    #[error("server error: {0}")]
    Server(String),

    /// A tracker query was issued while tracking is disabled or starting.
    #[error("channel tracking is not active")]
    NotTracking,

    /// The incoming line buffer filled up without a line terminator.
    #[error("line buffer overflow")]
    BufferOverflow,
}

/// Errors encountered when parsing IRC messages.
///
/// Surfaced by [`MessageRef::parse`](crate::message::MessageRef::parse).
/// Inside `read_step` a line that fails to parse is logged and skipped, so
/// these never propagate out of the client itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was invalid or missing.
    #[error("invalid command")]
    InvalidCommand,

    /// A `:` prefix was present but never terminated by a space.
    #[error("unterminated prefix")]
    UnterminatedPrefix,
}
