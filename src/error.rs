//! Error types for the client protocol core.
//!
//! Recoverable conditions are values the caller inspects: a malformed line
//! is dropped, a roster update that does not match the expected shape is
//! skipped. Only transport failures terminate the connection.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Failed to parse an IRC line.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The line that failed to parse.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing one IRC line into an [`Event`].
///
/// [`Event`]: crate::Event
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Line contained a prefix but no command token.
    #[error("missing command")]
    MissingCommand,

    /// Command token was neither letters nor a three-digit numeric.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// A roster update that was abandoned because the line's parameters did not
/// match the expected shape for that command.
///
/// Never fatal: the caller logs it and continues with the next line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RosterError {
    /// The event carried no origin, but the update needs a source nick.
    #[error("missing origin for {0}")]
    MissingOrigin(String),

    /// A required parameter was absent.
    #[error("missing parameter for {command}: {what}")]
    MissingParam {
        /// The command being applied.
        command: String,
        /// Which parameter was expected.
        what: &'static str,
    },
}
