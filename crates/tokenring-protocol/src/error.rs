//! Error types for tokenring-protocol.

use thiserror::Error;
use tokenring_topology::Position;

/// Result type for ring protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a participant or the whole ring.
///
/// An interrupt-driven shutdown is not an error; participants return a
/// report in that case.
#[derive(Debug, Error)]
pub enum Error {
    /// Channel allocation or participant wiring failed before the ring ran.
    #[error("ring setup failed: {0}")]
    Setup(#[from] tokenring_topology::Error),

    /// The single-owner invariant was broken upstream.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// The origin could not obtain a message to inject.
    #[error("input failure: {0}")]
    Input(#[from] InputError),

    /// The inbound channel ended while the ring was still running.
    #[error("inbound channel of position {position} closed unexpectedly")]
    Disconnected { position: Position },

    /// Channel I/O failed.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A participant task panicked or was aborted.
    #[error("participant task failed: {0}")]
    Task(String),
}

/// Ways a received record can break the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// The token arrived at a position whose turn it is not.
    #[error("token turn {turn} delivered to position {position}")]
    WrongTurn { turn: u32, position: Position },

    /// Fewer bytes than one record before the stream ended.
    #[error("truncated record: got {got} of {expected} bytes")]
    TruncatedRecord { got: usize, expected: usize },

    /// More bytes than one record.
    #[error("oversized record: got {got}, expected {expected} bytes")]
    OversizedRecord { got: usize, expected: usize },

    /// Destination field out of the encodable range.
    #[error("invalid destination {0}")]
    BadDestination(i64),

    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    BadPayload,
}

/// Failures of the interactive token source.
#[derive(Debug, Error)]
pub enum InputError {
    /// The source ended before supplying the first message.
    #[error("no message supplied")]
    NoMessage,

    /// Reading the message or destination failed.
    #[error("failed to read user input: {0}")]
    Io(#[from] std::io::Error),
}
