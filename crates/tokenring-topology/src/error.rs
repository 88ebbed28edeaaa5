//! Error types for tokenring-topology.

use thiserror::Error;

use crate::fabric::Endpoint;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while allocating channels or wiring participants.
///
/// All of these are fatal: a ring is either built completely or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Requested ring size is outside the supported range.
    #[error("ring size {size} outside supported range {min}..={max}")]
    InvalidSize { size: u32, min: u32, max: u32 },

    /// A channel could not hold even one record.
    #[error("channel capacity must be at least {required} bytes, got {capacity}")]
    InsufficientCapacity { capacity: usize, required: usize },

    /// Slot index past the end of the fabric.
    #[error("no channel slot {slot} in a fabric of {len}")]
    NoSuchSlot { slot: usize, len: usize },

    /// Endpoint was already handed to another participant.
    #[error("{end} end of channel {slot} already taken")]
    EndpointTaken { slot: usize, end: Endpoint },

    /// Endpoints were still held by the fabric once every participant was wired.
    #[error("{count} channel endpoints left open after wiring the ring")]
    LeakedEndpoints { count: usize },
}
