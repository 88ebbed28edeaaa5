//! Token Ring Topology
//!
//! Logical ring of `n` participants wired by unidirectional byte channels.
//!
//! # Shape
//!
//! Participants are numbered `0..n` in creation order. Position 0 is the
//! origin. Every participant owns exactly two channel endpoints:
//! - the write end of its own slot (outbound, toward its successor)
//! - the read end of its predecessor's slot (inbound)
//!
//! Position `n - 1` writes into its own slot, which position 0 reads, closing
//! the cycle.
//!
//! # Single ownership
//!
//! The [`ChannelFabric`] hands each endpoint out at most once. The
//! [`TopologyBuilder`] moves the two endpoints a participant needs into its
//! [`ParticipantLinks`] and closes whatever is left over, so no channel ever
//! has a second writer and every reader observes end-of-stream once its
//! writer is gone.

mod builder;
mod error;
mod fabric;
mod position;

pub use builder::{ParticipantLinks, Topology, TopologyBuilder};
pub use error::{Error, Result};
pub use fabric::{ChannelFabric, ChannelReader, ChannelWriter, Endpoint};
pub use position::{Position, RingSize};

/// Smallest ring that still has a distinct successor for every participant.
pub const MIN_RING_SIZE: u32 = 2;

/// Largest supported ring.
pub const MAX_RING_SIZE: u32 = 100;

/// Size used when the requested one is missing or out of range.
pub const DEFAULT_RING_SIZE: u32 = 3;

/// Default buffer size of a single fabric channel, in bytes.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

/// Endpoints held by a live participant (one inbound, one outbound).
pub const ENDPOINTS_PER_PARTICIPANT: usize = 2;

const _: () = assert!(MIN_RING_SIZE <= DEFAULT_RING_SIZE && DEFAULT_RING_SIZE <= MAX_RING_SIZE);
