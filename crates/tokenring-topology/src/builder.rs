//! Topology builder: wires a fabric into a ring of participants.
//!
//! Wiring happens once, in creation order. Participant `k` receives:
//! - the write end of slot `k` (its outbound channel)
//! - the read end of slot `k - 1`, wrapping to the last slot for the origin
//!
//! After every participant is wired the fabric must hold nothing. A leftover
//! endpoint would be a second potential writer (or a reader nobody drains),
//! so any leak fails the build instead of being silently closed.

use tracing::debug;

use crate::error::{Error, Result};
use crate::fabric::{ChannelFabric, ChannelReader, ChannelWriter};
use crate::{Position, RingSize, DEFAULT_CHANNEL_CAPACITY};

/// The two endpoints owned by one participant.
#[derive(Debug)]
pub struct ParticipantLinks {
    /// Position assigned at creation.
    pub position: Position,
    /// Read end of the predecessor's slot.
    pub inbound: ChannelReader,
    /// Write end of this participant's own slot.
    pub outbound: ChannelWriter,
}

/// A fully wired ring, in creation order.
#[derive(Debug)]
pub struct Topology {
    size: RingSize,
    links: Vec<ParticipantLinks>,
}

impl Topology {
    pub fn size(&self) -> RingSize {
        self.size
    }

    /// Links for every position, ordered by position.
    pub fn links(&self) -> &[ParticipantLinks] {
        &self.links
    }

    /// Hand the links over to the participants.
    pub fn into_links(self) -> Vec<ParticipantLinks> {
        self.links
    }
}

/// Builds a [`Topology`] of a given size.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    size: RingSize,
    capacity: usize,
    min_capacity: usize,
}

impl TopologyBuilder {
    pub fn new(size: RingSize) -> Self {
        Self {
            size,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            min_capacity: 1,
        }
    }

    /// Set the per-channel buffer size in bytes.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Require every channel to buffer at least `bytes`, typically one
    /// whole record, so a forward never waits on the reader.
    #[must_use]
    pub fn with_min_capacity(mut self, bytes: usize) -> Self {
        self.min_capacity = bytes;
        self
    }

    /// Allocate the fabric and wire every participant.
    pub fn build(self) -> Result<Topology> {
        if self.capacity < self.min_capacity {
            return Err(Error::InsufficientCapacity {
                capacity: self.capacity,
                required: self.min_capacity,
            });
        }

        let mut fabric = ChannelFabric::allocate(self.size, self.capacity)?;
        let mut links = Vec::with_capacity(self.size.len());

        for position in self.size.positions() {
            let predecessor = self.size.predecessor(position);
            let outbound = fabric.take_writer(position.index())?;
            let inbound = fabric.take_reader(predecessor.index())?;

            debug!(
                position = position.value(),
                inbound_slot = inbound.slot(),
                outbound_slot = outbound.slot(),
                "wired participant"
            );

            links.push(ParticipantLinks {
                position,
                inbound,
                outbound,
            });
        }

        let leaked = fabric.close_remaining();
        if leaked != 0 {
            return Err(Error::LeakedEndpoints { count: leaked });
        }

        debug!(size = self.size.get(), "ring topology built");
        Ok(Topology {
            size: self.size,
            links,
        })
    }
}
