//! Ring events and the sinks that receive them.
//!
//! Participants never print. Everything an operator might want to see is a
//! [`RingEvent`] handed to an [`EventLog`].

use tokio::sync::mpsc;
use tokenring_topology::Position;
use tracing::{debug, info, warn};

use crate::config::DeliveryMode;
use crate::token::Payload;

/// Something observable that happened in the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum RingEvent {
    /// Every participant is wired and about to start.
    TopologyBuilt { size: u32, mode: DeliveryMode },
    /// A participant started with its two endpoints.
    ParticipantStarted {
        position: Position,
        inbound_slot: usize,
        outbound_slot: usize,
    },
    /// The user's message was cut to fit the record.
    PayloadTruncated { original_len: usize, kept_len: usize },
    /// The requested destination is not a ring position.
    DestinationOutOfRange { destination: i64, size: u32 },
    /// The origin loaded a message onto the token.
    TokenInjected {
        position: Position,
        destination: Option<Position>,
        payload: Payload,
    },
    /// A participant read the token from its inbound channel.
    TokenReceived { position: Position, turn: u32 },
    /// The token was addressed to this participant.
    MessageDelivered { position: Position, payload: Payload },
    /// The token was not for this participant.
    TokenPassed { position: Position },
    /// The token is about to be written to the successor.
    TokenForwarded {
        from: Position,
        to: Position,
        turn: u32,
        destination: Option<Position>,
    },
    /// The interrupt reached this participant.
    ShutdownRequested { position: Position },
    /// Inbound and outbound endpoints are closed.
    EndpointsClosed { position: Position },
    /// The successor exited before this participant.
    ChildExited { position: Position, child: Position },
    /// The participant is done.
    ParticipantExited { position: Position },
}

/// The `Log(event)` collaborator.
pub trait EventLog: Send + Sync + 'static {
    fn log(&self, event: RingEvent);
}

/// Renders events as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn log(&self, event: RingEvent) {
        match event {
            RingEvent::TopologyBuilt { size, mode } => {
                info!(size, %mode, "Ring of {} participants wired", size);
            }
            RingEvent::ParticipantStarted {
                position,
                inbound_slot,
                outbound_slot,
            } => {
                debug!(
                    position = position.value(),
                    inbound_slot, outbound_slot, "Participant started"
                );
            }
            RingEvent::PayloadTruncated {
                original_len,
                kept_len,
            } => {
                warn!(
                    "Message of {} bytes truncated to {} bytes",
                    original_len, kept_len
                );
            }
            RingEvent::DestinationOutOfRange { destination, size } => {
                warn!(
                    "Destination {} is not a position of a ring of {}",
                    destination, size
                );
            }
            RingEvent::TokenInjected {
                position,
                destination,
                payload,
            } => match destination {
                Some(d) => info!(
                    position = position.value(),
                    "Initial token at process {} for process {}: {}", position, d, payload
                ),
                None => info!(
                    position = position.value(),
                    "Initial token at process {} is empty", position
                ),
            },
            RingEvent::TokenReceived { position, turn } => {
                info!(
                    position = position.value(),
                    turn, "Token passed to process {}", position
                );
            }
            RingEvent::MessageDelivered { position, payload } => {
                info!(
                    position = position.value(),
                    "A message for process {}: {}", position, payload
                );
            }
            RingEvent::TokenPassed { position } => {
                debug!(position = position.value(), "Don't need it, passing token");
            }
            RingEvent::TokenForwarded {
                from,
                to,
                turn,
                destination,
            } => {
                debug!(
                    from = from.value(),
                    to = to.value(),
                    turn,
                    destination = destination.map(|d| d.value()),
                    "Passing token"
                );
            }
            RingEvent::ShutdownRequested { position } => {
                info!(position = position.value(), "Shutting down process {}", position);
            }
            RingEvent::EndpointsClosed { position } => {
                debug!(position = position.value(), "Channel endpoints closed");
            }
            RingEvent::ChildExited { position, child } => {
                debug!(
                    position = position.value(),
                    child = child.value(),
                    "Child process exited"
                );
            }
            RingEvent::ParticipantExited { position } => {
                info!(position = position.value(), "Process {} exited", position);
            }
        }
    }
}

/// Forwards events to an unbounded channel, in the order they are logged.
#[derive(Debug, Clone)]
pub struct ChannelLog {
    tx: mpsc::UnboundedSender<RingEvent>,
}

impl ChannelLog {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RingEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventLog for ChannelLog {
    fn log(&self, event: RingEvent) {
        // A dropped receiver means nobody is watching any more.
        let _ = self.tx.send(event);
    }
}
