//! Per-position protocol engine.
//!
//! A participant owns its position, its two channel endpoints and its
//! neighbor wiring; nothing is shared with other participants except the
//! channels themselves.
//!
//! While serving, a participant suspends at these points:
//! - the origin waiting for user input
//! - waiting for the next record (or doorbell)
//! - the optional pause before a forward
//! - writing a record to the successor
//!
//! All but the write are raced against the interrupt. The write never waits
//! for space, since a channel holds a whole record and only one token exists.
//! The token is only touched between suspension points, so an interrupt can
//! never tear it. After the interrupt a signal-mode participant suspends once
//! more, until its child has exited.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use tokenring_topology::{ChannelReader, ChannelWriter, ParticipantLinks, Position, RingSize};
use tracing::{debug, error};

use crate::codec;
use crate::config::{DeliveryMode, RingConfig};
use crate::error::{Error, InputError, Result};
use crate::event::{EventLog, RingEvent};
use crate::rule::{self, Handling};
use crate::shutdown::{ShutdownHandle, ShutdownSignal};
use crate::source::{TokenSource, UserToken};
use crate::token::{Payload, Token};

/// What one participant did before it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantReport {
    pub position: Position,
    /// Records successfully written to the successor.
    pub forwards: u64,
    /// Messages addressed to and drained by this participant.
    pub deliveries: u64,
}

/// Neighbor wiring beyond the data channels.
pub(crate) struct Wiring {
    /// Rung by the predecessor after it writes a record.
    pub doorbell: Arc<Notify>,
    /// Rung by this participant after it writes a record.
    pub successor_doorbell: Arc<Notify>,
    /// Resolves when the successor (this participant's child) has exited.
    pub child_exit: Option<oneshot::Receiver<Position>>,
    /// Tells the predecessor (the parent) that this participant has exited.
    pub exit_tx: Option<oneshot::Sender<Position>>,
}

/// Outcome of asking the source for a message.
enum Pull {
    Token(UserToken),
    Exhausted,
    Interrupted,
}

pub(crate) struct Participant {
    position: Position,
    size: RingSize,
    mode: DeliveryMode,
    hop_delay: Duration,
    inbound: Option<ChannelReader>,
    outbound: Option<ChannelWriter>,
    wiring: Wiring,
    shutdown: ShutdownSignal,
    interrupt: ShutdownHandle,
    events: Arc<dyn EventLog>,
    report: ParticipantReport,
}

impl Participant {
    pub(crate) fn new(
        links: ParticipantLinks,
        wiring: Wiring,
        config: &RingConfig,
        interrupt: &ShutdownHandle,
        events: &Arc<dyn EventLog>,
    ) -> Self {
        let position = links.position;
        Self {
            position,
            size: config.size,
            mode: config.mode,
            hop_delay: config.hop_delay,
            inbound: Some(links.inbound),
            outbound: Some(links.outbound),
            wiring,
            shutdown: interrupt.subscribe(),
            interrupt: interrupt.clone(),
            events: Arc::clone(events),
            report: ParticipantReport {
                position,
                forwards: 0,
                deliveries: 0,
            },
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    /// Run a ring member until the interrupt or a failure.
    pub(crate) async fn run_member(mut self) -> Result<ParticipantReport> {
        self.started();
        let outcome = self.serve().await;
        self.finish(outcome).await
    }

    /// Run the origin: inject the first message, then serve like a member.
    pub(crate) async fn run_origin<S: TokenSource>(
        mut self,
        mut source: S,
        reinject: bool,
    ) -> Result<ParticipantReport> {
        self.started();
        let outcome = self.serve_origin(&mut source, reinject).await;
        self.finish(outcome).await
    }

    fn started(&self) {
        let (inbound_slot, outbound_slot) = match (&self.inbound, &self.outbound) {
            (Some(inbound), Some(outbound)) => (inbound.slot(), outbound.slot()),
            _ => return,
        };
        self.emit(RingEvent::ParticipantStarted {
            position: self.position,
            inbound_slot,
            outbound_slot,
        });
    }

    async fn serve(&mut self) -> Result<()> {
        while let Some(mut token) = self.receive().await? {
            self.settle(&mut token)?;
            self.forward(token).await?;
        }
        Ok(())
    }

    async fn serve_origin<S: TokenSource>(&mut self, source: &mut S, reinject: bool) -> Result<()> {
        let mut token = Token::new();
        match self.pull(source).await? {
            Pull::Token(user) => self.inject(&mut token, user)?,
            Pull::Exhausted => return Err(InputError::NoMessage.into()),
            Pull::Interrupted => return Ok(()),
        }
        self.forward(token).await?;

        let mut exhausted = false;
        while let Some(mut token) = self.receive().await? {
            self.settle(&mut token)?;
            if reinject && token.is_empty() && !exhausted {
                match self.pull(source).await? {
                    Pull::Token(user) => self.inject(&mut token, user)?,
                    Pull::Exhausted => exhausted = true,
                    Pull::Interrupted => return Ok(()),
                }
            }
            self.forward(token).await?;
        }
        Ok(())
    }

    async fn pull<S: TokenSource>(&mut self, source: &mut S) -> Result<Pull> {
        tokio::select! {
            biased;
            _ = self.shutdown.wait() => Ok(Pull::Interrupted),
            read = source.read_user_token() => match read? {
                Some(user) => Ok(Pull::Token(user)),
                None => Ok(Pull::Exhausted),
            },
        }
    }

    /// Load a user message onto the token held by the origin.
    ///
    /// A message addressed to the origin itself is delivered and drained
    /// here, before anything is written to a channel.
    fn inject(&mut self, token: &mut Token, user: UserToken) -> Result<()> {
        let (payload, truncated) = Payload::truncating(&user.message);
        if truncated {
            self.emit(RingEvent::PayloadTruncated {
                original_len: user.message.len(),
                kept_len: payload.len(),
            });
        }

        let destination = self.resolve_destination(user.destination);
        token.load(destination, payload.clone());
        self.emit(RingEvent::TokenInjected {
            position: self.position,
            destination,
            payload,
        });

        if destination == Some(self.position) {
            self.settle(token)?;
        }
        Ok(())
    }

    fn resolve_destination(&self, raw: i64) -> Option<Position> {
        if raw == -1 {
            return None;
        }
        let size = self.size.get();
        if (0..i64::from(size)).contains(&raw) {
            return Some(Position::new(raw as u32));
        }

        self.emit(RingEvent::DestinationOutOfRange {
            destination: raw,
            size,
        });
        // Past the last position the message still circulates, undelivered;
        // negative or unencodable values leave the token empty.
        i32::try_from(raw)
            .ok()
            .filter(|d| *d >= 0)
            .map(|d| Position::new(d as u32))
    }

    /// Wait for the next record. `Ok(None)` means the interrupt arrived.
    async fn receive(&mut self) -> Result<Option<Token>> {
        let position = self.position;
        let inbound = self
            .inbound
            .as_mut()
            .ok_or(Error::Disconnected { position })?;

        let record = match self.mode {
            DeliveryMode::Polling => tokio::select! {
                biased;
                _ = self.shutdown.wait() => return Ok(None),
                record = codec::read_record(inbound) => record?,
            },
            DeliveryMode::Signal => {
                tokio::select! {
                    biased;
                    _ = self.shutdown.wait() => return Ok(None),
                    _ = self.wiring.doorbell.notified() => {}
                }
                // The predecessor wrote the whole record before ringing.
                codec::read_record(inbound).await?
            }
        };

        match record {
            Some(token) => {
                self.emit(RingEvent::TokenReceived {
                    position,
                    turn: token.turn,
                });
                Ok(Some(token))
            }
            None if self.shutdown.is_triggered() => Ok(None),
            None => Err(Error::Disconnected { position }),
        }
    }

    /// Apply the turn rule as this participant.
    fn settle(&mut self, token: &mut Token) -> Result<()> {
        match rule::apply_turn(token, self.position)? {
            Handling::Delivered(payload) => {
                self.report.deliveries += 1;
                self.emit(RingEvent::MessageDelivered {
                    position: self.position,
                    payload,
                });
            }
            Handling::PassedThrough => {
                self.emit(RingEvent::TokenPassed {
                    position: self.position,
                });
            }
        }
        Ok(())
    }

    /// Advance the turn and hand the token to the successor.
    async fn forward(&mut self, mut token: Token) -> Result<()> {
        if !self.hop_delay.is_zero() {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => return Ok(()),
                _ = tokio::time::sleep(self.hop_delay) => {}
            }
        }

        token.advance(self.size);
        let position = self.position;
        self.emit(RingEvent::TokenForwarded {
            from: position,
            to: self.size.successor(position),
            turn: token.turn,
            destination: token.destination,
        });

        let outbound = self
            .outbound
            .as_mut()
            .ok_or(Error::Disconnected { position })?;
        match codec::write_record(outbound, &token).await {
            Ok(()) => {}
            Err(Error::Io(e)) if self.shutdown.is_triggered() => {
                debug!(position = position.value(), "Successor gone during shutdown: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.report.forwards += 1;
        if self.mode == DeliveryMode::Signal {
            self.wiring.successor_doorbell.notify_one();
        }
        Ok(())
    }

    async fn finish(mut self, outcome: Result<()>) -> Result<ParticipantReport> {
        if let Err(e) = &outcome {
            error!(position = self.position.value(), "Participant failed: {}", e);
            // A broken participant takes the whole ring down.
            self.interrupt.trigger();
        }
        self.terminate().await;
        outcome.map(|()| self.report)
    }

    /// Close endpoints, wait for the child in signal mode, tell the parent.
    async fn terminate(&mut self) {
        let position = self.position;
        if self.shutdown.is_triggered() {
            self.emit(RingEvent::ShutdownRequested { position });
        }

        let inbound = self.inbound.take();
        let outbound = self.outbound.take();
        if inbound.is_some() || outbound.is_some() {
            drop(inbound);
            drop(outbound);
            self.emit(RingEvent::EndpointsClosed { position });
        }

        if self.mode == DeliveryMode::Signal {
            if let Some(child_exit) = self.wiring.child_exit.take() {
                // Err means the child went away without reporting; either way it is gone.
                if let Ok(child) = child_exit.await {
                    self.emit(RingEvent::ChildExited { position, child });
                }
            }
        }

        self.emit(RingEvent::ParticipantExited { position });
        if let Some(exit_tx) = self.wiring.exit_tx.take() {
            let _ = exit_tx.send(position);
        }
    }

    fn emit(&self, event: RingEvent) {
        self.events.log(event);
    }
}
