//! Token Ring Protocol - single-token circulation over a logical ring
//!
//! One token travels around a ring of participants built by
//! `tokenring-topology`. Whoever holds the turn inspects it, delivers and
//! drains it if addressed to them, advances the turn and writes it to the
//! successor.
//!
//! # Overview
//!
//! ## Token and wire format
//!
//! A [`Token`] carries `turn`, an optional destination and a bounded
//! [`Payload`]. The [`codec`] module writes it as one fixed 1024-byte record;
//! any read that does not yield exactly one record is a
//! [`ProtocolViolation`].
//!
//! ## Turn rule
//!
//! [`apply_turn`] enforces single ownership: a token whose turn is not the
//! receiver's position is a violation, never silently skipped. The addressee
//! drains the token exactly once; it then circulates empty.
//!
//! ## Delivery modes
//!
//! - [`DeliveryMode::Polling`]: each participant blocks on its inbound read.
//! - [`DeliveryMode::Signal`]: each participant sleeps until its predecessor
//!   rings its doorbell, then reads. Shutdown unwinds from the last position
//!   back to the origin.
//!
//! ## Collaborators
//!
//! The origin obtains messages from a [`TokenSource`] (`ReadUserToken()`)
//! and everything observable goes to an [`EventLog`] (`Log(event)`).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokenring_protocol::{Ring, RingConfig, ScriptedSource, TracingLog};
//! use tokenring_topology::RingSize;
//!
//! # async fn demo() -> tokenring_protocol::Result<()> {
//! let config = RingConfig::new(RingSize::new(3)?);
//! let ring = Ring::build(config, Arc::new(TracingLog))?;
//! let interrupt = ring.shutdown_handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     interrupt.trigger();
//! });
//! let report = ring.run(ScriptedSource::once("hello", 2)).await?;
//! assert_eq!(report.deliveries(), 1);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod participant;
pub mod ring;
pub mod rule;
pub mod shutdown;
pub mod source;
pub mod token;

pub use codec::{PAYLOAD_CAPACITY, RECORD_LEN};
pub use config::{DeliveryMode, RingConfig};
pub use error::{Error, InputError, ProtocolViolation, Result};
pub use event::{ChannelLog, EventLog, RingEvent, TracingLog};
pub use participant::ParticipantReport;
pub use ring::{Ring, RingReport};
pub use rule::{apply_turn, Handling};
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use source::{ScriptedSource, TokenSource, UserToken};
pub use token::{Payload, Token};
