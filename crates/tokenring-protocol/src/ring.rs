//! Ring coordinator.
//!
//! Builds the topology once, creates one participant per position with its
//! own endpoints and wiring, runs them all as independent tasks and collects
//! their reports after the interrupt.

use std::sync::Arc;

use tokio::sync::{oneshot, Notify};
use tokio::task::JoinSet;
use tokenring_topology::{RingSize, TopologyBuilder};
use tracing::{debug, info};

use crate::codec::RECORD_LEN;
use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::event::{EventLog, RingEvent};
use crate::participant::{Participant, ParticipantReport, Wiring};
use crate::shutdown::{self, ShutdownHandle};
use crate::source::TokenSource;

/// Summary of a finished ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingReport {
    pub size: RingSize,
    /// One report per position, ordered by position.
    pub participants: Vec<ParticipantReport>,
}

impl RingReport {
    /// Total messages delivered across the ring.
    pub fn deliveries(&self) -> u64 {
        self.participants.iter().map(|p| p.deliveries).sum()
    }

    /// Total records written across the ring.
    pub fn forwards(&self) -> u64 {
        self.participants.iter().map(|p| p.forwards).sum()
    }
}

/// A wired ring, ready to run.
pub struct Ring {
    config: RingConfig,
    origin: Participant,
    members: Vec<Participant>,
    shutdown: ShutdownHandle,
}

impl Ring {
    /// Allocate the channel fabric and wire every participant.
    ///
    /// Fails with [`Error::Setup`] if the fabric cannot be built; no
    /// participant runs in that case.
    pub fn build(config: RingConfig, events: Arc<dyn EventLog>) -> Result<Self> {
        let size = config.size;
        let n = size.len();

        let topology = TopologyBuilder::new(size)
            .with_channel_capacity(config.channel_capacity)
            .with_min_capacity(RECORD_LEN)
            .build()?;

        let (shutdown, _) = shutdown::channel();
        let doorbells: Vec<Arc<Notify>> = (0..n).map(|_| Arc::new(Notify::new())).collect();
        let (mut exit_txs, mut exit_rxs): (Vec<_>, Vec<_>) = (0..n)
            .map(|_| {
                let (tx, rx) = oneshot::channel();
                (Some(tx), Some(rx))
            })
            .unzip();

        let mut participants = topology.into_links().into_iter().map(|links| {
            let k = links.position.index();
            let successor = size.successor(links.position).index();
            let wiring = Wiring {
                doorbell: Arc::clone(&doorbells[k]),
                successor_doorbell: Arc::clone(&doorbells[successor]),
                // The origin has no parent and the last position has no child.
                exit_tx: if k == 0 { None } else { exit_txs[k].take() },
                child_exit: if k + 1 < n { exit_rxs[k + 1].take() } else { None },
            };
            Participant::new(links, wiring, &config, &shutdown, &events)
        });

        let origin = participants
            .next()
            .ok_or(Error::Setup(tokenring_topology::Error::InvalidSize {
                size: size.get(),
                min: tokenring_topology::MIN_RING_SIZE,
                max: tokenring_topology::MAX_RING_SIZE,
            }))?;
        let members: Vec<_> = participants.collect();
        debug_assert!(origin.position().is_origin());

        events.log(RingEvent::TopologyBuilt {
            size: size.get(),
            mode: config.mode,
        });

        Ok(Self {
            config,
            origin,
            members,
            shutdown,
        })
    }

    pub fn size(&self) -> RingSize {
        self.config.size
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Handle that delivers the interrupt to every participant.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run every participant until the interrupt.
    ///
    /// The origin pulls its first message from `source`. Returns the first
    /// failure if any participant failed; otherwise one report per position.
    pub async fn run<S: TokenSource>(self, source: S) -> Result<RingReport> {
        let Self {
            config,
            origin,
            members,
            shutdown,
        } = self;

        info!(
            size = config.size.get(),
            mode = %config.mode,
            "Starting token ring"
        );

        let mut tasks = JoinSet::new();
        for member in members {
            tasks.spawn(member.run_member());
        }
        tasks.spawn(origin.run_origin(source, config.reinject));

        let mut reports = Vec::with_capacity(config.size.len());
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| Error::Task(e.to_string())).and_then(|r| r) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    shutdown.trigger();
                    if failure.is_none() {
                        failure = Some(e);
                    } else {
                        debug!("Further participant failure: {}", e);
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        reports.sort_by_key(|r| r.position);
        Ok(RingReport {
            size: config.size,
            participants: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChannelLog;
    use crate::source::ScriptedSource;
    use std::time::Duration;

    fn quiet() -> Arc<dyn EventLog> {
        Arc::new(ChannelLog::new().0)
    }

    #[test]
    fn capacity_smaller_than_record_is_setup_failure() {
        let config = RingConfig::default().with_channel_capacity(RECORD_LEN - 1);
        match Ring::build(config, quiet()) {
            Err(Error::Setup(tokenring_topology::Error::InsufficientCapacity {
                capacity,
                required,
            })) => {
                assert_eq!(capacity, RECORD_LEN - 1);
                assert_eq!(required, RECORD_LEN);
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("ring built with undersized channels"),
        }
    }

    #[test]
    fn one_participant_per_position() {
        let ring = Ring::build(RingConfig::new(RingSize::new(6).unwrap()), quiet()).unwrap();
        assert!(ring.origin.position().is_origin());
        let positions: Vec<u32> = ring.members.iter().map(|p| p.position().value()).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn interrupt_before_input_is_clean() {
        let config = RingConfig::default().with_hop_delay(Duration::ZERO);
        let ring = Ring::build(config, quiet()).unwrap();
        let handle = ring.shutdown_handle();
        handle.trigger();

        let report = ring.run(ScriptedSource::once("never sent", 1)).await.unwrap();
        assert_eq!(report.participants.len(), 3);
        assert_eq!(report.forwards(), 0);
        assert_eq!(report.deliveries(), 0);
    }

    #[tokio::test]
    async fn missing_first_message_is_input_failure() {
        let config = RingConfig::default().with_hop_delay(Duration::ZERO);
        let ring = Ring::build(config, quiet()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), ring.run(ScriptedSource::default()))
            .await
            .unwrap();
        assert!(matches!(outcome, Err(Error::Input(_))));
    }
}
