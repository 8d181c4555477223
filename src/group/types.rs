use crate::table::types::TableOptions;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Rank of a participant, in `[0, participants)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub usize);

/// Descriptor a participant publishes for its segment.
///
/// Together with the owner's address it forms the remote handle other
/// participants use for one-sided access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentHandle {
    pub owner: ParticipantId,
    pub participants: usize,
    pub capacity: usize,
    /// Number of slots in the segment.
    pub len: usize,
    /// The owner has collected and verified every other handle.
    pub ready: bool,
}

/// Startup configuration of one participant of an HTTP group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub participant: ParticipantId,
    pub capacity: usize,
    /// Addresses of every participant, indexed by participant id (including
    /// this one).
    pub peers: Vec<SocketAddr>,
    #[serde(default)]
    pub options: TableOptions,
    #[serde(default = "default_rendezvous_timeout_ms")]
    pub rendezvous_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_rendezvous_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl GroupConfig {
    pub fn new(participant: ParticipantId, capacity: usize, peers: Vec<SocketAddr>) -> Self {
        Self {
            participant,
            capacity,
            peers,
            options: TableOptions::default(),
            rendezvous_timeout_ms: default_rendezvous_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    pub fn participants(&self) -> usize {
        self.peers.len()
    }

    pub fn rendezvous_timeout(&self) -> Duration {
        Duration::from_millis(self.rendezvous_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            anyhow::bail!("Capacity must be greater than zero");
        }
        if self.peers.is_empty() {
            anyhow::bail!("At least one participant is required");
        }
        if self.participant.0 >= self.peers.len() {
            anyhow::bail!(
                "Participant id {} out of range for {} participant(s)",
                self.participant.0,
                self.peers.len()
            );
        }
        Ok(())
    }
}
