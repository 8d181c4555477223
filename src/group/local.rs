//! In-process group: every participant lives in the same process and
//! reaches the other segments through direct memory access. Used by test
//! harnesses and single-node runs; the slot protocol is the same as over
//! HTTP.

use super::rendezvous::verify_handles;
use super::types::{ParticipantId, SegmentHandle};
use crate::storage::access::{RemoteAccess, SegmentLink};
use crate::storage::partitioner::PartitionLayout;
use crate::storage::segment::LocalSegment;
use crate::table::hashmap::DistributedHashTable;
use crate::table::record::TableRecord;
use crate::table::types::TableOptions;

use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Barrier;

pub struct InProcessGroup<R> {
    participants: usize,
    segments: DashMap<ParticipantId, Arc<LocalSegment<R>>>,
    barrier: Barrier,
}

impl<R: TableRecord> InProcessGroup<R> {
    pub fn new(participants: usize) -> Arc<Self> {
        Arc::new(Self {
            participants,
            segments: DashMap::new(),
            barrier: Barrier::new(participants.max(1)),
        })
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Collective construction. Every participant of the group must call
    /// this exactly once, concurrently, with its own id; none returns before
    /// all have published and collected their handles.
    pub async fn join(
        &self,
        participant: ParticipantId,
        capacity: usize,
        options: TableOptions,
    ) -> Result<DistributedHashTable<R>> {
        // An out-of-range id still waits on the first barrier, and its missing
        // handle fails collection everywhere. A zero capacity publishes an
        // empty handle and fails verification everywhere.
        let segment = if participant.0 < self.participants {
            let len = if capacity == 0 {
                0
            } else {
                PartitionLayout::new(capacity, self.participants).segment_len(participant)
            };
            let segment = Arc::new(LocalSegment::new(
                participant,
                self.participants,
                capacity,
                len,
            ));
            self.segments.insert(participant, segment.clone());
            Some(segment)
        } else {
            None
        };

        self.barrier.wait().await;

        let Some(segment) = segment else {
            anyhow::bail!(
                "Participant id {} out of range for {} participant(s)",
                participant.0,
                self.participants
            );
        };

        let handles = self.collect_handles()?;
        verify_handles(&handles, capacity, self.participants)?;
        segment.mark_barrier_cleared();

        let links = (0..self.participants)
            .map(|rank| {
                self.segments
                    .get(&ParticipantId(rank))
                    .map(|entry| SegmentLink::Local(entry.value().clone()))
                    .ok_or_else(|| anyhow::anyhow!("Missing segment of participant {}", rank))
            })
            .collect::<Result<Vec<_>>>()?;

        self.barrier.wait().await;
        tracing::info!(
            "Participant {} joined in-process group of {}",
            participant.0,
            self.participants
        );

        let layout = PartitionLayout::new(capacity, self.participants);
        Ok(DistributedHashTable::from_parts(
            participant,
            RemoteAccess::new(layout, links),
            segment,
            options,
        ))
    }

    fn collect_handles(&self) -> Result<Vec<SegmentHandle>> {
        (0..self.participants)
            .map(|rank| {
                self.segments
                    .get(&ParticipantId(rank))
                    .map(|entry| entry.value().handle())
                    .ok_or_else(|| anyhow::anyhow!("Participant {} never published a handle", rank))
            })
            .collect()
    }
}
