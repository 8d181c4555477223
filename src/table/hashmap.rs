use super::record::TableRecord;
use super::types::TableOptions;
use crate::group::types::ParticipantId;
use crate::storage::access::RemoteAccess;
use crate::storage::partitioner::PartitionLayout;
use crate::storage::segment::LocalSegment;
use crate::storage::types::{ClaimToken, SegmentStats, SlotState};

use anyhow::Result;
use std::sync::Arc;

/// One participant's view of the distributed table.
///
/// Built only by a collective construction (`InProcessGroup::join` or
/// `group::node::start_participant`), which returns after every participant
/// has exchanged handles. Structurally immutable afterwards.
pub struct DistributedHashTable<R> {
    participant: ParticipantId,
    access: RemoteAccess<R>,
    local: Arc<LocalSegment<R>>,
    options: TableOptions,
}

impl<R: TableRecord> DistributedHashTable<R> {
    pub(crate) fn from_parts(
        participant: ParticipantId,
        access: RemoteAccess<R>,
        local: Arc<LocalSegment<R>>,
        options: TableOptions,
    ) -> Self {
        Self {
            participant,
            access,
            local,
            options,
        }
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Total slot count across all participants.
    pub fn capacity(&self) -> usize {
        self.access.layout().capacity()
    }

    pub fn layout(&self) -> &PartitionLayout {
        self.access.layout()
    }

    pub fn options(&self) -> TableOptions {
        self.options
    }

    /// Slot-level primitives, addressed by global slot index.
    pub fn access(&self) -> &RemoteAccess<R> {
        &self.access
    }

    pub fn local_stats(&self) -> SegmentStats {
        self.local.stats()
    }

    /// `Ready` records held by this participant, keyed by global slot.
    pub fn local_records(&self) -> Vec<(usize, R)> {
        let layout = self.access.layout();
        self.local
            .ready_records()
            .into_iter()
            .map(|(offset, record)| (layout.global_slot(self.participant, offset), record))
            .collect()
    }

    fn probe_origin(&self, key: &R::Key) -> usize {
        (R::hash_key(key) % self.capacity() as u64) as usize
    }

    /// Stores `record` in the first slot of its probe sequence this call can
    /// claim.
    ///
    /// Returns `Ok(false)` when all `capacity` candidates were taken. An
    /// equal key inserted twice occupies two slots.
    pub async fn insert(&self, record: R) -> Result<bool> {
        let capacity = self.capacity();
        let origin = self.probe_origin(record.key());
        let token = ClaimToken::new();

        for probe in 0..capacity {
            let candidate = (origin + probe) % capacity;

            if !self.access.claim(candidate, &token).await? {
                continue;
            }

            // Publish strictly after the write has completed.
            self.access.write_record(candidate, record).await?;
            self.access.publish(candidate, &token).await?;

            tracing::debug!(
                "Inserted at slot {} (origin {}, {} probe(s))",
                candidate,
                origin,
                probe + 1
            );
            return Ok(true);
        }

        tracing::warn!(
            "Table full along probe sequence from slot {} (capacity {})",
            origin,
            capacity
        );
        Ok(false)
    }

    /// Looks `key` up along its probe sequence, reading only `Ready` slots.
    pub async fn find(&self, key: &R::Key) -> Result<Option<R>> {
        let capacity = self.capacity();
        let origin = self.probe_origin(key);

        for probe in 0..capacity {
            let candidate = (origin + probe) % capacity;

            match self.access.read_state(candidate).await? {
                SlotState::Ready => {
                    if let Some(record) = self.access.read_record(candidate).await?
                        && record.key() == key
                    {
                        tracing::debug!("Found key at slot {} ({} probe(s))", candidate, probe + 1);
                        return Ok(Some(record));
                    }
                }
                SlotState::Empty if self.options.stop_at_empty => break,
                _ => {}
            }
        }

        Ok(None)
    }
}
