use crate::group::types::ParticipantId;
use std::ops::Range;

/// Static block partitioning of the global slot space.
///
/// Every participant builds the same layout from `(capacity, participants)`
/// alone, so resolving the owner of a slot never needs a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionLayout {
    capacity: usize,
    participants: usize,
    segment_size: usize,
}

impl PartitionLayout {
    /// Both arguments must be non-zero; construction checks this before
    /// building a layout.
    pub fn new(capacity: usize, participants: usize) -> Self {
        debug_assert!(capacity > 0 && participants > 0);
        Self {
            capacity,
            participants,
            segment_size: capacity.div_ceil(participants),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn owner(&self, slot: usize) -> ParticipantId {
        ParticipantId(slot / self.segment_size)
    }

    pub fn local_offset(&self, slot: usize) -> usize {
        slot % self.segment_size
    }

    /// Resolves a global slot to `(owner, local_offset)`.
    pub fn locate(&self, slot: usize) -> (ParticipantId, usize) {
        (self.owner(slot), self.local_offset(slot))
    }

    pub fn global_slot(&self, owner: ParticipantId, offset: usize) -> usize {
        owner.0 * self.segment_size + offset
    }

    /// Global indices owned by `owner`. Empty for trailing participants when
    /// there are more participants than slots.
    pub fn segment_range(&self, owner: ParticipantId) -> Range<usize> {
        let start = (owner.0 * self.segment_size).min(self.capacity);
        let end = ((owner.0 + 1) * self.segment_size).min(self.capacity);
        start..end
    }

    pub fn segment_len(&self, owner: ParticipantId) -> usize {
        self.segment_range(owner).len()
    }
}
