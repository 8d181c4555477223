use serde::{Deserialize, Serialize};

/// Lifecycle of a single slot.
///
/// Transitions are monotonic: `Empty -> Reserved -> Ready`. A slot never
/// goes back to `Empty`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SlotState {
    /// Never claimed.
    Empty = 0,
    /// Claimed by exactly one writer; the record may not be visible yet.
    Reserved = 1,
    /// Record fully written and visible to every reader.
    Ready = 2,
}

impl SlotState {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            0 => SlotState::Empty,
            1 => SlotState::Reserved,
            _ => SlotState::Ready,
        }
    }
}

/// Identifies one insert attempt.
///
/// The owner remembers the token of the claim that won a slot, which makes a
/// retried claim request idempotent and lets it refuse a publish coming from
/// anyone else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClaimToken(pub String);

impl ClaimToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ClaimToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Occupancy snapshot of one local segment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentStats {
    pub slots: usize,
    pub empty: usize,
    pub reserved: usize,
    pub ready: usize,
}
