//! Local Storage Segment
//!
//! The slots a participant owns: one state marker and one record cell per
//! local offset. Every participant reaches these slots through the same
//! methods, either directly (same process) or through the owner's request
//! handlers, so the atomics here are the single point of arbitration for
//! each slot.
//!
//! ## Visibility
//! A record is written before its state is stored as `Ready` with `Release`
//! ordering, and readers load the state with `Acquire` before reading the
//! record. A reader that sees `Ready` therefore sees the whole record.

use super::types::{ClaimToken, SegmentStats, SlotState};
use crate::group::types::{ParticipantId, SegmentHandle};

use anyhow::Result;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

pub struct LocalSegment<R> {
    owner: ParticipantId,
    participants: usize,
    capacity: usize,
    states: Vec<AtomicU8>,
    records: DashMap<usize, R>,
    claimants: DashMap<usize, ClaimToken>,
    barrier_cleared: AtomicBool,
}

impl<R: Clone> LocalSegment<R> {
    /// Allocates `len` slots, all `Empty`.
    pub fn new(owner: ParticipantId, participants: usize, capacity: usize, len: usize) -> Self {
        let states = (0..len)
            .map(|_| AtomicU8::new(SlotState::Empty as u8))
            .collect();

        tracing::info!(
            "Allocated segment for participant {} ({} of {} slots)",
            owner.0,
            len,
            capacity
        );

        Self {
            owner,
            participants,
            capacity,
            states,
            records: DashMap::with_capacity(len),
            claimants: DashMap::new(),
            barrier_cleared: AtomicBool::new(false),
        }
    }

    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Descriptor published to the other participants during rendezvous.
    pub fn handle(&self) -> SegmentHandle {
        SegmentHandle {
            owner: self.owner,
            participants: self.participants,
            capacity: self.capacity,
            len: self.len(),
            ready: self.barrier_cleared.load(Ordering::Acquire),
        }
    }

    pub fn mark_barrier_cleared(&self) {
        self.barrier_cleared.store(true, Ordering::Release);
    }

    fn slot(&self, offset: usize) -> Result<&AtomicU8> {
        self.states.get(offset).ok_or_else(|| {
            anyhow::anyhow!(
                "Offset {} out of range for segment of participant {} (len {})",
                offset,
                self.owner.0,
                self.len()
            )
        })
    }

    pub fn read_state(&self, offset: usize) -> Result<SlotState> {
        let raw = self.slot(offset)?.load(Ordering::Acquire);
        Ok(SlotState::from_raw(raw))
    }

    /// `None` until a record has been written to the slot.
    pub fn read_record(&self, offset: usize) -> Result<Option<R>> {
        self.slot(offset)?;
        Ok(self.records.get(&offset).map(|entry| entry.value().clone()))
    }

    pub fn write_record(&self, offset: usize, record: R) -> Result<()> {
        self.slot(offset)?;
        self.records.insert(offset, record);
        Ok(())
    }

    /// Atomic `Empty -> Reserved`. Returns whether `token` owns the slot.
    ///
    /// A repeated claim with the winning token reports success again while
    /// the slot is still `Reserved`.
    pub fn claim(&self, offset: usize, token: &ClaimToken) -> Result<bool> {
        let state = self.slot(offset)?;

        match state.compare_exchange(
            SlotState::Empty as u8,
            SlotState::Reserved as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.claimants.insert(offset, token.clone());
                tracing::debug!("Claimed offset {} on participant {}", offset, self.owner.0);
                Ok(true)
            }
            Err(current) if current == SlotState::Reserved as u8 => Ok(self
                .claimants
                .get(&offset)
                .map(|winner| winner.value() == token)
                .unwrap_or(false)),
            Err(_) => Ok(false),
        }
    }

    /// `Reserved -> Ready`, only for the claimant, only after its record
    /// write has completed.
    ///
    /// The winning token stays recorded after the slot turns `Ready`, so a
    /// repeated publish from the claimant succeeds without changing anything.
    pub fn publish(&self, offset: usize, token: &ClaimToken) -> Result<()> {
        let state = self.slot(offset)?;

        let is_claimant = self
            .claimants
            .get(&offset)
            .map(|winner| winner.value() == token)
            .unwrap_or(false);

        let current = SlotState::from_raw(state.load(Ordering::Acquire));
        if current == SlotState::Ready && is_claimant {
            tracing::debug!(
                "Offset {} on participant {} already published by this claimant",
                offset,
                self.owner.0
            );
            return Ok(());
        }
        if current != SlotState::Reserved {
            anyhow::bail!(
                "Cannot publish offset {} on participant {}: slot is {:?}",
                offset,
                self.owner.0,
                current
            );
        }

        if !is_claimant {
            anyhow::bail!(
                "Cannot publish offset {} on participant {}: not the claimant",
                offset,
                self.owner.0
            );
        }

        if !self.records.contains_key(&offset) {
            anyhow::bail!(
                "Cannot publish offset {} on participant {}: no record written",
                offset,
                self.owner.0
            );
        }

        state.store(SlotState::Ready as u8, Ordering::Release);
        Ok(())
    }

    pub fn stats(&self) -> SegmentStats {
        let mut stats = SegmentStats {
            slots: self.len(),
            ..Default::default()
        };
        for state in &self.states {
            match SlotState::from_raw(state.load(Ordering::Acquire)) {
                SlotState::Empty => stats.empty += 1,
                SlotState::Reserved => stats.reserved += 1,
                SlotState::Ready => stats.ready += 1,
            }
        }
        stats
    }

    /// Records in `Ready` slots, with their local offsets.
    pub fn ready_records(&self) -> Vec<(usize, R)> {
        let mut entries = Vec::new();
        for (offset, state) in self.states.iter().enumerate() {
            if SlotState::from_raw(state.load(Ordering::Acquire)) != SlotState::Ready {
                continue;
            }
            if let Some(record) = self.records.get(&offset) {
                entries.push((offset, record.value().clone()));
            }
        }
        entries
    }
}
