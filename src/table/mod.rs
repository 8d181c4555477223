//! Hash Table Operations
//!
//! Insert and find as linear-probing sequences over global slot indices,
//! built on the storage layers.
//!
//! ## Protocol
//! 1. **Claim**: insert claims the first slot along its probe sequence whose state moves
//!    `Empty -> Reserved` under its token. Losers keep probing.
//! 2. **Write**: the claimant writes its record into the slot and waits for completion.
//! 3. **Publish**: only then does the claimant store `Ready`.
//!
//! Find only ever reads records from `Ready` slots, so it never observes a partial record.
//! `Reserved` slots are skipped by both operations.

pub mod hashmap;
pub mod record;
pub mod types;
