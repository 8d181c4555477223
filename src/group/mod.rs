//! Participant Group & Construction
//!
//! Builds a participant's view of the table collectively with every other participant.
//!
//! ## Core Mechanisms
//! - **Handles**: each participant allocates its segment and publishes a `SegmentHandle`
//!   describing it (owner, capacity, participant count, length).
//! - **Barrier**: construction returns only after every handle has been published,
//!   collected and verified by everyone. Disagreement on capacity or group size is fatal.
//! - **Transports**: `local` wires participants of one process together with direct
//!   memory access; `node` runs one participant per process over HTTP.

pub mod local;
pub mod node;
pub mod rendezvous;
pub mod types;
