//! Distributed Slot Storage
//!
//! The three layers underneath the hash table operations.
//!
//! ## Core Concepts
//! - **Partitioning**: `PartitionLayout` maps a global slot to its owner and local offset,
//!   computed identically by every participant from capacity and participant count.
//! - **Segments**: each participant owns a `LocalSegment` of slot states and records.
//! - **Access**: `RemoteAccess` reaches any slot, local or remote, through the handle table.
//! - **Arbitration**: claims run as an atomic compare-and-swap on the owner's segment,
//!   whether issued locally or received through the owner's handlers.

pub mod access;
pub mod handlers;
pub mod partitioner;
pub mod protocol;
pub mod segment;
pub mod types;
