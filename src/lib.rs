//! Distributed k-mer Hash Table Library
//!
//! A fixed-capacity, open-addressed hash table whose slots are sharded across the
//! participants of an assembly run. Each participant owns one contiguous segment and
//! exposes it for one-sided access by the others.
//! It serves as the foundation for the node binary (`main.rs`).
//!
//! ## Architecture Modules
//! - **`storage`**: Partition layout, local segments, the remote access layer and the
//!   per-slot claim primitive, plus the HTTP protocol and handlers that serve a segment.
//! - **`table`**: `DistributedHashTable` with linear-probing `insert` and `find`, and the
//!   `TableRecord` contract values must satisfy.
//! - **`group`**: Collective construction. Handle exchange and the construction barrier,
//!   either in-process (direct memory) or across processes (HTTP).
//! - **`kmer`**: `KmerPair`, the packed k-mer record stored by the node binary.

pub mod group;
pub mod kmer;
pub mod storage;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;
