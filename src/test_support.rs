//! Shared fixtures for unit tests: a record whose probe origin is chosen by
//! the test, and a helper that builds an in-process group.

use crate::group::local::InProcessGroup;
use crate::group::types::ParticipantId;
use crate::table::hashmap::DistributedHashTable;
use crate::table::record::TableRecord;
use crate::table::types::TableOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestKey {
    pub id: u64,
    pub hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestRecord {
    pub key: TestKey,
    pub payload: String,
}

impl TableRecord for TestRecord {
    type Key = TestKey;

    fn key(&self) -> &TestKey {
        &self.key
    }

    fn hash_key(key: &TestKey) -> u64 {
        key.hash
    }
}

pub fn key(id: u64, hash: u64) -> TestKey {
    TestKey { id, hash }
}

pub fn record(id: u64, hash: u64) -> TestRecord {
    TestRecord {
        key: key(id, hash),
        payload: format!("payload-{}", id),
    }
}

/// Joins every participant of a fresh in-process group concurrently and
/// returns the tables ordered by participant id.
pub async fn build_group(
    participants: usize,
    capacity: usize,
    options: TableOptions,
) -> Vec<Arc<DistributedHashTable<TestRecord>>> {
    let group = InProcessGroup::<TestRecord>::new(participants);

    let handles: Vec<_> = (0..participants)
        .map(|rank| {
            let group = group.clone();
            tokio::spawn(async move { group.join(ParticipantId(rank), capacity, options).await })
        })
        .collect();

    let mut tables = Vec::with_capacity(participants);
    for handle in handles {
        let table = handle.await.unwrap().unwrap();
        tables.push(Arc::new(table));
    }
    tables
}
