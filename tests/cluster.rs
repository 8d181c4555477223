//! Cluster integration tests: every participant runs its own HTTP server on
//! an ephemeral port, and remote slots are reached over the network.

use kmer_dht::group::node::start_participant;
use kmer_dht::group::types::{GroupConfig, ParticipantId};
use kmer_dht::kmer::{Kmer, KmerPair};
use kmer_dht::storage::protocol::*;
use kmer_dht::storage::types::{ClaimToken, SlotState};
use kmer_dht::table::hashmap::DistributedHashTable;
use kmer_dht::table::record::TableRecord;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Record whose probe origin is chosen by the test. Keys parse from `id:hash`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct PinnedKey {
    id: u64,
    hash: u64,
}

impl FromStr for PinnedKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (id, hash) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("expected id:hash, got {}", s))?;
        Ok(Self {
            id: id.parse()?,
            hash: hash.parse()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct PinnedRecord {
    key: PinnedKey,
    payload: String,
}

impl TableRecord for PinnedRecord {
    type Key = PinnedKey;

    fn key(&self) -> &PinnedKey {
        &self.key
    }

    fn hash_key(key: &PinnedKey) -> u64 {
        key.hash
    }
}

fn pinned(id: u64, hash: u64) -> PinnedRecord {
    PinnedRecord {
        key: PinnedKey { id, hash },
        payload: format!("payload-{}", id),
    }
}

async fn start_cluster<R>(
    participants: usize,
    capacity: usize,
) -> (Vec<SocketAddr>, Vec<Arc<DistributedHashTable<R>>>)
where
    R: TableRecord,
    R::Key: FromStr,
    <R::Key as FromStr>::Err: std::fmt::Display,
{
    let mut listeners = Vec::new();
    let mut peers = Vec::new();
    for _ in 0..participants {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        peers.push(listener.local_addr().unwrap());
        listeners.push(listener);
    }

    let handles: Vec<_> = listeners
        .into_iter()
        .enumerate()
        .map(|(rank, listener)| {
            let mut config = GroupConfig::new(ParticipantId(rank), capacity, peers.clone());
            config.rendezvous_timeout_ms = 10_000;
            config.poll_interval_ms = 20;
            tokio::spawn(start_participant::<R>(listener, config))
        })
        .collect();

    let mut tables = Vec::new();
    for handle in handles {
        tables.push(handle.await.unwrap().unwrap());
    }
    (peers, tables)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_remote_write_into_other_segment() {
    let (_, tables) = start_cluster::<PinnedRecord>(2, 4).await;

    // Slot 1 belongs to participant 0; participant 1 inserts it.
    assert!(tables[1].insert(pinned(1, 1)).await.unwrap());

    assert_eq!(tables[0].local_stats().ready, 1);
    assert_eq!(tables[1].local_stats().ready, 0);
    assert_eq!(tables[0].local_records(), vec![(1, pinned(1, 1))]);
    assert_eq!(
        tables[1].find(&PinnedKey { id: 1, hash: 1 }).await.unwrap(),
        Some(pinned(1, 1))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_cluster_rejects_extra_insert() {
    let (_, tables) = start_cluster::<PinnedRecord>(3, 5).await;

    for id in 0..5 {
        assert!(tables[id as usize % 3].insert(pinned(id, 2)).await.unwrap());
    }
    assert!(!tables[0].insert(pinned(99, 2)).await.unwrap());

    for id in 0..5 {
        assert_eq!(
            tables[2].find(&PinnedKey { id, hash: 2 }).await.unwrap(),
            Some(pinned(id, 2))
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_remote_claims_have_one_winner() {
    let (_, tables) = start_cluster::<PinnedRecord>(3, 30).await;

    let writers: Vec<_> = tables
        .iter()
        .enumerate()
        .map(|(rank, table)| {
            let table = table.clone();
            tokio::spawn(async move {
                for i in 0..6u64 {
                    let id = rank as u64 * 100 + i;
                    assert!(table.insert(pinned(id, 4)).await.unwrap());
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    let access = tables[0].access();
    let mut ids = Vec::new();
    for slot in 0..30 {
        if access.read_state(slot).await.unwrap() == SlotState::Ready {
            let stored = access.read_record(slot).await.unwrap().unwrap();
            ids.push(stored.key.id);
        }
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 18);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_remote_publish_requires_claimant() {
    let (_, tables) = start_cluster::<PinnedRecord>(2, 4).await;
    let access = tables[0].access();

    // Slot 3 is owned by participant 1 and reached remotely.
    let token = ClaimToken::new();
    assert!(access.claim(3, &token).await.unwrap());
    assert!(!access.claim(3, &ClaimToken::new()).await.unwrap());
    access.write_record(3, pinned(3, 3)).await.unwrap();

    assert!(access.publish(3, &ClaimToken::new()).await.is_err());
    assert_eq!(access.read_state(3).await.unwrap(), SlotState::Reserved);

    access.publish(3, &token).await.unwrap();
    assert_eq!(access.read_state(3).await.unwrap(), SlotState::Ready);

    // A resent publish from the claimant is acknowledged again.
    access.publish(3, &token).await.unwrap();
    assert_eq!(
        tables[1].find(&PinnedKey { id: 3, hash: 3 }).await.unwrap(),
        Some(pinned(3, 3))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_public_endpoints_with_kmers() {
    let (peers, tables) = start_cluster::<KmerPair>(2, 64).await;
    let client = reqwest::Client::new();

    let kmer: Kmer = "ACGTTGCA".parse().unwrap();
    let pair = KmerPair::new(kmer, 'F', 'G');

    let response: InsertResponse = client
        .post(format!("http://{}{}", peers[0], ENDPOINT_INSERT))
        .json(&InsertRequest {
            record_json: serde_json::to_string(&pair).unwrap(),
        })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(response.inserted);

    let found = client
        .get(format!("http://{}{}/{}", peers[1], ENDPOINT_FIND, kmer))
        .send()
        .await
        .unwrap();
    assert!(found.status().is_success());
    let body: FindResponse = found.json().await.unwrap();
    let stored: KmerPair = serde_json::from_str(&body.record_json.unwrap()).unwrap();
    assert_eq!(stored, pair);
    assert!(stored.is_start());

    let missing = client
        .get(format!("http://{}{}/{}", peers[1], ENDPOINT_FIND, "TTTTTTTT"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let stats: Vec<StatsResponse> = {
        let mut stats = Vec::new();
        for peer in &peers {
            stats.push(
                client
                    .get(format!("http://{}{}", peer, ENDPOINT_STATS))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap(),
            );
        }
        stats
    };
    let ready: usize = stats.iter().map(|s| s.local.ready).sum();
    assert_eq!(ready, 1);
    assert_eq!(stats[1].participant, 1);
    assert_eq!(tables[0].capacity(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_disagreement_aborts_construction() {
    let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peers = vec![first.local_addr().unwrap(), second.local_addr().unwrap()];

    let mut config_a = GroupConfig::new(ParticipantId(0), 8, peers.clone());
    config_a.rendezvous_timeout_ms = 2_000;
    config_a.poll_interval_ms = 20;
    let mut config_b = GroupConfig::new(ParticipantId(1), 16, peers);
    config_b.rendezvous_timeout_ms = 2_000;
    config_b.poll_interval_ms = 20;

    let a = tokio::spawn(start_participant::<PinnedRecord>(first, config_a));
    let b = tokio::spawn(start_participant::<PinnedRecord>(second, config_b));

    assert!(a.await.unwrap().is_err());
    assert!(b.await.unwrap().is_err());
}
