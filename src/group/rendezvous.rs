//! Handle exchange and construction barrier.

use super::types::{GroupConfig, ParticipantId, SegmentHandle};
use crate::storage::access::HttpSegmentClient;
use crate::storage::partitioner::PartitionLayout;
use crate::storage::segment::LocalSegment;

use anyhow::Result;
use tokio::time::Instant;

/// Checks that a full set of handles describes one consistent table.
///
/// `handles[r]` must come from participant `r`. Every participant runs this
/// on the same set and so reaches the same verdict.
pub fn verify_handles(
    handles: &[SegmentHandle],
    capacity: usize,
    participants: usize,
) -> Result<()> {
    if capacity == 0 {
        anyhow::bail!("Capacity must be greater than zero");
    }
    if participants == 0 {
        anyhow::bail!("At least one participant is required");
    }
    if handles.len() != participants {
        anyhow::bail!(
            "Expected {} handle(s), collected {}",
            participants,
            handles.len()
        );
    }

    let layout = PartitionLayout::new(capacity, participants);

    for (rank, handle) in handles.iter().enumerate() {
        if handle.owner != ParticipantId(rank) {
            anyhow::bail!(
                "Handle at position {} belongs to participant {}",
                rank,
                handle.owner.0
            );
        }
        if handle.capacity != capacity {
            anyhow::bail!(
                "Participant {} declared capacity {}, expected {}",
                rank,
                handle.capacity,
                capacity
            );
        }
        if handle.participants != participants {
            anyhow::bail!(
                "Participant {} declared {} participant(s), expected {}",
                rank,
                handle.participants,
                participants
            );
        }
        let expected_len = layout.segment_len(handle.owner);
        if handle.len != expected_len {
            anyhow::bail!(
                "Participant {} segment has {} slot(s), expected {}",
                rank,
                handle.len,
                expected_len
            );
        }
    }

    Ok(())
}

/// Exchanges handles with every peer over HTTP and waits until all of them
/// have done the same.
///
/// The local segment must already be served, since peers poll it while this
/// runs.
pub async fn exchange_handles<R: Clone>(
    local: &LocalSegment<R>,
    config: &GroupConfig,
    http_client: &reqwest::Client,
) -> Result<Vec<SegmentHandle>> {
    let deadline = Instant::now() + config.rendezvous_timeout();
    let me = config.participant;

    let mut handles = Vec::with_capacity(config.participants());
    for (rank, addr) in config.peers.iter().enumerate() {
        if rank == me.0 {
            handles.push(local.handle());
            continue;
        }
        let client = HttpSegmentClient::new(ParticipantId(rank), *addr, http_client.clone());
        handles.push(poll_handle(&client, config, deadline, false).await?);
    }

    verify_handles(&handles, config.capacity, config.participants())?;
    local.mark_barrier_cleared();
    tracing::info!(
        "Participant {} collected {} handle(s)",
        me.0,
        handles.len()
    );

    for (rank, addr) in config.peers.iter().enumerate() {
        if rank == me.0 {
            continue;
        }
        let client = HttpSegmentClient::new(ParticipantId(rank), *addr, http_client.clone());
        poll_handle(&client, config, deadline, true).await?;
    }

    tracing::info!("Participant {} cleared the construction barrier", me.0);
    Ok(handles)
}

async fn poll_handle(
    client: &HttpSegmentClient,
    config: &GroupConfig,
    deadline: Instant,
    require_ready: bool,
) -> Result<SegmentHandle> {
    loop {
        match client.fetch_handle().await {
            Ok(handle) if !require_ready || handle.ready => return Ok(handle),
            Ok(_) => {
                tracing::debug!("Participant {} not past the barrier yet", client.owner().0);
            }
            Err(e) => {
                tracing::debug!(
                    "Participant {} at {} not reachable yet: {}",
                    client.owner().0,
                    client.addr(),
                    e
                );
            }
        }

        if Instant::now() >= deadline {
            anyhow::bail!(
                "Rendezvous timed out waiting for participant {} at {}",
                client.owner().0,
                client.addr()
            );
        }
        tokio::time::sleep(config.poll_interval()).await;
    }
}
