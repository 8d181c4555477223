//! HTTP participant: one process per participant.
//!
//! The node serves its segment before rendezvous starts (peers need the
//! handle endpoint to be up), then exchanges handles and only afterwards
//! exposes the table on the public endpoints.

use super::rendezvous::exchange_handles;
use super::types::{GroupConfig, ParticipantId};
use crate::storage::access::{HttpSegmentClient, RemoteAccess, SegmentLink};
use crate::storage::handlers::*;
use crate::storage::partitioner::PartitionLayout;
use crate::storage::protocol::*;
use crate::storage::segment::LocalSegment;
use crate::table::hashmap::DistributedHashTable;
use crate::table::record::TableRecord;

use anyhow::Result;
use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tokio::net::TcpListener;

/// Routes for the segment (internal) and the table (public).
pub fn participant_router<R>(segment: Arc<LocalSegment<R>>, cell: TableCell<R>) -> Router
where
    R: TableRecord,
    R::Key: FromStr,
    <R::Key as FromStr>::Err: std::fmt::Display,
{
    Router::new()
        .route(ENDPOINT_HANDLE, get(handle_get_handle::<R>))
        .route(&format!("{}/:offset", ENDPOINT_STATE), get(handle_read_state::<R>))
        .route(&format!("{}/:offset", ENDPOINT_RECORD), get(handle_read_record::<R>))
        .route(ENDPOINT_RECORD, post(handle_write_record::<R>))
        .route(ENDPOINT_CLAIM, post(handle_claim::<R>))
        .route(ENDPOINT_PUBLISH, post(handle_publish::<R>))
        .route(ENDPOINT_INSERT, post(handle_insert::<R>))
        .route(&format!("{}/:key", ENDPOINT_FIND), get(handle_find::<R>))
        .route(ENDPOINT_STATS, get(handle_stats::<R>))
        .layer(Extension(segment))
        .layer(Extension(cell))
}

/// Collective construction over HTTP.
///
/// Allocates this participant's segment, serves it on `listener`, and
/// returns once every peer listed in `config` has exchanged handles.
pub async fn start_participant<R>(
    listener: TcpListener,
    config: GroupConfig,
) -> Result<Arc<DistributedHashTable<R>>>
where
    R: TableRecord,
    R::Key: FromStr,
    <R::Key as FromStr>::Err: std::fmt::Display,
{
    config.validate()?;

    let me = config.participant;
    let layout = PartitionLayout::new(config.capacity, config.participants());
    let segment = Arc::new(LocalSegment::new(
        me,
        layout.participants(),
        layout.capacity(),
        layout.segment_len(me),
    ));
    let cell: TableCell<R> = Arc::new(OnceLock::new());

    let app = participant_router(segment.clone(), cell.clone());
    let local_addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    });
    tracing::info!("Participant {} serving segment on {}", me.0, local_addr);

    let http_client = reqwest::Client::new();
    exchange_handles(&segment, &config, &http_client).await?;

    let links = config
        .peers
        .iter()
        .enumerate()
        .map(|(rank, addr)| {
            if rank == me.0 {
                SegmentLink::Local(segment.clone())
            } else {
                SegmentLink::Remote(HttpSegmentClient::new(
                    ParticipantId(rank),
                    *addr,
                    http_client.clone(),
                ))
            }
        })
        .collect();

    let table = Arc::new(DistributedHashTable::from_parts(
        me,
        RemoteAccess::new(layout, links),
        segment,
        config.options,
    ));
    if cell.set(table.clone()).is_err() {
        anyhow::bail!("Table for participant {} constructed twice", me.0);
    }

    Ok(table)
}
