use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use super::protocol::{
    AckResponse, ClaimRequest, ClaimResponse, FindResponse, HandleResponse, InsertRequest,
    InsertResponse, PublishRequest, RecordResponse, StateResponse, StatsResponse,
    WriteRecordRequest,
};
use super::segment::LocalSegment;
use crate::table::hashmap::DistributedHashTable;
use crate::table::record::TableRecord;

/// Filled in once rendezvous completes; public handlers answer `503` before.
pub type TableCell<R> = Arc<OnceLock<Arc<DistributedHashTable<R>>>>;

pub async fn handle_get_handle<R>(
    Extension(segment): Extension<Arc<LocalSegment<R>>>,
) -> (StatusCode, Json<HandleResponse>)
where
    R: TableRecord,
{
    (
        StatusCode::OK,
        Json(HandleResponse {
            handle: segment.handle(),
        }),
    )
}

pub async fn handle_read_state<R>(
    Extension(segment): Extension<Arc<LocalSegment<R>>>,
    Path(offset): Path<usize>,
) -> Result<Json<StateResponse>, StatusCode>
where
    R: TableRecord,
{
    match segment.read_state(offset) {
        Ok(state) => Ok(Json(StateResponse { state })),
        Err(e) => {
            tracing::error!("Failed to read state: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

pub async fn handle_read_record<R>(
    Extension(segment): Extension<Arc<LocalSegment<R>>>,
    Path(offset): Path<usize>,
) -> (StatusCode, Json<RecordResponse>)
where
    R: TableRecord,
{
    let record = match segment.read_record(offset) {
        Ok(record) => record,
        Err(e) => {
            tracing::error!("Failed to read record: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(RecordResponse { record_json: None }),
            );
        }
    };

    match record.map(|r| serde_json::to_string(&r)).transpose() {
        Ok(record_json) => (StatusCode::OK, Json(RecordResponse { record_json })),
        Err(e) => {
            tracing::error!("Failed to serialize record: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RecordResponse { record_json: None }),
            )
        }
    }
}

pub async fn handle_write_record<R>(
    Extension(segment): Extension<Arc<LocalSegment<R>>>,
    Json(req): Json<WriteRecordRequest>,
) -> (StatusCode, Json<AckResponse>)
where
    R: TableRecord,
{
    let record: R = match serde_json::from_str(&req.record_json) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to deserialize record: {}", e);
            return (StatusCode::BAD_REQUEST, Json(AckResponse { success: false }));
        }
    };

    match segment.write_record(req.offset, record) {
        Ok(()) => (StatusCode::OK, Json(AckResponse { success: true })),
        Err(e) => {
            tracing::error!("Failed to write record: {}", e);
            (StatusCode::BAD_REQUEST, Json(AckResponse { success: false }))
        }
    }
}

pub async fn handle_claim<R>(
    Extension(segment): Extension<Arc<LocalSegment<R>>>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, StatusCode>
where
    R: TableRecord,
{
    match segment.claim(req.offset, &req.token) {
        Ok(claimed) => Ok(Json(ClaimResponse { claimed })),
        Err(e) => {
            tracing::error!("Failed to claim: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

pub async fn handle_publish<R>(
    Extension(segment): Extension<Arc<LocalSegment<R>>>,
    Json(req): Json<PublishRequest>,
) -> (StatusCode, Json<AckResponse>)
where
    R: TableRecord,
{
    match segment.publish(req.offset, &req.token) {
        Ok(()) => (StatusCode::OK, Json(AckResponse { success: true })),
        Err(e) => {
            tracing::error!("Failed to publish: {}", e);
            (StatusCode::CONFLICT, Json(AckResponse { success: false }))
        }
    }
}

pub async fn handle_insert<R>(
    Extension(cell): Extension<TableCell<R>>,
    Json(req): Json<InsertRequest>,
) -> (StatusCode, Json<InsertResponse>)
where
    R: TableRecord,
{
    let Some(table) = cell.get() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(InsertResponse { inserted: false }),
        );
    };

    let record: R = match serde_json::from_str(&req.record_json) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to deserialize record: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(InsertResponse { inserted: false }),
            );
        }
    };

    match table.insert(record).await {
        Ok(inserted) => (StatusCode::OK, Json(InsertResponse { inserted })),
        Err(e) => {
            tracing::error!("Failed to insert: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InsertResponse { inserted: false }),
            )
        }
    }
}

pub async fn handle_find<R>(
    Extension(cell): Extension<TableCell<R>>,
    Path(key_str): Path<String>,
) -> (StatusCode, Json<FindResponse>)
where
    R: TableRecord,
    R::Key: FromStr,
    <R::Key as FromStr>::Err: std::fmt::Display,
{
    let Some(table) = cell.get() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(FindResponse { record_json: None }),
        );
    };

    let key: R::Key = match key_str.parse() {
        Ok(k) => k,
        Err(e) => {
            tracing::error!("Failed to parse key: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(FindResponse { record_json: None }),
            );
        }
    };

    match table.find(&key).await {
        Ok(Some(record)) => match serde_json::to_string(&record) {
            Ok(record_json) => (
                StatusCode::OK,
                Json(FindResponse {
                    record_json: Some(record_json),
                }),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FindResponse { record_json: None }),
            ),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(FindResponse { record_json: None }),
        ),
        Err(e) => {
            tracing::error!("Failed to find: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FindResponse { record_json: None }),
            )
        }
    }
}

pub async fn handle_stats<R>(
    Extension(cell): Extension<TableCell<R>>,
) -> Result<Json<StatsResponse>, StatusCode>
where
    R: TableRecord,
{
    let table = cell.get().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(StatsResponse {
        participant: table.participant().0,
        capacity: table.capacity(),
        local: table.local_stats(),
    }))
}
