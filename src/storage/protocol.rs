//! Segment Network Protocol
//!
//! Endpoints and DTOs used when one participant accesses a slot owned by
//! another. Every request addresses a *local offset* in the owner's segment;
//! the issuer resolves global slots to offsets with the shared partition
//! layout before sending anything.
//!
//! Records travel as JSON strings so the handlers stay generic over the
//! record type.

use super::types::{ClaimToken, SegmentStats, SlotState};
use crate::group::types::SegmentHandle;
use serde::{Deserialize, Serialize};

// --- Internal endpoints (participant to participant) ---

/// Segment descriptor, polled during rendezvous.
pub const ENDPOINT_HANDLE: &str = "/internal/segment/handle";
/// `GET {ENDPOINT_STATE}/:offset`
pub const ENDPOINT_STATE: &str = "/internal/segment/state";
/// `GET {ENDPOINT_RECORD}/:offset` reads, `POST {ENDPOINT_RECORD}` writes.
pub const ENDPOINT_RECORD: &str = "/internal/segment/record";
pub const ENDPOINT_CLAIM: &str = "/internal/segment/claim";
pub const ENDPOINT_PUBLISH: &str = "/internal/segment/publish";

// --- Public endpoints (clients) ---

pub const ENDPOINT_INSERT: &str = "/insert";
/// `GET {ENDPOINT_FIND}/:key`
pub const ENDPOINT_FIND: &str = "/find";
pub const ENDPOINT_STATS: &str = "/stats";

#[derive(Debug, Serialize, Deserialize)]
pub struct HandleResponse {
    pub handle: SegmentHandle,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: SlotState,
}

/// `record_json` is `None` when nothing was ever written to the slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    pub record_json: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteRecordRequest {
    pub offset: usize,
    pub record_json: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub offset: usize,
    pub token: ClaimToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub claimed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub offset: usize,
    pub token: ClaimToken,
}

/// Acknowledgment for writes and publishes.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertRequest {
    pub record_json: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertResponse {
    /// `false` when the probe sequence found no free slot.
    pub inserted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindResponse {
    pub record_json: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub participant: usize,
    pub capacity: usize,
    pub local: SegmentStats,
}
