//! Remote Access Layer
//!
//! One-sided slot operations addressed by *global* slot index. The partition
//! layout resolves the owner and offset, and the handle table supplies the
//! link to the owner's segment: direct memory when the segment lives in this
//! process, an HTTP client otherwise. Both paths end in the same
//! `LocalSegment` methods on the owner, so the tri-state protocol is
//! identical regardless of transport.
//!
//! Every call completes (or fails) before it returns.

use super::partitioner::PartitionLayout;
use super::protocol::*;
use super::segment::LocalSegment;
use super::types::{ClaimToken, SlotState};
use crate::group::types::{ParticipantId, SegmentHandle};

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_ATTEMPTS: usize = 3;

/// Client side of another participant's segment.
#[derive(Clone)]
pub struct HttpSegmentClient {
    owner: ParticipantId,
    addr: SocketAddr,
    http_client: reqwest::Client,
}

impl HttpSegmentClient {
    pub fn new(owner: ParticipantId, addr: SocketAddr, http_client: reqwest::Client) -> Self {
        Self {
            owner,
            addr,
            http_client,
        }
    }

    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn post_with_retry<T: Serialize>(
        &self,
        url: String,
        payload: &T,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 50u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    tracing::warn!("POST {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 25;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(800);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }

    async fn get_with_retry(&self, url: String, attempts: usize) -> Result<reqwest::Response> {
        let mut delay_ms = 50u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .get(url.clone())
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    tracing::warn!("GET {} failed (attempt {}): {}", url, attempt + 1, e);
                    let jitter = rand::random::<u64>() % 25;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(800);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "{} on participant {} failed: {}",
                what,
                self.owner.0,
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    /// Single attempt; rendezvous polls this until the peer is up.
    pub async fn fetch_handle(&self) -> Result<SegmentHandle> {
        let response = self.get_with_retry(self.url(ENDPOINT_HANDLE), 1).await?;
        let body: HandleResponse = self.decode(response, "Handle fetch").await?;
        Ok(body.handle)
    }

    pub async fn read_state(&self, offset: usize) -> Result<SlotState> {
        let url = self.url(&format!("{}/{}", ENDPOINT_STATE, offset));
        let response = self.get_with_retry(url, REQUEST_ATTEMPTS).await?;
        let body: StateResponse = self.decode(response, "State read").await?;
        Ok(body.state)
    }

    pub async fn read_record<R: DeserializeOwned>(&self, offset: usize) -> Result<Option<R>> {
        let url = self.url(&format!("{}/{}", ENDPOINT_RECORD, offset));
        let response = self.get_with_retry(url, REQUEST_ATTEMPTS).await?;
        let body: RecordResponse = self.decode(response, "Record read").await?;

        match body.record_json {
            Some(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            None => Ok(None),
        }
    }

    pub async fn write_record<R: Serialize>(&self, offset: usize, record: &R) -> Result<()> {
        let payload = WriteRecordRequest {
            offset,
            record_json: serde_json::to_string(record)?,
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_RECORD), &payload, REQUEST_ATTEMPTS)
            .await?;
        let ack: AckResponse = self.decode(response, "Record write").await?;
        if !ack.success {
            anyhow::bail!("Record write rejected by participant {}", self.owner.0);
        }
        Ok(())
    }

    pub async fn claim(&self, offset: usize, token: &ClaimToken) -> Result<bool> {
        let payload = ClaimRequest {
            offset,
            token: token.clone(),
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_CLAIM), &payload, REQUEST_ATTEMPTS)
            .await?;
        let body: ClaimResponse = self.decode(response, "Claim").await?;
        Ok(body.claimed)
    }

    pub async fn publish(&self, offset: usize, token: &ClaimToken) -> Result<()> {
        let payload = PublishRequest {
            offset,
            token: token.clone(),
        };
        let response = self
            .post_with_retry(self.url(ENDPOINT_PUBLISH), &payload, REQUEST_ATTEMPTS)
            .await?;
        let ack: AckResponse = self.decode(response, "Publish").await?;
        if !ack.success {
            anyhow::bail!("Publish rejected by participant {}", self.owner.0);
        }
        Ok(())
    }
}

/// One entry of the handle table.
pub enum SegmentLink<R> {
    Local(Arc<LocalSegment<R>>),
    Remote(HttpSegmentClient),
}

impl<R> SegmentLink<R>
where
    R: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub async fn read_state(&self, offset: usize) -> Result<SlotState> {
        match self {
            SegmentLink::Local(segment) => segment.read_state(offset),
            SegmentLink::Remote(client) => client.read_state(offset).await,
        }
    }

    pub async fn read_record(&self, offset: usize) -> Result<Option<R>> {
        match self {
            SegmentLink::Local(segment) => segment.read_record(offset),
            SegmentLink::Remote(client) => client.read_record(offset).await,
        }
    }

    pub async fn write_record(&self, offset: usize, record: R) -> Result<()> {
        match self {
            SegmentLink::Local(segment) => segment.write_record(offset, record),
            SegmentLink::Remote(client) => client.write_record(offset, &record).await,
        }
    }

    pub async fn claim(&self, offset: usize, token: &ClaimToken) -> Result<bool> {
        match self {
            SegmentLink::Local(segment) => segment.claim(offset, token),
            SegmentLink::Remote(client) => client.claim(offset, token).await,
        }
    }

    pub async fn publish(&self, offset: usize, token: &ClaimToken) -> Result<()> {
        match self {
            SegmentLink::Local(segment) => segment.publish(offset, token),
            SegmentLink::Remote(client) => client.publish(offset, token).await,
        }
    }
}

/// Layout plus handle table: everything needed to reach any global slot.
pub struct RemoteAccess<R> {
    layout: PartitionLayout,
    links: Vec<SegmentLink<R>>,
}

impl<R> RemoteAccess<R>
where
    R: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// `links[r]` must point at participant `r`'s segment.
    pub fn new(layout: PartitionLayout, links: Vec<SegmentLink<R>>) -> Self {
        debug_assert_eq!(layout.participants(), links.len());
        Self { layout, links }
    }

    pub fn layout(&self) -> &PartitionLayout {
        &self.layout
    }

    fn resolve(&self, slot: usize) -> Result<(&SegmentLink<R>, usize)> {
        if slot >= self.layout.capacity() {
            anyhow::bail!(
                "Slot {} out of range for capacity {}",
                slot,
                self.layout.capacity()
            );
        }
        let (owner, offset) = self.layout.locate(slot);
        let link = self
            .links
            .get(owner.0)
            .ok_or_else(|| anyhow::anyhow!("No handle for participant {}", owner.0))?;
        Ok((link, offset))
    }

    pub async fn read_state(&self, slot: usize) -> Result<SlotState> {
        let (link, offset) = self.resolve(slot)?;
        link.read_state(offset).await
    }

    pub async fn read_record(&self, slot: usize) -> Result<Option<R>> {
        let (link, offset) = self.resolve(slot)?;
        link.read_record(offset).await
    }

    pub async fn write_record(&self, slot: usize, record: R) -> Result<()> {
        let (link, offset) = self.resolve(slot)?;
        link.write_record(offset, record).await
    }

    pub async fn claim(&self, slot: usize, token: &ClaimToken) -> Result<bool> {
        let (link, offset) = self.resolve(slot)?;
        link.claim(offset, token).await
    }

    pub async fn publish(&self, slot: usize, token: &ClaimToken) -> Result<()> {
        let (link, offset) = self.resolve(slot)?;
        link.publish(offset, token).await
    }
}
