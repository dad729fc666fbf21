//! Delivery transports for the analytics endpoint.
//!
//! Neither transport reads a response body. The primary transport only
//! checks that the round trip completed with a success status; the
//! fallback accepts any response at all, since all it can observe is that
//! the request was dispatched without a network error.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use std::time::Duration;

/// Which transport delivered (or tried to deliver) a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    /// One-shot GET that must complete with a success status
    Pixel,
    /// Fire-and-forget GET with an opaque outcome
    Fetch,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Pixel => f.write_str("pixel"),
            TransportKind::Fetch => f.write_str("fetch"),
        }
    }
}

/// Why a delivery attempt failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("endpoint answered with status {0}")]
    Rejected(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl From<DeliveryError> for crate::Error {
    fn from(e: DeliveryError) -> Self {
        crate::Error::Transport(e.to_string())
    }
}

/// A way of getting a URL to the endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Issue one request; `Ok` means the transport observed success
    async fn deliver(&self, url: &Url) -> Result<(), DeliveryError>;
}

/// Beacon-style GET: success only when the response completes with 2xx
pub struct PixelTransport {
    client: Client,
}

impl PixelTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for PixelTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Pixel
    }

    async fn deliver(&self, url: &Url) -> Result<(), DeliveryError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        // Body is dropped unread
        drop(response);

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(status.as_u16()))
        }
    }
}

/// Opaque GET: any response counts, only network errors fail
pub struct FetchTransport {
    client: Client,
}

impl FetchTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for FetchTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Fetch
    }

    async fn deliver(&self, url: &Url) -> Result<(), DeliveryError> {
        self.client
            .get(url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Network(e.to_string()))
    }
}

/// Run one delivery with a hard deadline; an expired deadline is a failure
pub async fn deliver_with_timeout(
    transport: &dyn Transport,
    url: &Url,
    deadline: Duration,
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(deadline, transport.deliver(url)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(deadline)),
    }
}
