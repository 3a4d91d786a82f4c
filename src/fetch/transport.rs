// src/fetch/transport.rs

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::FetchError;

/// What came back for a single GET.
#[derive(Debug, Clone)]
pub enum Payload {
    /// 2xx response body.
    Body(Bytes),
    /// Any non-success HTTP status.
    Status(u16),
}

/// Fetch raw bytes for a named resource. One attempt, no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Payload, FetchError>;
}

/// `reqwest`-backed transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Payload, FetchError> {
        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Ok(Payload::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await.map_err(FetchError::from_reqwest)?;
        Ok(Payload::Body(bytes))
    }
}
