// src/fetch/mod.rs
//! Retrieval of one monthly file per fetch unit.
//!
//! A fetch never errors past this module: every unit ends up as a
//! [`FetchOutcome`] so the caller can tell a missing month apart from a
//! broken one.

pub mod transport;
pub mod urls;

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::{ConfigError, SourceConfig};
use crate::process::{decode, RawTable};
use crate::window::FetchUnit;

pub use transport::{HttpTransport, Payload, Transport};

/// Statuses that mean "this month does not exist". CloudFront/S3 answer
/// 403 for absent keys.
const MISSING_STATUSES: &[u16] = &[403, 404, 410];

/// Unit-level failure: the unit contributes no rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("cannot build resource url: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Why a unit was skipped without being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotFound { status: u16 },
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound { status } => write!(f, "not found (status {})", status),
            SkipReason::Empty => f.write_str("empty payload"),
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(RawTable),
    Skipped(SkipReason),
    Failed(FetchError),
}

/// The outcome of one unit together with where it was fetched from.
#[derive(Debug)]
pub struct UnitFetch {
    pub unit: FetchUnit,
    pub url: String,
    pub outcome: FetchOutcome,
}

/// Fetches and decodes monthly files through a [`Transport`].
pub struct RemoteFetcher<T> {
    transport: T,
    source: SourceConfig,
    base: Url,
}

impl<T: Transport> RemoteFetcher<T> {
    pub fn new(transport: T, source: SourceConfig) -> Result<Self, ConfigError> {
        let base = urls::base_url(&source)?;
        Ok(Self {
            transport,
            source,
            base,
        })
    }

    pub fn resource_url(&self, unit: &FetchUnit) -> Result<Url, url::ParseError> {
        urls::resource_url(&self.base, &self.source, unit)
    }

    /// Fetch one unit. Emits one diagnostic per skip or failure.
    #[instrument(level = "debug", skip_all, fields(unit = %unit))]
    pub async fn fetch(&self, unit: &FetchUnit) -> UnitFetch {
        let (url, outcome) = match self.resource_url(unit) {
            Ok(url) => {
                let outcome = self.fetch_url(unit, &url).await;
                (url.to_string(), outcome)
            }
            Err(e) => (
                urls::resource_name(&self.source, unit),
                FetchOutcome::Failed(e.into()),
            ),
        };

        match &outcome {
            FetchOutcome::Fetched(raw) => {
                info!(url = %url, rows = raw.num_rows(), columns = raw.num_columns(), "fetched");
            }
            FetchOutcome::Skipped(reason) => {
                warn!(url = %url, variant = %unit.variant, reason = %reason, "skipping unit");
            }
            FetchOutcome::Failed(err) => {
                warn!(url = %url, variant = %unit.variant, error = %err, "unit failed");
            }
        }

        UnitFetch {
            unit: unit.clone(),
            url,
            outcome,
        }
    }

    async fn fetch_url(&self, unit: &FetchUnit, url: &Url) -> FetchOutcome {
        debug!(url = %url, "downloading");
        let response = match tokio::time::timeout(self.source.timeout(), self.transport.get(url)).await {
            Ok(response) => response,
            Err(_) => return FetchOutcome::Failed(FetchError::Timeout),
        };
        let bytes = match response {
            Ok(Payload::Body(bytes)) => bytes,
            Ok(Payload::Status(status)) if MISSING_STATUSES.contains(&status) => {
                return FetchOutcome::Skipped(SkipReason::NotFound { status })
            }
            Ok(Payload::Status(status)) => return FetchOutcome::Failed(FetchError::Status(status)),
            Err(e) => return FetchOutcome::Failed(e),
        };

        if bytes.is_empty() {
            return FetchOutcome::Skipped(SkipReason::Empty);
        }

        // offload the decode to the blocking pool
        let format = self.source.format;
        let size = bytes.len();
        let decoded = tokio::task::spawn_blocking(move || decode::decode_table(bytes, format)).await;

        match decoded {
            Ok(Ok(batch)) if batch.num_rows() == 0 => FetchOutcome::Skipped(SkipReason::Empty),
            Ok(Ok(batch)) => {
                debug!(url = %url, bytes = size, "decoded");
                FetchOutcome::Fetched(RawTable::new(unit.clone(), batch))
            }
            Ok(Err(e)) => FetchOutcome::Failed(FetchError::Decode(format!("{:#}", e))),
            Err(e) => FetchOutcome::Failed(FetchError::Decode(e.to_string())),
        }
    }
}
