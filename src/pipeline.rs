// src/pipeline.rs
//! One ingestion run: plan units, fetch them with bounded concurrency, then
//! reconcile, coerce and aggregate whatever arrived.

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::fmt;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{ConfigError, IngestConfig};
use crate::fetch::{FetchOutcome, RemoteFetcher, SkipReason, Transport, UnitFetch};
use crate::process::{aggregate, coerce, reconcile, CanonicalTable};
use crate::window::{plan_fetch_units, FetchUnit};

/// Errors that abort a whole run. Unit-level problems never end up here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("assembling output table: {0}")]
    Assemble(#[from] ArrowError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitStatus {
    Fetched,
    Skipped(SkipReason),
    Failed(String),
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Fetched => f.write_str("fetched"),
            UnitStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
            UnitStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// What happened to one planned unit.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub unit: FetchUnit,
    pub url: String,
    pub status: UnitStatus,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub extracted_at: DateTime<Utc>,
    /// In plan order.
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn fetched(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Fetched))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed(_)))
    }

    pub fn total_rows(&self) -> usize {
        self.units.iter().map(|u| u.rows).sum()
    }

    fn count(&self, pred: impl Fn(&UnitStatus) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.status)).count()
    }
}

#[derive(Debug)]
pub struct IngestOutput {
    /// Always carries exactly the canonical schema.
    pub table: RecordBatch,
    pub report: RunReport,
}

/// Run the pipeline, stamping rows with the current time.
pub async fn run<T: Transport>(
    config: &IngestConfig,
    transport: T,
) -> Result<IngestOutput, IngestError> {
    run_at(config, transport, Utc::now()).await
}

/// Run the pipeline with a fixed extraction instant.
#[instrument(level = "info", skip_all, fields(start = %config.start_date, end = %config.end_date))]
pub async fn run_at<T: Transport>(
    config: &IngestConfig,
    transport: T,
    extracted_at: DateTime<Utc>,
) -> Result<IngestOutput, IngestError> {
    let window = config.window()?;
    let fetcher = RemoteFetcher::new(transport, config.source.clone())?;
    let units = plan_fetch_units(&window, &config.variants);
    info!(
        units = units.len(),
        months = window.len(),
        concurrency = config.concurrency(),
        "planned fetch units"
    );

    // `buffered` hands results back in plan order whatever order they finish in
    let fetches: Vec<UnitFetch> = stream::iter(units.iter().map(|unit| fetcher.fetch(unit)))
        .buffered(config.concurrency())
        .collect()
        .await;

    let mut tables: Vec<CanonicalTable> = Vec::new();
    let mut reports = Vec::with_capacity(fetches.len());
    for UnitFetch { unit, url, outcome } in fetches {
        let (status, rows) = match outcome {
            FetchOutcome::Fetched(raw) => {
                let table = coerce(reconcile(&raw, extracted_at));
                let rows = table.num_rows;
                tables.push(table);
                (UnitStatus::Fetched, rows)
            }
            FetchOutcome::Skipped(reason) => (UnitStatus::Skipped(reason), 0),
            FetchOutcome::Failed(err) => (UnitStatus::Failed(err.to_string()), 0),
        };
        reports.push(UnitReport {
            unit,
            url,
            status,
            rows,
        });
    }

    let table = aggregate(&tables)?;
    let report = RunReport {
        extracted_at,
        units: reports,
    };

    if report.fetched() == 0 {
        warn!(units = report.units.len(), "no unit produced data; returning empty table");
    }
    info!(
        rows = table.num_rows(),
        fetched = report.fetched(),
        skipped = report.skipped(),
        failed = report.failed(),
        "run complete"
    );

    Ok(IngestOutput { table, report })
}
