// src/test_util.rs
//! Shared fixtures for unit tests: an in-memory transport and builders for
//! trip-shaped tables.

use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, TimestampMicrosecondArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use crate::fetch::{FetchError, Payload, Transport};
use crate::process::RawTable;
use crate::window::{FetchUnit, YearMonth};

pub const TEST_BASE: &str = "http://trips.test/data";

pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tripscraper=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
enum Canned {
    Body(Bytes),
    Status(u16),
    Error(FetchError),
}

/// Transport serving canned responses keyed by file name (last path
/// segment). Unknown names answer 404.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: HashMap<String, Canned>,
    delays: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, name: &str, body: impl Into<Bytes>) -> Self {
        self.responses.insert(name.to_string(), Canned::Body(body.into()));
        self
    }

    pub fn with_status(mut self, name: &str, status: u16) -> Self {
        self.responses.insert(name.to_string(), Canned::Status(status));
        self
    }

    pub fn with_error(mut self, name: &str, err: FetchError) -> Self {
        self.responses.insert(name.to_string(), Canned::Error(err));
        self
    }

    pub fn with_delay(mut self, name: &str, millis: u64) -> Self {
        self.delays.insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    /// URLs requested so far, in request order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &Url) -> Result<Payload, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();

        if let Some(delay) = self.delays.get(&name) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(&name) {
            Some(Canned::Body(bytes)) => Ok(Payload::Body(bytes.clone())),
            Some(Canned::Status(status)) => Ok(Payload::Status(*status)),
            Some(Canned::Error(err)) => Err(err.clone()),
            None => Ok(Payload::Status(404)),
        }
    }
}

/// `rows` rows using the generic (already canonical) column names.
pub fn trip_batch(rows: usize) -> RecordBatch {
    let base = 1_709_251_200_000_000i64; // 2024-03-01T00:00:00Z
    let minute = 60_000_000i64;
    let pickups: Vec<i64> = (0..rows as i64).map(|i| base + i * 10 * minute).collect();
    let dropoffs: Vec<i64> = pickups.iter().map(|p| p + 15 * minute).collect();

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("pickup_datetime", Arc::new(TimestampMicrosecondArray::from(pickups)) as ArrayRef),
        ("dropoff_datetime", Arc::new(TimestampMicrosecondArray::from(dropoffs)) as ArrayRef),
        ("passenger_count", Arc::new(Int64Array::from_iter_values((0..rows).map(|i| 1 + i as i64 % 3))) as ArrayRef),
        ("trip_distance", Arc::new(Float64Array::from_iter_values((0..rows).map(|i| 1.2 + i as f64))) as ArrayRef),
        ("payment_type", Arc::new(Int64Array::from_iter_values((0..rows).map(|_| 1))) as ArrayRef),
        ("fare_amount", Arc::new(Float64Array::from_iter_values((0..rows).map(|i| 10.0 + i as f64))) as ArrayRef),
        ("tip_amount", Arc::new(Float64Array::from_iter_values((0..rows).map(|_| 2.0))) as ArrayRef),
        ("total_amount", Arc::new(Float64Array::from_iter_values((0..rows).map(|i| 12.0 + i as f64))) as ArrayRef),
        ("vendor_id", Arc::new(Int32Array::from_iter_values((0..rows).map(|_| 2))) as ArrayRef),
    ];
    RecordBatch::try_from_iter(columns).expect("trip batch")
}

/// Encode a batch as an in-memory parquet file.
pub fn parquet_bytes(batch: &RecordBatch) -> Bytes {
    let mut writer = ArrowWriter::try_new(Vec::new(), batch.schema(), None).expect("parquet writer");
    writer.write(batch).expect("write batch");
    Bytes::from(writer.into_inner().expect("finish parquet"))
}

/// Raw table for `variant`/2024-01 built from named columns.
pub fn raw_table(variant: &str, columns: Vec<(&str, ArrayRef)>) -> RawTable {
    let batch = RecordBatch::try_from_iter(columns).expect("raw batch");
    RawTable::new(
        FetchUnit::new(variant, YearMonth { year: 2024, month: 1 }),
        batch,
    )
}
