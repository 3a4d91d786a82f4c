// src/config.rs
//! Run configuration. The pipeline only ever sees an [`IngestConfig`];
//! reading the process environment happens in the binary through
//! [`IngestConfig::from_env`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::warn;

use crate::window::{normalize_variants, MonthWindow};

pub const DEFAULT_VARIANT: &str = "yellow";
pub const DEFAULT_BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";
pub const DEFAULT_DATASET: &str = "tripdata";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_OUTPUT: &str = "parquet/trips.parquet";

pub const ENV_START_DATE: &str = "BRUIN_START_DATE";
pub const ENV_START_DATETIME: &str = "BRUIN_START_DATETIME";
pub const ENV_END_DATE: &str = "BRUIN_END_DATE";
pub const ENV_END_DATETIME: &str = "BRUIN_END_DATETIME";
pub const ENV_VARS: &str = "BRUIN_VARS";
pub const ENV_BASE_URL: &str = "TRIPS_BASE_URL";
pub const ENV_DATASET: &str = "TRIPS_DATASET";
pub const ENV_FORMAT: &str = "TRIPS_FORMAT";
pub const ENV_CONCURRENCY: &str = "TRIPS_CONCURRENCY";
pub const ENV_TIMEOUT_SECS: &str = "TRIPS_TIMEOUT_SECS";
pub const ENV_OUTPUT: &str = "TRIPS_OUTPUT";

/// Contract violations that abort a run before anything is fetched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be provided")]
    MissingDate { name: &'static str },

    #[error("{name} is not a valid date: {value:?}")]
    MalformedDate { name: &'static str, value: String },

    #[error("start date {start} is after end date {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },

    #[error("{name} is not a valid number: {value:?}")]
    MalformedNumber { name: &'static str, value: String },

    #[error("unknown source format {0:?} (expected parquet or csv)")]
    UnknownFormat(String),

    #[error("invalid base url {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Encoding of the remote monthly files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    #[default]
    Parquet,
    Csv,
}

impl SourceFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Parquet => "parquet",
            SourceFormat::Csv => "csv",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(SourceFormat::Parquet),
            "csv" => Ok(SourceFormat::Csv),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Where and how the monthly files are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub dataset: String,
    pub format: SourceFormat,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            format: SourceFormat::Parquet,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Everything one ingestion run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, alias = "taxi_types")]
    pub variants: Vec<String>,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl IngestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, variants: Vec<String>) -> Self {
        IngestConfig {
            start_date,
            end_date,
            variants,
            source: SourceConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Validated month window; fails if the dates are inverted.
    pub fn window(&self) -> Result<MonthWindow, ConfigError> {
        MonthWindow::new(self.start_date, self.end_date)
    }

    /// Variant list with blanks/duplicates removed and the default applied.
    pub fn variants(&self) -> Vec<String> {
        normalize_variants(&self.variants)
    }

    /// In-flight fetch limit, never zero.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Read the orchestrator's environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // the date form wins; errors name the variable actually read
        let first_set = |keys: [&'static str; 2]| {
            keys.into_iter()
                .find_map(|key| non_empty(key).map(|raw| (key, raw)))
        };

        let start_date = match first_set([ENV_START_DATE, ENV_START_DATETIME]) {
            Some((key, raw)) => parse_date(key, &raw)?,
            None => return Err(ConfigError::MissingDate { name: ENV_START_DATE }),
        };
        let end_date = match first_set([ENV_END_DATE, ENV_END_DATETIME]) {
            Some((key, raw)) => parse_date(key, &raw)?,
            None => return Err(ConfigError::MissingDate { name: ENV_END_DATE }),
        };

        let variants = non_empty(ENV_VARS)
            .map(|raw| variants_from_vars_json(&raw))
            .unwrap_or_else(|| vec![DEFAULT_VARIANT.to_string()]);

        let mut source = SourceConfig::default();
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            source.base_url = base_url;
        }
        if let Some(dataset) = non_empty(ENV_DATASET) {
            source.dataset = dataset;
        }
        if let Some(format) = non_empty(ENV_FORMAT) {
            source.format = format.parse()?;
        }
        if let Some(raw) = non_empty(ENV_TIMEOUT_SECS) {
            source.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &raw)?;
        }

        let concurrency = match non_empty(ENV_CONCURRENCY) {
            Some(raw) => parse_number(ENV_CONCURRENCY, &raw)?,
            None => DEFAULT_CONCURRENCY,
        };

        let config = IngestConfig {
            start_date,
            end_date,
            variants,
            source,
            concurrency,
        };
        config.window()?;
        Ok(config)
    }
}

/// Output path for the materialized table, from `TRIPS_OUTPUT`.
pub fn output_path_from_env() -> PathBuf {
    env::var(ENV_OUTPUT)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}

/// Parse a window bound. Accepts `YYYY-MM-DD`, RFC 3339 datetimes (converted
/// to UTC) and naive `YYYY-MM-DDTHH:MM:SS[.f]`.
pub fn parse_date(name: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    let s = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(ConfigError::MalformedDate {
        name,
        value: value.to_string(),
    })
}

fn parse_number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::MalformedNumber {
            name,
            value: value.to_string(),
        })
}

#[derive(Deserialize)]
struct PipelineVars {
    taxi_types: Option<serde_json::Value>,
}

/// Pull `taxi_types` out of the orchestrator's JSON variables.
///
/// Anything unusable (bad JSON, missing key, not an array of strings, empty
/// array) yields the single default variant.
pub fn variants_from_vars_json(raw: &str) -> Vec<String> {
    let vars: PipelineVars = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "pipeline vars are not valid JSON; using default variant");
            return vec![DEFAULT_VARIANT.to_string()];
        }
    };

    let variants: Vec<String> = match vars.taxi_types {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Some(serde_json::Value::String(single)) => vec![single],
        Some(other) => {
            warn!(value = %other, "taxi_types is not a list; using default variant");
            Vec::new()
        }
        None => Vec::new(),
    };

    normalize_variants(&variants)
}
