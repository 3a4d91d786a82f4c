pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod sink;
pub mod window;

#[cfg(test)]
mod test_util;

pub use config::{ConfigError, IngestConfig, SourceConfig, SourceFormat};
pub use fetch::{FetchError, FetchOutcome, HttpTransport, RemoteFetcher, SkipReason, Transport};
pub use pipeline::{run, run_at, IngestError, IngestOutput, RunReport, UnitReport, UnitStatus};
pub use window::{plan_fetch_units, FetchUnit, MonthWindow, YearMonth};
