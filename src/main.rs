use anyhow::{Context, Result};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use tripscraper::{
    config::{output_path_from_env, IngestConfig},
    pipeline,
    sink, HttpTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tripscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) read run configuration ───────────────────────────────────
    let config = IngestConfig::from_env().context("reading run configuration")?;
    let output = output_path_from_env();
    info!(
        start = %config.start_date,
        end = %config.end_date,
        variants = ?config.variants(),
        base = %config.source.base_url,
        output = %output.display(),
        "configured"
    );

    // ─── 3) fetch, reconcile, aggregate ──────────────────────────────
    let transport = HttpTransport::new(config.source.timeout())?;
    let started = Instant::now();
    let out = pipeline::run(&config, transport).await?;

    // ─── 4) replace the target table ─────────────────────────────────
    let rows = sink::write_parquet_replace(&out.table, &output)?;
    info!(
        rows,
        fetched = out.report.fetched(),
        skipped = out.report.skipped(),
        failed = out.report.failed(),
        elapsed = ?started.elapsed(),
        "all done"
    );
    Ok(())
}
