use anyhow::Result;
use edlists::{
    fetch::build_client,
    pipeline::{self, DEFAULT_OUTPUT_DIR},
    Settings,
};
use std::{env, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) output dir + settings ────────────────────────────────────
    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let settings = Settings::load()?;
    info!(
        out_dir = %out_dir.display(),
        sources = settings.sources.len(),
        "downloading EDLists from Wayback Machine snapshots (February 2024)"
    );

    // ─── 3) fetch, extract, write each list in turn ──────────────────
    let client = build_client(&settings)?;
    let summary = pipeline::run_download(&client, &settings.sources, &out_dir).await?;

    // ─── 4) summary + produced files ─────────────────────────────────
    info!(
        succeeded = summary.successes(),
        total = summary.outcomes.len(),
        "run finished"
    );
    if summary.successes() == 0 {
        warn!("no lists downloaded");
    }
    pipeline::log_output_files(&out_dir, "csv")?;
    Ok(())
}
