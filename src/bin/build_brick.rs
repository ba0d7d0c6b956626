use anyhow::Result;
use edlists::{
    pipeline::{DEFAULT_BRICK_DIR, DEFAULT_OUTPUT_DIR},
    write::{convert_dir, read_brick_rows},
};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Convert `<DOWNLOAD_DIR>/*.csv` into `<BRICK_DIR>/*.parquet`.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let download_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let brick_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BRICK_DIR));

    let written = convert_dir(&download_dir, &brick_dir)?;
    let mut total = 0;
    for path in &written {
        total += read_brick_rows(path)?;
    }
    info!(files = written.len(), rows = total, "brick built");
    Ok(())
}
