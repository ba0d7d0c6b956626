use anyhow::Result;
use edlists::{fetch::build_client, pipeline, Settings};
use std::{env, path::PathBuf, process::exit};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Live-site variant: look for spreadsheet exports on edlists.org and save
/// them as `<name>.xlsx`. Falls back to writing manual instructions.
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        let prog = args.first().map(String::as_str).unwrap_or("download_xlsx");
        eprintln!("Usage: {} <OUTPUT_DIR>", prog);
        exit(1);
    }
    let out_dir = PathBuf::from(&args[1]);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    let settings = Settings::load()?.with_live_sources();
    let client = build_client(&settings)?;
    let summary = pipeline::run_spreadsheet_download(&client, &settings.sources, &out_dir).await?;

    info!(
        succeeded = summary.successes(),
        total = summary.outcomes.len(),
        "run finished"
    );
    pipeline::log_output_files(&out_dir, "xlsx")?;
    Ok(())
}
