// src/pipeline.rs

use anyhow::{Context, Result};
use glob::glob;
use reqwest::Client;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{error, info, instrument, warn};

use crate::{
    config::SourceDescriptor,
    extract::extract_table,
    fetch::{
        download::{download_spreadsheet, write_download_instructions},
        fetch_html,
    },
    write::write_table,
};

/// Fallback output directory when none is given on the command line.
pub const DEFAULT_OUTPUT_DIR: &str = "download";
pub const DEFAULT_BRICK_DIR: &str = "brick";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written { path: PathBuf, rows: usize },
    /// Page fetched but no table rows found; nothing written.
    NoData,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn successes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Written { .. }))
            .count()
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.outcome)
    }
}

/// Fetch → extract → normalize → write for one source.
#[instrument(level = "info", skip(client, source, out_dir), fields(source = %source.name))]
async fn process_source(
    client: &Client,
    source: &SourceDescriptor,
    out_dir: &Path,
) -> Result<Outcome> {
    info!(url = %source.url, "fetching");
    let html = fetch_html(client, &source.url).await?;

    let table = extract_table(&html);
    if table.headers.is_empty() {
        warn!("no table found");
    }
    info!(rows = table.rows.len(), "found substances");
    if table.is_empty() {
        return Ok(Outcome::NoData);
    }

    let path = out_dir.join(format!("{}.csv", source.name));
    write_table(&path, &table)?;
    info!(path = %path.display(), "saved");
    Ok(Outcome::Written {
        path,
        rows: table.rows.len(),
    })
}

/// Run the archive-scrape download for every source, one after another.
///
/// Per-source failures are logged and recorded; only an unusable output
/// directory fails the whole run.
pub async fn run_download(
    client: &Client,
    sources: &[SourceDescriptor],
    out_dir: impl AsRef<Path>,
) -> Result<RunSummary> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut summary = RunSummary::default();
    for source in sources {
        let start = Instant::now();
        let outcome = match process_source(client, source, out_dir).await {
            Ok(Outcome::NoData) => {
                warn!(source = %source.name, "SKIPPED: no data found");
                Outcome::NoData
            }
            Ok(o) => {
                info!(source = %source.name, elapsed = ?start.elapsed(), "done");
                o
            }
            Err(e) => {
                error!(source = %source.name, error = %format!("{:#}", e), "processing failed");
                Outcome::Failed(format!("{:#}", e))
            }
        };
        summary.outcomes.push(SourceOutcome {
            name: source.name.clone(),
            outcome,
        });
    }

    if summary.successes() > 0 {
        info!(lists = summary.successes(), "download complete");
    } else {
        warn!("no data downloaded; check network connectivity");
    }
    Ok(summary)
}

/// Live-site spreadsheet download. Writes `DOWNLOAD_INSTRUCTIONS.md` when no
/// source yielded a spreadsheet.
pub async fn run_spreadsheet_download(
    client: &Client,
    sources: &[SourceDescriptor],
    out_dir: impl AsRef<Path>,
) -> Result<RunSummary> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut summary = RunSummary::default();
    for source in sources {
        let outcome = match download_spreadsheet(client, source, out_dir).await {
            Ok(Some(path)) => Outcome::Written { path, rows: 0 },
            Ok(None) => Outcome::NoData,
            Err(e) => {
                error!(
                    source = %source.name,
                    error = %format!("{:#}", e),
                    "spreadsheet download failed"
                );
                Outcome::Failed(format!("{:#}", e))
            }
        };
        summary.outcomes.push(SourceOutcome {
            name: source.name.clone(),
            outcome,
        });
    }

    if summary.successes() == 0 {
        let path = write_download_instructions(out_dir, sources).await?;
        warn!(path = %path.display(), "no spreadsheets found; wrote manual instructions");
    } else {
        info!(lists = summary.successes(), "spreadsheet download complete");
    }
    Ok(summary)
}

/// Files in `dir` with extension `ext`, with their sizes, in name order.
pub fn list_output_files(dir: impl AsRef<Path>, ext: &str) -> Result<Vec<(PathBuf, u64)>> {
    let pattern = dir.as_ref().join(format!("*.{}", ext));
    let pattern = pattern.to_string_lossy();
    let mut files = Vec::new();
    let entries =
        glob(&pattern).with_context(|| format!("Failed to read glob pattern '{}'", pattern))?;
    for entry in entries {
        let path = match entry {
            Ok(p) => p,
            Err(_) => continue,
        };
        let size = fs::metadata(&path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        files.push((path, size));
    }
    files.sort();
    Ok(files)
}

/// Log each produced file with its size.
pub fn log_output_files(dir: impl AsRef<Path>, ext: &str) -> Result<()> {
    for (path, size) in list_output_files(dir, ext)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(file = %name, bytes = size, "output");
    }
    Ok(())
}
