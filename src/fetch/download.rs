// src/fetch/download.rs

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

use super::{fetch_document, fetch_html, links::discover_spreadsheet_links, DocumentKind};
use crate::config::SourceDescriptor;

/// Anything at or below this size is an error page, not a list export.
pub const MIN_SPREADSHEET_BYTES: usize = 1000;

pub const INSTRUCTIONS_FILE: &str = "DOWNLOAD_INSTRUCTIONS.md";

/// Fetch the list page for `source`, try each discovered spreadsheet link and
/// save the first acceptable one as `<name>.xlsx` under `dest_dir`.
///
/// Returns `Ok(None)` when no candidate produced a usable file.
#[instrument(level = "info", skip(client, source, dest_dir), fields(source = %source.name))]
pub async fn download_spreadsheet(
    client: &Client,
    source: &SourceDescriptor,
    dest_dir: impl AsRef<Path>,
) -> Result<Option<PathBuf>> {
    let dest_dir = dest_dir.as_ref();
    let base = Url::parse(&source.url).with_context(|| format!("parsing {}", source.url))?;
    let html = fetch_html(client, &source.url).await?;

    let candidates = discover_spreadsheet_links(&html, &base);
    if candidates.is_empty() {
        warn!("no spreadsheet links on page");
        return Ok(None);
    }
    info!(count = candidates.len(), "trying spreadsheet candidates");

    for candidate in candidates {
        let doc = match fetch_document(client, candidate.as_str()).await {
            Ok(d) => d,
            Err(e) => {
                warn!(url = %candidate, error = %e, "candidate failed");
                continue;
            }
        };
        if doc.kind != DocumentKind::Spreadsheet || doc.body.len() <= MIN_SPREADSHEET_BYTES {
            warn!(
                url = %candidate,
                kind = ?doc.kind,
                bytes = doc.body.len(),
                "candidate is not a spreadsheet"
            );
            continue;
        }

        fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("creating {}", dest_dir.display()))?;
        let dest_path = dest_dir.join(format!("{}.xlsx", source.name));
        fs::write(&dest_path, &doc.body)
            .await
            .with_context(|| format!("writing {}", dest_path.display()))?;
        info!(path = %dest_path.display(), bytes = doc.body.len(), "saved spreadsheet");
        return Ok(Some(dest_path));
    }

    Ok(None)
}

/// Render manual download steps for every source.
pub fn render_instructions(sources: &[SourceDescriptor]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# EDLists manual download");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Automatic spreadsheet discovery failed (generated {}).",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out, "Download each list by hand and place it in this directory.");
    let _ = writeln!(out);
    let _ = writeln!(out, "1. Open the list page in a regular browser.");
    let _ = writeln!(out, "2. Use the page's export button to download the list as Excel.");
    let _ = writeln!(out, "3. Save the file under the expected filename below.");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Expected file | Source | Description |");
    let _ = writeln!(out, "|---------------|--------|-------------|");
    for s in sources {
        let _ = writeln!(out, "| `{}.xlsx` | <{}> | {} |", s.name, s.url, s.description);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Alternatively run the archive scraper (`edlists <dir>`), which reads the\n\
         Wayback Machine snapshots and writes CSV files instead."
    );
    out
}

/// Write `DOWNLOAD_INSTRUCTIONS.md` into `dest_dir`.
pub async fn write_download_instructions(
    dest_dir: impl AsRef<Path>,
    sources: &[SourceDescriptor],
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating {}", dest_dir.display()))?;
    let path = dest_dir.join(INSTRUCTIONS_FILE);
    fs::write(&path, render_instructions(sources))
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdList;

    #[test]
    fn instructions_list_every_expected_file() {
        let sources: Vec<_> = EdList::ALL.iter().map(|l| l.live_source()).collect();
        let text = render_instructions(&sources);
        for l in EdList::ALL {
            assert!(text.contains(&format!("`{}.xlsx`", l.name())));
            assert!(text.contains(l.live_url()));
        }
    }

    #[tokio::test]
    async fn writes_instructions_into_new_directory() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("nested").join("out");
        let path = write_download_instructions(&dir, &[EdList::III.live_source()]).await?;
        assert_eq!(path, dir.join(INSTRUCTIONS_FILE));
        let body = std::fs::read_to_string(path)?;
        assert!(body.contains("list_iii_national_authority.xlsx"));
        Ok(())
    }
}
