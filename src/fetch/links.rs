// src/fetch/links.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::trace;
use url::Url;

static XLSX_ANCHOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href$=".xlsx"], a[href$=".XLSX"]"#).expect("xlsx anchor selector")
});
static EXPORT_ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="export"]"#).expect("export anchor selector"));
static DATA_HREF: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-href]").expect("data-href selector"));
static XLSX_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^"'\s<>]+\.xlsx"#).expect("xlsx url regex"));

/// Best-effort discovery of spreadsheet download links on a list page.
///
/// Candidates are returned in the order they should be tried: explicit `.xlsx`
/// anchors, export anchors, `data-href` attributes, then absolute `.xlsx` URLs
/// found anywhere in the raw markup (scripts included). Duplicates are removed.
/// Nothing here guarantees the link serves a spreadsheet; the caller checks the
/// downloaded bytes.
pub fn discover_spreadsheet_links(html: &str, base: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);

    let mut raw: Vec<String> = Vec::new();
    for sel in [&*XLSX_ANCHOR, &*EXPORT_ANCHOR] {
        raw.extend(
            doc.select(sel)
                .filter_map(|e| e.value().attr("href"))
                .map(str::to_string),
        );
    }
    raw.extend(
        doc.select(&DATA_HREF)
            .filter_map(|e| e.value().attr("data-href"))
            .map(str::to_string),
    );
    raw.extend(XLSX_URL.find_iter(html).map(|m| m.as_str().to_string()));

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .filter(|u| seen.insert(u.to_string()))
        .inspect(|u| trace!(url = %u, "spreadsheet candidate"))
        .collect()
}
