// src/normalize.rs

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Long-form header phrases published on edlists.org → short field names.
/// Applied in order; no phrase is a substring of another.
pub const HEADER_RENAMES: &[(&str, &str)] = &[
    ("Name and abbreviation", "name"),
    ("CAS no.", "cas_number"),
    ("EC / List no.", "ec_list_number"),
    ("Health Effects", "health_effects"),
    ("Environmental Effects", "environmental_effects"),
    ("Status", "status"),
    ("Regulatory Field", "regulatory_field"),
];

/// Column names used when a table carries no header cells.
pub const DEFAULT_HEADERS: [&str; 7] = [
    "name",
    "cas_number",
    "ec_list_number",
    "health_effects",
    "environmental_effects",
    "status",
    "regulatory_field",
];

pub fn default_headers() -> Vec<String> {
    DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect()
}

/// Collapse every whitespace run to a single space and trim.
pub fn clean_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Rename known header phrases; unknown text passes through unchanged.
///
/// A replacement can expose a new phrase ("Health EffectStatus"), so the
/// mapping is repeated until the text stops changing.
pub fn rename_header(header: &str) -> String {
    let mut current = header.to_string();
    loop {
        let next = HEADER_RENAMES
            .iter()
            .fold(current.clone(), |acc, (from, to)| acc.replace(from, to));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Pad with empty strings or truncate to `width`.
/// Returns `None` when every cell is empty.
pub fn fit_row(mut cells: Vec<String>, width: usize) -> Option<Vec<String>> {
    if cells.iter().all(|c| c.is_empty()) {
        return None;
    }
    cells.resize(width, String::new());
    Some(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_internal_whitespace() {
        assert_eq!(clean_text("  Bisphenol\n\t A  "), "Bisphenol A");
        assert_eq!(clean_text("\u{a0}80-05-7 "), "80-05-7");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn renames_every_known_phrase() {
        let got: Vec<String> = HEADER_RENAMES.iter().map(|(from, _)| rename_header(from)).collect();
        assert_eq!(got, default_headers());
    }

    #[test]
    fn unknown_headers_pass_through() {
        assert_eq!(rename_header("Date of inclusion"), "Date of inclusion");
        assert_eq!(rename_header("Status (2024)"), "status (2024)");
    }

    #[test]
    fn rename_is_idempotent() {
        for raw in [
            "Name and abbreviation",
            "CAS no.",
            "EC / List no.",
            "Health Effects",
            "Environmental Effects",
            "Status",
            "Regulatory Field",
            "Something else",
            "Health EffectStatus",
            "Environmental EffectsStatus",
        ] {
            let once = rename_header(raw);
            assert_eq!(rename_header(&once), once, "{raw}");
        }
    }

    #[test]
    fn renames_phrases_exposed_by_an_earlier_rename() {
        assert_eq!(rename_header("Health EffectStatus"), "health_effectstatus");
    }

    #[test]
    fn fit_row_pads_and_truncates() {
        let short = vec!["a".to_string()];
        assert_eq!(fit_row(short, 3).unwrap(), vec!["a", "", ""]);

        let long: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(fit_row(long, 2).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn fit_row_drops_blank_rows() {
        assert_eq!(fit_row(vec![String::new(), String::new()], 7), None);
        assert_eq!(fit_row(Vec::new(), 7), None);
    }
}
