// src/extract/mod.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::normalize::{clean_text, default_headers, fit_row, rename_header};

static DATA_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.cols-7").expect("data table selector"));
static ANY_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static HEADER_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead th").expect("header cell selector"));
static TBODY: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").expect("tbody selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("cell selector"));

/// A normalized table: every row has exactly `headers.len()` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

fn cell_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Locate the substance table in `html` and return its normalized contents.
///
/// Prefers the `cols-7` table edlists.org renders, falling back to the first
/// table in the document. A page without any table yields an empty `Table`.
pub fn extract_table(html: &str) -> Table {
    let document = Html::parse_document(html);

    let table = match document
        .select(&DATA_TABLE)
        .next()
        .or_else(|| document.select(&ANY_TABLE).next())
    {
        Some(t) => t,
        None => {
            debug!("no table element in document");
            return Table::default();
        }
    };

    let mut headers: Vec<String> = table
        .select(&HEADER_CELL)
        .map(|th| rename_header(&cell_text(th)))
        .collect();
    if headers.is_empty() {
        debug!("no header cells; using default schema");
        headers = default_headers();
    }

    let body = table.select(&TBODY).next().unwrap_or(table);
    let width = headers.len();
    let rows: Vec<Vec<String>> = body
        .select(&ROW)
        .filter_map(|tr| {
            let cells: Vec<String> = tr.select(&CELL).map(cell_text).collect();
            if cells.is_empty() {
                return None;
            }
            let fitted = fit_row(cells, width);
            if fitted.is_none() {
                trace!("skipping blank row");
            }
            fitted
        })
        .collect();

    Table { headers, rows }
}
