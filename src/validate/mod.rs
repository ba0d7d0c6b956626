// src/validate/mod.rs

use anyhow::{Context, Result};
use arrow::array::Array;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;
use std::{fs, fs::File, path::Path};
use tracing::{debug, info, instrument, warn};

use crate::config::{EdList, TOTAL_MIN_ROWS};

/// Names are expected on almost every row.
pub const MAX_NAME_NULL_RATIO: f64 = 0.10;
/// Some substances (mixtures, groups) carry no CAS number.
pub const MAX_CAS_NULL_RATIO: f64 = 0.50;

/// What one brick file must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub file_name: String,
    pub min_rows: usize,
    /// Also run the column and null-ratio checks.
    pub quality: bool,
}

impl Expectation {
    pub fn new(file_name: impl Into<String>, min_rows: usize, quality: bool) -> Self {
        Self {
            file_name: file_name.into(),
            min_rows,
            quality,
        }
    }
}

/// Expectations for the three published lists. Only List I, the largest and
/// best curated, gets the quality checks.
pub fn default_expectations() -> Vec<Expectation> {
    EdList::ALL
        .iter()
        .map(|l| Expectation::new(l.parquet_file_name(), l.min_rows(), *l == EdList::I))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub nulls: usize,
}

/// Shape of a dataset read from a brick file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl DatasetProfile {
    /// First column whose name contains `needle`, case-insensitively.
    pub fn find_column(&self, needle: &str) -> Option<&ColumnProfile> {
        let needle = needle.to_lowercase();
        self.columns
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
    }

    /// Fraction of rows that are null in `column`; `None` for an empty dataset.
    pub fn null_ratio(&self, column: &ColumnProfile) -> Option<f64> {
        (self.rows > 0).then(|| column.nulls as f64 / self.rows as f64)
    }

    /// True when no cell holds a value; a dataset without rows or columns
    /// has none.
    pub fn all_null(&self) -> bool {
        self.columns.iter().all(|c| c.nulls == self.rows)
    }
}

/// Read a parquet file and count rows and per-column nulls.
pub fn profile_parquet<P: AsRef<Path>>(path: P) -> Result<DatasetProfile> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?;
    let mut columns: Vec<ColumnProfile> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| ColumnProfile {
            name: f.name().clone(),
            nulls: 0,
        })
        .collect();

    let reader = builder
        .build()
        .with_context(|| format!("building reader for {}", path.display()))?;
    let mut rows = 0;
    for batch in reader {
        let batch = batch.with_context(|| format!("decoding {}", path.display()))?;
        rows += batch.num_rows();
        for (col, arr) in columns.iter_mut().zip(batch.columns()) {
            col.nulls += arr.null_count();
        }
    }

    Ok(DatasetProfile { rows, columns })
}

/// Outcome of one independent check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: String,
    pub dataset: Option<String>,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
    pub total_rows: usize,
}

impl ValidationReport {
    fn record(&mut self, check: &str, dataset: Option<&str>, passed: bool, detail: String) {
        let ds = dataset.unwrap_or("-");
        if passed {
            debug!(check, dataset = ds, %detail, "pass");
        } else {
            warn!(check, dataset = ds, %detail, "fail");
        }
        self.checks.push(CheckResult {
            check: check.to_string(),
            dataset: dataset.map(str::to_string),
            passed,
            detail,
        });
    }

    pub fn is_success(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Look up a check by name and dataset.
    pub fn get(&self, check: &str, dataset: Option<&str>) -> Option<&CheckResult> {
        self.checks
            .iter()
            .find(|c| c.check == check && c.dataset.as_deref() == dataset)
    }
}

/// Row-count check on its own; an empty dataset is reported as too few rows.
pub fn check_min_rows(profile: &DatasetProfile, min_rows: usize) -> (bool, String) {
    if profile.rows >= min_rows {
        (true, format!("{} rows (min {})", profile.rows, min_rows))
    } else {
        (
            false,
            format!("too few rows: expected at least {}, got {}", min_rows, profile.rows),
        )
    }
}

/// Null-ratio check for the first column matching `needle`.
///
/// A missing column is not this check's failure (the column-presence check
/// reports it); an empty dataset fails because no ratio can be computed.
pub fn check_null_ratio(profile: &DatasetProfile, needle: &str, max_ratio: f64) -> (bool, String) {
    let Some(col) = profile.find_column(needle) else {
        return (true, format!("no '{}' column; skipped", needle));
    };
    match profile.null_ratio(col) {
        Some(ratio) if ratio < max_ratio => (
            true,
            format!("{}: {:.1}% missing", col.name, ratio * 100.0),
        ),
        Some(ratio) => (
            false,
            format!(
                "too many missing values in {}: {:.1}% (max {:.0}%)",
                col.name,
                ratio * 100.0,
                max_ratio * 100.0
            ),
        ),
        None => (false, format!("{}: no rows to measure", col.name)),
    }
}

fn validate_file(report: &mut ValidationReport, dir: &Path, exp: &Expectation) -> usize {
    let ds = Some(exp.file_name.as_str());
    let path = dir.join(&exp.file_name);

    match fs::metadata(&path) {
        Ok(meta) if meta.len() > 0 => {
            report.record("file_exists", ds, true, format!("{} bytes", meta.len()))
        }
        Ok(_) => report.record("file_exists", ds, false, "file has zero length".into()),
        Err(e) => report.record("file_exists", ds, false, format!("{}: {}", path.display(), e)),
    }

    let profile = match profile_parquet(&path) {
        Ok(p) => {
            report.record(
                "readable",
                ds,
                true,
                format!("{} rows, {} columns", p.rows, p.columns.len()),
            );
            p
        }
        Err(e) => {
            report.record("readable", ds, false, format!("{:#}", e));
            return 0;
        }
    };

    report.record(
        "not_empty",
        ds,
        profile.rows > 0,
        format!("{} rows", profile.rows),
    );
    report.record(
        "not_all_null",
        ds,
        !profile.all_null(),
        if profile.rows == 0 || profile.columns.is_empty() {
            "no values: dataset is empty".into()
        } else if profile.all_null() {
            "every value is null".into()
        } else {
            "has values".into()
        },
    );

    let (ok, detail) = check_min_rows(&profile, exp.min_rows);
    report.record("min_rows", ds, ok, detail);

    if exp.quality {
        let name_col = profile.find_column("name").map(|c| c.name.clone());
        report.record(
            "has_name_column",
            ds,
            name_col.is_some(),
            name_col.unwrap_or_else(|| "missing name column".into()),
        );
        let cas_col = profile.find_column("cas").map(|c| c.name.clone());
        report.record(
            "has_cas_column",
            ds,
            cas_col.is_some(),
            cas_col.unwrap_or_else(|| "missing CAS number column".into()),
        );

        let (ok, detail) = check_null_ratio(&profile, "name", MAX_NAME_NULL_RATIO);
        report.record("name_null_ratio", ds, ok, detail);
        let (ok, detail) = check_null_ratio(&profile, "cas", MAX_CAS_NULL_RATIO);
        report.record("cas_null_ratio", ds, ok, detail);
    }

    profile.rows
}

/// Run every check against the brick in `dir`. Checks are independent: a
/// failure is recorded and evaluation carries on.
#[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display()))]
pub fn validate_brick<P: AsRef<Path>>(
    dir: P,
    expectations: &[Expectation],
    total_min_rows: usize,
) -> ValidationReport {
    let dir = dir.as_ref();
    let mut report = ValidationReport::default();

    report.record(
        "brick_dir_exists",
        None,
        dir.is_dir(),
        dir.display().to_string(),
    );

    let mut total = 0;
    for exp in expectations {
        total += validate_file(&mut report, dir, exp);
    }
    report.total_rows = total;

    report.record(
        "total_rows",
        None,
        total >= total_min_rows,
        format!("{} rows across all lists (min {})", total, total_min_rows),
    );

    info!(
        checks = report.checks.len(),
        failed = report.failures().count(),
        total_rows = total,
        "validation finished"
    );
    report
}

/// [`validate_brick`] with the published thresholds.
pub fn validate_default_brick<P: AsRef<Path>>(dir: P) -> ValidationReport {
    validate_brick(dir, &default_expectations(), TOTAL_MIN_ROWS)
}
