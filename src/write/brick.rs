// src/write/brick.rs

use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use glob::glob;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, instrument};

use super::delimited::read_table;
use crate::extract::Table;

/// Every column is nullable Utf8; empty cells become nulls so missing values
/// read as missing rather than as empty strings.
pub fn table_to_batch(table: &Table) -> Result<RecordBatch> {
    if table.headers.is_empty() {
        bail!("cannot build a record batch without columns");
    }

    let schema = Arc::new(Schema::new(
        table
            .headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<ArrayRef> = (0..table.headers.len())
        .map(|i| {
            let values: StringArray = table
                .rows
                .iter()
                .map(|row| row.get(i).map(String::as_str).filter(|s| !s.is_empty()))
                .collect();
            Arc::new(values) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(schema, columns).context("building brick record batch")
}

/// Write `table` as a Snappy-compressed parquet file, replacing any existing
/// file. Returns the number of rows written.
pub fn write_brick<P: AsRef<Path>>(path: P, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let batch = table_to_batch(table)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for brick")?;
    writer.write(&batch).context("writing brick batch")?;
    writer.close().context("closing brick writer")?;
    Ok(batch.num_rows())
}

/// Row count of a parquet file, summed over its record batches.
pub fn read_brick_rows<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?
        .build()?;
    let mut rows = 0;
    for batch in reader {
        rows += batch?.num_rows();
    }
    Ok(rows)
}

/// Convert every `*.csv` in `download_dir` into `<stem>.parquet` under
/// `brick_dir`. Returns the written paths in name order.
#[instrument(
    level = "info",
    skip_all,
    fields(
        from = %download_dir.as_ref().display(),
        to = %brick_dir.as_ref().display()
    )
)]
pub fn convert_dir<P: AsRef<Path>, Q: AsRef<Path>>(
    download_dir: P,
    brick_dir: Q,
) -> Result<Vec<PathBuf>> {
    let brick_dir = brick_dir.as_ref();
    fs::create_dir_all(brick_dir).with_context(|| format!("creating {}", brick_dir.display()))?;

    let pattern = download_dir.as_ref().join("*.csv");
    let pattern = pattern.to_string_lossy();
    let mut csv_paths: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    csv_paths.sort();

    let mut written = Vec::with_capacity(csv_paths.len());
    for csv_path in csv_paths {
        let stem = match csv_path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        let table = read_table(&csv_path)?;
        let out = brick_dir.join(format!("{}.parquet", stem));
        let rows = write_brick(&out, &table)
            .with_context(|| format!("converting {}", csv_path.display()))?;
        info!(file = %out.display(), rows, "wrote brick");
        written.push(out);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::delimited::write_table;
    use arrow::array::Array;

    fn sample() -> Table {
        Table {
            headers: vec!["name".into(), "cas_number".into()],
            rows: vec![
                vec!["Bisphenol A".into(), "80-05-7".into()],
                vec!["Dibutyl phthalate".into(), "".into()],
            ],
        }
    }

    #[test]
    fn empty_cells_become_nulls() -> Result<()> {
        let batch = table_to_batch(&sample())?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(0).null_count(), 0);
        assert_eq!(batch.column(1).null_count(), 1);
        assert_eq!(batch.schema().field(1).name(), "cas_number");
        Ok(())
    }

    #[test]
    fn table_without_headers_is_rejected() {
        assert!(table_to_batch(&Table::default()).is_err());
    }

    #[test]
    fn converts_csv_dir_preserving_row_counts() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let download = tmp.path().join("download");
        let brick = tmp.path().join("brick");
        write_table(download.join("list_i_eu_identified.csv"), &sample())?;
        write_table(
            download.join("list_iii_national_authority.csv"),
            &Table {
                headers: vec!["name".into()],
                rows: vec![],
            },
        )?;

        let written = convert_dir(&download, &brick)?;
        assert_eq!(
            written,
            vec![
                brick.join("list_i_eu_identified.parquet"),
                brick.join("list_iii_national_authority.parquet"),
            ]
        );
        assert_eq!(read_brick_rows(&written[0])?, 2);
        assert_eq!(read_brick_rows(&written[1])?, 0);
        Ok(())
    }
}
