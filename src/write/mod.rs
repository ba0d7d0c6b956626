//! Persisting normalized tables: CSV in the download stage, parquet in the brick.

pub mod brick;
pub mod delimited;

pub use brick::{convert_dir, read_brick_rows, write_brick};
pub use delimited::{read_table, write_table};
