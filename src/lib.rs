pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod validate;
pub mod write;

pub use config::{EdList, Settings, SourceDescriptor};
pub use error::FetchError;
pub use extract::{extract_table, Table};
