// src/error.rs

use thiserror::Error;

/// Failure modes of a single outbound request.
///
/// Callers treat every variant as fatal for the source being fetched only;
/// the run moves on to the next source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Timeout, DNS failure, refused connection or a body that could not be read.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("invalid {name} header value '{value}'")]
    InvalidHeader {
        name: &'static str,
        value: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Status code carried by an HTTP error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
