// src/fetch/mod.rs

use encoding_rs::{Encoding, UTF_8};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client,
};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Settings;
use crate::error::FetchError;

pub mod download;
pub mod links;

/// First bytes of every xlsx (zip container) file.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Spreadsheet,
    Other,
}

impl DocumentKind {
    /// Classify from the `Content-Type` header, falling back to magic bytes.
    pub fn detect(content_type: Option<&str>, body: &[u8]) -> Self {
        let ct = content_type.unwrap_or_default().to_ascii_lowercase();
        if ct.contains("html") {
            DocumentKind::Html
        } else if ct.contains("spreadsheet")
            || ct.contains("excel")
            || body.starts_with(ZIP_MAGIC)
        {
            DocumentKind::Spreadsheet
        } else {
            DocumentKind::Other
        }
    }
}

/// A fetched response body, consumed immediately by the extractor or the
/// spreadsheet writer.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub status: u16,
    pub kind: DocumentKind,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawDocument {
    /// Body decoded with the `charset` from `Content-Type`, UTF-8 otherwise.
    /// A byte-order mark wins over the declared charset.
    pub fn text(&self) -> String {
        let encoding = self
            .content_type
            .as_deref()
            .and_then(charset_label)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, malformed) = encoding.decode(&self.body);
        if malformed {
            debug!(url = %self.url, encoding = encoding.name(), "replaced malformed bytes");
        }
        text.into_owned()
    }
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Client with the browser-like headers and per-call timeout from `settings`.
pub fn build_client(settings: &Settings) -> Result<Client, FetchError> {
    let accept =
        HeaderValue::from_str(&settings.accept).map_err(|source| FetchError::InvalidHeader {
            name: "accept",
            value: settings.accept.clone(),
            source,
        })?;
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, accept);
    Client::builder()
        .user_agent(settings.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(FetchError::Client)
}

/// Single GET, no retries. Non-2xx responses become `FetchError::Http`.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_document(client: &Client, url: &str) -> Result<RawDocument, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let resp = client
        .get(parsed)
        .send()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .bytes()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?
        .to_vec();

    let kind = DocumentKind::detect(content_type.as_deref(), &body);
    debug!(status = status.as_u16(), ?kind, bytes = body.len(), "fetched");

    Ok(RawDocument {
        url: url.to_string(),
        status: status.as_u16(),
        kind,
        content_type,
        body,
    })
}

/// Fetch a page and decode its body as text.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, FetchError> {
    Ok(fetch_document(client, url).await?.text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kind_from_content_type() {
        assert_eq!(
            DocumentKind::detect(Some("text/html; charset=utf-8"), b"<html>"),
            DocumentKind::Html
        );
        assert_eq!(
            DocumentKind::detect(
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                b""
            ),
            DocumentKind::Spreadsheet
        );
        assert_eq!(
            DocumentKind::detect(Some("application/octet-stream"), b"PK\x03\x04rest"),
            DocumentKind::Spreadsheet
        );
        assert_eq!(DocumentKind::detect(None, b"plain"), DocumentKind::Other);
    }

    fn doc(content_type: Option<&str>, body: &[u8]) -> RawDocument {
        RawDocument {
            url: "http://localhost/list".into(),
            status: 200,
            kind: DocumentKind::Html,
            content_type: content_type.map(str::to_string),
            body: body.to_vec(),
        }
    }

    #[test]
    fn text_honours_declared_charset() {
        let latin1 = doc(Some("text/html; charset=ISO-8859-1"), b"Caf\xE9ine");
        assert_eq!(latin1.text(), "Caf\u{e9}ine");

        let quoted = doc(Some("text/html; Charset=\"windows-1252\""), b"\x93PFOA\x94");
        assert_eq!(quoted.text(), "\u{201c}PFOA\u{201d}");
    }

    #[test]
    fn text_defaults_to_utf8() {
        let utf8 = doc(None, "Dibutyl phthalate \u{e9}".as_bytes());
        assert_eq!(utf8.text(), "Dibutyl phthalate \u{e9}");
        assert_eq!(doc(Some("text/html; charset=bogus"), b"plain").text(), "plain");
        assert_eq!(doc(Some("text/html"), b"\xff").text(), "\u{fffd}");
    }

    #[test]
    fn builds_client_from_default_settings() {
        assert!(build_client(&Settings::default()).is_ok());
    }

    #[test]
    fn invalid_accept_header_is_an_error() {
        let settings = Settings {
            accept: "text/html\nbad".into(),
            ..Settings::default()
        };
        let err = build_client(&settings).unwrap_err();
        assert!(matches!(err, FetchError::InvalidHeader { name: "accept", .. }), "{err}");
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_sending() {
        let client = Client::new();
        let err = fetch_document(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
