//! Retrieval strategies for monitor documents.

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::file::fetch_file;
use super::http::fetch_http;

/// Why a single source failed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("read error: {0}")]
    Io(String),
    #[error("malformed JSON: {0}")]
    Malformed(String),
}

/// Where a document can be retrieved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Http(String),
    File(PathBuf),
}

impl Source {
    /// Interpret a configured source: URLs with an http(s) scheme are fetched,
    /// anything else is a filesystem path.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.starts_with("http://") || spec.starts_with("https://") {
            Source::Http(spec.to_string())
        } else {
            Source::File(PathBuf::from(spec))
        }
    }

    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Value, SourceError> {
        match self {
            Source::Http(url) => fetch_http(client, url).await,
            Source::File(path) => fetch_file(path).await,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Http(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "file: {}", path.display()),
        }
    }
}
