//! Result loading.
//!
//! A load retrieves the history document and then the current results. History
//! failures degrade to an empty history. Current results are tried source by
//! source in priority order; the load fails only when every source has failed,
//! and the error then names each source with its cause.

mod file;
mod http;
mod source;

pub use file::*;
pub use http::*;
pub use source::*;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::model::{DocumentError, History, ResultsDocument};

/// One source's failure within a load.
#[derive(Debug)]
pub struct SourceFailure {
    /// Rank label: `primary`, `secondary`, `fallback #n`.
    pub label: String,
    pub origin: Source,
    pub error: SourceError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.origin, self.error)
    }
}

fn format_failures(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load failure.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("all result sources failed: {}", format_failures(.0))]
    AllSourcesFailed(Vec<SourceFailure>),
    #[error("invalid results document: {0}")]
    InvalidDocumentShape(#[from] DocumentError),
    #[error("no result sources configured")]
    NoSources,
    #[error("HTTP client initialization error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Output of a successful load.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub history: History,
    pub document: ResultsDocument,
    /// The source that answered.
    pub source: Source,
}

fn rank_label(rank: usize) -> String {
    match rank {
        0 => "primary".to_string(),
        1 => "secondary".to_string(),
        n => format!("fallback #{}", n - 1),
    }
}

/// Retrieves monitor documents from configured sources.
#[derive(Debug, Clone)]
pub struct Loader {
    client: reqwest::Client,
    history: Source,
    results: Vec<Source>,
}

impl Loader {
    /// Create a loader; `results` are tried in order.
    pub fn new(history: Source, results: Vec<Source>, timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            history,
            results,
        })
    }

    pub fn from_config(cfg: &ServerConfig) -> Result<Self, LoadError> {
        Self::new(
            Source::parse(&cfg.history_source),
            vec![
                Source::parse(&cfg.primary_source),
                Source::parse(&cfg.secondary_source),
            ],
            cfg.fetch_timeout,
        )
    }

    /// Retrieve the history document, degrading to an empty history.
    pub async fn load_history(&self) -> History {
        let value = match self.history.fetch(&self.client).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("History unavailable from {}: {}", self.history, e);
                return History::new();
            }
        };

        match History::from_value(value) {
            Ok(history) => {
                tracing::debug!("Loaded history for {} sites", history.site_count());
                history
            }
            Err(e) => {
                tracing::warn!("History unavailable from {}: {}", self.history, e);
                History::new()
            }
        }
    }

    /// Retrieve the current results from the first source that answers.
    pub async fn load_results(&self) -> Result<(ResultsDocument, Source), LoadError> {
        let mut failures = Vec::new();

        for (rank, source) in self.results.iter().enumerate() {
            let label = rank_label(rank);
            match source.fetch(&self.client).await {
                Ok(value) => {
                    tracing::info!("Loaded results from {} source {}", label, source);
                    let document = ResultsDocument::from_value(value)?;
                    return Ok((document, source.clone()));
                }
                Err(error) => {
                    tracing::warn!("{} source {} failed: {}", label, source, error);
                    failures.push(SourceFailure {
                        label,
                        origin: source.clone(),
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Err(LoadError::NoSources)
        } else {
            Err(LoadError::AllSourcesFailed(failures))
        }
    }

    /// Run one full load: history first, then current results.
    pub async fn load(&self) -> Result<Loaded, LoadError> {
        let history = self.load_history().await;
        let (document, source) = self.load_results().await?;
        Ok(Loaded {
            history,
            document,
            source,
        })
    }
}
