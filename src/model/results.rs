//! Current probe results, one document per load cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_timestamp, DocumentError};

/// Overall outcome of a site in the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Success,
    Failed,
}

/// Latest probe outcome for one URL of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUrlResult {
    pub url: String,
    /// Latency in seconds; absent when the URL was unreachable.
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_keyword: Option<bool>,
    #[serde(default)]
    pub is_best: bool,
}

impl CurrentUrlResult {
    pub fn is_reachable(&self) -> bool {
        self.latency.is_some()
    }

    pub fn latency_ms(&self) -> Option<f64> {
        self.latency.map(|secs| secs * 1000.0)
    }
}

/// Current result for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResult {
    pub status: SiteStatus,
    #[serde(default)]
    pub best_url: Option<String>,
    #[serde(default)]
    pub urls: Vec<CurrentUrlResult>,
}

impl SiteResult {
    /// Decode one site entry.
    ///
    /// An entry that does not decode is reported as failed, keeping whichever
    /// of its URL entries still decode, so one bad site never sinks the batch.
    pub fn from_value(name: &str, value: Value) -> Self {
        match serde_json::from_value::<SiteResult>(value.clone()) {
            Ok(site) => site,
            Err(e) => {
                tracing::warn!("Malformed result for site {}: {}", name, e);
                let urls = match value.get("urls") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(|item| serde_json::from_value(item.clone()).ok())
                        .collect(),
                    _ => Vec::new(),
                };
                SiteResult {
                    status: SiteStatus::Failed,
                    best_url: None,
                    urls,
                }
            }
        }
    }
}

/// The current-results document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsDocument {
    pub timestamp: Option<String>,
    /// Sites in document order.
    pub sites: Vec<(String, SiteResult)>,
}

impl ResultsDocument {
    /// Validate and decode a current-results document.
    ///
    /// The top level must be an object with a `sites` object; anything else
    /// rejects the whole document.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(mut top) = value else {
            return Err(DocumentError::NotAnObject);
        };

        let Some(Value::Object(sites)) = top.remove("sites") else {
            return Err(DocumentError::MissingSites);
        };

        let timestamp = match top.remove("timestamp") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        let sites = sites
            .into_iter()
            .map(|(name, entry)| {
                let site = SiteResult::from_value(&name, entry);
                (name, site)
            })
            .collect();

        Ok(Self { timestamp, sites })
    }

    pub fn site(&self, name: &str) -> Option<&SiteResult> {
        self.sites.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}
