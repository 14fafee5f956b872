//! Historical check records.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::DocumentError;

/// Outcome of one recorded check.
///
/// The monitor writes `up` or `down`; `success` is accepted as a synonym for
/// `up`. Any unrecognised value counts as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ProbeStatus {
    Up,
    Down,
    NoData,
}

impl ProbeStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "up" | "success" => ProbeStatus::Up,
            "no_data" => ProbeStatus::NoData,
            _ => ProbeStatus::Down,
        }
    }
}

impl From<String> for ProbeStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// One historical measurement for a (site, URL) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub status: ProbeStatus,
    /// Latency in seconds, present only when the URL was reachable.
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default)]
    pub is_best: bool,
}

impl ProbeRecord {
    /// Parsed record time, if the timestamp is present and well-formed.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Parse an ISO timestamp.
///
/// RFC 3339 strings are taken as-is. Strings without an offset are what the
/// monitor writes by default and are read as local time.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Record sequence for one URL, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlHistory {
    pub url: String,
    pub records: Vec<ProbeRecord>,
}

/// All URL histories of one site, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteHistory {
    urls: Vec<UrlHistory>,
}

impl SiteHistory {
    /// Insert or replace the records for a URL.
    pub fn insert(&mut self, url: impl Into<String>, records: Vec<ProbeRecord>) {
        let url = url.into();
        match self.urls.iter_mut().find(|h| h.url == url) {
            Some(existing) => existing.records = records,
            None => self.urls.push(UrlHistory { url, records }),
        }
    }

    pub fn records(&self, url: &str) -> Option<&[ProbeRecord]> {
        self.urls
            .iter()
            .find(|h| h.url == url)
            .map(|h| h.records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &UrlHistory> {
        self.urls.iter()
    }
}

impl Serialize for SiteHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.urls.len()))?;
        for entry in &self.urls {
            map.serialize_entry(&entry.url, &entry.records)?;
        }
        map.end()
    }
}

/// History for every monitored site.
///
/// Rebuilt wholesale from each retrieved document; never merged into.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    sites: BTreeMap<String, SiteHistory>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn insert(&mut self, site: impl Into<String>, history: SiteHistory) {
        self.sites.insert(site.into(), history);
    }

    pub fn site(&self, site: &str) -> Option<&SiteHistory> {
        self.sites.get(site)
    }

    pub fn records(&self, site: &str, url: &str) -> Option<&[ProbeRecord]> {
        self.sites.get(site)?.records(url)
    }

    /// Build a history from the monitor's JSON document.
    ///
    /// The top level must be an object. Below that, entries of the wrong
    /// shape and records that fail to decode are skipped individually.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(sites) = value else {
            return Err(DocumentError::NotAnObject);
        };

        let mut history = History::new();
        for (site, urls) in sites {
            let Value::Object(urls) = urls else {
                tracing::debug!("Skipping history for {}: not an object", site);
                continue;
            };

            let mut site_history = SiteHistory::default();
            for (url, records) in urls {
                let Value::Array(items) = records else {
                    tracing::debug!("Skipping history for {} {}: not an array", site, url);
                    continue;
                };

                let records = items
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<ProbeRecord>(item) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            tracing::debug!("Skipping history record for {} {}: {}", site, url, e);
                            None
                        }
                    })
                    .collect();
                site_history.insert(url, records);
            }
            history.insert(site, site_history);
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(ProbeStatus::parse("up"), ProbeStatus::Up);
        assert_eq!(ProbeStatus::parse("success"), ProbeStatus::Up);
        assert_eq!(ProbeStatus::parse("down"), ProbeStatus::Down);
        assert_eq!(ProbeStatus::parse("timeout"), ProbeStatus::Down);
        assert_eq!(ProbeStatus::parse("no_data"), ProbeStatus::NoData);
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = parse_timestamp("2024-01-01T08:00:00+08:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_naive_is_local() {
        let dt = parse_timestamp("2024-01-01T12:30:00.123456").unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 1, 1, 12, 30, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(dt.timestamp(), expected.timestamp());
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_history_from_value() {
        let history = History::from_value(json!({
            "SiteA": {
                "http://a": [
                    {"timestamp": "2024-01-01T00:00:00Z", "status": "up", "latency": 0.2, "is_best": true},
                    {"timestamp": "2024-01-01T01:00:00Z", "status": "down", "latency": null, "error_detail": "HTTP 503"}
                ],
                "http://b": []
            }
        }))
        .unwrap();

        let records = history.records("SiteA", "http://a").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, ProbeStatus::Up);
        assert_eq!(records[0].latency, Some(0.2));
        assert!(records[0].is_best);
        assert_eq!(records[1].status, ProbeStatus::Down);
        assert_eq!(records[1].error_detail.as_deref(), Some("HTTP 503"));
        assert!(!records[1].is_best);
        assert_eq!(history.records("SiteA", "http://b").unwrap().len(), 0);
        assert!(history.records("SiteA", "http://c").is_none());
        assert!(history.records("SiteB", "http://a").is_none());
    }

    #[test]
    fn test_history_preserves_url_order() {
        let history = History::from_value(json!({
            "SiteA": { "http://z": [], "http://a": [], "http://m": [] }
        }))
        .unwrap();

        let urls: Vec<&str> = history
            .site("SiteA")
            .unwrap()
            .iter()
            .map(|h| h.url.as_str())
            .collect();
        assert_eq!(urls, vec!["http://z", "http://a", "http://m"]);
    }

    #[test]
    fn test_history_skips_bad_entries() {
        let history = History::from_value(json!({
            "SiteA": {
                "http://a": [
                    {"timestamp": "2024-01-01T00:00:00Z", "status": "up", "latency": 0.1},
                    "not a record",
                    {"latency": 0.3}
                ],
                "http://b": "oops"
            },
            "SiteB": 42
        }))
        .unwrap();

        assert_eq!(history.records("SiteA", "http://a").unwrap().len(), 1);
        assert!(history.records("SiteA", "http://b").is_none());
        assert!(history.site("SiteB").is_none());
        assert_eq!(history.site_count(), 1);
    }

    #[test]
    fn test_history_rejects_non_object() {
        assert_eq!(
            History::from_value(json!([1, 2, 3])),
            Err(DocumentError::NotAnObject)
        );
    }

    #[test]
    fn test_history_serializes_as_document() {
        let mut site = SiteHistory::default();
        site.insert("http://a", vec![]);
        let mut history = History::new();
        history.insert("SiteA", site);

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value, json!({"SiteA": {"http://a": []}}));
    }
}
