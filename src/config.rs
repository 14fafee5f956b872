//! Configuration module for statusboard.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::view::{DEFAULT_GOOD_THRESHOLD_MS, DEFAULT_TIMELINE_LEN};

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the JSON API (default: 8080)
    pub http_port: u16,
    /// First source tried for current results
    pub primary_source: String,
    /// Source tried when the primary fails
    pub secondary_source: String,
    /// History document source
    pub history_source: String,
    /// Interval between load cycles (default: 1 hour)
    pub refresh: Duration,
    /// Per-request timeout for HTTP sources (default: 10s)
    pub fetch_timeout: Duration,
    /// Latencies below this are classified good (default: 500ms)
    pub good_latency_ms: f64,
    /// Number of slots per timeline (default: 12)
    pub timeline_len: usize,
    /// How long a failed load keeps the loading indicator up (default: 3s)
    pub error_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            primary_source: "http://127.0.0.1:5000/api/data".to_string(),
            secondary_source: "web/assets/data/test_results.json".to_string(),
            history_source: "web/assets/data/history.json".to_string(),
            refresh: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(10),
            good_latency_ms: DEFAULT_GOOD_THRESHOLD_MS,
            timeline_len: DEFAULT_TIMELINE_LEN,
            error_grace: Duration::from_millis(3000),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STATUSBOARD_HTTP_PORT`: HTTP port (default: 8080)
    /// - `STATUSBOARD_PRIMARY_SOURCE`: URL or path of the primary results source
    /// - `STATUSBOARD_SECONDARY_SOURCE`: URL or path of the fallback results source
    /// - `STATUSBOARD_HISTORY_SOURCE`: URL or path of the history document
    /// - `STATUSBOARD_REFRESH_SECS`: load-cycle interval in seconds (default: 3600)
    /// - `STATUSBOARD_FETCH_TIMEOUT_SECS`: HTTP timeout in seconds (default: 10)
    /// - `STATUSBOARD_GOOD_LATENCY_MS`: good/degraded boundary (default: 500)
    /// - `STATUSBOARD_TIMELINE_LEN`: timeline slots (default: 12)
    /// - `STATUSBOARD_ERROR_GRACE_MS`: loading-indicator grace after a failure (default: 3000)
    ///
    /// Values that fail to parse are ignored.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = parse_var(&lookup, "STATUSBOARD_HTTP_PORT") {
            cfg.http_port = port;
        }
        if let Some(source) = lookup("STATUSBOARD_PRIMARY_SOURCE") {
            cfg.primary_source = source;
        }
        if let Some(source) = lookup("STATUSBOARD_SECONDARY_SOURCE") {
            cfg.secondary_source = source;
        }
        if let Some(source) = lookup("STATUSBOARD_HISTORY_SOURCE") {
            cfg.history_source = source;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "STATUSBOARD_REFRESH_SECS").filter(|s| *s > 0) {
            cfg.refresh = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "STATUSBOARD_FETCH_TIMEOUT_SECS").filter(|s| *s > 0) {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<f64, _>(&lookup, "STATUSBOARD_GOOD_LATENCY_MS").filter(|ms| *ms > 0.0) {
            cfg.good_latency_ms = ms;
        }
        if let Some(len) = parse_var::<usize, _>(&lookup, "STATUSBOARD_TIMELINE_LEN").filter(|len| *len > 0) {
            cfg.timeline_len = len;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STATUSBOARD_ERROR_GRACE_MS") {
            cfg.error_grace = Duration::from_millis(ms);
        }

        cfg
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.refresh, Duration::from_secs(3600));
        assert_eq!(cfg.good_latency_ms, 500.0);
        assert_eq!(cfg.timeline_len, 12);
        assert_eq!(cfg.error_grace, Duration::from_millis(3000));
    }

    #[test]
    fn test_overrides() {
        let cfg = from_map(&[
            ("STATUSBOARD_HTTP_PORT", "9000"),
            ("STATUSBOARD_PRIMARY_SOURCE", "http://monitor/api/data"),
            ("STATUSBOARD_HISTORY_SOURCE", "/srv/history.json"),
            ("STATUSBOARD_REFRESH_SECS", "60"),
            ("STATUSBOARD_GOOD_LATENCY_MS", "250"),
            ("STATUSBOARD_TIMELINE_LEN", " 24 "),
        ]);
        assert_eq!(cfg.http_port, 9000);
        assert_eq!(cfg.primary_source, "http://monitor/api/data");
        assert_eq!(cfg.secondary_source, ServerConfig::default().secondary_source);
        assert_eq!(cfg.history_source, "/srv/history.json");
        assert_eq!(cfg.refresh, Duration::from_secs(60));
        assert_eq!(cfg.good_latency_ms, 250.0);
        assert_eq!(cfg.timeline_len, 24);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let cfg = from_map(&[
            ("STATUSBOARD_HTTP_PORT", "not-a-port"),
            ("STATUSBOARD_REFRESH_SECS", "0"),
            ("STATUSBOARD_TIMELINE_LEN", "0"),
            ("STATUSBOARD_GOOD_LATENCY_MS", "-5"),
        ]);
        let defaults = ServerConfig::default();
        assert_eq!(cfg.http_port, defaults.http_port);
        assert_eq!(cfg.refresh, defaults.refresh);
        assert_eq!(cfg.timeline_len, defaults.timeline_len);
        assert_eq!(cfg.good_latency_ms, defaults.good_latency_ms);
    }
}
