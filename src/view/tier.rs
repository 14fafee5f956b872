//! Latency classification.

use serde::Serialize;

/// Default boundary between good and degraded latency.
pub const DEFAULT_GOOD_THRESHOLD_MS: f64 = 500.0;

/// Presentation tier for a displayed latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Good,
    Degraded,
    /// No latency to show; the endpoint did not answer.
    Down,
}

/// Maps latencies onto tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    good_threshold_ms: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_GOOD_THRESHOLD_MS)
    }
}

impl Classifier {
    pub fn new(good_threshold_ms: f64) -> Self {
        Self { good_threshold_ms }
    }

    pub fn classify(&self, latency_ms: f64) -> Tier {
        if latency_ms < self.good_threshold_ms {
            Tier::Good
        } else {
            Tier::Degraded
        }
    }

    /// Classify an optional latency in milliseconds; missing means down.
    pub fn classify_opt(&self, latency_ms: Option<f64>) -> Tier {
        latency_ms.map_or(Tier::Down, |ms| self.classify(ms))
    }
}
