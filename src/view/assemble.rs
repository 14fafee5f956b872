//! Per-site view models.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

use super::resolver::find_last_successful_url;
use super::tier::{Classifier, Tier};
use super::timeline::{TimelineBuilder, TimelinePoint};
use crate::model::{CurrentUrlResult, History, ResultsDocument, SiteResult, SiteStatus};

/// Errors raised while assembling a site view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("site {site}: {reason}")]
    SiteInvariantViolation { site: String, reason: String },
}

fn violation(site: &str, reason: impl Into<String>) -> ViewError {
    ViewError::SiteInvariantViolation {
        site: site.to_string(),
        reason: reason.into(),
    }
}

/// Header of a site card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SiteHeader {
    Success {
        url: String,
        latency_ms: Option<f64>,
        tier: Tier,
        timeline: Vec<TimelinePoint>,
    },
    Failed {
        /// The URL that was last foregrounded before the outage, if any.
        last_known_url: Option<String>,
        tier: Tier,
        timeline: Vec<TimelinePoint>,
    },
}

impl SiteHeader {
    pub fn timeline(&self) -> &[TimelinePoint] {
        match self {
            SiteHeader::Success { timeline, .. } | SiteHeader::Failed { timeline, .. } => timeline,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            SiteHeader::Success { tier, .. } | SiteHeader::Failed { tier, .. } => *tier,
        }
    }
}

/// One secondary URL row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlView {
    pub url: String,
    /// Display position; the header counts as position 1.
    pub position: usize,
    pub reachable: bool,
    pub latency_ms: Option<f64>,
    pub tier: Tier,
    pub status_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_keyword: Option<bool>,
    pub timeline: Vec<TimelinePoint>,
}

/// Everything the renderer needs for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteView {
    pub name: String,
    pub header: SiteHeader,
    pub secondary: Vec<UrlView>,
}

impl SiteView {
    pub fn status(&self) -> SiteStatus {
        match self.header {
            SiteHeader::Success { .. } => SiteStatus::Success,
            SiteHeader::Failed { .. } => SiteStatus::Failed,
        }
    }
}

/// Site counts for the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_sites: usize,
    pub success_sites: usize,
    pub failed_sites: usize,
}

/// All site views of one load cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub timestamp: Option<DateTime<Utc>>,
    /// Local `HH:MM` of the document timestamp, or of assembly time.
    pub last_updated: String,
    pub summary: Summary,
    pub sites: Vec<SiteView>,
    /// Invariant violations found while assembling; those sites render as failed.
    pub violations: Vec<String>,
}

impl Dashboard {
    pub fn site(&self, name: &str) -> Option<&SiteView> {
        self.sites.iter().find(|s| s.name == name)
    }
}

/// Composes classifier, timeline builder and resolver into site views.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler {
    classifier: Classifier,
    timeline: TimelineBuilder,
}

impl Assembler {
    pub fn new(classifier: Classifier, timeline: TimelineBuilder) -> Self {
        Self {
            classifier,
            timeline,
        }
    }

    /// Build the view for one site.
    ///
    /// A successful site must declare a `best_url` that matches exactly one
    /// URL entry flagged `is_best`; otherwise this fails instead of
    /// foregrounding an arbitrary URL.
    pub fn assemble_site_view(
        &self,
        name: &str,
        site: &SiteResult,
        history: &History,
    ) -> Result<SiteView, ViewError> {
        match site.status {
            SiteStatus::Success => self.success_view(name, site, history),
            SiteStatus::Failed => Ok(self.failed_view(name, site, history)),
        }
    }

    /// Build views for every site of the document, in document order.
    ///
    /// Sites violating their invariants are logged, recorded on the
    /// dashboard and rendered through the failed path.
    pub fn assemble_dashboard(&self, document: &ResultsDocument, history: &History) -> Dashboard {
        let mut sites = Vec::with_capacity(document.sites.len());
        let mut violations = Vec::new();

        for (name, site) in &document.sites {
            match self.assemble_site_view(name, site, history) {
                Ok(view) => sites.push(view),
                Err(e) => {
                    tracing::error!("Invariant violation: {}", e);
                    violations.push(e.to_string());
                    sites.push(self.failed_view(name, site, history));
                }
            }
        }

        let success_sites = sites
            .iter()
            .filter(|s| s.status() == SiteStatus::Success)
            .count();
        let summary = Summary {
            total_sites: sites.len(),
            success_sites,
            failed_sites: sites.len() - success_sites,
        };

        let timestamp = document.time();
        let last_updated = timestamp
            .unwrap_or(self.timeline.now())
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();

        Dashboard {
            timestamp,
            last_updated,
            summary,
            sites,
            violations,
        }
    }

    fn success_view(
        &self,
        name: &str,
        site: &SiteResult,
        history: &History,
    ) -> Result<SiteView, ViewError> {
        let declared = site
            .best_url
            .as_deref()
            .ok_or_else(|| violation(name, "status is success but no best_url is declared"))?;

        let mut flagged = site.urls.iter().filter(|u| u.is_best);
        let best = flagged.next().ok_or_else(|| {
            violation(name, format!("best_url {} has no url entry flagged is_best", declared))
        })?;
        if flagged.next().is_some() {
            return Err(violation(name, "more than one url entry is flagged is_best"));
        }
        if best.url != declared {
            return Err(violation(
                name,
                format!("best_url {} does not match the is_best entry {}", declared, best.url),
            ));
        }

        let latency_ms = best.latency_ms();
        let header = SiteHeader::Success {
            url: best.url.clone(),
            latency_ms,
            tier: self.classifier.classify_opt(latency_ms),
            timeline: self.timeline.build(history, name, Some(&best.url), Some(best)),
        };

        let others = site.urls.iter().filter(|u| !u.is_best);
        Ok(SiteView {
            name: name.to_string(),
            header,
            secondary: self.secondary(name, others, history),
        })
    }

    fn failed_view(&self, name: &str, site: &SiteResult, history: &History) -> SiteView {
        let last_known = find_last_successful_url(history, name);
        let header = SiteHeader::Failed {
            last_known_url: last_known.map(str::to_string),
            tier: Tier::Down,
            timeline: self.timeline.build(history, name, last_known, None),
        };

        let others = site
            .urls
            .iter()
            .filter(|u| Some(u.url.as_str()) != last_known);
        SiteView {
            name: name.to_string(),
            header,
            secondary: self.secondary(name, others, history),
        }
    }

    fn secondary<'a>(
        &self,
        name: &str,
        urls: impl Iterator<Item = &'a CurrentUrlResult>,
        history: &History,
    ) -> Vec<UrlView> {
        let mut urls: Vec<&CurrentUrlResult> = urls.collect();

        // Reachable first, fastest first
        urls.sort_by(|a, b| {
            b.is_reachable()
                .cmp(&a.is_reachable())
                .then_with(|| match (a.latency, b.latency) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                })
        });

        urls.into_iter()
            .enumerate()
            .map(|(index, url)| self.url_view(name, url, index + 2, history))
            .collect()
    }

    fn url_view(
        &self,
        name: &str,
        url: &CurrentUrlResult,
        position: usize,
        history: &History,
    ) -> UrlView {
        let latency_ms = url.latency_ms();
        let status_text = match (latency_ms, url.error_detail.as_deref()) {
            (Some(ms), _) => format!("{:.0}ms", ms),
            (None, Some(detail)) => detail.to_string(),
            (None, None) => "failed".to_string(),
        };

        UrlView {
            url: url.url.clone(),
            position,
            reachable: url.is_reachable(),
            latency_ms,
            tier: self.classifier.classify_opt(latency_ms),
            status_text,
            error_detail: url.error_detail.clone(),
            error_type: url.error_type.clone(),
            has_keyword: url.has_keyword,
            timeline: self.timeline.build(history, name, Some(&url.url), Some(url)),
        }
    }
}
