//! Fixed-width status timelines.
//!
//! A timeline always has exactly `len` slots. Real records are right-aligned
//! so the newest lands in the last slot; unfilled slots on the left are
//! "no data" sentinels.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::model::{CurrentUrlResult, History, ProbeRecord, ProbeStatus};

/// Default number of slots in a timeline.
pub const DEFAULT_TIMELINE_LEN: usize = 12;

const UNKNOWN_TIME: &str = "unknown time";

/// Status of one timeline slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    Up,
    Down,
    NoData,
}

impl From<ProbeStatus> for PointStatus {
    fn from(status: ProbeStatus) -> Self {
        match status {
            ProbeStatus::Up => PointStatus::Up,
            ProbeStatus::Down => PointStatus::Down,
            ProbeStatus::NoData => PointStatus::NoData,
        }
    }
}

/// One slot of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub status: PointStatus,
    /// Instant of the check, when known.
    pub time: Option<DateTime<Utc>>,
    /// Local display string; empty for sentinels.
    pub timestamp: String,
    /// Latency in seconds.
    pub latency: Option<f64>,
    pub error_detail: Option<String>,
}

impl TimelinePoint {
    pub fn no_data() -> Self {
        Self {
            status: PointStatus::NoData,
            time: None,
            timestamp: String::new(),
            latency: None,
            error_detail: None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.status == PointStatus::NoData
    }

    fn from_record(record: &ProbeRecord) -> Self {
        let time = record.time();
        Self {
            status: record.status.into(),
            time,
            timestamp: time.map_or_else(|| UNKNOWN_TIME.to_string(), format_display_time),
            latency: record.latency,
            error_detail: record.error_detail.clone(),
        }
    }

    fn from_live(live: &CurrentUrlResult, now: DateTime<Utc>) -> Self {
        let status = if live.is_reachable() {
            PointStatus::Up
        } else {
            PointStatus::Down
        };
        Self {
            status,
            time: Some(now),
            timestamp: format_display_time(now),
            latency: live.latency,
            error_detail: live.error_detail.clone(),
        }
    }
}

/// Format an instant for display in local time, 24h clock.
pub fn format_display_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y/%m/%d %H:%M:%S")
        .to_string()
}

/// Builds timelines of a fixed width.
///
/// `now` stamps points synthesised from live results; one builder is used
/// per load cycle so every synthesised point of the cycle shares it.
#[derive(Debug, Clone, Copy)]
pub struct TimelineBuilder {
    len: usize,
    now: DateTime<Utc>,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TIMELINE_LEN)
    }
}

impl TimelineBuilder {
    /// Create a builder for `len` slots (at least one).
    pub fn new(len: usize) -> Self {
        Self {
            len: len.max(1),
            now: Utc::now(),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Build the timeline for `url` of `site`.
    ///
    /// Only the newest `len` records are kept. `live` fills the last slot
    /// only when the URL has no history at all; it never replaces a real
    /// record.
    pub fn build(
        &self,
        history: &History,
        site: &str,
        url: Option<&str>,
        live: Option<&CurrentUrlResult>,
    ) -> Vec<TimelinePoint> {
        let mut points: Vec<TimelinePoint> = (0..self.len).map(|_| TimelinePoint::no_data()).collect();

        let records = url
            .and_then(|url| history.records(site, url))
            .unwrap_or_default();
        let kept = records.len().min(self.len);
        let newest = &records[records.len() - kept..];

        for (slot, record) in points[self.len - kept..].iter_mut().zip(newest) {
            *slot = TimelinePoint::from_record(record);
        }

        if kept == 0 {
            if let (Some(live), Some(last)) = (live, points.last_mut()) {
                *last = TimelinePoint::from_live(live, self.now);
            }
        }

        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SiteHistory;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn record(i: i64) -> ProbeRecord {
        let up = i % 3 != 0;
        ProbeRecord {
            timestamp: Some((base_time() + Duration::hours(i)).to_rfc3339()),
            status: if up { ProbeStatus::Up } else { ProbeStatus::Down },
            latency: if up { Some(0.1 * i as f64) } else { None },
            error_detail: if up { None } else { Some(format!("check {} failed", i)) },
            is_best: false,
        }
    }

    fn history_with(count: i64) -> History {
        let mut site = SiteHistory::default();
        site.insert("http://a", (0..count).map(record).collect());
        let mut history = History::new();
        history.insert("SiteA", site);
        history
    }

    fn live(latency: Option<f64>) -> CurrentUrlResult {
        CurrentUrlResult {
            url: "http://a".to_string(),
            latency,
            error_detail: if latency.is_none() { Some("timeout".to_string()) } else { None },
            error_type: None,
            has_keyword: None,
            is_best: true,
        }
    }

    #[test]
    fn test_length_is_fixed() {
        let builder = TimelineBuilder::new(DEFAULT_TIMELINE_LEN);
        for count in 0..30 {
            let history = history_with(count);
            let points = builder.build(&history, "SiteA", Some("http://a"), None);
            assert_eq!(points.len(), DEFAULT_TIMELINE_LEN, "history of {}", count);
        }
    }

    #[test]
    fn test_short_history_right_aligned() {
        let history = history_with(3);
        let points = TimelineBuilder::new(12).build(&history, "SiteA", Some("http://a"), None);

        assert!(points[..9].iter().all(|p| p.is_no_data() && p.timestamp.is_empty()));
        assert_eq!(points[9].time, Some(base_time()));
        assert_eq!(points[10].time, Some(base_time() + Duration::hours(1)));
        assert_eq!(points[11].time, Some(base_time() + Duration::hours(2)));
        assert_eq!(points[9].status, PointStatus::Down);
        assert_eq!(points[9].error_detail.as_deref(), Some("check 0 failed"));
        assert_eq!(points[10].status, PointStatus::Up);
        assert_eq!(points[10].latency, Some(0.1));
    }

    #[test]
    fn test_long_history_keeps_newest() {
        let history = history_with(20);
        let points = TimelineBuilder::new(12).build(&history, "SiteA", Some("http://a"), None);

        // 20 records, 12 slots: the first slot is the 9th oldest record
        assert_eq!(points[0].time, Some(base_time() + Duration::hours(8)));
        assert_eq!(points[11].time, Some(base_time() + Duration::hours(19)));
        assert!(points.iter().all(|p| !p.is_no_data()));
        assert!(points.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_exact_fit() {
        let history = history_with(12);
        let points = TimelineBuilder::new(12).build(&history, "SiteA", Some("http://a"), None);
        assert_eq!(points[0].time, Some(base_time()));
        assert_eq!(points[11].time, Some(base_time() + Duration::hours(11)));
    }

    #[test]
    fn test_missing_url_is_all_sentinels() {
        let history = history_with(5);
        let builder = TimelineBuilder::new(12);

        for points in [
            builder.build(&history, "SiteA", None, None),
            builder.build(&history, "SiteA", Some("http://nope"), None),
            builder.build(&history, "Nope", Some("http://a"), None),
            builder.build(&History::new(), "SiteA", Some("http://a"), None),
        ] {
            assert_eq!(points.len(), 12);
            assert!(points.iter().all(TimelinePoint::is_no_data));
        }
    }

    #[test]
    fn test_live_fills_empty_history() {
        let now = base_time() + Duration::days(3);
        let builder = TimelineBuilder::new(12).at(now);
        let history = history_with(0);

        let points = builder.build(&history, "SiteA", Some("http://a"), Some(&live(Some(0.25))));
        assert!(points[..11].iter().all(TimelinePoint::is_no_data));
        assert_eq!(points[11].status, PointStatus::Up);
        assert_eq!(points[11].time, Some(now));
        assert_eq!(points[11].latency, Some(0.25));
        assert_eq!(points[11].timestamp, format_display_time(now));
    }

    #[test]
    fn test_failed_live_fills_empty_history() {
        let builder = TimelineBuilder::new(12);
        let points = builder.build(&History::new(), "SiteA", Some("http://a"), Some(&live(None)));
        assert_eq!(points[11].status, PointStatus::Down);
        assert_eq!(points[11].latency, None);
        assert_eq!(points[11].error_detail.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_live_never_replaces_history() {
        let history = history_with(2);
        let builder = TimelineBuilder::new(12).at(base_time() + Duration::days(3));

        let points = builder.build(&history, "SiteA", Some("http://a"), Some(&live(Some(0.9))));
        assert_eq!(points[11].time, Some(base_time() + Duration::hours(1)));
        assert_eq!(points[11].latency, Some(0.1));
        assert!(points[..10].iter().all(TimelinePoint::is_no_data));
    }

    #[test]
    fn test_points_are_independent() {
        let history = history_with(2);
        let builder = TimelineBuilder::new(12);

        let mut first = builder.build(&history, "SiteA", Some("http://a"), None);
        let second = builder.build(&history, "SiteA", Some("http://a"), None);

        first[0].status = PointStatus::Up;
        first[0].timestamp = "mutated".to_string();
        first[0].latency = Some(9.9);

        assert!(first[1..10].iter().all(|p| p.is_no_data() && p.timestamp.is_empty()));
        assert!(second[0].is_no_data());
        assert_eq!(second[0].latency, None);
        assert_eq!(history.records("SiteA", "http://a").unwrap().len(), 2);
    }

    #[test]
    fn test_unparseable_timestamp_displays_unknown() {
        let mut site = SiteHistory::default();
        site.insert(
            "http://a",
            vec![ProbeRecord {
                timestamp: Some("not a time".to_string()),
                status: ProbeStatus::Up,
                latency: Some(0.2),
                error_detail: None,
                is_best: false,
            }],
        );
        let mut history = History::new();
        history.insert("SiteA", site);

        let points = TimelineBuilder::new(4).build(&history, "SiteA", Some("http://a"), None);
        assert_eq!(points[3].timestamp, UNKNOWN_TIME);
        assert_eq!(points[3].time, None);
        assert_eq!(points[3].status, PointStatus::Up);
    }

    #[test]
    fn test_zero_len_clamped() {
        let builder = TimelineBuilder::new(0);
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.build(&History::new(), "SiteA", None, None).len(), 1);
    }
}
