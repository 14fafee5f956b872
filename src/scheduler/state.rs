//! Shared dashboard snapshot.
//!
//! Readers always see a complete snapshot: every update builds a new
//! [`Snapshot`] and swaps it in whole.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::model::History;
use crate::view::Dashboard;

/// Progress of the most recent load cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Ready {
        at: DateTime<Utc>,
    },
    Failed {
        message: String,
        since: DateTime<Utc>,
        /// The loading indicator is cleared at this instant.
        until: DateTime<Utc>,
    },
}

impl LoadStatus {
    /// Whether the loading indicator should be shown at `now`.
    pub fn is_loading(&self, now: DateTime<Utc>) -> bool {
        match self {
            LoadStatus::Loading => true,
            LoadStatus::Ready { .. } => false,
            LoadStatus::Failed { until, .. } => now < *until,
        }
    }
}

/// Everything a reader needs, captured at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Cycle that produced the history and dashboard (0 before the first).
    pub cycle: u64,
    pub history: Arc<History>,
    pub dashboard: Option<Arc<Dashboard>>,
    pub status: LoadStatus,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            cycle: 0,
            history: Arc::new(History::new()),
            dashboard: None,
            status: LoadStatus::Loading,
        }
    }
}

/// Owner of the current snapshot.
#[derive(Debug)]
pub struct DashboardState {
    current: RwLock<Arc<Snapshot>>,
    next_cycle: AtomicU64,
    error_grace: chrono::Duration,
}

impl DashboardState {
    pub fn new(error_grace: Duration) -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
            next_cycle: AtomicU64::new(1),
            error_grace: chrono::Duration::from_std(error_grace)
                .unwrap_or_else(|_| chrono::Duration::seconds(3)),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start a new cycle and return its id. Marks the dashboard as loading.
    pub fn begin_cycle(&self) -> u64 {
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst);
        self.swap(|current| {
            Some(Snapshot {
                status: LoadStatus::Loading,
                ..current.clone()
            })
        });
        cycle
    }

    /// Publish the result of a successful cycle.
    ///
    /// Returns false, leaving the snapshot untouched, when a newer cycle has
    /// already published.
    pub fn publish(&self, cycle: u64, history: History, dashboard: Dashboard, now: DateTime<Utc>) -> bool {
        let history = Arc::new(history);
        let dashboard = Arc::new(dashboard);
        self.swap(|current| {
            (cycle >= current.cycle).then(|| Snapshot {
                cycle,
                history: history.clone(),
                dashboard: Some(dashboard.clone()),
                status: LoadStatus::Ready { at: now },
            })
        })
    }

    /// Record a failed cycle. The previous dashboard and history stay in place.
    pub fn fail(&self, cycle: u64, message: String, now: DateTime<Utc>) -> bool {
        let until = now + self.error_grace;
        self.swap(|current| {
            (cycle >= current.cycle).then(|| Snapshot {
                status: LoadStatus::Failed {
                    message: message.clone(),
                    since: now,
                    until,
                },
                ..current.clone()
            })
        })
    }

    fn swap<F>(&self, update: F) -> bool
    where
        F: FnOnce(&Snapshot) -> Option<Snapshot>,
    {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match update(&**current) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        }
    }
}
