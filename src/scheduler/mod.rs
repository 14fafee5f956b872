//! Scheduler module for running load cycles.

mod state;

pub use state::*;

use crate::config::ServerConfig;
use crate::loader::Loader;
use crate::view::{Assembler, Classifier, TimelineBuilder};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Drives load cycles and publishes their results.
pub struct Scheduler {
    loader: Arc<Loader>,
    state: Arc<DashboardState>,
    classifier: Classifier,
    timeline_len: usize,
    refresh: Duration,
    stop_tx: broadcast::Sender<()>,
}

impl Scheduler {
    /// Create a new scheduler.
    pub fn new(loader: Arc<Loader>, state: Arc<DashboardState>, cfg: &ServerConfig) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            loader,
            state,
            classifier: Classifier::new(cfg.good_latency_ms),
            timeline_len: cfg.timeline_len,
            refresh: cfg.refresh,
            stop_tx,
        }
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    /// Run one load cycle to completion.
    ///
    /// Returns whether the outcome was published; a cycle overtaken by a newer
    /// one is dropped.
    pub async fn run_cycle(&self) -> bool {
        let cycle = self.state.begin_cycle();
        tracing::info!("Starting load cycle {}", cycle);

        match self.loader.load().await {
            Ok(loaded) => {
                let now = Utc::now();
                let assembler =
                    Assembler::new(self.classifier, TimelineBuilder::new(self.timeline_len).at(now));
                let dashboard = assembler.assemble_dashboard(&loaded.document, &loaded.history);

                tracing::info!(
                    "Load cycle {} complete: {} sites ({} up, {} failed) from {}",
                    cycle,
                    dashboard.summary.total_sites,
                    dashboard.summary.success_sites,
                    dashboard.summary.failed_sites,
                    loaded.source
                );

                let published = self.state.publish(cycle, loaded.history, dashboard, now);
                if !published {
                    tracing::debug!("Load cycle {} superseded, result dropped", cycle);
                }
                published
            }
            Err(e) => {
                tracing::error!("Load cycle {} failed: {}", cycle, e);
                self.state.fail(cycle, e.to_string(), Utc::now())
            }
        }
    }

    /// Start the periodic load loop. The first cycle runs immediately.
    pub fn start(self: &Arc<Self>) {
        let scheduler = self.clone();
        let mut stop_rx = self.stop_tx.subscribe();

        tracing::info!("Starting scheduler, refreshing every {:?}", self.refresh);

        tokio::spawn(async move {
            // Jitter so several dashboards started together don't hit the sources at once
            let jitter = rand::random::<u64>() % 100;
            tokio::time::sleep(Duration::from_millis(jitter)).await;

            let mut interval = tokio::time::interval(scheduler.refresh);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = interval.tick() => {
                        scheduler.run_cycle().await;
                    }
                }
            }

            tracing::info!("Scheduler stopped");
        });
    }

    /// Stop the periodic load loop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}
