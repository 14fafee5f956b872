//! statusboard - site reachability dashboard backend
//!
//! Pulls the monitor's current results and check history, reconciles them
//! into per-site view models and serves those as JSON.

mod config;
mod loader;
mod model;
mod scheduler;
mod view;
mod web;

use config::ServerConfig;
use loader::Loader;
use scheduler::{DashboardState, Scheduler};
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("statusboard=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting statusboard on port {}...", cfg.http_port);
    tracing::info!(
        "Results from {} (fallback {}), history from {}",
        cfg.primary_source,
        cfg.secondary_source,
        cfg.history_source
    );

    let loader = Arc::new(Loader::from_config(&cfg)?);
    let state = Arc::new(DashboardState::new(cfg.error_grace));

    // Start load cycles
    let scheduler = Arc::new(Scheduler::new(loader, state.clone(), &cfg));
    scheduler.start();

    // Start web server
    let server = Server::new(cfg, state, scheduler.clone());
    let result = server.start().await;
    scheduler.stop();
    result?;

    Ok(())
}
