//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::scheduler::{DashboardState, Scheduler};

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub state: Arc<DashboardState>,
    pub scheduler: Arc<Scheduler>,
}

/// JSON API server for the dashboard.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, state: Arc<DashboardState>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            state: AppState {
                config,
                state,
                scheduler,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        router(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/api/dashboard", get(handlers::handle_dashboard))
        .route("/api/sites/{name}", get(handlers::handle_site))
        .route("/api/history", get(handlers::handle_history))
        .route("/api/refresh", post(handlers::handle_refresh))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
