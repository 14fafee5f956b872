//! HTTP request handlers.

use super::AppState;
use crate::scheduler::LoadStatus;
use crate::view::Dashboard;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Serialize;

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DashboardResponse<'a> {
    pub status: &'a LoadStatus,
    /// Whether the loading indicator should be visible.
    pub loading: bool,
    pub dashboard: Option<&'a Dashboard>,
}

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.state.snapshot();
    let response = DashboardResponse {
        status: &snapshot.status,
        loading: snapshot.status.is_loading(Utc::now()),
        dashboard: snapshot.dashboard.as_deref(),
    };
    Json(response).into_response()
}

pub async fn handle_site(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let snapshot = state.state.snapshot();
    match snapshot.dashboard.as_ref().and_then(|d| d.site(&name)) {
        Some(site) => Json(site).into_response(),
        None => (StatusCode::NOT_FOUND, "Site not found").into_response(),
    }
}

// ============================================================================
// History
// ============================================================================

pub async fn handle_history(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.state.snapshot();
    Json(&*snapshot.history).into_response()
}

// ============================================================================
// Refresh
// ============================================================================

pub async fn handle_refresh(State(state): State<AppState>) -> impl IntoResponse {
    let scheduler = state.scheduler.clone();
    tokio::spawn(async move {
        scheduler.run_cycle().await;
    });
    StatusCode::ACCEPTED
}
