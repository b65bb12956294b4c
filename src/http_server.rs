//! HTTP surface for the dashboard
//!
//! - GET /                        - Dashboard page, `?row=N` selects a node
//! - GET /api/nodes               - Node table as JSON
//! - GET /api/selection?row=N     - Selection output as JSON
//! - GET /health                  - Liveness and snapshot counts

use crate::db::NodeSummary;
use crate::error::{DashboardError, Result};
use crate::presenter::{on_selection_changed, RenderOutput};
use crate::render::render_page;
use crate::snapshot::DashboardSnapshot;
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<DashboardSnapshot>,
    page_title: Arc<str>,
    start_time: Instant,
}

impl AppState {
    pub fn new(snapshot: Arc<DashboardSnapshot>, page_title: &str) -> Self {
        Self {
            snapshot,
            page_title: Arc::from(page_title),
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    row: Option<String>,
}

impl SelectionQuery {
    /// Anything that isn't a non-negative index (empty, negative, too large,
    /// not a number) selects nothing.
    fn selected_row(&self) -> Option<usize> {
        self.row.as_deref().and_then(|r| r.trim().parse().ok())
    }

    fn selected_rows(&self) -> Vec<usize> {
        self.selected_row().into_iter().collect()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    rows: usize,
    nodes: usize,
    loaded_at: String,
    uptime_secs: u64,
}

// ============================================================================
// Handlers
// ============================================================================

// GET /
async fn page_handler(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Html<String> {
    let output = on_selection_changed(&query.selected_rows(), &state.snapshot);
    // Only mark the radio when the index actually named a node
    let selected_row = match &output {
        RenderOutput::NodeSelected(_) => query.selected_row(),
        RenderOutput::NoSelection { .. } => None,
    };
    Html(render_page(&state.page_title, state.snapshot.nodes(), selected_row, &output))
}

// GET /api/nodes
async fn nodes_handler(State(state): State<AppState>) -> Json<Vec<NodeSummary>> {
    Json(state.snapshot.nodes().to_vec())
}

// GET /api/selection
async fn selection_handler(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Json<RenderOutput> {
    Json(on_selection_changed(&query.selected_rows(), &state.snapshot))
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        rows: state.snapshot.rows().len(),
        nodes: state.snapshot.nodes().len(),
        loaded_at: state.snapshot.loaded_at().to_rfc3339(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/nodes", get(nodes_handler))
        .route("/api/selection", get(selection_handler))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(page_handler))
        .route("/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| DashboardError::Bind { addr: addr.to_string(), source })?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(DashboardError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}
