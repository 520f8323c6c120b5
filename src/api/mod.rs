//! REST API over a completed simulation run.
//!
//! Read endpoints serve the run the server was started with:
//! - `/summary` — scenario and headline figures
//! - `/monthly` — monthly records with optional index range filtering
//! - `/annual` — yearly rollups
//!
//! `POST /simulate` runs a fresh scenario posted as JSON.

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::sim::SimulationResult;

pub use types::{ErrorResponse, MonthlyQuery, SummaryResponse};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the simulation run completes and wrapped in
/// `Arc`; all data is read-only.
pub struct AppState {
    /// Scenario the run was built from.
    pub scenario: ScenarioConfig,
    /// Completed run.
    pub result: SimulationResult,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/monthly", get(handlers::get_monthly))
        .route("/annual", get(handlers::get_annual))
        .route("/simulate", post(handlers::post_simulate))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process ends.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server stops with an I/O failure.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
