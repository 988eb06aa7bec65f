//! # aturno-server
//!
//! Diagnostic HTTP endpoint for the spreadsheet-backed store.
//!
//! This crate provides:
//! - `router`: the axum router with `GET`/`POST /api/test-sheets` and
//!   `GET /health`
//! - `AppState`: the spreadsheet services, or the reason they are missing
//! - `ApiErrorResponse`: the `{success:false, error, message, details?}`
//!   envelope every failure is rendered as
//! - `serve`: bind a listener and run the router until shutdown

pub mod error;
pub mod handlers;
pub mod samples;
pub mod state;

use std::future::Future;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiErrorResponse, ErrorBody};
pub use state::{AppState, Backend, Environment, Services};

pub const TEST_SHEETS_PATH: &str = "/api/test-sheets";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            TEST_SHEETS_PATH,
            get(handlers::test_connection).post(handlers::run_action),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!(%address, environment = %state.environment, "Listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
