//! HTTP surface — Axum router over the ledger.
//!
//! All game endpoints live under `/betmo/` and accept both GET and POST.
//! CORS is open for browser clients.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, Reply};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/betmo/submit_guess",
            get(routes::submit_guess).post(routes::submit_guess),
        )
        .route(
            "/betmo/submit_final_score",
            get(routes::submit_final_score).post(routes::submit_final_score),
        )
        .route(
            "/betmo/get_current_guesses",
            get(routes::get_current_guesses).post(routes::get_current_guesses),
        )
        .route(
            "/betmo/get_balances",
            get(routes::get_balances).post(routes::get_balances),
        )
        .route(
            "/betmo/get_total_wins",
            get(routes::get_total_wins).post(routes::get_total_wins),
        )
        .route(
            "/betmo/transfer_balance",
            get(routes::transfer_balance).post(routes::transfer_balance),
        )
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr, "BETMO server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
