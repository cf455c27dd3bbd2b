//! HTTP presentation contract — Axum server.
//!
//! Serves the session view and the user-intent endpoints as JSON.
//! Rendering is someone else's job; this layer only carries the state
//! tuple out and the intents in. CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/session", get(routes::get_session))
        .route("/api/wager/amount", post(routes::select_amount))
        .route("/api/wager/side", post(routes::select_side))
        .route("/api/wager/submit", post(routes::submit))
        .route("/api/history", get(routes::get_history))
        .route("/api/promo/redeem", post(routes::redeem_promo))
        .route("/api/session/signout", post(routes::signout))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Run the server until a shutdown signal arrives.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Server starting on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received.");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
