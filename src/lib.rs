//! Presentation command distribution for unattended displays.
//!
//! The server half authenticates operators, keeps the last accepted command,
//! and fans commands out to every connected display over WebSocket. The
//! client half (`display`) turns that command stream into a deterministic
//! playback sequence with fallback and retry rules.

pub mod auth;
pub mod config;
pub mod display;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::distribution::DistributionService;

use axum::routing::{get, post};
use handlers::http;
use tower_http::cors::CorsLayer;

/// Build the API router (ws, commands, status, config, relay, login, health). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let api_routes = axum::Router::new()
        .route("/send-command", post(http::send_command))
        .route("/status", get(http::status))
        .route("/config", get(http::client_config));

    axum::Router::new()
        .route("/ws", get(handlers::ws_handler))
        .route("/login", post(auth::login))
        .route("/relay", get(handlers::relay))
        .route("/health", get(http::health))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
