//! HTTP surface.
//!
//! Thin adapter over [`Commands`]: extracts the actor and identifiers,
//! runs the command and renders the result. Request bodies never feed the
//! dispatched payload.

mod actor;
mod handlers;
mod render;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use crate::commands::Commands;

pub use render::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<Commands>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub const fn new(commands: Arc<Commands>, jwt: Arc<JwtManager>) -> Self {
        Self { commands, jwt }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v3/build/{id}/cancel", post(handlers::cancel_build))
        .route("/v3/build/{id}/restart", post(handlers::restart_build))
        .route("/v3/job/{id}/restart", post(handlers::restart_job))
        .route(
            "/v3/repo/{repository_id}/branch/{branch}/cron",
            post(handlers::create_cron),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
