//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use buildgate_core::CommandError;
use serde_json::{Value, json};
use tracing::debug;

use super::render::{self, ApiError};
use super::AppState;
use crate::auth::Actor;
use crate::commands::CronParams;

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `POST /v3/build/{id}/cancel`
pub async fn cancel_build(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.commands.cancel_build(&actor, Some(&id)).await?;
    Ok((StatusCode::ACCEPTED, Json(render::pending(&receipt))))
}

/// `POST /v3/build/{id}/restart`
pub async fn restart_build(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.commands.restart_build(&actor, Some(&id)).await?;
    Ok((StatusCode::ACCEPTED, Json(render::pending(&receipt))))
}

/// `POST /v3/job/{id}/restart`
pub async fn restart_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.commands.restart_job(&actor, Some(&id)).await?;
    Ok((StatusCode::ACCEPTED, Json(render::pending(&receipt))))
}

/// `POST /v3/repo/{repository_id}/branch/{branch}/cron`
///
/// The body is optional. An empty body carries no parameters and fails
/// interval validation; a body that is not valid cron JSON is `wrong_params`.
pub async fn create_cron(
    State(state): State<AppState>,
    Path((repository_id, branch)): Path<(String, String)>,
    actor: Actor,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let params: CronParams = if body.is_empty() {
        CronParams::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            debug!(error = %e, "Rejecting unparsable cron body");
            ApiError(CommandError::WrongParams(format!("invalid cron body: {e}")))
        })?
    };
    let created = state
        .commands
        .create_cron(&actor, Some(&repository_id), Some(&branch), &params)
        .await?;
    Ok((StatusCode::CREATED, Json(render::cron(&created))))
}
