//! Response bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use tracing::error;

use buildgate_core::CommandError;

use crate::commands::{CronCreated, Receipt};

/// A rejected command rendered as an error body.
#[derive(Debug)]
pub struct ApiError(pub CommandError);

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(error_body(&self.0))).into_response()
    }
}

pub fn error_body(e: &CommandError) -> Value {
    let mut body = Map::new();
    body.insert("@type".into(), json!("error"));
    body.insert("error_type".into(), json!(e.error_type()));
    body.insert("error_message".into(), json!(e.public_message()));
    if let Some(resource_type) = e.resource_type() {
        body.insert("resource_type".into(), json!(resource_type.as_str()));
    }
    if let Some(permission) = e.permission() {
        body.insert("permission".into(), json!(permission.as_str()));
    }
    Value::Object(body)
}

/// `202 Accepted` body for a dispatched command.
pub fn pending(receipt: &Receipt) -> Value {
    let kind = receipt.resource_type.as_str();
    let mut body = Map::new();
    body.insert("@type".into(), json!("pending"));
    body.insert(
        kind.into(),
        json!({
            "@type": kind,
            "@href": format!("/v3/{kind}/{}", receipt.id),
            "@representation": "minimal",
            "id": receipt.id,
            "state": receipt.state.as_str(),
        }),
    );
    body.insert("state_change".into(), json!(receipt.state_change.as_str()));
    body.insert("resource_type".into(), json!(kind));
    Value::Object(body)
}

/// `201 Created` body for a new cron.
pub fn cron(created: &CronCreated) -> Value {
    let CronCreated {
        cron,
        repository,
        branch,
    } = created;
    json!({
        "@type": "cron",
        "@href": format!("/v3/cron/{}", cron.id),
        "@representation": "standard",
        "id": cron.id,
        "repository": {
            "@type": "repository",
            "@href": format!("/v3/repo/{}", repository.id),
            "@representation": "minimal",
            "id": repository.id,
            "name": repository.name,
            "slug": repository.slug(),
        },
        "branch": {
            "@type": "branch",
            "@href": format!("/v3/repo/{}/branch/{}", repository.id, branch.name),
            "@representation": "minimal",
            "name": branch.name,
        },
        "interval": cron.interval,
        "disable_by_build": cron.disable_by_build,
        "created_at": cron.created_at,
        "next_run_at": cron.next_run_at,
    })
}
