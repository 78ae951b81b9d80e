//! Actor extraction from the `Authorization` header.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use super::AppState;
use crate::auth::Actor;

/// Accepts `token <jwt>` and `Bearer <jwt>`.
fn token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token(&parts.headers) else {
            return Ok(Self::Anonymous);
        };
        let actor = match state.jwt.validate(token) {
            Ok(claims) if claims.is_access() => Self::try_from(claims).unwrap_or_default(),
            Ok(_) => {
                debug!("Not an access token");
                Self::Anonymous
            }
            Err(e) => {
                debug!(error = %e, "Invalid token");
                Self::Anonymous
            }
        };
        Ok(actor)
    }
}
