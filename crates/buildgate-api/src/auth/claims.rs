//! JWT claims carried by API access tokens.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject: the numeric user id, as a string.
    pub sub: String,
    pub login: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    /// Only "access" tokens are accepted by the API.
    pub token_type: String,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == "access"
    }
}
