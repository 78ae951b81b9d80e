//! JWT token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use buildgate_core::db::unix_timestamp;

use super::claims::Claims;

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &[u8], access_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
        }
    }

    /// Issue an access token for the given user. Returns the token and its
    /// lifetime in seconds.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        login: &str,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let now = unix_timestamp();

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            login: login.to_string(),
            iat: now,
            exp: now + self.access_ttl_secs,
            token_type: "access".to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, self.access_ttl_secs))
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}
