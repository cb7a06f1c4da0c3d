//! JWT token creation with configurable signing and TTL.
//!
//! Minting tokens is the account system's job; this encoder exists for
//! local tooling and tests.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use farmhub_core::config::auth::AuthConfig;
use farmhub_core::error::AppError;

use super::claims::Claims;

/// Creates signed JWT access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_minutes: config.jwt_access_ttl_minutes as i64,
        }
    }

    /// Generates a signed access token for the given user.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        farm_id: Option<Uuid>,
        name: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.access_ttl_minutes);

        let claims = Claims {
            sub: user_id,
            name: name.to_string(),
            farm: farm_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }
}
