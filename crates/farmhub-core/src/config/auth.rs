//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token verification configuration.
///
/// FarmHub consumes identity as a capability: tokens are minted elsewhere
/// and only verified here, so the schema carries just the verification
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes (used when minting test tokens).
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Clock skew leeway in seconds when validating `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    60
}

fn default_leeway() -> u64 {
    30
}
