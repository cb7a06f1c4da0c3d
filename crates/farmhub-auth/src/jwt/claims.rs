//! JWT claims structure embedded in access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use farmhub_core::types::id::{FarmId, UserId};

/// JWT claims payload embedded in every access token.
///
/// Decoded and validated exactly once at the connection boundary; the
/// rest of the system only ever sees this structure, never the raw token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: Uuid,
    /// Display name for diagnostics.
    pub name: String,
    /// The farm the user last worked in, if any.
    pub farm: Option<Uuid>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> UserId {
        UserId::from(self.sub)
    }

    /// Returns the default farm scope, if the token carries one.
    pub fn farm_id(&self) -> Option<FarmId> {
        self.farm.map(FarmId::from)
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
