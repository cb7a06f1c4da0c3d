//! WebSocket authentication — validates the handshake bearer token.

use std::sync::Arc;

use farmhub_auth::JwtDecoder;
use farmhub_core::error::AppError;
use farmhub_core::types::id::{FarmId, UserId};

/// Authenticated connection info extracted from the token.
#[derive(Debug, Clone)]
pub struct AuthenticatedConnection {
    /// User ID.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Farm scope requested at handshake time, if any.
    pub farm_id: Option<FarmId>,
}

/// Authenticates WebSocket connections using JWT tokens.
///
/// A rejection here is terminal: the connection is closed with an error
/// payload and the server never retries authentication for it.
#[derive(Clone)]
pub struct WsAuthenticator {
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Authenticates a connection using a token from the handshake.
    ///
    /// The optional `farm` handshake parameter overrides the farm scope
    /// carried in the token claims.
    pub fn authenticate(
        &self,
        token: &str,
        farm: Option<FarmId>,
    ) -> Result<AuthenticatedConnection, AppError> {
        let claims = self.decoder.decode(token)?;

        Ok(AuthenticatedConnection {
            user_id: claims.user_id(),
            name: claims.name.clone(),
            farm_id: farm.or_else(|| claims.farm_id()),
        })
    }
}
