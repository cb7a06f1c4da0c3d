//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{info, warn};

use farmhub_core::types::id::FarmId;

use crate::connection::authenticator::AuthenticatedConnection;
use crate::server::RealtimeEngine;

/// Query parameters for the WebSocket handshake.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Opaque bearer token.
    pub token: String,
    /// Optional farm scope to join immediately.
    pub farm: Option<FarmId>,
}

/// GET /ws?token={jwt}&farm={uuid} — WebSocket upgrade.
///
/// Authentication happens before the upgrade; a rejected handshake closes
/// with an error payload and is never retried server-side.
pub async fn ws_handler(
    State(engine): State<Arc<RealtimeEngine>>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Response {
    let auth = match engine.authenticator.authenticate(&query.token, query.farm) {
        Ok(auth) => auth,
        Err(e) => {
            info!(error = %e, "WebSocket handshake rejected");
            return (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({ "message": e.message })),
            )
                .into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_ws_connection(engine, auth, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(
    engine: Arc<RealtimeEngine>,
    auth: AuthenticatedConnection,
    socket: WebSocket,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = engine.connections.register(&auth);
    let conn_id = handle.id;

    // Forward queued outbound frames to the socket.
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound frames until the client goes away.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                engine.connections.handle_inbound(&conn_id, &text);
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    engine.connections.unregister(&conn_id);

    info!(
        conn_id = %conn_id,
        user_id = %auth.user_id,
        "WebSocket connection closed"
    );
}
