//! WebSocket upgrade handler
//!
//! Clients authenticate with their access token passed as a query
//! parameter (browsers cannot set headers on websocket upgrades).

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Query,
    },
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::AuthService;

use super::connection::ConnectionRegistry;
use super::messages::ServerMessage;

/// Query parameters for the websocket upgrade
#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    /// Access token for authentication
    token: String,
}

/// Upgrade handler for `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQueryParams>,
    Extension(auth_service): Extension<AuthService>,
    Extension(registry): Extension<ConnectionRegistry>,
) -> Response {
    let claims = match auth_service.verify_token(&params.token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket auth failed");
            return ws.on_upgrade(|mut socket| async move {
                let _ = socket.send(Message::Close(None)).await;
            });
        }
    };

    let user_id = claims.sub;
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, registry))
}

async fn handle_socket(mut socket: WebSocket, user_id: Uuid, registry: ConnectionRegistry) {
    let (connection_id, mut outbound) = registry.register(user_id);
    tracing::debug!(user_id = %user_id, "WebSocket connected");

    if let Ok(json) = serde_json::to_string(&ServerMessage::Connected { user_id }) {
        if socket.send(Message::Text(json.into())).await.is_err() {
            registry.unregister(user_id, connection_id);
            return;
        }
    }

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                match outgoing {
                    Some(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to encode server message");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Clients only listen; anything but close is ignored
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.unregister(user_id, connection_id);
    tracing::debug!(user_id = %user_id, "WebSocket disconnected");
}
