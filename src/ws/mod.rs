pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::protocol::{ClientMessage, Scope, ServerMessage};
use crate::state::AppState;
use handlers::ConnCtx;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut conn = ConnCtx::default();
    // None until this connection starts or joins a session
    let mut session_rx: Option<broadcast::Receiver<ServerMessage>> = None;

    tracing::info!("WebSocket connected");

    loop {
        tokio::select! {
            // Session broadcasts, once subscribed
            broadcast_msg = async {
                match &mut session_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Not in a session yet: wait forever
                        std::future::pending::<Option<ServerMessage>>().await
                    }
                }
            } => {
                if let Some(msg) = broadcast_msg {
                    if let Ok(json) = serde_json::to_string(&msg) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }

            // Client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                let events =
                                    handlers::handle_message(client_msg, &mut conn, &state).await;

                                // Subscribe before publishing so this
                                // connection sees the broadcasts its own
                                // action produced (e.g. the join roster)
                                let entry = match &conn.session_id {
                                    Some(id) => state.get_session(id).await,
                                    None => None,
                                };
                                if session_rx.is_none() {
                                    if let Some(ref entry) = entry {
                                        session_rx = Some(entry.events.subscribe());
                                    }
                                }

                                let mut closed = false;
                                for event in events {
                                    match event.scope {
                                        Scope::Unicast => {
                                            if let Ok(json) = serde_json::to_string(&event.message) {
                                                if sender.send(Message::Text(json.into())).await.is_err() {
                                                    closed = true;
                                                    break;
                                                }
                                            }
                                        }
                                        Scope::Broadcast => {
                                            if let Some(ref entry) = entry {
                                                // No receivers is fine
                                                let _ = entry.events.send(event.message);
                                            }
                                        }
                                    }
                                }
                                if closed {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "parse_error".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Implicit leave: the engine treats a dropped connection as departure
    handlers::handle_disconnect(&conn, &state).await;
    tracing::info!("WebSocket connection closed");
}
