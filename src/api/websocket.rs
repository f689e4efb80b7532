//! WebSocket handler for real-time viewer connections
//!
//! Each viewer connects to `/ws?session_id=...&name=...` and receives
//! the session's event stream. The channel is push-only apart from
//! keep-alive pings and dice rolls; every other mutation goes through
//! the REST surface.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::AppState;
use crate::broadcast::Viewer;
use crate::events::Event;

/// Per-viewer outgoing buffer; a viewer further behind than this is
/// treated as unreachable and dropped
const EVENT_BUFFER: usize = 32;

/// Connection parameters
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session_id: String,
    pub name: Option<String>,
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Keep the connection alive
    Ping,
    /// Roll dice and announce the result to the session
    Roll { notation: String },
}

/// Handle WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

/// Handle an individual viewer connection
async fn handle_socket(mut socket: WebSocket, state: AppState, query: WsQuery) {
    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_BUFFER);

    let viewer_id = uuid::Uuid::new_v4().to_string();
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("viewer-{}", &viewer_id[..8]));
    let session_id = query.session_id;

    info!(viewer = %viewer_id, session = %session_id, name = %name, "viewer connected");

    state
        .connections
        .register(Viewer {
            viewer_id: viewer_id.clone(),
            name: name.clone(),
            session_id: session_id.clone(),
            sender: tx,
        })
        .await;

    // The viewer's own join event doubles as the connection ack
    state
        .connections
        .broadcast(
            &session_id,
            Event::UserJoined {
                session_id: session_id.clone(),
                name: name.clone(),
            },
        )
        .await;

    loop {
        tokio::select! {
            // Events fanned out to this viewer
            Some(event) = rx.recv() => {
                if let Ok(json) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
            // Incoming client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) {
                            handle_client_message(&state, &session_id, &name, msg).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    // Clean up; eviction by a failed broadcast may have beaten us here
    if state.connections.unregister(&viewer_id).await.is_some() {
        state
            .connections
            .broadcast(
                &session_id,
                Event::UserLeft {
                    session_id: session_id.clone(),
                    name: name.clone(),
                },
            )
            .await;
    }
    info!(viewer = %viewer_id, session = %session_id, "viewer disconnected");
}

/// Handle a message from the viewer
async fn handle_client_message(
    state: &AppState,
    session_id: &str,
    name: &str,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Ping => {
            // Keep-alive only, no response
        }
        ClientMessage::Roll { notation } => {
            // The result reaches this viewer through the broadcast;
            // a bad notation is logged and swallowed
            if let Err(e) = state.engine.roll_dice(session_id, name, &notation).await {
                warn!(session = %session_id, roller = %name, "dice roll rejected: {}", e);
            }
        }
    }
}
