//! WebSocket Support for Real-time Raffle Events
//!
//! Streams the ordered raffle notifications (entries, settlement requests,
//! winners) to connected clients as JSON.

use super::handlers::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::raffle::RaffleEvent;

/// Upgrade handler
/// GET /ws
pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let rx = state.events.subscribe();
    ws.on_upgrade(move |socket| handle_events_socket(socket, rx))
}

async fn handle_events_socket(socket: WebSocket, mut rx: broadcast::Receiver<RaffleEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        debug!("websocket client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Ignore pings and stray client messages
                _ => {}
            },
        }
    }
}
