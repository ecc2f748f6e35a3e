//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::{handlers::*, websocket::events_handler};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Observable raffle state
        .route("/status", get(status_handler))
        .route("/player/:index", get(player_handler))
        .route("/winner", get(winner_handler))
        // Entry
        .route("/enter", post(enter_handler))
        // Settlement trigger: GET is the dry-run, POST performs
        .route(
            "/upkeep",
            get(check_upkeep_handler).post(perform_upkeep_handler),
        )
        // WebSocket endpoint for real-time events
        .route("/ws", get(events_handler))
        // Attach shared state
        .with_state(state)
}
