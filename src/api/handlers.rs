//! Request Handlers
//!
//! Every state-mutating handler takes the raffle mutex for the whole
//! operation, preserving the single-writer execution model.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::raffle::{Raffle, RaffleEvent};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Shared application state
pub struct AppState {
    pub raffle: Arc<Mutex<Raffle>>,
    pub events: broadcast::Sender<RaffleEvent>,
    pub version: String,
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}

/// Full raffle status
/// GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let raffle = state.raffle.lock().await;
    Json(StatusResponse {
        state: raffle.state(),
        players: raffle.players().to_vec(),
        pool_balance: raffle.pool_balance(),
        entrance_fee: raffle.entrance_fee(),
        interval_secs: raffle.interval_secs(),
        last_timestamp: raffle.last_timestamp(),
        recent_winner: raffle.recent_winner().cloned(),
        pending_request: raffle.pending_request(),
    })
}

/// Enter the current round
/// POST /enter
pub async fn enter_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnterRequest>,
) -> Result<Json<EnterResponse>, ApiError> {
    if request.player_id.is_empty() {
        return Err(ApiError::bad_request(
            request_id.0,
            "player_id must not be empty".to_string(),
        ));
    }

    let mut raffle = state.raffle.lock().await;
    raffle
        .enter(request.player_id, request.amount)
        .map_err(|e| ApiError::from_raffle(request_id.0.clone(), e))?;

    Ok(Json(EnterResponse {
        player_count: raffle.player_count(),
        pool_balance: raffle.pool_balance(),
    }))
}

/// Look up one entrant slot by index
/// GET /player/{index}
pub async fn player_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let raffle = state.raffle.lock().await;
    let player = raffle.player(index).cloned().ok_or_else(|| {
        ApiError::not_found(
            request_id.0.clone(),
            format!("No player at index {}", index),
        )
    })?;

    Ok(Json(PlayerResponse { index, player }))
}

/// Most recent winner, if any round has settled yet
/// GET /winner
pub async fn winner_handler(State(state): State<Arc<AppState>>) -> Json<WinnerResponse> {
    let raffle = state.raffle.lock().await;
    Json(WinnerResponse {
        winner: raffle.recent_winner().cloned(),
    })
}

/// Dry-run the eligibility check
/// GET /upkeep
pub async fn check_upkeep_handler(State(state): State<Arc<AppState>>) -> Json<UpkeepResponse> {
    let raffle = state.raffle.lock().await;
    Json(UpkeepResponse {
        upkeep_needed: raffle.check_upkeep(),
        state: raffle.state(),
        player_count: raffle.player_count(),
        pool_balance: raffle.pool_balance(),
    })
}

/// Trigger settlement; fails loudly when eligibility is false at call time
/// POST /upkeep
pub async fn perform_upkeep_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PerformUpkeepResponse>, ApiError> {
    let mut raffle = state.raffle.lock().await;
    let oracle_request_id = raffle
        .perform_upkeep()
        .await
        .map_err(|e| ApiError::from_raffle(request_id.0.clone(), e))?;

    Ok(Json(PerformUpkeepResponse {
        request_id: oracle_request_id,
    }))
}
