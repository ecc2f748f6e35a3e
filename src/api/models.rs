//! API Response Models
//!
//! Serializable request/response types for the HTTP surface.

use crate::raffle::{PlayerId, RaffleState, RequestId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Full observable raffle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: RaffleState,
    pub players: Vec<PlayerId>,
    pub pool_balance: u64,
    pub entrance_fee: u64,
    pub interval_secs: u64,
    pub last_timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_winner: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_request: Option<RequestId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnterRequest {
    pub player_id: PlayerId,
    /// Fee paid with this entry, in base units
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnterResponse {
    pub player_count: usize,
    pub pool_balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerResponse {
    pub index: usize,
    pub player: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

/// Dry-run result of the eligibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpkeepResponse {
    pub upkeep_needed: bool,
    pub state: RaffleState,
    pub player_count: usize,
    pub pool_balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformUpkeepResponse {
    pub request_id: RequestId,
}
