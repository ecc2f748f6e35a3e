//! Error types for the jackpot raffle service
//!
//! Every failure aborts the operation that triggered it in full; no variant
//! is ever swallowed or retried automatically.

use crate::raffle::types::{PlayerId, RaffleState, RequestId};

/// Errors surfaced by the raffle state machine and its collaborators
#[derive(Debug, Clone, thiserror::Error)]
pub enum RaffleError {
    #[error("entry fee {paid} is below the required entrance fee {required}")]
    InsufficientFee { paid: u64, required: u64 },

    #[error("raffle is not open for entries")]
    RaffleNotOpen,

    #[error("upkeep not needed (balance: {balance}, players: {num_players}, state: {state})")]
    UpkeepNotNeeded {
        balance: u64,
        num_players: usize,
        state: RaffleState,
    },

    #[error("randomness request rejected by the oracle: {0}")]
    OracleRequestFailed(String),

    #[error("payout of {amount} to {winner} was refused")]
    TransferFailed { winner: PlayerId, amount: u64 },

    #[error("fulfillment received for unknown request id {0}")]
    UnknownRequest(RequestId),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("missing required field: {0}")]
    MissingRequired(String),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Convenience alias used throughout the crate
pub type RaffleResult<T> = Result<T, RaffleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RaffleError::InsufficientFee {
            paid: 5,
            required: 10,
        };
        assert!(err.to_string().contains("below the required"));

        let err = RaffleError::UpkeepNotNeeded {
            balance: 0,
            num_players: 0,
            state: RaffleState::Open,
        };
        assert!(err.to_string().contains("balance: 0"));
        assert!(err.to_string().contains("players: 0"));
    }

    #[test]
    fn test_config_error_conversion() {
        let config_err = ConfigError::MissingRequired("raffle.entrance_fee".to_string());
        let err: RaffleError = config_err.into();
        match err {
            RaffleError::Config(_) => {}
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
