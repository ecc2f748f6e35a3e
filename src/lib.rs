//! Jackpot - Pooled-Stake Raffle Service
//!
//! Players pay a fixed entrance fee into a shared pot. Once the configured
//! interval has elapsed with at least one entrant, an automation tick
//! requests a random word from the randomness oracle; its asynchronous
//! fulfillment picks the winner (`word % player_count`, weighted by entry
//! multiplicity), transfers the whole pot, and reopens the round.
//!
//! The settlement state machine lives in [`raffle::state_machine`]; the
//! oracle and payout boundaries are injected capabilities so production
//! adapters and test doubles are interchangeable.

pub mod api;
pub mod config;
pub mod errors;
pub mod raffle;
pub mod service;

pub use config::{ConfigLoader, JackpotConfig};
pub use errors::{ConfigError, RaffleError, RaffleResult};
pub use raffle::{Raffle, RaffleEvent, RaffleState};
pub use service::RaffleService;
