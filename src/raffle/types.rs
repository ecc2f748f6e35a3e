use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Player identifier (wallet address or session ID)
pub type PlayerId = String;

/// Correlation identifier assigned by the randomness oracle, unique per request
pub type RequestId = u64;

/// Round lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RaffleState {
    /// Accepting entries, no settlement in progress
    Open,
    /// One outstanding randomness request, entries rejected
    Settling,
}

impl fmt::Display for RaffleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaffleState::Open => write!(f, "open"),
            RaffleState::Settling => write!(f, "settling"),
        }
    }
}

/// Observable raffle notifications, emitted in a fixed order:
/// `PlayerEntered` on entry, `WinnerRequested` once the oracle accepts a
/// settlement request, `WinnerPicked` on fulfillment before the payout
/// transfer is attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaffleEvent {
    PlayerEntered { player: PlayerId, fee_paid: u64 },
    WinnerRequested { request_id: RequestId },
    WinnerPicked { winner: PlayerId, prize: u64 },
}

/// Time source injected into the state machine so the strict
/// `elapsed > interval` eligibility boundary stays testable.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn unix_now(&self) -> u64;
}

/// Wall clock used in production
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually advanced clock for tests and simulations
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: u64) {
        self.now.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
