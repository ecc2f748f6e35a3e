//! Payout executor boundary
//!
//! The winner transfer is a capability injected into the state machine. A
//! refused transfer is a `false` return, never a panic, so the caller owns
//! the rollback policy. No retry is attempted here: retries, if wanted, are
//! a caller-level policy for a later round.

use crate::raffle::types::PlayerId;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

#[async_trait]
pub trait PayoutExecutor: Send + Sync {
    /// Attempt to move `amount` to `to`. Returns `false` when the recipient
    /// refuses the transfer.
    async fn transfer(&self, to: &PlayerId, amount: u64) -> bool;
}

/// In-process account ledger backing the payout executor.
///
/// Accounts can be flagged as refusing, which exercises the settlement
/// rollback path the same way a non-accepting recipient would.
pub struct InMemoryBank {
    balances: DashMap<PlayerId, u64>,
    refusing: DashSet<PlayerId>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            refusing: DashSet::new(),
        }
    }

    pub fn balance(&self, who: &str) -> u64 {
        self.balances.get(who).map(|b| *b).unwrap_or(0)
    }

    /// Make `who` refuse all incoming transfers
    pub fn refuse_payments(&self, who: &str) {
        self.refusing.insert(who.to_string());
    }

    /// Make `who` accept incoming transfers again
    pub fn accept_payments(&self, who: &str) {
        self.refusing.remove(who);
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayoutExecutor for InMemoryBank {
    async fn transfer(&self, to: &PlayerId, amount: u64) -> bool {
        if self.refusing.contains(to) {
            return false;
        }
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        true
    }
}
