//! Prize pool ledger for the current round
//!
//! Tracks the ordered entrant list and the accumulated pot. Round-state
//! gating lives in the state machine; the pool only enforces the fee
//! minimum. Invariant: `players` is empty iff `balance == 0`.

use crate::errors::{RaffleError, RaffleResult};
use crate::raffle::types::PlayerId;

pub struct PrizePool {
    entrance_fee: u64,
    /// Insertion order = entry order. Duplicates allowed: a player entering
    /// twice holds two weighted slots.
    players: Vec<PlayerId>,
    balance: u64,
}

impl PrizePool {
    pub fn new(entrance_fee: u64) -> Self {
        Self {
            entrance_fee,
            players: Vec::new(),
            balance: 0,
        }
    }

    /// Append a player and add their fee to the pot.
    pub fn record_entry(&mut self, player: PlayerId, fee_paid: u64) -> RaffleResult<()> {
        if fee_paid < self.entrance_fee {
            return Err(RaffleError::InsufficientFee {
                paid: fee_paid,
                required: self.entrance_fee,
            });
        }
        self.players.push(player);
        self.balance += fee_paid;
        Ok(())
    }

    /// Return the round's entrants and pot, clearing both for the next round.
    pub fn snapshot_and_reset(&mut self) -> (Vec<PlayerId>, u64) {
        let players = std::mem::take(&mut self.players);
        let balance = std::mem::replace(&mut self.balance, 0);
        (players, balance)
    }

    /// Rollback hook: reinstate a snapshot taken by `snapshot_and_reset`.
    /// Used by the state machine when the payout transfer is refused.
    pub fn restore(&mut self, players: Vec<PlayerId>, balance: u64) {
        self.players = players;
        self.balance = balance;
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn player(&self, index: usize) -> Option<&PlayerId> {
        self.players.get(index)
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
