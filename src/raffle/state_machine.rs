//! Settlement state machine
//!
//! `Raffle` exclusively owns the round: the prize pool, the lifecycle state,
//! and the at-most-one outstanding randomness request. The round cycles
//! Open -> Settling -> Open indefinitely. The execution substrate (a tokio
//! mutex in the service layer) serializes every state-mutating operation,
//! so no internal locking is needed.
//!
//! There is no timeout or cancellation for an outstanding request: if the
//! oracle never responds the round stays Settling. That liveness gap is
//! inherited from the protocol, not patched here.

use crate::config::{OracleConfig, RaffleParams};
use crate::errors::{RaffleError, RaffleResult};
use crate::raffle::oracle::{RandomnessRequest, RandomnessSource};
use crate::raffle::payout::PayoutExecutor;
use crate::raffle::pool::PrizePool;
use crate::raffle::types::{Clock, PlayerId, RaffleEvent, RaffleState, RequestId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// One random word decides a round
const WORDS_PER_SETTLEMENT: u32 = 1;

pub struct Raffle {
    params: RaffleParams,
    oracle_config: OracleConfig,
    state: RaffleState,
    pool: PrizePool,
    /// Set when the round opens, at construction and at every reopening
    last_timestamp: u64,
    recent_winner: Option<PlayerId>,
    pending_request: Option<RequestId>,
    oracle: Arc<dyn RandomnessSource>,
    payout: Arc<dyn PayoutExecutor>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<RaffleEvent>,
}

impl Raffle {
    pub fn new(
        params: RaffleParams,
        oracle_config: OracleConfig,
        oracle: Arc<dyn RandomnessSource>,
        payout: Arc<dyn PayoutExecutor>,
        clock: Arc<dyn Clock>,
        events: broadcast::Sender<RaffleEvent>,
    ) -> Self {
        let last_timestamp = clock.unix_now();
        Self {
            pool: PrizePool::new(params.entrance_fee),
            params,
            oracle_config,
            state: RaffleState::Open,
            last_timestamp,
            recent_winner: None,
            pending_request: None,
            oracle,
            payout,
            clock,
            events,
        }
    }

    /// Enter the current round. Open-only; the pool enforces the fee minimum.
    pub fn enter(&mut self, player: PlayerId, fee_paid: u64) -> RaffleResult<()> {
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen);
        }
        self.pool.record_entry(player.clone(), fee_paid)?;
        self.emit(RaffleEvent::PlayerEntered { player, fee_paid });
        Ok(())
    }

    /// Single source of truth for settlement eligibility. True iff the round
    /// is open, strictly more than the interval has elapsed, and the pool
    /// holds at least one entry and a non-zero balance.
    pub fn check_upkeep(&self) -> bool {
        let elapsed = self.clock.unix_now().saturating_sub(self.last_timestamp);
        self.state == RaffleState::Open
            && elapsed > self.params.interval_secs
            && !self.pool.is_empty()
            && self.pool.balance() > 0
    }

    /// Request settlement of the current round. Re-evaluates eligibility,
    /// asks the oracle for one random word, and only once the oracle accepts
    /// transitions to Settling. Performs no payout; fulfillment may arrive
    /// arbitrarily later, or never.
    pub async fn perform_upkeep(&mut self) -> RaffleResult<RequestId> {
        if !self.check_upkeep() {
            return Err(RaffleError::UpkeepNotNeeded {
                balance: self.pool.balance(),
                num_players: self.pool.player_count(),
                state: self.state,
            });
        }

        let request = RandomnessRequest {
            key_hash: self.oracle_config.key_hash.clone(),
            subscription_id: self.oracle_config.subscription_id,
            confirmations: self.oracle_config.confirmations,
            callback_gas_limit: self.oracle_config.callback_gas_limit,
            num_words: WORDS_PER_SETTLEMENT,
        };

        // A rejected request leaves the round Open.
        let request_id = self.oracle.request_random_words(request).await?;

        self.state = RaffleState::Settling;
        self.pending_request = Some(request_id);
        info!(request_id, "settlement requested, round is settling");
        self.emit(RaffleEvent::WinnerRequested { request_id });

        Ok(request_id)
    }

    /// Consume the oracle's fulfillment: pick the winner, reopen the round,
    /// and pay out the pot.
    ///
    /// Effects are ordered so bookkeeping commits before the external
    /// transfer: winner recorded, state reopened, pool reset, `WinnerPicked`
    /// emitted, then the transfer. A refused transfer rolls every state
    /// change of this handler back and surfaces `TransferFailed`; the round
    /// must not stay reopened with the pot unaccounted for.
    pub async fn on_randomness_fulfilled(
        &mut self,
        request_id: RequestId,
        random_word: u64,
    ) -> RaffleResult<PlayerId> {
        match self.pending_request {
            Some(pending) if pending == request_id => {}
            _ => return Err(RaffleError::UnknownRequest(request_id)),
        }

        // Pool is never empty while Settling: eligibility required entrants
        // and entries are rejected until the round reopens.
        let num_players = self.pool.player_count();
        let winner_index = (random_word % num_players as u64) as usize;
        let winner = self.pool.players()[winner_index].clone();

        let previous_winner = self.recent_winner.clone();
        let previous_timestamp = self.last_timestamp;

        self.recent_winner = Some(winner.clone());
        self.state = RaffleState::Open;
        self.pending_request = None;
        let (players, prize) = self.pool.snapshot_and_reset();
        self.last_timestamp = self.clock.unix_now();

        info!(%winner, prize, num_players, "winner picked");
        self.emit(RaffleEvent::WinnerPicked {
            winner: winner.clone(),
            prize,
        });

        if !self.payout.transfer(&winner, prize).await {
            warn!(%winner, prize, "payout refused, rolling settlement back");
            self.pool.restore(players, prize);
            self.recent_winner = previous_winner;
            self.state = RaffleState::Settling;
            self.pending_request = Some(request_id);
            self.last_timestamp = previous_timestamp;
            return Err(RaffleError::TransferFailed {
                winner,
                amount: prize,
            });
        }

        Ok(winner)
    }

    /// Subscribe to the observable notification stream
    pub fn subscribe(&self) -> broadcast::Receiver<RaffleEvent> {
        self.events.subscribe()
    }

    pub fn entrance_fee(&self) -> u64 {
        self.pool.entrance_fee()
    }

    pub fn interval_secs(&self) -> u64 {
        self.params.interval_secs
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn player(&self, index: usize) -> Option<&PlayerId> {
        self.pool.player(index)
    }

    pub fn players(&self) -> &[PlayerId] {
        self.pool.players()
    }

    pub fn player_count(&self) -> usize {
        self.pool.player_count()
    }

    pub fn pool_balance(&self) -> u64 {
        self.pool.balance()
    }

    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub fn recent_winner(&self) -> Option<&PlayerId> {
        self.recent_winner.as_ref()
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.pending_request
    }

    fn emit(&self, event: RaffleEvent) {
        // Send fails only when nobody is subscribed; that is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raffle::payout::InMemoryBank;
    use crate::raffle::types::ManualClock;
    use std::sync::Mutex;

    const FEE: u64 = 10_000_000;
    const INTERVAL: u64 = 30;

    /// Records requests and hands out sequential ids; can be switched to
    /// reject requests.
    struct MockOracle {
        requests: Mutex<Vec<RandomnessRequest>>,
        next_id: Mutex<RequestId>,
        rejecting: Mutex<bool>,
    }

    impl MockOracle {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                next_id: Mutex::new(0),
                rejecting: Mutex::new(false),
            }
        }

        fn reject_requests(&self) {
            *self.rejecting.lock().unwrap() = true;
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl RandomnessSource for MockOracle {
        async fn request_random_words(
            &self,
            request: RandomnessRequest,
        ) -> Result<RequestId, RaffleError> {
            if *self.rejecting.lock().unwrap() {
                return Err(RaffleError::OracleRequestFailed(
                    "subscription underfunded".to_string(),
                ));
            }
            self.requests.lock().unwrap().push(request);
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            Ok(*id)
        }
    }

    struct Harness {
        raffle: Raffle,
        oracle: Arc<MockOracle>,
        bank: Arc<InMemoryBank>,
        clock: Arc<ManualClock>,
        events: broadcast::Receiver<RaffleEvent>,
    }

    fn harness() -> Harness {
        let oracle = Arc::new(MockOracle::new());
        let bank = Arc::new(InMemoryBank::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let (tx, events) = broadcast::channel(64);
        let raffle = Raffle::new(
            RaffleParams {
                entrance_fee: FEE,
                interval_secs: INTERVAL,
            },
            OracleConfig::default(),
            oracle.clone(),
            bank.clone(),
            clock.clone(),
            tx,
        );
        Harness {
            raffle,
            oracle,
            bank,
            clock,
            events,
        }
    }

    #[test]
    fn test_entry_appends_and_accumulates_exact_fee() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.raffle.enter("bob".to_string(), FEE + 5).unwrap();

        assert_eq!(h.raffle.player_count(), 2);
        assert_eq!(h.raffle.pool_balance(), 2 * FEE + 5);
        assert_eq!(h.raffle.player(0), Some(&"alice".to_string()));
        assert_eq!(
            h.events.try_recv().unwrap(),
            RaffleEvent::PlayerEntered {
                player: "alice".to_string(),
                fee_paid: FEE
            }
        );
    }

    #[test]
    fn test_underpaid_entry_rejected() {
        let mut h = harness();
        let err = h.raffle.enter("alice".to_string(), FEE - 1).unwrap_err();
        assert!(matches!(err, RaffleError::InsufficientFee { .. }));
        assert_eq!(h.raffle.player_count(), 0);
        assert_eq!(h.raffle.pool_balance(), 0);
    }

    #[tokio::test]
    async fn test_entry_rejected_while_settling() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        h.raffle.perform_upkeep().await.unwrap();

        let err = h.raffle.enter("bob".to_string(), FEE).unwrap_err();
        assert!(matches!(err, RaffleError::RaffleNotOpen));
        assert_eq!(h.raffle.player_count(), 1);
    }

    #[test]
    fn test_eligibility_boundaries() {
        let h = harness();

        // Empty round, plenty of time elapsed: pool empty and balance zero.
        h.clock.advance(INTERVAL + 10);
        assert!(!h.raffle.check_upkeep());

        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();

        // elapsed < interval
        h.clock.advance(INTERVAL - 1);
        assert!(!h.raffle.check_upkeep());

        // elapsed == interval: strict inequality, still not eligible
        h.clock.advance(1);
        assert!(!h.raffle.check_upkeep());

        // elapsed > interval
        h.clock.advance(1);
        assert!(h.raffle.check_upkeep());
    }

    #[tokio::test]
    async fn test_eligibility_false_while_settling() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        h.raffle.perform_upkeep().await.unwrap();

        h.clock.advance(INTERVAL + 1);
        assert!(!h.raffle.check_upkeep());
    }

    #[tokio::test]
    async fn test_upkeep_not_needed_carries_diagnostics() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();

        // Interval not elapsed yet
        let err = h.raffle.perform_upkeep().await.unwrap_err();
        match err {
            RaffleError::UpkeepNotNeeded {
                balance,
                num_players,
                state,
            } => {
                assert_eq!(balance, FEE);
                assert_eq!(num_players, 1);
                assert_eq!(state, RaffleState::Open);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(h.oracle.request_count(), 0);
        assert_eq!(h.raffle.state(), RaffleState::Open);
    }

    #[tokio::test]
    async fn test_perform_upkeep_transitions_and_stores_request() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);

        let request_id = h.raffle.perform_upkeep().await.unwrap();
        assert_eq!(h.raffle.state(), RaffleState::Settling);
        assert_eq!(h.raffle.pending_request(), Some(request_id));

        // Skip the entry event, then expect the settlement request event.
        let _ = h.events.try_recv().unwrap();
        assert_eq!(
            h.events.try_recv().unwrap(),
            RaffleEvent::WinnerRequested { request_id }
        );

        // A second request must fail without touching the pending one.
        let err = h.raffle.perform_upkeep().await.unwrap_err();
        assert!(matches!(err, RaffleError::UpkeepNotNeeded { .. }));
        assert_eq!(h.raffle.pending_request(), Some(request_id));
        assert_eq!(h.oracle.request_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_oracle_request_leaves_round_open() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        h.oracle.reject_requests();

        let err = h.raffle.perform_upkeep().await.unwrap_err();
        assert!(matches!(err, RaffleError::OracleRequestFailed(_)));
        assert_eq!(h.raffle.state(), RaffleState::Open);
        assert_eq!(h.raffle.pending_request(), None);

        // Still enterable
        h.raffle.enter("bob".to_string(), FEE).unwrap();
    }

    #[tokio::test]
    async fn test_fulfillment_pays_winner_and_reopens() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        let request_id = h.raffle.perform_upkeep().await.unwrap();

        h.clock.advance(5);
        let settled_at = h.clock.unix_now();
        let winner = h
            .raffle
            .on_randomness_fulfilled(request_id, 777)
            .await
            .unwrap();

        assert_eq!(winner, "alice");
        assert_eq!(h.raffle.state(), RaffleState::Open);
        assert_eq!(h.raffle.player_count(), 0);
        assert_eq!(h.raffle.pool_balance(), 0);
        assert_eq!(h.raffle.pending_request(), None);
        assert_eq!(h.raffle.recent_winner(), Some(&"alice".to_string()));
        assert_eq!(h.raffle.last_timestamp(), settled_at);
        assert_eq!(h.bank.balance("alice"), FEE);
    }

    #[tokio::test]
    async fn test_winner_selection_is_modulo_with_multiplicity() {
        let mut h = harness();
        for player in ["a", "b", "a", "c"] {
            h.raffle.enter(player.to_string(), FEE).unwrap();
        }
        h.clock.advance(INTERVAL + 1);
        let request_id = h.raffle.perform_upkeep().await.unwrap();

        // 5 mod 4 = 1 -> second slot, player b
        let winner = h
            .raffle
            .on_randomness_fulfilled(request_id, 5)
            .await
            .unwrap();
        assert_eq!(winner, "b");
        assert_eq!(h.bank.balance("b"), 4 * FEE);
    }

    #[tokio::test]
    async fn test_winner_picked_emitted_before_payout() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        let request_id = h.raffle.perform_upkeep().await.unwrap();
        h.bank.refuse_payments("alice");

        let err = h
            .raffle
            .on_randomness_fulfilled(request_id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RaffleError::TransferFailed { .. }));

        // The event stays observable even though the payout failed.
        let _ = h.events.try_recv().unwrap(); // PlayerEntered
        let _ = h.events.try_recv().unwrap(); // WinnerRequested
        assert_eq!(
            h.events.try_recv().unwrap(),
            RaffleEvent::WinnerPicked {
                winner: "alice".to_string(),
                prize: FEE
            }
        );
    }

    #[tokio::test]
    async fn test_refused_payout_rolls_back_all_state() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        let request_id = h.raffle.perform_upkeep().await.unwrap();
        let pre_timestamp = h.raffle.last_timestamp();
        h.bank.refuse_payments("alice");
        h.clock.advance(5);

        let err = h
            .raffle
            .on_randomness_fulfilled(request_id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RaffleError::TransferFailed { .. }));

        assert_eq!(h.raffle.state(), RaffleState::Settling);
        assert_eq!(h.raffle.pending_request(), Some(request_id));
        assert_eq!(h.raffle.player_count(), 1);
        assert_eq!(h.raffle.pool_balance(), FEE);
        assert_eq!(h.raffle.recent_winner(), None);
        assert_eq!(h.raffle.last_timestamp(), pre_timestamp);
        assert_eq!(h.bank.balance("alice"), 0);
    }

    #[tokio::test]
    async fn test_unknown_request_id_rejected() {
        let mut h = harness();
        h.raffle.enter("alice".to_string(), FEE).unwrap();
        h.clock.advance(INTERVAL + 1);
        let request_id = h.raffle.perform_upkeep().await.unwrap();

        let err = h
            .raffle
            .on_randomness_fulfilled(request_id + 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RaffleError::UnknownRequest(_)));
        assert_eq!(h.raffle.state(), RaffleState::Settling);
        assert_eq!(h.raffle.pending_request(), Some(request_id));
    }

    #[tokio::test]
    async fn test_round_cycles_indefinitely() {
        let mut h = harness();

        for round in 0..3u64 {
            h.raffle.enter("alice".to_string(), FEE).unwrap();
            h.clock.advance(INTERVAL + 1);
            let request_id = h.raffle.perform_upkeep().await.unwrap();
            let winner = h
                .raffle
                .on_randomness_fulfilled(request_id, round)
                .await
                .unwrap();
            assert_eq!(winner, "alice");
            assert_eq!(h.raffle.state(), RaffleState::Open);
        }

        assert_eq!(h.bank.balance("alice"), 3 * FEE);
    }
}
