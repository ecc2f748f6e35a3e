//! Service layer wiring the raffle to its collaborators
//!
//! Builds the randomness coordinator, the bank, and the state machine, and
//! owns the two background tasks: the fulfillment forwarding loop (the
//! oracle's inbound delivery path) and the upkeep ticker (the external
//! automation agent that periodically triggers settlement).

use crate::config::JackpotConfig;
use crate::raffle::{
    Fulfillment, InMemoryBank, Raffle, RaffleEvent, SystemClock, VrfCoordinator,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Dependency-injection container for a running raffle
pub struct RaffleService {
    raffle: Arc<Mutex<Raffle>>,
    bank: Arc<InMemoryBank>,
    events: broadcast::Sender<RaffleEvent>,
    coordinator_public_key: String,
    fulfillment_loop: JoinHandle<()>,
}

impl RaffleService {
    pub fn new(config: &JackpotConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (coordinator, deliveries) =
            VrfCoordinator::new(Duration::from_millis(config.oracle.block_time_ms));
        let coordinator_public_key = coordinator.public_key_hex();
        let bank = Arc::new(InMemoryBank::new());

        let raffle = Arc::new(Mutex::new(Raffle::new(
            config.raffle.clone(),
            config.oracle.clone(),
            Arc::new(coordinator),
            bank.clone(),
            Arc::new(SystemClock),
            events.clone(),
        )));

        let fulfillment_loop = tokio::spawn(run_fulfillment_loop(raffle.clone(), deliveries));

        info!(
            entrance_fee = config.raffle.entrance_fee,
            interval_secs = config.raffle.interval_secs,
            vrf_public_key = %coordinator_public_key,
            "raffle service ready"
        );

        Self {
            raffle,
            bank,
            events,
            coordinator_public_key,
            fulfillment_loop,
        }
    }

    /// Shared handle to the state machine. The mutex serializes every
    /// state-mutating operation; hold it across the whole operation.
    pub fn raffle(&self) -> Arc<Mutex<Raffle>> {
        self.raffle.clone()
    }

    pub fn bank(&self) -> Arc<InMemoryBank> {
        self.bank.clone()
    }

    pub fn events(&self) -> broadcast::Sender<RaffleEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RaffleEvent> {
        self.events.subscribe()
    }

    pub fn coordinator_public_key(&self) -> &str {
        &self.coordinator_public_key
    }

    /// Spawn the automation agent: every `poll_interval` it dry-runs the
    /// eligibility check and, when positive, requests settlement.
    pub fn spawn_upkeep_ticker(&self, poll_interval: Duration) -> JoinHandle<()> {
        let raffle = self.raffle.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                let mut raffle = raffle.lock().await;
                if !raffle.check_upkeep() {
                    debug!("upkeep not needed");
                    continue;
                }
                match raffle.perform_upkeep().await {
                    Ok(request_id) => info!(request_id, "upkeep performed"),
                    // Raced by a concurrent trigger, or the oracle rejected
                    // the request; either way the round state is unchanged.
                    Err(e) => error!(error = %e, "upkeep failed"),
                }
            }
        })
    }

    pub fn abort_background_tasks(&self) {
        self.fulfillment_loop.abort();
    }
}

/// Forward oracle deliveries to the settlement callback
async fn run_fulfillment_loop(
    raffle: Arc<Mutex<Raffle>>,
    mut deliveries: mpsc::UnboundedReceiver<Fulfillment>,
) {
    while let Some(fulfillment) = deliveries.recv().await {
        let Some(word) = fulfillment.words.first().copied() else {
            error!(
                request_id = fulfillment.request_id,
                "fulfillment carried no random words"
            );
            continue;
        };
        let mut raffle = raffle.lock().await;
        match raffle
            .on_randomness_fulfilled(fulfillment.request_id, word)
            .await
        {
            Ok(winner) => info!(
                request_id = fulfillment.request_id,
                %winner,
                proof = %fulfillment.proof,
                "settlement fulfilled"
            ),
            Err(e) => error!(
                request_id = fulfillment.request_id,
                error = %e,
                "settlement fulfillment failed"
            ),
        }
    }
    debug!("fulfillment channel closed");
}
