//! Randomness oracle boundary
//!
//! The state machine depends on the [`RandomnessSource`] capability only;
//! the bundled [`VrfCoordinator`] satisfies it with a local schnorrkel VRF
//! and delivers fulfillments asynchronously over a channel. Tests satisfy it
//! with hand-rolled doubles.

use crate::errors::RaffleError;
use crate::raffle::types::RequestId;
use async_trait::async_trait;
use schnorrkel::{context::SigningContext, Keypair};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

const VRF_SIGNING_CONTEXT: &[u8] = b"jackpot-raffle";

/// Parameters for a randomness request. Key hash, subscription id,
/// confirmations and callback gas limit are opaque pass-through
/// configuration: the raffle never reinterprets them.
#[derive(Debug, Clone)]
pub struct RandomnessRequest {
    pub key_hash: String,
    pub subscription_id: u64,
    pub confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Asynchronous delivery from the oracle, correlated by request id
#[derive(Debug, Clone)]
pub struct Fulfillment {
    pub request_id: RequestId,
    pub words: Vec<u64>,
    /// Hex-encoded VRF proof, kept for auditability
    pub proof: String,
}

/// Outbound half of the oracle protocol. Returns the correlation id once
/// the oracle accepts the request; any rejection surfaces as
/// `OracleRequestFailed` and must leave the caller's state untouched.
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    async fn request_random_words(
        &self,
        request: RandomnessRequest,
    ) -> Result<RequestId, RaffleError>;
}

/// Local VRF-backed randomness provider.
///
/// Assigns monotonically increasing request ids, derives random words from
/// the VRF output over a per-request input message, and delivers each
/// fulfillment on the channel handed out at construction after a
/// confirmation-scaled delay.
pub struct VrfCoordinator {
    keypair: Keypair,
    next_request_id: AtomicU64,
    deliveries: mpsc::UnboundedSender<Fulfillment>,
    /// Simulated per-confirmation block time
    block_time: Duration,
}

impl VrfCoordinator {
    /// Create a coordinator with a fresh keypair. The receiver carries the
    /// inbound `deliver(requestId, words)` half of the protocol.
    pub fn new(block_time: Duration) -> (Self, mpsc::UnboundedReceiver<Fulfillment>) {
        let keypair = Keypair::generate_with(rand_core::OsRng);
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                keypair,
                next_request_id: AtomicU64::new(0),
                deliveries: tx,
                block_time,
            },
            rx,
        )
    }

    /// Get the public key as hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public.to_bytes())
    }

    /// VRF output and proof for an input message
    fn vrf_sign(&self, message: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let ctx = SigningContext::new(VRF_SIGNING_CONTEXT);
        let signature = self.keypair.sign(ctx.bytes(message));

        // VRF output is hash of signature (deterministic); proof is the
        // signature itself
        let mut hasher = Sha256::new();
        hasher.update(signature.to_bytes());
        (hasher.finalize().to_vec(), signature.to_bytes().to_vec())
    }

    /// Expand the VRF output into `num_words` independent words
    fn derive_words(vrf_output: &[u8], num_words: u32) -> Vec<u64> {
        (0..num_words)
            .map(|i| {
                let mut hasher = Sha256::new();
                hasher.update(vrf_output);
                hasher.update(i.to_le_bytes());
                let digest = hasher.finalize();
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&digest[..8]);
                u64::from_le_bytes(bytes)
            })
            .collect()
    }
}

#[async_trait]
impl RandomnessSource for VrfCoordinator {
    async fn request_random_words(
        &self,
        request: RandomnessRequest,
    ) -> Result<RequestId, RaffleError> {
        if request.num_words == 0 {
            return Err(RaffleError::OracleRequestFailed(
                "zero random words requested".to_string(),
            ));
        }
        if self.deliveries.is_closed() {
            return Err(RaffleError::OracleRequestFailed(
                "fulfillment channel closed".to_string(),
            ));
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1;
        let input = format!(
            "{}:{}:{}",
            request.key_hash, request.subscription_id, request_id
        );
        let (vrf_output, vrf_proof) = self.vrf_sign(input.as_bytes());
        let words = Self::derive_words(&vrf_output, request.num_words);

        let fulfillment = Fulfillment {
            request_id,
            words,
            proof: hex::encode(vrf_proof),
        };

        let delay = self.block_time * u32::from(request.confirmations);
        let tx = self.deliveries.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(fulfillment).is_err() {
                warn!(request_id, "fulfillment receiver dropped, discarding delivery");
            }
        });

        Ok(request_id)
    }
}
