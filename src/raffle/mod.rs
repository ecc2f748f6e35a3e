pub mod oracle;
pub mod payout;
pub mod pool;
pub mod state_machine;
pub mod types;

pub use oracle::{Fulfillment, RandomnessRequest, RandomnessSource, VrfCoordinator};
pub use payout::{InMemoryBank, PayoutExecutor};
pub use pool::PrizePool;
pub use state_machine::Raffle;
pub use types::{Clock, ManualClock, PlayerId, RaffleEvent, RaffleState, RequestId, SystemClock};
