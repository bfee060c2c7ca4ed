//! Harbor Incentive - Reward accumulation and claims
//!
//! Rewards are tracked with cumulative indexes:
//! - Each block, every active reward period grows its source's global
//!   indexes by `rewards_per_second * seconds / source_total`.
//! - Each claim keeps the global indexes as of its last sync. Before a
//!   position changes, the difference times the owner's shares moves into
//!   the claim.
//! - Claiming scales the earned amount by a multiplier and pays it out from
//!   the funding module, time-locked for the multiplier's lockup.
//!
//! `RewardHooks` plugs into the ledger listener registry so deposits,
//! borrows, delegations and pool share changes settle rewards as they
//! happen.

pub mod accumulator;
pub mod claim;
pub mod error;
pub mod hooks;
pub mod indexes;
pub mod keeper;
pub mod mock;
pub mod params;
pub mod payout;
pub mod sources;
pub mod store;

pub use accumulator::Accumulator;
pub use claim::{Claim, ClaimType, RewardCategory};
pub use error::{IncentiveError, IncentiveResult};
pub use hooks::{category_for, RewardHooks};
pub use indexes::{calculate_rewards, MultiRewardIndexes, RewardIndexes};
pub use keeper::RewardKeeper;
pub use mock::{MockPools, MockSources, MockStaking};
pub use params::{IncentiveParams, MultiRewardPeriod, Multiplier, MultiplierName, MultipliersPerDenom};
pub use payout::period_length;
pub use sources::{
    total_delegated, BondStatus, Delegation, PoolShareSource, RewardSources, StakingKeeper,
    Validator,
};
pub use store::IncentiveStore;
