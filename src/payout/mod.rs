//! Payout Accounting
//!
//! Decomposes a safe's balance into staking rewards and validator
//! principal, splits both across the four beneficiary classes, and
//! computes the time-decayed non-exit penalty charged against the B-NFT
//! side. The split conserves value exactly; a violation is treated as an
//! accounting defect, never a recoverable condition.

pub mod penalty;
pub mod splitter;

pub use penalty::{non_exit_penalty_gwei, PenaltyConfig, MAX_PENALTY_DAYS, SECONDS_PER_DAY};
pub use splitter::{
    decompose, principal_only_split, rewards_only_split, split, PayoutShares, RewardSplit,
    ValueBreakdown, PARTIAL_WITHDRAWAL_LIMIT_WEI,
};
