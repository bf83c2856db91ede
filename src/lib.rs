//! # Stakesafe
//!
//! Withdrawal-safe accounting engine for a liquid-staking protocol: each
//! safe tracks one or more consensus-layer validators sharing the same
//! economic beneficiaries (operator, T-NFT holder, B-NFT holder,
//! treasury), reconciles the restaking delegation layer's withdrawal
//! queues against its own ledger, and computes how any balance splits
//! among beneficiaries at exit time.
//!
//! ## Core Guarantees
//! - Conservation: a payout split never creates or destroys value; the
//!   four shares sum exactly to rewards plus principal
//! - Principal banding: accounted principal always lies in the 16-32 ETH
//!   band per validator
//! - Ledger safety: restaking withdrawal accumulators never wrap;
//!   underflow attempts fail
//! - Versioned state: single-validator (v0) safes migrate once to the
//!   multi-validator (v1) representation without rewriting history
//!
//! ## Units and Time Bases
//! The execution layer accounts in wei against timestamps; the consensus
//! and restaking layers account in gwei against block numbers. Amounts
//! stay in the owning subsystem's unit and convert only at the payout
//! boundary.

pub mod core;
pub mod external;
pub mod payout;
pub mod restaking;
pub mod safe;

// Re-exports
pub use crate::core::{
    Address, Gwei, SafeError, ValidatorId, Wei, ETHER, FULL_STAKE_GWEI, FULL_STAKE_WEI,
};
pub use external::{
    distribute_payouts, sweep_claims, total_balance, withdrawable_balance,
    ConsensusBalanceSource, FundTransfer, LegacyClaimRouter, PayoutRecipients, PendingClaim,
};
pub use payout::{
    non_exit_penalty_gwei, PayoutShares, PenaltyConfig, RewardSplit, ValueBreakdown,
};
pub use restaking::{DelegationService, QueuedWithdrawal, RequestId, RestakingTracker, WithdrawalLedger};
pub use safe::{
    LegacySafe, SafeCounters, SafeState, ValidatorInfo, ValidatorPhase, ValidatorSet,
    WithdrawalSafe,
};

/// Crate version
pub const STAKESAFE_VERSION: &str = env!("CARGO_PKG_VERSION");
