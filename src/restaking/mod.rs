//! Restaking Layer Integration
//!
//! Withdrawal accounting against the external delegation layer. The
//! tracker keeps the pending/completed ledger in the layer's native unit
//! (gwei) and its own time base (block numbers), and talks to the
//! protocol through an injected [`delegation::DelegationService`]
//! capability with content-addressed request identifiers.

pub mod delegation;
pub mod tracker;

pub use delegation::{DelegationService, QueuedWithdrawal, RequestId};
pub use tracker::{RestakingTracker, WithdrawalLedger};
