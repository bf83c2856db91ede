//! Withdrawal Safe Management
//!
//! The safe is the accounting unit for one or more staking validators
//! sharing the same economic beneficiaries. This module owns the validator
//! registry and aggregate counters, the lifecycle phase machine, the
//! versioned single- to multi-validator state representation, and the
//! facade that runs every operation transactionally.
//!
//! # Versioning
//! Safes created before the multi-validator upgrade carry legacy fields
//! bound to a single validator. Counter reads dispatch on the state tag so
//! legacy state is never rewritten outside the one-shot migration.

pub mod node;
pub mod phase;
pub mod registry;
pub mod state;

pub use node::WithdrawalSafe;
pub use phase::{validate_transition, ValidatorInfo, ValidatorPhase};
pub use registry::{SafeCounters, ValidatorSet};
pub use state::{LegacySafe, ModernSafe, SafeState};
