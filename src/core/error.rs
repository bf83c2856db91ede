//! Error types for the withdrawal safe
//!
//! All errors surface synchronously to the caller; nothing is retried
//! internally. `IncorrectAmount` and `State` signal invariant violations
//! rather than transient conditions: callers should halt further mutation
//! of the affected safe pending investigation.

use crate::core::types::Gwei;
use crate::safe::phase::ValidatorPhase;

/// Withdrawal-safe errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SafeError {
    #[error("caller is not the orchestrator")]
    Authorization,

    #[error("invalid safe state: {0}")]
    State(&'static str),

    #[error("invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ValidatorPhase,
        to: ValidatorPhase,
    },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("accounting invariant violated: {0}")]
    IncorrectAmount(&'static str),

    #[error("unclaimed withdrawal of {unclaimed_gwei} gwei is below one full principal unit")]
    Slashed { unclaimed_gwei: Gwei },

    #[error("fund distribution failed")]
    Transfer,
}
