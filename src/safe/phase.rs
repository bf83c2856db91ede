//! Validator Lifecycle Phases
//!
//! Pure transition validation for the validator lifecycle. The machine has
//! no side effects and holds no state: for multi-validator safes the phase
//! record lives with the orchestrator, and this module only answers whether
//! a reported transition is legal. Counter adjustments happen in response
//! to validated transitions, never here.

use crate::core::{Gwei, SafeError};
use serde::{Deserialize, Serialize};

/// Validator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorPhase {
    /// No stake deposited yet
    NotInitialized,
    /// Stake deposited, waiting to go live
    StakeDeposited,
    /// Deposited and held for operator approval
    WaitingForApproval,
    /// Active on the consensus layer
    Live,
    /// Under an active slashing procedure
    BeingSlashed,
    /// Exited the consensus layer, principal not yet released
    Exited,
    /// Principal fully withdrawn, ready for deregistration
    FullyWithdrawn,
}

impl ValidatorPhase {
    /// Check whether a transition to `to` is legal from this phase
    pub fn can_transition(self, to: ValidatorPhase) -> bool {
        use ValidatorPhase::*;
        matches!(
            (self, to),
            (NotInitialized, StakeDeposited)
                | (StakeDeposited, Live)
                | (StakeDeposited, WaitingForApproval)
                | (StakeDeposited, NotInitialized)
                | (WaitingForApproval, Live)
                | (WaitingForApproval, NotInitialized)
                | (Live, Exited)
                | (Live, BeingSlashed)
                | (BeingSlashed, Exited)
                | (Exited, FullyWithdrawn)
        )
    }

    /// Whether a validator in this phase counts toward the associated set
    pub fn is_associated(self) -> bool {
        matches!(
            self,
            ValidatorPhase::Live | ValidatorPhase::BeingSlashed | ValidatorPhase::Exited
        )
    }
}

impl Default for ValidatorPhase {
    fn default() -> Self {
        ValidatorPhase::NotInitialized
    }
}

/// Validate a phase transition, failing on any edge outside the lifecycle
pub fn validate_transition(from: ValidatorPhase, to: ValidatorPhase) -> Result<(), SafeError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(SafeError::InvalidTransition { from, to })
    }
}

/// Per-validator record supplied by the orchestrator on each call.
///
/// Never persisted by the safe; the orchestrator is the source of truth
/// for per-validator metadata.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// Current lifecycle phase
    pub phase: ValidatorPhase,
    /// Timestamp of the T-NFT-side exit request (0 = never requested)
    pub exit_request_timestamp: u64,
    /// Timestamp of the consensus-layer exit (0 = not exited)
    pub exit_timestamp: u64,
    /// Current consensus-layer balance
    pub beacon_balance_gwei: Gwei,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ValidatorPhase::*;

    const ALL_PHASES: [ValidatorPhase; 7] = [
        NotInitialized,
        StakeDeposited,
        WaitingForApproval,
        Live,
        BeingSlashed,
        Exited,
        FullyWithdrawn,
    ];

    #[test]
    fn test_legal_transitions() {
        let legal = [
            (NotInitialized, StakeDeposited),
            (StakeDeposited, Live),
            (StakeDeposited, WaitingForApproval),
            (StakeDeposited, NotInitialized),
            (WaitingForApproval, Live),
            (WaitingForApproval, NotInitialized),
            (Live, Exited),
            (Live, BeingSlashed),
            (BeingSlashed, Exited),
            (Exited, FullyWithdrawn),
        ];
        for (from, to) in legal {
            assert!(validate_transition(from, to).is_ok(), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let legal = [
            (NotInitialized, StakeDeposited),
            (StakeDeposited, Live),
            (StakeDeposited, WaitingForApproval),
            (StakeDeposited, NotInitialized),
            (WaitingForApproval, Live),
            (WaitingForApproval, NotInitialized),
            (Live, Exited),
            (Live, BeingSlashed),
            (BeingSlashed, Exited),
            (Exited, FullyWithdrawn),
        ];
        for from in ALL_PHASES {
            for to in ALL_PHASES {
                if legal.contains(&(from, to)) {
                    continue;
                }
                assert_eq!(
                    validate_transition(from, to),
                    Err(SafeError::InvalidTransition { from, to }),
                    "{from:?} -> {to:?} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_no_exit_reversal() {
        assert!(!Exited.can_transition(Live));
        assert!(!FullyWithdrawn.can_transition(Exited));
        assert!(!BeingSlashed.can_transition(Live));
    }

    #[test]
    fn test_associated_phases() {
        assert!(Live.is_associated());
        assert!(BeingSlashed.is_associated());
        assert!(Exited.is_associated());
        assert!(!NotInitialized.is_associated());
        assert!(!StakeDeposited.is_associated());
        assert!(!WaitingForApproval.is_associated());
        assert!(!FullyWithdrawn.is_associated());
    }
}
