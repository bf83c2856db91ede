//! Restaking Withdrawal Tracker
//!
//! Pending/completed withdrawal accounting against the delegation layer.
//! The ledger is created empty at safe creation and mutated only by the
//! queue, complete and release operations; every mutation is ordered after
//! the external call whose failure must abort it, so a failed call leaves
//! no partial accounting. Amounts never wrap: an attempted underflow is an
//! error, not a saturation.

use crate::core::{Address, Gwei, SafeError, ValidatorId, FULL_STAKE_GWEI};
use crate::restaking::delegation::{DelegationService, QueuedWithdrawal, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Pending/completed withdrawal accumulators in gwei
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalLedger {
    /// Queued against the delegation layer, not yet completed
    pub pending_gwei: Gwei,
    /// Completed but not yet released to beneficiaries
    pub completed_gwei: Gwei,
}

/// Per-safe restaking withdrawal state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestakingTracker {
    /// Withdrawal accumulators
    ledger: WithdrawalLedger,
    /// Block at which the restaking-layer exit was observed, per validator
    exit_blocks: HashMap<ValidatorId, u64>,
    /// Monotone nonce for queued withdrawal requests
    withdrawal_nonce: u64,
}

impl RestakingTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ledger state
    pub fn ledger(&self) -> WithdrawalLedger {
        self.ledger
    }

    /// Record the block at which the restaking-layer exit was observed
    pub fn mark_exit_observed(&mut self, id: ValidatorId, at_block: u64) {
        self.exit_blocks.insert(id, at_block);
    }

    /// Block at which the exit was observed, if any. Used to reconcile
    /// against block-indexed withdrawal queues.
    pub fn exit_observed_at(&self, id: ValidatorId) -> Option<u64> {
        self.exit_blocks.get(&id).copied()
    }

    /// Reset the exit marker for a validator
    pub fn clear_exit_marker(&mut self, id: ValidatorId) {
        self.exit_blocks.remove(&id);
    }

    /// Queue a full-principal withdrawal for whatever the delegation layer
    /// has made withdrawable beyond what is already pending.
    ///
    /// No-op when nothing is unclaimed. An unclaimed amount short of one
    /// full principal unit means the validator was slashed; partial
    /// withdrawals are not supported and must block rather than silently
    /// under-withdraw.
    pub fn queue_full_withdrawal(
        &mut self,
        safe: Address,
        strategy: Address,
        current_block: u64,
        withdrawable_gwei: Gwei,
        service: &dyn DelegationService,
    ) -> Result<Vec<RequestId>, SafeError> {
        let unclaimed = withdrawable_gwei.saturating_sub(self.ledger.pending_gwei);
        if unclaimed == 0 {
            return Ok(Vec::new());
        }
        if unclaimed < FULL_STAKE_GWEI {
            warn!(unclaimed_gwei = unclaimed, "withdrawable amount below full principal");
            return Err(SafeError::Slashed {
                unclaimed_gwei: unclaimed,
            });
        }

        let request = QueuedWithdrawal {
            staker: safe,
            withdrawer: safe,
            strategy,
            shares_gwei: FULL_STAKE_GWEI,
            start_block: current_block,
            nonce: self.withdrawal_nonce,
        };

        // External call first: a failure must leave the ledger untouched
        let ids = service.queue_withdrawal(&request)?;
        if ids.is_empty() {
            return Err(SafeError::State("delegation layer produced no withdrawal request"));
        }

        self.withdrawal_nonce += 1;
        self.ledger.pending_gwei += FULL_STAKE_GWEI;
        info!(
            pending_gwei = self.ledger.pending_gwei,
            request_id = %ids[0],
            "queued full-principal withdrawal"
        );
        Ok(ids)
    }

    /// Complete queued withdrawals.
    ///
    /// With `as_tokens` the amounts move from pending to completed. Without
    /// it the shares are re-delegated, which is only legal once no full
    /// withdrawal is outstanding: the ordering constraint, not a general
    /// exclusion. Every entry must name the safe as both requester and
    /// recipient.
    pub fn complete_withdrawals(
        &mut self,
        safe: Address,
        batch: &[QueuedWithdrawal],
        as_tokens: bool,
        service: &dyn DelegationService,
    ) -> Result<Gwei, SafeError> {
        let mut total_gwei: Gwei = 0;
        for entry in batch {
            if entry.staker != safe || entry.withdrawer != safe {
                return Err(SafeError::Authorization);
            }
            total_gwei = total_gwei
                .checked_add(entry.shares_gwei)
                .ok_or(SafeError::IncorrectAmount("withdrawal batch total overflows"))?;
        }

        if as_tokens {
            if self.ledger.pending_gwei < total_gwei {
                return Err(SafeError::InsufficientBalance {
                    required: total_gwei as u128,
                    available: self.ledger.pending_gwei as u128,
                });
            }
        } else if self.ledger.pending_gwei != 0 {
            return Err(SafeError::State(
                "outstanding full withdrawal must be completed before undelegating",
            ));
        }

        let ids: Vec<RequestId> = batch.iter().map(|entry| entry.request_id()).collect();
        let proof_indices: Vec<usize> = (0..ids.len()).collect();
        let transferred = service.complete_withdrawal(&ids, &proof_indices, as_tokens)?;

        if as_tokens {
            self.ledger.pending_gwei -= total_gwei;
            self.ledger.completed_gwei += total_gwei;
            info!(
                completed_gwei = self.ledger.completed_gwei,
                batch = batch.len(),
                "completed full withdrawals"
            );
        }
        Ok(transferred)
    }

    /// Release one completed full-principal unit toward beneficiary payout
    pub fn release_full_principal(&mut self) -> Result<(), SafeError> {
        if self.ledger.completed_gwei < FULL_STAKE_GWEI {
            return Err(SafeError::InsufficientBalance {
                required: FULL_STAKE_GWEI as u128,
                available: self.ledger.completed_gwei as u128,
            });
        }
        self.ledger.completed_gwei -= FULL_STAKE_GWEI;
        Ok(())
    }
}
