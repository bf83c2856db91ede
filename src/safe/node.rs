//! Withdrawal Safe
//!
//! The per-safe facade: one mutex-guarded state instance plus the injected
//! external services. Every entry point runs to completion under the lock,
//! so the conservation invariants checked at the end of an operation are
//! never observed violated mid-call. Cross-safe operations are independent;
//! there is no global lock.
//!
//! Only the orchestrator may invoke mutating operations. Per-validator
//! metadata (phase, exit timestamps, beacon balance) arrives from the
//! orchestrator as a [`ValidatorInfo`] on each call and is never persisted
//! here for multi-validator safes.

use crate::core::{gwei_to_wei, Address, Gwei, SafeError, ValidatorId, Wei, FULL_STAKE_WEI};
use crate::external::ConsensusBalanceSource;
use crate::payout::penalty::{non_exit_penalty_gwei, PenaltyConfig};
use crate::payout::splitter::{
    decompose, principal_only_split, rewards_only_split, split, PayoutShares, RewardSplit,
};
use crate::restaking::delegation::{DelegationService, QueuedWithdrawal, RequestId};
use crate::restaking::tracker::{RestakingTracker, WithdrawalLedger};
use crate::safe::phase::{validate_transition, ValidatorInfo, ValidatorPhase};
use crate::safe::registry::SafeCounters;
use crate::safe::state::{LegacySafe, SafeState};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// State guarded by the per-safe lock
struct SafeInner {
    state: SafeState,
    restaking_enabled: bool,
    tracker: RestakingTracker,
}

/// Accounting unit for one or more validators sharing the same economic
/// beneficiaries
pub struct WithdrawalSafe {
    /// The safe's own account address
    address: Address,
    /// Sole caller authorized to mutate
    orchestrator: Address,
    /// Delegation strategy withdrawn from on exit
    beacon_strategy: Address,
    /// External delegation-layer service
    delegation: Arc<dyn DelegationService>,
    inner: Mutex<SafeInner>,
}

impl WithdrawalSafe {
    /// Create a fresh multi-validator (version 1) safe
    pub fn new(
        address: Address,
        orchestrator: Address,
        beacon_strategy: Address,
        delegation: Arc<dyn DelegationService>,
    ) -> Self {
        Self {
            address,
            orchestrator,
            beacon_strategy,
            delegation,
            inner: Mutex::new(SafeInner {
                state: SafeState::default(),
                restaking_enabled: false,
                tracker: RestakingTracker::new(),
            }),
        }
    }

    /// Reconstruct a pre-migration (version 0) safe from its legacy state
    pub fn from_legacy(
        address: Address,
        orchestrator: Address,
        beacon_strategy: Address,
        delegation: Arc<dyn DelegationService>,
        legacy: LegacySafe,
        restaking_enabled: bool,
    ) -> Self {
        Self {
            address,
            orchestrator,
            beacon_strategy,
            delegation,
            inner: Mutex::new(SafeInner {
                state: SafeState::Legacy(legacy),
                restaking_enabled,
                tracker: RestakingTracker::new(),
            }),
        }
    }

    fn authorize(&self, caller: Address) -> Result<(), SafeError> {
        if caller != self.orchestrator {
            return Err(SafeError::Authorization);
        }
        Ok(())
    }

    /// The safe's own address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Version tag: 0 before migration, 1 after
    pub fn version(&self) -> u8 {
        self.inner.lock().state.version()
    }

    /// Whether restaking is enabled for this safe
    pub fn restaking_enabled(&self) -> bool {
        self.inner.lock().restaking_enabled
    }

    /// Active-member count; derived from the single phase field for
    /// legacy safes
    pub fn num_associated_validators(&self) -> u32 {
        self.inner.lock().state.num_associated()
    }

    /// Aggregate counters, derived for legacy safes
    pub fn counters(&self) -> SafeCounters {
        self.inner.lock().state.effective_counters()
    }

    /// Check membership of a validator (always false before migration)
    pub fn is_member(&self, id: ValidatorId) -> bool {
        match &self.inner.lock().state {
            SafeState::Legacy(legacy) => legacy.validator_id == Some(id),
            SafeState::Modern(modern) => modern.validators.contains(id),
        }
    }

    /// Current restaking withdrawal ledger
    pub fn withdrawal_ledger(&self) -> WithdrawalLedger {
        self.inner.lock().tracker.ledger()
    }

    /// Block at which the restaking-layer exit was observed for a validator
    pub fn exit_observed_at(&self, id: ValidatorId) -> Option<u64> {
        self.inner.lock().tracker.exit_observed_at(id)
    }

    /// Register a validator into the safe.
    ///
    /// All members of one safe share a restaking mode: registering with a
    /// flag that disagrees with an existing membership fails. When
    /// restaking is requested, the delegation-layer account is created
    /// idempotently before any local state changes.
    pub fn register_validator(
        &self,
        caller: Address,
        id: ValidatorId,
        enable_restaking: bool,
    ) -> Result<(), SafeError> {
        self.authorize(caller)?;
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let modern = inner.state.modern_mut()?;

        if !modern.validators.is_empty() && inner.restaking_enabled != enable_restaking {
            return Err(SafeError::State("mixed restaking modes within one safe"));
        }

        if enable_restaking {
            self.delegation.ensure_account(self.address)?;
        }

        modern.validators.insert(id)?;
        if modern.validators.len() == 1 {
            inner.restaking_enabled = enable_restaking;
        }
        debug!(validator_id = id, enable_restaking, "registered validator");
        Ok(())
    }

    /// Remove a validator, returning whether the safe is now empty and
    /// recyclable for a different validator group.
    ///
    /// Only fully-withdrawn or never-initialized validators may leave. A
    /// fully-withdrawn validator settles the exited counter; an outstanding
    /// exit request settles with it. On full vacancy the restaking flag is
    /// cleared and the validator's exit marker reset.
    pub fn deregister_validator(
        &self,
        caller: Address,
        id: ValidatorId,
        info: &ValidatorInfo,
    ) -> Result<bool, SafeError> {
        self.authorize(caller)?;
        if info.phase != ValidatorPhase::FullyWithdrawn
            && info.phase != ValidatorPhase::NotInitialized
        {
            return Err(SafeError::State("validator must be fully withdrawn to deregister"));
        }

        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let modern = inner.state.modern_mut()?;

        modern.validators.swap_remove(id)?;
        modern.counters.settle_deregistration(
            info.phase == ValidatorPhase::FullyWithdrawn,
            info.exit_request_timestamp > 0,
        );

        let empty = modern.validators.is_empty();
        if empty {
            inner.restaking_enabled = false;
            inner.tracker.clear_exit_marker(id);
        }
        debug!(validator_id = id, empty, "deregistered validator");
        Ok(empty)
    }

    /// Record a reported phase transition and adjust aggregate counters.
    ///
    /// Arrival at `Live` grows the associated set; exits go through
    /// [`WithdrawalSafe::process_exit`] instead, which applies the same
    /// transition plus the restaking bookkeeping.
    pub fn record_phase_transition(
        &self,
        caller: Address,
        from: ValidatorPhase,
        to: ValidatorPhase,
    ) -> Result<(), SafeError> {
        self.authorize(caller)?;
        let mut inner = self.inner.lock();
        Self::apply_transition(&mut inner.state, from, to)
    }

    /// Record a B-NFT-holder exit request
    pub fn record_exit_request(&self, caller: Address, timestamp: u64) -> Result<(), SafeError> {
        self.authorize(caller)?;
        let mut inner = self.inner.lock();
        match &mut inner.state {
            SafeState::Legacy(legacy) => {
                if legacy.exit_request_timestamp != 0 {
                    return Err(SafeError::State("exit already requested"));
                }
                legacy.exit_request_timestamp = timestamp;
            }
            SafeState::Modern(modern) => modern.counters.record_exit_request(),
        }
        Ok(())
    }

    /// Process a consensus-layer exit: validates the transition, bumps the
    /// exited counter, and records the restaking exit marker when restaking
    /// is enabled.
    pub fn process_exit(
        &self,
        caller: Address,
        id: ValidatorId,
        info: &ValidatorInfo,
        exit_timestamp: u64,
        observed_block: u64,
    ) -> Result<(), SafeError> {
        self.authorize(caller)?;
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        Self::apply_transition(&mut inner.state, info.phase, ValidatorPhase::Exited)?;
        if let SafeState::Legacy(legacy) = &mut inner.state {
            legacy.exit_timestamp = exit_timestamp;
        }
        if inner.restaking_enabled {
            inner.tracker.mark_exit_observed(id, observed_block);
        }
        debug!(validator_id = id, observed_block, "processed validator exit");
        Ok(())
    }

    fn apply_transition(
        state: &mut SafeState,
        from: ValidatorPhase,
        to: ValidatorPhase,
    ) -> Result<(), SafeError> {
        validate_transition(from, to)?;
        match state {
            SafeState::Legacy(legacy) => {
                if legacy.phase != from {
                    return Err(SafeError::State("reported phase does not match stored state"));
                }
                legacy.phase = to;
            }
            SafeState::Modern(modern) => match to {
                ValidatorPhase::Live => modern.counters.record_live(),
                ValidatorPhase::Exited => modern.counters.record_exit()?,
                _ => {}
            },
        }
        Ok(())
    }

    /// Queue a full-principal restaking withdrawal for any unclaimed
    /// withdrawable amount
    pub fn queue_restaking_withdrawal(
        &self,
        caller: Address,
        current_block: u64,
        withdrawable_gwei: Gwei,
    ) -> Result<Vec<RequestId>, SafeError> {
        self.authorize(caller)?;
        let mut inner = self.inner.lock();
        if !inner.restaking_enabled {
            return Err(SafeError::State("restaking not enabled for this safe"));
        }
        inner.tracker.queue_full_withdrawal(
            self.address,
            self.beacon_strategy,
            current_block,
            withdrawable_gwei,
            self.delegation.as_ref(),
        )
    }

    /// Complete queued restaking withdrawals
    pub fn complete_restaking_withdrawals(
        &self,
        caller: Address,
        batch: &[QueuedWithdrawal],
        as_tokens: bool,
    ) -> Result<Gwei, SafeError> {
        self.authorize(caller)?;
        let mut inner = self.inner.lock();
        inner
            .tracker
            .complete_withdrawals(self.address, batch, as_tokens, self.delegation.as_ref())
    }

    /// Release one completed full-principal unit for beneficiary payout
    pub fn release_exited_principal(&self, caller: Address) -> Result<(), SafeError> {
        self.authorize(caller)?;
        self.inner.lock().tracker.release_full_principal()
    }

    /// Migrate the safe from the single-validator to the multi-validator
    /// representation. Idempotent; returns whether a migration ran.
    pub fn migrate(&self, caller: Address) -> Result<bool, SafeError> {
        self.authorize(caller)?;
        Ok(self.inner.lock().state.migrate())
    }

    /// Payout shares for one validator's full withdrawal.
    ///
    /// A safe holding a single member runs the full rewards/principal
    /// decomposition over `balance_wei`. With multiple members only the
    /// exiting member's capped principal is split; rewards stay pooled for
    /// the remaining members.
    pub fn full_withdrawal_payouts(
        &self,
        balance_wei: Wei,
        info: &ValidatorInfo,
        split_config: &RewardSplit,
        penalty_config: &PenaltyConfig,
    ) -> Result<PayoutShares, SafeError> {
        let inner = self.inner.lock();
        let counters = inner.state.effective_counters();
        drop(inner);

        let penalty_wei = gwei_to_wei(non_exit_penalty_gwei(
            penalty_config,
            info.exit_request_timestamp,
            info.exit_timestamp,
        ));

        if counters.num_associated_validators > 1 {
            let principal = balance_wei.min(FULL_STAKE_WEI);
            principal_only_split(principal, penalty_wei)
        } else {
            let breakdown = decompose(
                balance_wei,
                info.beacon_balance_gwei,
                info.phase,
                counters.num_associated_validators,
                counters.num_exited_validators,
            )?;
            split(breakdown, split_config, penalty_wei)
        }
    }

    /// Total value locked per beneficiary class, over a balance of the
    /// caller's choice (total or only-withdrawable)
    pub fn calculate_tvl(
        &self,
        balance_wei: Wei,
        info: &ValidatorInfo,
        split_config: &RewardSplit,
        penalty_config: &PenaltyConfig,
    ) -> Result<PayoutShares, SafeError> {
        let counters = self.inner.lock().state.effective_counters();
        let penalty_wei = gwei_to_wei(non_exit_penalty_gwei(
            penalty_config,
            info.exit_request_timestamp,
            info.exit_timestamp,
        ));
        let breakdown = decompose(
            balance_wei,
            info.beacon_balance_gwei,
            info.phase,
            counters.num_associated_validators,
            counters.num_exited_validators,
        )?;
        split(breakdown, split_config, penalty_wei)
    }

    /// [`WithdrawalSafe::calculate_tvl`] with the consensus-layer balance
    /// read from the injected source instead of the orchestrator's record
    pub fn calculate_tvl_from_source(
        &self,
        balance_wei: Wei,
        id: ValidatorId,
        info: &ValidatorInfo,
        source: &dyn ConsensusBalanceSource,
        split_config: &RewardSplit,
        penalty_config: &PenaltyConfig,
    ) -> Result<PayoutShares, SafeError> {
        let mut info = *info;
        info.beacon_balance_gwei = source.validator_balance_gwei(id);
        self.calculate_tvl(balance_wei, &info, split_config, penalty_config)
    }

    /// Payout shares for a rewards-only skim of the execution-layer balance
    pub fn rewards_payouts(
        &self,
        rewards_wei: Wei,
        split_config: &RewardSplit,
    ) -> Result<PayoutShares, SafeError> {
        rewards_only_split(rewards_wei, split_config)
    }
}
