//! External Collaborator Interfaces
//!
//! Narrow contracts for the services the safe consumes but does not
//! implement: the consensus-layer balance source, the legacy
//! withdrawal-claim router being phased out, and the fund-transfer
//! primitive behind beneficiary distribution. All are injected
//! capability-style so the accounting engine tests against deterministic
//! fakes.

use crate::core::{Address, Gwei, SafeError, ValidatorId, Wei};
use crate::payout::splitter::PayoutShares;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Read-only consensus-layer balance source
pub trait ConsensusBalanceSource: Send + Sync {
    /// Current beacon-layer balance for a validator
    fn validator_balance_gwei(&self, id: ValidatorId) -> Gwei;
}

/// A withdrawal claim queued in the legacy router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingClaim {
    /// Claim amount (wei)
    pub amount_wei: Wei,
}

/// Legacy withdrawal-claim router, being phased out
pub trait LegacyClaimRouter: Send + Sync {
    /// Claims queued for an account but not yet withdrawable
    fn list_pending(&self, account: Address) -> Vec<PendingClaim>;

    /// Claims ready to withdraw for an account
    fn list_claimable(&self, account: Address) -> Vec<PendingClaim>;

    /// Claim up to `max_claims` withdrawable entries, returning the number
    /// claimed
    fn claim(&self, account: Address, max_claims: usize) -> Result<usize, SafeError>;
}

/// Fund-transfer primitive. A failed transfer reports an error and leaves
/// no partial effect.
pub trait FundTransfer: Send + Sync {
    /// Transfer `amount_wei` to `to`
    fn transfer(&self, to: Address, amount_wei: Wei) -> Result<(), SafeError>;
}

/// Beneficiary addresses for one distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecipients {
    /// Node operator
    pub operator: Address,
    /// T-NFT holder
    pub tnft: Address,
    /// B-NFT holder
    pub bnft: Address,
    /// Protocol treasury
    pub treasury: Address,
}

/// Distribute payout shares to their recipients.
///
/// Operator and NFT-holder transfers are best-effort: a failure redirects
/// that share to the treasury instead of aborting. The treasury transfer
/// itself must succeed, or the whole distribution fails with
/// [`SafeError::Transfer`]. Zero shares are skipped.
pub fn distribute_payouts(
    transfer: &dyn FundTransfer,
    recipients: &PayoutRecipients,
    shares: &PayoutShares,
) -> Result<(), SafeError> {
    let mut treasury_amount = shares.treasury;
    let best_effort = [
        (recipients.operator, shares.operator),
        (recipients.tnft, shares.tnft),
        (recipients.bnft, shares.bnft),
    ];
    for (to, amount) in best_effort {
        if amount == 0 {
            continue;
        }
        if transfer.transfer(to, amount).is_err() {
            warn!(recipient = %to, amount_wei = amount, "transfer failed, redirecting to treasury");
            treasury_amount += amount;
        }
    }
    if treasury_amount > 0 {
        transfer
            .transfer(recipients.treasury, treasury_amount)
            .map_err(|_| SafeError::Transfer)?;
    }
    Ok(())
}

/// Claim withdrawable entries from the legacy router for an account,
/// bounded by `max_claims`
pub fn sweep_claims(
    router: &dyn LegacyClaimRouter,
    account: Address,
    max_claims: usize,
) -> Result<usize, SafeError> {
    if router.list_claimable(account).is_empty() {
        return Ok(0);
    }
    router.claim(account, max_claims)
}

/// Execution-layer balance that can be withdrawn right now: the local
/// balance plus whatever the legacy router has made claimable
pub fn withdrawable_balance(
    local_balance_wei: Wei,
    router: &dyn LegacyClaimRouter,
    account: Address,
) -> Wei {
    let claimable: Wei = router
        .list_claimable(account)
        .iter()
        .map(|claim| claim.amount_wei)
        .sum();
    local_balance_wei + claimable
}

/// Total execution-layer balance attributable to an account, including
/// router entries still pending
pub fn total_balance(local_balance_wei: Wei, router: &dyn LegacyClaimRouter, account: Address) -> Wei {
    let pending: Wei = router
        .list_pending(account)
        .iter()
        .map(|claim| claim.amount_wei)
        .sum();
    withdrawable_balance(local_balance_wei, router, account) + pending
}
