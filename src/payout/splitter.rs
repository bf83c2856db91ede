//! TVL Decomposition and Payout Split
//!
//! The central accounting algorithm. Stage one decomposes a safe's balance
//! into staking rewards and validator principal; stage two splits both
//! across the four beneficiary classes (operator, T-NFT holder, B-NFT
//! holder, treasury) and applies the non-exit penalty. The split conserves
//! value exactly: the four shares always sum to rewards plus principal,
//! and a violation is a fatal accounting error, not a recoverable
//! condition.

use crate::core::{
    gwei_to_wei, Gwei, SafeError, Wei, ETHER, EXIT_PRINCIPAL_FLOOR_WEI, FULL_STAKE_WEI,
};
use crate::safe::phase::ValidatorPhase;
use serde::{Deserialize, Serialize};

/// Balance above which rewards-only skimming is refused and a full
/// withdrawal must be processed instead (8 ETH)
pub const PARTIAL_WITHDRAWAL_LIMIT_WEI: Wei = 8 * ETHER;

/// Principal at or above which the B-NFT side recovers more than the flat
/// floor (31 ETH)
const BNFT_PREMIUM_THRESHOLD_WEI: Wei = 31 * ETHER;

/// Principal retained by the T-NFT side before the B-NFT premium (30 ETH)
const TNFT_PRINCIPAL_TARGET_WEI: Wei = 30 * ETHER;

/// Flat B-NFT principal floor (1 ETH)
const BNFT_PRINCIPAL_FLOOR_WEI: Wei = ETHER;

/// Cap on the operator's share of an applied penalty (0.2 ETH)
const OPERATOR_INCENTIVE_CAP_WEI: Wei = ETHER / 5;

/// Proportional weights for splitting staking rewards.
///
/// Weights are relative; only their ratio matters. A zero sum is rejected
/// at split time. Principal is never split by these weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardSplit {
    /// Node operator weight
    pub operator: u32,
    /// T-NFT holder weight
    pub tnft: u32,
    /// B-NFT holder weight
    pub bnft: u32,
    /// Protocol treasury weight
    pub treasury: u32,
}

impl RewardSplit {
    /// Sum of the four weights
    pub fn total(&self) -> u64 {
        self.operator as u64 + self.tnft as u64 + self.bnft as u64 + self.treasury as u64
    }
}

impl Default for RewardSplit {
    fn default() -> Self {
        Self {
            operator: 5,   // 5%
            tnft: 29,      // 29%
            bnft: 29,      // 29%
            treasury: 37,  // 37%
        }
    }
}

/// Final payout per beneficiary class (wei)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutShares {
    /// Node operator
    pub operator: Wei,
    /// T-NFT holder
    pub tnft: Wei,
    /// B-NFT holder
    pub bnft: Wei,
    /// Protocol treasury
    pub treasury: Wei,
}

impl PayoutShares {
    /// Sum of the four shares
    pub fn total(&self) -> Wei {
        self.operator + self.tnft + self.bnft + self.treasury
    }
}

/// A safe balance decomposed into its economic components (wei)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBreakdown {
    /// Accrued staking rewards, execution plus consensus layer
    pub staking_rewards: Wei,
    /// The validator's staked capital, within the 16-32 ETH band
    pub principal: Wei,
}

/// Decompose one validator's share of a safe balance into staking rewards
/// and principal.
///
/// `balance_wei` is the execution-layer balance the caller chose to account
/// (total or only-withdrawable). Exited validators' principal is financed
/// first from the guaranteed 16 ETH floor, then from any surplus up to the
/// 32 ETH ceiling; whatever execution-layer balance remains is divided
/// evenly across all associated members as rewards. Consensus-layer rewards
/// are any beacon balance above the full 32 ETH stake.
pub fn decompose(
    balance_wei: Wei,
    beacon_balance_gwei: Gwei,
    phase: ValidatorPhase,
    num_associated: u32,
    num_exited: u32,
) -> Result<ValueBreakdown, SafeError> {
    if num_associated == 0 {
        return Err(SafeError::State("no associated validators to account"));
    }

    let exited_floor = EXIT_PRINCIPAL_FLOOR_WEI * num_exited as Wei;
    if balance_wei < exited_floor {
        return Err(SafeError::InsufficientBalance {
            required: exited_floor,
            available: balance_wei,
        });
    }

    // Exited principal: guaranteed floor first, surplus up to the ceiling
    let surplus = balance_wei - exited_floor;
    let total_exited_principal = exited_floor + surplus.min(exited_floor);

    let execution_rewards = balance_wei - total_exited_principal;
    let execution_reward_share = execution_rewards / num_associated as Wei;

    let beacon_wei = gwei_to_wei(beacon_balance_gwei);
    let consensus_rewards = beacon_wei.saturating_sub(FULL_STAKE_WEI);
    let staking_rewards = execution_reward_share + consensus_rewards;

    let principal = match phase {
        ValidatorPhase::Exited => {
            if beacon_wei != 0 {
                return Err(SafeError::State(
                    "exited validator still holds a consensus-layer balance",
                ));
            }
            if num_exited == 0 {
                return Err(SafeError::State("no exited validators recorded"));
            }
            total_exited_principal / num_exited as Wei
        }
        ValidatorPhase::Live | ValidatorPhase::BeingSlashed => beacon_wei - consensus_rewards,
        _ => return Err(SafeError::State("validator phase carries no principal")),
    };

    if !(EXIT_PRINCIPAL_FLOOR_WEI..=FULL_STAKE_WEI).contains(&principal) {
        return Err(SafeError::IncorrectAmount("principal outside the 16-32 ETH band"));
    }

    Ok(ValueBreakdown {
        staking_rewards,
        principal,
    })
}

/// Split a decomposed balance across the four beneficiary classes.
///
/// Rewards split proportionally by weight with the treasury absorbing the
/// rounding remainder. Principal splits by the fixed rule: the B-NFT side
/// takes everything above 30 ETH when principal reaches 31 ETH, otherwise a
/// flat 1 ETH floor, with the T-NFT side taking the remainder. The non-exit
/// penalty then moves value out of the B-NFT share: up to 0.2 ETH of it
/// incentivizes the operator, the rest goes to the treasury.
pub fn split(
    breakdown: ValueBreakdown,
    config: &RewardSplit,
    penalty_wei: Wei,
) -> Result<PayoutShares, SafeError> {
    let rewards = breakdown.staking_rewards;
    let mut shares = split_rewards(rewards, config)?;

    let (bnft_principal, tnft_principal) = split_principal(breakdown.principal);
    shares.bnft += bnft_principal;
    shares.tnft += tnft_principal;

    apply_penalty(&mut shares, penalty_wei);

    if shares.total() != rewards + breakdown.principal {
        return Err(SafeError::IncorrectAmount("payout shares do not sum to the split value"));
    }
    Ok(shares)
}

/// Split one exited member's capped principal without touching the pooled
/// rewards. The multi-validator full-withdrawal path: rewards stay in the
/// safe for the remaining members, deferring loss absorption to whichever
/// member exits last.
pub fn principal_only_split(principal_wei: Wei, penalty_wei: Wei) -> Result<PayoutShares, SafeError> {
    if !(EXIT_PRINCIPAL_FLOOR_WEI..=FULL_STAKE_WEI).contains(&principal_wei) {
        return Err(SafeError::IncorrectAmount("principal outside the 16-32 ETH band"));
    }

    let mut shares = PayoutShares::default();
    let (bnft_principal, tnft_principal) = split_principal(principal_wei);
    shares.bnft = bnft_principal;
    shares.tnft = tnft_principal;

    apply_penalty(&mut shares, penalty_wei);

    if shares.total() != principal_wei {
        return Err(SafeError::IncorrectAmount("payout shares do not sum to the split value"));
    }
    Ok(shares)
}

/// Split accrued staking rewards only, leaving all principal staked. The
/// skim path is refused once the balance is large enough to imply an exit:
/// that must go through the full-withdrawal accounting instead.
pub fn rewards_only_split(rewards_wei: Wei, config: &RewardSplit) -> Result<PayoutShares, SafeError> {
    if rewards_wei >= PARTIAL_WITHDRAWAL_LIMIT_WEI {
        return Err(SafeError::State(
            "balance too large for a rewards skim, process a full withdrawal",
        ));
    }
    let shares = split_rewards(rewards_wei, config)?;
    if shares.total() != rewards_wei {
        return Err(SafeError::IncorrectAmount("payout shares do not sum to the split value"));
    }
    Ok(shares)
}

fn split_rewards(rewards: Wei, config: &RewardSplit) -> Result<PayoutShares, SafeError> {
    let total_weight = config.total() as Wei;
    if total_weight == 0 {
        return Err(SafeError::State("reward split weights sum to zero"));
    }

    let operator = rewards * config.operator as Wei / total_weight;
    let tnft = rewards * config.tnft as Wei / total_weight;
    let bnft = rewards * config.bnft as Wei / total_weight;
    // Treasury absorbs the rounding remainder so the shares sum exactly
    let treasury = rewards - operator - tnft - bnft;

    Ok(PayoutShares {
        operator,
        tnft,
        bnft,
        treasury,
    })
}

/// Fixed principal split between the B-NFT and T-NFT sides
fn split_principal(principal: Wei) -> (Wei, Wei) {
    let bnft = if principal >= BNFT_PREMIUM_THRESHOLD_WEI {
        principal - TNFT_PRINCIPAL_TARGET_WEI
    } else {
        BNFT_PRINCIPAL_FLOOR_WEI
    };
    (bnft, principal - bnft)
}

/// Charge the non-exit penalty against the B-NFT share, routing a capped
/// incentive to the operator and the residue to the treasury
fn apply_penalty(shares: &mut PayoutShares, penalty_wei: Wei) {
    let applied = shares.bnft.min(penalty_wei);
    if applied == 0 {
        return;
    }
    let incentive = applied.min(OPERATOR_INCENTIVE_CAP_WEI);
    shares.operator += incentive;
    shares.treasury += applied - incentive;
    shares.bnft -= applied;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FULL_STAKE_GWEI, GWEI_PER_ETH};

    fn breakdown(rewards: Wei, principal: Wei) -> ValueBreakdown {
        ValueBreakdown {
            staking_rewards: rewards,
            principal,
        }
    }

    #[test]
    fn test_reward_split_with_treasury_remainder() {
        // 5/29/29/37 over 1000 wei of rewards, no penalty
        let shares = split_rewards(1000, &RewardSplit::default()).unwrap();
        assert_eq!(shares.operator, 50);
        assert_eq!(shares.tnft, 290);
        assert_eq!(shares.bnft, 290);
        assert_eq!(shares.treasury, 370);
    }

    #[test]
    fn test_reward_split_remainder_goes_to_treasury() {
        // 1001 is not divisible: 50/290/290 computed, treasury takes 371
        let shares = split_rewards(1001, &RewardSplit::default()).unwrap();
        assert_eq!(shares.operator, 50);
        assert_eq!(shares.tnft, 290);
        assert_eq!(shares.bnft, 290);
        assert_eq!(shares.treasury, 371);
        assert_eq!(shares.total(), 1001);
    }

    #[test]
    fn test_zero_weight_sum_rejected() {
        let config = RewardSplit {
            operator: 0,
            tnft: 0,
            bnft: 0,
            treasury: 0,
        };
        assert!(split_rewards(1000, &config).is_err());
    }

    #[test]
    fn test_exited_validator_decomposition() {
        // One exited validator, 33 ETH balance: principal financed 16 from
        // the floor plus min(17, 16) from the surplus = 32, leaving 1 ETH of
        // execution rewards for the single member
        let balance = 33 * ETHER;
        let breakdown = decompose(balance, 0, ValidatorPhase::Exited, 1, 1).unwrap();
        assert_eq!(breakdown.principal, 32 * ETHER);
        assert_eq!(breakdown.staking_rewards, ETHER);
    }

    #[test]
    fn test_exited_principal_floor_enforced() {
        let err = decompose(15 * ETHER, 0, ValidatorPhase::Exited, 1, 1).unwrap_err();
        assert_eq!(
            err,
            SafeError::InsufficientBalance {
                required: 16 * ETHER,
                available: 15 * ETHER,
            }
        );
    }

    #[test]
    fn test_exited_validator_with_beacon_balance_rejected() {
        let err = decompose(33 * ETHER, GWEI_PER_ETH, ValidatorPhase::Exited, 1, 1).unwrap_err();
        assert_eq!(
            err,
            SafeError::State("exited validator still holds a consensus-layer balance")
        );
    }

    #[test]
    fn test_live_validator_decomposition() {
        // 1 ETH of execution rewards, beacon at 33 ETH: consensus rewards of
        // 1 ETH, principal capped at the full 32 ETH stake
        let breakdown =
            decompose(ETHER, 33 * GWEI_PER_ETH, ValidatorPhase::Live, 1, 0).unwrap();
        assert_eq!(breakdown.staking_rewards, 2 * ETHER);
        assert_eq!(breakdown.principal, FULL_STAKE_WEI);
    }

    #[test]
    fn test_slashed_below_band_rejected() {
        // Beacon balance slashed below 16 ETH breaks the principal band
        let err = decompose(0, 15 * GWEI_PER_ETH, ValidatorPhase::BeingSlashed, 1, 0).unwrap_err();
        assert_eq!(err, SafeError::IncorrectAmount("principal outside the 16-32 ETH band"));
    }

    #[test]
    fn test_rewards_divided_across_members() {
        // 4 ETH of execution rewards pooled across 4 members
        let breakdown =
            decompose(4 * ETHER, FULL_STAKE_GWEI, ValidatorPhase::Live, 4, 0).unwrap();
        assert_eq!(breakdown.staking_rewards, ETHER);
        assert_eq!(breakdown.principal, FULL_STAKE_WEI);
    }

    #[test]
    fn test_phase_without_principal_rejected() {
        assert!(decompose(ETHER, 0, ValidatorPhase::StakeDeposited, 1, 0).is_err());
        assert!(decompose(ETHER, 0, ValidatorPhase::FullyWithdrawn, 1, 0).is_err());
    }

    #[test]
    fn test_full_split_scenario() {
        // 33 ETH exit: 1 ETH rewards split 5/29/29/37, 32 ETH principal
        // split 2/30 between B-NFT and T-NFT
        let breakdown = breakdown(ETHER, 32 * ETHER);
        let shares = split(breakdown, &RewardSplit::default(), 0).unwrap();
        assert_eq!(shares.operator, ETHER / 20);
        assert_eq!(shares.bnft, 29 * ETHER / 100 + 2 * ETHER);
        assert_eq!(shares.tnft, 29 * ETHER / 100 + 30 * ETHER);
        assert_eq!(shares.total(), 33 * ETHER);
    }

    #[test]
    fn test_principal_split_below_premium_threshold() {
        // 16 ETH principal: B-NFT absorbs the loss down to the 1 ETH floor
        let breakdown = breakdown(0, 16 * ETHER);
        let shares = split(breakdown, &RewardSplit::default(), 0).unwrap();
        assert_eq!(shares.bnft, ETHER);
        assert_eq!(shares.tnft, 15 * ETHER);
    }

    #[test]
    fn test_penalty_moves_bnft_value() {
        // 1 ETH penalty: 0.2 ETH incentivizes the operator, 0.8 ETH to the
        // treasury, all charged against the B-NFT share
        let breakdown = breakdown(0, 32 * ETHER);
        let shares = split(breakdown, &RewardSplit::default(), ETHER).unwrap();
        assert_eq!(shares.operator, ETHER / 5);
        assert_eq!(shares.treasury, 4 * ETHER / 5);
        assert_eq!(shares.bnft, ETHER);
        assert_eq!(shares.tnft, 30 * ETHER);
        assert_eq!(shares.total(), 32 * ETHER);
    }

    #[test]
    fn test_penalty_capped_by_bnft_share() {
        // Penalty larger than the whole B-NFT share: only the share moves
        let breakdown = breakdown(0, 16 * ETHER);
        let shares = split(breakdown, &RewardSplit::default(), 10 * ETHER).unwrap();
        assert_eq!(shares.bnft, 0);
        assert_eq!(shares.operator, ETHER / 5);
        assert_eq!(shares.treasury, ETHER - ETHER / 5);
        assert_eq!(shares.total(), 16 * ETHER);
    }

    #[test]
    fn test_conservation_over_swept_inputs() {
        // Conservation must hold for every accepted input combination
        let config = RewardSplit {
            operator: 7,
            tnft: 31,
            bnft: 23,
            treasury: 39,
        };
        for rewards_milli in [0u128, 1, 999, 123_456_789] {
            for principal_eth in 16..=32u128 {
                for penalty_milli in [0u128, 1, 250, 1000, 5000] {
                    let breakdown = ValueBreakdown {
                        staking_rewards: rewards_milli * ETHER / 1000,
                        principal: principal_eth * ETHER,
                    };
                    let penalty = penalty_milli * ETHER / 1000;
                    let shares = split(breakdown, &config, penalty).unwrap();
                    assert_eq!(
                        shares.total(),
                        breakdown.staking_rewards + breakdown.principal,
                        "conservation broken at rewards={rewards_milli} principal={principal_eth} penalty={penalty_milli}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_principal_only_split() {
        let shares = principal_only_split(FULL_STAKE_WEI, 0).unwrap();
        assert_eq!(shares.bnft, 2 * ETHER);
        assert_eq!(shares.tnft, 30 * ETHER);
        assert_eq!(shares.operator, 0);
        assert_eq!(shares.treasury, 0);
    }

    #[test]
    fn test_principal_only_split_band_checked() {
        assert!(principal_only_split(15 * ETHER, 0).is_err());
        assert!(principal_only_split(33 * ETHER, 0).is_err());
    }

    #[test]
    fn test_principal_only_split_with_penalty() {
        let shares = principal_only_split(FULL_STAKE_WEI, ETHER / 2).unwrap();
        assert_eq!(shares.bnft, 2 * ETHER - ETHER / 2);
        assert_eq!(shares.operator, ETHER / 5);
        assert_eq!(shares.treasury, ETHER / 2 - ETHER / 5);
        assert_eq!(shares.total(), FULL_STAKE_WEI);
    }

    #[test]
    fn test_rewards_skim_guard() {
        assert!(rewards_only_split(ETHER, &RewardSplit::default()).is_ok());
        assert_eq!(
            rewards_only_split(8 * ETHER, &RewardSplit::default()),
            Err(SafeError::State(
                "balance too large for a rewards skim, process a full withdrawal"
            ))
        );
    }
}
