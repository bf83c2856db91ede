//! Non-Exit Penalty Decay
//!
//! A B-NFT holder who delays the consensus-layer exit after the T-NFT side
//! requested one forfeits part of their principal. The charge compounds
//! daily against a fixed cap and is computed in gwei with fixed-point
//! basis-point arithmetic.

use crate::core::{Gwei, FULL_STAKE_GWEI, GWEI_PER_ETH};
use serde::{Deserialize, Serialize};

/// Seconds per penalty day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Elapsed days beyond which the full cap is charged
pub const MAX_PENALTY_DAYS: u64 = 365;

/// Days compounded per fixed-point exponentiation step. Chunking keeps the
/// exponent small enough that the intermediate product fits in a u128 while
/// avoiding the precision loss of single-day compounding.
const PENALTY_CHUNK_DAYS: u64 = 7;

/// Basis-point denominator
const BPS_DENOMINATOR: u64 = 10_000;

/// Configuration for the non-exit penalty
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Daily compounding rate (basis points)
    pub daily_rate_bps: u32,
    /// Maximum charge per validator (gwei); bounded by one full principal
    pub principal_cap_gwei: Gwei,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            daily_rate_bps: 300,              // 3% per day
            principal_cap_gwei: GWEI_PER_ETH, // 1 ETH
        }
    }
}

/// Compute the non-exit penalty in gwei.
///
/// `exit_request_timestamp == 0` means no exit was ever requested, so no
/// penalty accrues. Elapsed days past [`MAX_PENALTY_DAYS`] charge the full
/// cap. Otherwise the remaining (unforfeited) amount decays by
/// `(10000 - rate)^k / 10000^k` in chunks of up to [`PENALTY_CHUNK_DAYS`]
/// days, and the penalty is the cap minus what remains.
pub fn non_exit_penalty_gwei(
    config: &PenaltyConfig,
    exit_request_timestamp: u64,
    exit_timestamp: u64,
) -> Gwei {
    if exit_request_timestamp == 0 {
        return 0;
    }
    // Cap bounded by one full principal so the chunked product fits in u128
    let cap = config.principal_cap_gwei.min(FULL_STAKE_GWEI);

    let start = exit_request_timestamp.min(exit_timestamp);
    let mut days_left = (exit_timestamp - start) / SECONDS_PER_DAY;
    if days_left > MAX_PENALTY_DAYS {
        return cap;
    }

    let keep_bps = BPS_DENOMINATOR.saturating_sub(config.daily_rate_bps as u64) as u128;
    let mut remaining = cap as u128;
    while days_left > 0 {
        let chunk = days_left.min(PENALTY_CHUNK_DAYS) as u32;
        remaining = remaining * keep_bps.pow(chunk) / (BPS_DENOMINATOR as u128).pow(chunk);
        days_left -= chunk as u64;
    }

    cap.saturating_sub(remaining as Gwei)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(daily_rate_bps: u32, cap_gwei: Gwei) -> PenaltyConfig {
        PenaltyConfig {
            daily_rate_bps,
            principal_cap_gwei: cap_gwei,
        }
    }

    fn penalty_after_days(cfg: &PenaltyConfig, days: u64) -> Gwei {
        let request = 1_000_000;
        non_exit_penalty_gwei(cfg, request, request + days * SECONDS_PER_DAY)
    }

    #[test]
    fn test_no_request_no_penalty() {
        let cfg = PenaltyConfig::default();
        assert_eq!(non_exit_penalty_gwei(&cfg, 0, 1_000_000), 0);
    }

    #[test]
    fn test_same_day_exit_no_penalty() {
        let cfg = PenaltyConfig::default();
        assert_eq!(penalty_after_days(&cfg, 0), 0);
    }

    #[test]
    fn test_request_after_exit_clamps_to_zero_days() {
        // A request timestamp later than the exit counts as zero elapsed days
        let cfg = PenaltyConfig::default();
        assert_eq!(non_exit_penalty_gwei(&cfg, 2_000_000, 1_000_000), 0);
    }

    #[test]
    fn test_full_cap_after_a_year() {
        let cfg = PenaltyConfig::default();
        assert_eq!(penalty_after_days(&cfg, 366), cfg.principal_cap_gwei);
        assert_eq!(penalty_after_days(&cfg, 10_000), cfg.principal_cap_gwei);
    }

    #[test]
    fn test_ten_day_penalty_matches_single_exponent() {
        // 300 bps over 10 days, 1 ETH cap: the 7+3 chunked computation must
        // agree with one 0.97^10 exponent within integer rounding.
        let cfg = config(300, GWEI_PER_ETH);
        let chunked = penalty_after_days(&cfg, 10);
        let expected = GWEI_PER_ETH as f64 * (1.0 - 0.97f64.powi(10));
        let diff = (chunked as f64 - expected).abs();
        assert!(diff <= 2.0, "chunked {chunked} vs single-exponent {expected}");
    }

    #[test]
    fn test_penalty_monotone_and_capped() {
        let cfg = config(300, GWEI_PER_ETH);
        let mut previous = 0;
        for days in 0..=400 {
            let penalty = penalty_after_days(&cfg, days);
            assert!(penalty >= previous, "penalty decreased at day {days}");
            assert!(penalty <= cfg.principal_cap_gwei);
            previous = penalty;
        }
        assert_eq!(previous, cfg.principal_cap_gwei);
    }

    #[test]
    fn test_zero_rate_charges_nothing() {
        let cfg = config(0, GWEI_PER_ETH);
        assert_eq!(penalty_after_days(&cfg, 30), 0);
        assert_eq!(penalty_after_days(&cfg, 365), 0);
        // Beyond the decay window the cap applies regardless of rate
        assert_eq!(penalty_after_days(&cfg, 366), GWEI_PER_ETH);
    }

    #[test]
    fn test_cap_bounded_by_full_principal() {
        let cfg = config(10_000, 100 * FULL_STAKE_GWEI);
        assert_eq!(penalty_after_days(&cfg, 1), FULL_STAKE_GWEI);
    }

    #[test]
    fn test_one_day_single_chunk() {
        // 3% of 1 ETH after one day
        let cfg = config(300, GWEI_PER_ETH);
        assert_eq!(penalty_after_days(&cfg, 1), 30_000_000);
    }
}
