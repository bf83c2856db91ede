//! Core Types for the Withdrawal Safe
//!
//! Shared primitives: account addresses, validator identifiers, the
//! wei/gwei unit constants, and the crate-wide error enum.

pub mod error;
pub mod types;

pub use error::SafeError;
pub use types::{
    gwei_to_wei, Address, Gwei, ValidatorId, Wei, ETHER, EXIT_PRINCIPAL_FLOOR_WEI,
    FULL_STAKE_GWEI, FULL_STAKE_WEI, GWEI_PER_ETH, WEI_PER_GWEI,
};
