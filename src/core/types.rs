//! Core value types and protocol units
//!
//! The safe reconciles two external subsystems that account in different
//! units: the execution layer (wei) and the consensus/restaking layer
//! (gwei). Amounts are kept in the unit of the subsystem that owns them
//! and converted at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution-layer amount (wei)
pub type Wei = u128;

/// Consensus/restaking-layer amount (gwei)
pub type Gwei = u64;

/// Protocol-level validator identifier
pub type ValidatorId = u64;

/// Wei per gwei
pub const WEI_PER_GWEI: Wei = 1_000_000_000;

/// Gwei per ETH
pub const GWEI_PER_ETH: Gwei = 1_000_000_000;

/// One ETH in wei
pub const ETHER: Wei = 1_000_000_000_000_000_000;

/// Full validator principal (32 ETH) in gwei
pub const FULL_STAKE_GWEI: Gwei = 32 * GWEI_PER_ETH;

/// Full validator principal (32 ETH) in wei
pub const FULL_STAKE_WEI: Wei = 32 * ETHER;

/// Guaranteed principal floor for an exited validator (16 ETH) in wei
pub const EXIT_PRINCIPAL_FLOOR_WEI: Wei = 16 * ETHER;

/// Convert a gwei amount to wei
pub fn gwei_to_wei(amount: Gwei) -> Wei {
    amount as Wei * WEI_PER_GWEI
}

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Create a new address from bytes
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Create a zero address
    pub fn zero() -> Self {
        Address([0u8; 20])
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Get the bytes of the address
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_constants() {
        assert_eq!(gwei_to_wei(GWEI_PER_ETH), ETHER);
        assert_eq!(gwei_to_wei(FULL_STAKE_GWEI), FULL_STAKE_WEI);
        assert_eq!(EXIT_PRINCIPAL_FLOOR_WEI * 2, FULL_STAKE_WEI);
    }

    #[test]
    fn test_address_zero() {
        assert!(Address::zero().is_zero());
        assert!(!Address::new([1u8; 20]).is_zero());
    }

    #[test]
    fn test_address_hex() {
        let addr = Address::new([0xab; 20]);
        assert_eq!(addr.to_hex().len(), 40);
        assert!(addr.to_string().starts_with("0xabab"));
    }
}
