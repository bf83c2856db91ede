//! Restaking Delegation Interface
//!
//! Capability-style contract for the external delegation layer. The safe
//! never talks to the protocol directly; it queues and completes
//! withdrawals through an injected service so the tracker can be tested
//! against deterministic fakes. Request identifiers are content hashes of
//! the request itself, making duplicate submissions detectable.

use crate::core::{Address, Gwei, SafeError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content-addressed withdrawal request identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub [u8; 32]);

impl RequestId {
    /// Get the bytes of the identifier
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A withdrawal queued against the delegation layer.
///
/// The safe is both requester and recipient of its own withdrawals; the
/// tracker rejects completion batches where either differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedWithdrawal {
    /// Account that queued the withdrawal
    pub staker: Address,
    /// Account receiving the withdrawn amount
    pub withdrawer: Address,
    /// Delegation strategy being withdrawn from
    pub strategy: Address,
    /// Withdrawn shares in the layer's native unit
    pub shares_gwei: Gwei,
    /// Block number at which the withdrawal was queued
    pub start_block: u64,
    /// Per-safe request nonce
    pub nonce: u64,
}

impl QueuedWithdrawal {
    /// Deterministic content hash of the request
    pub fn request_id(&self) -> RequestId {
        let encoded = bincode::serialize(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        RequestId(bytes)
    }
}

/// External delegation-layer service consumed by the tracker.
///
/// Calls are synchronous and all-or-nothing: a failure must leave no
/// partial effect, and the tracker orders its own ledger mutations after
/// these calls so a failed call aborts the whole operation.
pub trait DelegationService: Send + Sync {
    /// Ensure a delegation account exists for `owner`. Idempotent.
    fn ensure_account(&self, owner: Address) -> Result<(), SafeError>;

    /// Queue a withdrawal, returning its content-addressed identifiers
    fn queue_withdrawal(&self, request: &QueuedWithdrawal) -> Result<Vec<RequestId>, SafeError>;

    /// Complete previously queued withdrawals. `as_tokens` releases the
    /// funds; otherwise the shares are re-delegated. Returns the amount
    /// transferred.
    fn complete_withdrawal(
        &self,
        ids: &[RequestId],
        proof_indices: &[usize],
        as_tokens: bool,
    ) -> Result<Gwei, SafeError>;
}
