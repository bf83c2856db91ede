//! Versioned Safe State
//!
//! A safe created before the multi-validator upgrade (version 0) is bound
//! 1:1 to a single validator and carries its phase and exit timestamps
//! directly. Version 1 safes share aggregate counters across many
//! validators. The two representations live in one tagged variant so every
//! counter read dispatches on the tag instead of branching on a raw
//! version integer, and v0 state is never rewritten except by the one-shot
//! migration.

use crate::core::{SafeError, ValidatorId};
use crate::safe::phase::ValidatorPhase;
use crate::safe::registry::{SafeCounters, ValidatorSet};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Legacy (version 0) single-validator state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacySafe {
    /// The single bound validator, if any
    pub validator_id: Option<ValidatorId>,
    /// Phase of the bound validator
    pub phase: ValidatorPhase,
    /// Timestamp of the exit request (0 = never requested)
    pub exit_request_timestamp: u64,
    /// Timestamp of the consensus-layer exit (0 = not exited)
    pub exit_timestamp: u64,
}

/// Modern (version 1) multi-validator state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModernSafe {
    /// Member validators
    pub validators: ValidatorSet,
    /// Aggregate counters
    pub counters: SafeCounters,
}

/// Tagged safe representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SafeState {
    /// Version 0: single-validator binding with legacy fields
    Legacy(LegacySafe),
    /// Version 1: multi-validator counters
    Modern(ModernSafe),
}

impl Default for SafeState {
    fn default() -> Self {
        SafeState::Modern(ModernSafe::default())
    }
}

impl SafeState {
    /// Version tag: 0 for legacy, 1 for modern
    pub fn version(&self) -> u8 {
        match self {
            SafeState::Legacy(_) => 0,
            SafeState::Modern(_) => 1,
        }
    }

    /// Active-member count.
    ///
    /// Legacy safes derive the count from the single phase field (0 or 1)
    /// rather than a counter; that dual path is preserved exactly because
    /// v0 state is never rewritten outside migration.
    pub fn num_associated(&self) -> u32 {
        match self {
            SafeState::Legacy(legacy) => legacy.phase.is_associated() as u32,
            SafeState::Modern(modern) => modern.counters.num_associated_validators,
        }
    }

    /// Counters as seen by the payout engine, derived for legacy safes
    pub fn effective_counters(&self) -> SafeCounters {
        match self {
            SafeState::Legacy(legacy) => SafeCounters {
                num_associated_validators: legacy.phase.is_associated() as u32,
                num_exit_requests_by_bnft_holder: (legacy.exit_request_timestamp > 0) as u32,
                num_exited_validators: (legacy.phase == ValidatorPhase::Exited) as u32,
            },
            SafeState::Modern(modern) => modern.counters,
        }
    }

    /// Mutable access to the modern representation, failing for v0 safes
    pub fn modern_mut(&mut self) -> Result<&mut ModernSafe, SafeError> {
        match self {
            SafeState::Modern(modern) => Ok(modern),
            SafeState::Legacy(_) => Err(SafeError::State("safe not migrated to multi-validator version")),
        }
    }

    /// Shared access to the modern representation, failing for v0 safes
    pub fn modern(&self) -> Result<&ModernSafe, SafeError> {
        match self {
            SafeState::Modern(modern) => Ok(modern),
            SafeState::Legacy(_) => Err(SafeError::State("safe not migrated to multi-validator version")),
        }
    }

    /// One-shot migration from the single-validator to the multi-validator
    /// representation. Idempotent: returns `false` without touching state
    /// when already at version 1.
    ///
    /// A bound validator is registered into the v1 set, and the counters are
    /// seeded exactly once from the implied legacy state: an outstanding
    /// exit request or a completed exit that predates the migration shows up
    /// in the v1 counters.
    pub fn migrate(&mut self) -> bool {
        let legacy = match self {
            SafeState::Modern(_) => return false,
            SafeState::Legacy(legacy) => legacy.clone(),
        };

        let mut modern = ModernSafe::default();
        if let Some(id) = legacy.validator_id {
            if legacy.phase != ValidatorPhase::NotInitialized {
                // Fresh set: the insert cannot collide
                let _ = modern.validators.insert(id);
            }
            modern.counters = SafeCounters {
                num_associated_validators: legacy.phase.is_associated() as u32,
                num_exit_requests_by_bnft_holder: (legacy.exit_request_timestamp > 0) as u32,
                num_exited_validators: (legacy.phase == ValidatorPhase::Exited) as u32,
            };
            info!(
                validator_id = id,
                phase = ?legacy.phase,
                "migrated single-validator safe to multi-validator state"
            );
        }
        *self = SafeState::Modern(modern);
        true
    }
}
