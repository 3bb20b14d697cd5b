//! Broadcast validation levels and import outcomes.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Slot};
use thiserror::Error;

/// Strictness a caller requests before a block may be gossiped.
///
/// Ordered weakest to strongest so that `reached >= requested` expresses
/// "the request is satisfied".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastValidationLevel {
    /// Gossip validity only.
    #[default]
    Gossip,
    /// Full consensus validity (state transition applied).
    Consensus,
    /// Consensus validity and no equivocating block seen for the proposer.
    ConsensusAndEquivocation,
}

impl BroadcastValidationLevel {
    /// Whether a block validated at `self` may be broadcast for `requested`.
    pub fn satisfies(self, requested: BroadcastValidationLevel) -> bool {
        self >= requested
    }
}

/// Why the broadcast validation gate refused a block.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastValidationResult {
    /// Gate passed.
    #[error("success")]
    Success,
    /// Block failed gossip validation.
    #[error("gossip validation failed")]
    GossipFailure,
    /// Block failed consensus validation.
    #[error("consensus validation failed")]
    ConsensusFailure,
    /// Another block from the same proposer and slot was already seen.
    #[error("equivocating block observed")]
    EquivocationFailure,
    /// Import succeeded, but only at a weaker level than requested.
    #[error("validated only at {reached:?}")]
    InsufficientLevel {
        /// Level actually reached by the import.
        reached: BroadcastValidationLevel,
    },
}

impl BroadcastValidationResult {
    /// Whether the gate passed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Why a block (or its blob sidecars) failed to import.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ImportFailureReason {
    /// Block is malformed or carries an invalid signature.
    #[error("invalid block: {0}")]
    InvalidBlock(String),
    /// Blob sidecars do not match the block.
    #[error("invalid blob sidecars: {0}")]
    InvalidBlobSidecars(String),
    /// Parent block is not known locally.
    #[error("unknown parent")]
    UnknownParent,
    /// State transition rejected the block.
    #[error("state transition failed: {0}")]
    FailedStateTransition(String),
    /// Import machinery failed; the block itself may be valid.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Successful import of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockImportResult {
    /// Root of the imported block.
    pub block_root: Hash,
    /// Slot of the imported block.
    pub slot: Slot,
    /// Strongest broadcast validation level the import established.
    pub validated_at: BroadcastValidationLevel,
    /// Imported without a verified execution payload.
    pub optimistic: bool,
}

/// Outcome of the import step, produced once per publish attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportAndBroadcastValidationResult {
    /// Block imported.
    Imported(BlockImportResult),
    /// Block refused by the broadcast validation gate.
    ValidationFailed(BroadcastValidationResult),
    /// Block or sidecars failed to import.
    ImportFailed(ImportFailureReason),
}

impl ImportAndBroadcastValidationResult {
    /// Apply the broadcast gate for `requested`.
    ///
    /// An import that only reached a weaker level is downgraded to
    /// `ValidationFailed(InsufficientLevel)`.
    pub fn gate(self, requested: BroadcastValidationLevel) -> Self {
        match self {
            Self::Imported(result) if !result.validated_at.satisfies(requested) => {
                Self::ValidationFailed(BroadcastValidationResult::InsufficientLevel {
                    reached: result.validated_at,
                })
            }
            Self::ValidationFailed(BroadcastValidationResult::Success) => {
                Self::ImportFailed(ImportFailureReason::Internal(
                    "validation reported success without an import result".into(),
                ))
            }
            other => other,
        }
    }

    /// Whether the block may be broadcast.
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Imported(_))
    }
}
