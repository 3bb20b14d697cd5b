//! Error types for the block publishing subsystem

use crate::domain::{
    BroadcastValidationLevel, BroadcastValidationResult, ImportFailureReason, PublishAttemptOutcome,
};
use shared_types::{Hash, Milestone};
use thiserror::Error;

/// Result type alias for block publishing operations
pub type Result<T> = std::result::Result<T, PublishError>;

/// Why a publish attempt did not reach gossip
///
/// Every collaborator fault is converted into one of these; nothing else
/// escapes `publish`.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Block or blob sidecars failed import
    #[error("Block {} import failed: {}", hex::encode(.block_root), .reason)]
    ImportFailed {
        /// Root of the rejected block
        block_root: Hash,
        /// Failure reason
        reason: ImportFailureReason,
    },

    /// Block imported but refused by the broadcast validation gate
    #[error(
        "Block {} failed broadcast validation at {:?}: {}",
        hex::encode(.block_root),
        .requested,
        .result
    )]
    BroadcastValidationFailed {
        /// Root of the refused block
        block_root: Hash,
        /// Level the caller asked for
        requested: BroadcastValidationLevel,
        /// Gate verdict
        result: BroadcastValidationResult,
    },

    /// No publisher registered for the block's fork
    #[error("No block publisher for milestone {0}")]
    UnsupportedMilestone(Milestone),

    /// Publish pipeline aborted; whether gossip happened is unknown
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PublishError {
    /// The block (or its sidecars) was found invalid, or import broke down
    pub fn is_import_failure(&self) -> bool {
        matches!(self, Self::ImportFailed { .. })
    }

    /// The block was valid but did not pass the requested validation level
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::BroadcastValidationFailed { .. })
    }

    /// Coarse outcome reported to duty metrics
    pub fn attempt_outcome(&self) -> PublishAttemptOutcome {
        match self {
            Self::ImportFailed { .. } => PublishAttemptOutcome::ImportFailed,
            Self::BroadcastValidationFailed { .. } => {
                PublishAttemptOutcome::BroadcastValidationFailed
            }
            Self::UnsupportedMilestone(_) | Self::Internal(_) => {
                PublishAttemptOutcome::NotAttempted
            }
        }
    }
}

/// Fault in the import channel itself
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportChannelError {
    /// Import service is gone
    #[error("Import channel closed")]
    Closed,

    /// Import service failed
    #[error("Import channel error: {0}")]
    Internal(String),
}

/// A message could not be enqueued for gossip
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GossipError {
    /// Outbound queue is full
    #[error("Gossip queue full")]
    QueueFull,

    /// Network service is gone
    #[error("Gossip channel closed")]
    ChannelClosed,

    /// Message could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Invalid configuration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
