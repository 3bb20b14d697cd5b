//! Outbound ports (driven side - SPI)

use crate::domain::{BroadcastValidationLevel, ImportAndBroadcastValidationResult, PublishAttemptOutcome};
use crate::error::{GossipError, ImportChannelError};
use async_trait::async_trait;
use shared_types::{BlobSidecar, SignedBlock};
use std::sync::Arc;

/// Port: wall-clock and slot geometry
pub trait SlotClock: Send + Sync {
    /// Genesis time (Unix epoch milliseconds)
    fn genesis_time_millis(&self) -> u64;

    /// Duration of one slot in milliseconds
    fn slot_duration_millis(&self) -> u64;

    /// Current time (Unix epoch milliseconds)
    fn current_time_millis(&self) -> u64;
}

/// Port: state-transition import of blocks and blob sidecars
///
/// Implementations run import and the broadcast validation checks for the
/// requested level. A returned `Err` means the channel itself broke down,
/// not that the block is invalid.
#[async_trait]
pub trait BlockImportChannel: Send + Sync {
    /// Import a block without blob sidecars
    async fn import_block(
        &self,
        block: Arc<SignedBlock>,
        level: BroadcastValidationLevel,
    ) -> Result<ImportAndBroadcastValidationResult, ImportChannelError>;

    /// Import a block together with its blob sidecars
    async fn import_block_and_blob_sidecars(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<ImportAndBroadcastValidationResult, ImportChannelError>;
}

/// Port: gossip a block
///
/// Fire-and-forget. `Err` only reports that the message could not be
/// enqueued.
pub trait BlockGossipChannel: Send + Sync {
    /// Enqueue `block` for broadcast
    fn publish_block(&self, block: Arc<SignedBlock>) -> Result<(), GossipError>;
}

/// Port: gossip a blob sidecar
pub trait BlobSidecarGossipChannel: Send + Sync {
    /// Enqueue `blob_sidecar` for broadcast
    fn publish_blob_sidecar(&self, blob_sidecar: Arc<BlobSidecar>) -> Result<(), GossipError>;
}

/// Port: validator duty metrics
pub trait DutyMetrics: Send + Sync {
    /// Called once per publish attempt
    fn on_block_publishing_attempt(&self, block: &SignedBlock, outcome: PublishAttemptOutcome);
}

/// Port: validator performance tracking
pub trait PerformanceTracker: Send + Sync {
    /// Called once per publish attempt
    fn save_produced_block(&self, block: &SignedBlock, outcome: PublishAttemptOutcome);
}

/// Performance tracker that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPerformanceTracker;

impl PerformanceTracker for NoopPerformanceTracker {
    fn save_produced_block(&self, _block: &SignedBlock, _outcome: PublishAttemptOutcome) {}
}
