//! # Block Publisher
//!
//! Sequences import and gossip for a signed block and its blob sidecars.
//!
//! ```text
//! publish(block, sidecars, level)
//!   │
//!   ├─→ import_block_and_blob_sidecars ──→ ImportAndBroadcastValidationResult
//!   │                                          │
//!   │                     Imported && validated_at >= level ?
//!   │                          │ yes                    │ no
//!   │                          ↓                        ↓
//!   │           publish_block_and_blob_sidecars     no broadcast
//!   │
//!   └─→ DutyMetrics / PerformanceTracker (always)
//! ```
//!
//! Fork-specific behaviour lives behind [`BlockAndBlobSidecarsPublisher`]:
//! [`BlockPublisherPhase0`] for forks without blobs and
//! [`BlockPublisherDeneb`] for blob-bearing forks.
//! [`MilestoneBasedBlockPublisher`] picks one per block from the fork schedule.

mod deneb;
mod milestone;
mod phase0;

pub use deneb::BlockPublisherDeneb;
pub use milestone::{MilestoneBasedBlockPublisher, PublisherPorts};
pub use phase0::BlockPublisherPhase0;

use crate::domain::{
    BroadcastDelay, BroadcastReport, BroadcastValidationLevel, ImportAndBroadcastValidationResult,
    ImportFailureReason, PublishAttemptOutcome, PublishOutcome, SlotTimingParameters,
    INTERVALS_PER_SLOT,
};
use crate::error::{ImportChannelError, PublishError, Result};
use crate::ports::{BlockPublisherApi, DutyMetrics, PerformanceTracker, SlotClock};
use async_trait::async_trait;
use shared_types::{BlobSidecar, SignedBlock};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fork-specific import and publish steps.
#[async_trait]
pub trait BlockAndBlobSidecarsPublisher: Send + Sync {
    /// Import `block` (and `blob_sidecars`) at `level`.
    ///
    /// Never fails: channel faults come back as `ImportFailed(Internal)`.
    async fn import_block_and_blob_sidecars(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> ImportAndBroadcastValidationResult;

    /// Hand `block` and then `blob_sidecars` to gossip.
    fn publish_block_and_blob_sidecars(
        &self,
        block: &Arc<SignedBlock>,
        blob_sidecars: &[Arc<BlobSidecar>],
    ) -> BroadcastReport;
}

pub(crate) fn import_channel_failure(err: ImportChannelError) -> ImportAndBroadcastValidationResult {
    ImportAndBroadcastValidationResult::ImportFailed(ImportFailureReason::Internal(err.to_string()))
}

/// Import-then-publish pipeline for one fork variant.
///
/// Stateless across calls. Each `publish` runs on its own tokio task, so a
/// dispatched import runs to completion even if the caller stops waiting.
#[derive(Clone)]
pub struct BlockPublisher {
    variant: Arc<dyn BlockAndBlobSidecarsPublisher>,
    duty_metrics: Arc<dyn DutyMetrics>,
    performance_tracker: Arc<dyn PerformanceTracker>,
    slot_clock: Option<Arc<dyn SlotClock>>,
    intervals_per_slot: u64,
}

impl BlockPublisher {
    /// Create a pipeline around `variant`.
    pub fn new(
        variant: Arc<dyn BlockAndBlobSidecarsPublisher>,
        duty_metrics: Arc<dyn DutyMetrics>,
        performance_tracker: Arc<dyn PerformanceTracker>,
    ) -> Self {
        Self {
            variant,
            duty_metrics,
            performance_tracker,
            slot_clock: None,
            intervals_per_slot: INTERVALS_PER_SLOT,
        }
    }

    /// Log late broadcasts against `slot_clock`.
    pub fn with_slot_clock(mut self, slot_clock: Arc<dyn SlotClock>, intervals_per_slot: u64) -> Self {
        self.slot_clock = Some(slot_clock);
        self.intervals_per_slot = intervals_per_slot;
        self
    }

    /// Import `block` and, if it passes `level`, broadcast it.
    pub async fn publish(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<PublishOutcome> {
        let pipeline = self.clone();
        let task_block = block.clone();
        let handle =
            tokio::spawn(async move { pipeline.run(task_block, blob_sidecars, level).await });

        match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                // Task panicked or was aborted; gossip may already have happened.
                error!(
                    "[qc-17] Publish pipeline for block {} slot {} aborted: {}",
                    hex::encode(block.root()),
                    block.slot(),
                    join_error
                );
                let outcome = PublishAttemptOutcome::NotAttempted;
                self.duty_metrics.on_block_publishing_attempt(&block, outcome);
                self.performance_tracker.save_produced_block(&block, outcome);
                Err(PublishError::Internal(join_error.to_string()))
            }
        }
    }

    async fn run(
        self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<PublishOutcome> {
        let block_root = block.root();
        debug!(
            "[qc-17] Importing block {} slot {} with {} blob sidecars at {:?}",
            hex::encode(block_root),
            block.slot(),
            blob_sidecars.len(),
            level
        );

        let import_result = self
            .variant
            .import_block_and_blob_sidecars(block.clone(), blob_sidecars.clone(), level)
            .await
            .gate(level);

        let result = match import_result {
            ImportAndBroadcastValidationResult::Imported(imported) => {
                let broadcast = self
                    .variant
                    .publish_block_and_blob_sidecars(&block, &blob_sidecars);
                self.log_broadcast_delay(&block);
                if broadcast.is_partial() {
                    warn!(
                        "[qc-17] Block {} slot {} imported but partially broadcast (block enqueued: {}, failed sidecars: {:?})",
                        hex::encode(block_root),
                        block.slot(),
                        broadcast.block_enqueued,
                        broadcast.failed_blob_sidecars
                    );
                } else {
                    info!(
                        "[qc-17] Published block {} slot {} with {} blob sidecars",
                        hex::encode(block_root),
                        block.slot(),
                        broadcast.blob_sidecars_enqueued
                    );
                }
                Ok(PublishOutcome {
                    block_root,
                    slot: block.slot(),
                    optimistic: imported.optimistic,
                    broadcast,
                })
            }
            ImportAndBroadcastValidationResult::ValidationFailed(result) => {
                warn!(
                    "[qc-17] Block {} slot {} publishing skipped due to broadcast validation result: {}",
                    hex::encode(block_root),
                    block.slot(),
                    result
                );
                Err(PublishError::BroadcastValidationFailed {
                    block_root,
                    requested: level,
                    result,
                })
            }
            ImportAndBroadcastValidationResult::ImportFailed(reason) => {
                error!(
                    "[qc-17] Proposed block {} slot {} failed to import: {}",
                    hex::encode(block_root),
                    block.slot(),
                    reason
                );
                Err(PublishError::ImportFailed { block_root, reason })
            }
        };

        let outcome = match &result {
            Ok(published) if published.broadcast.is_partial() => {
                PublishAttemptOutcome::PartiallyPublished
            }
            Ok(_) => PublishAttemptOutcome::Published,
            Err(err) => err.attempt_outcome(),
        };
        self.duty_metrics.on_block_publishing_attempt(&block, outcome);
        self.performance_tracker.save_produced_block(&block, outcome);

        result
    }

    fn log_broadcast_delay(&self, block: &SignedBlock) {
        let Some(clock) = &self.slot_clock else {
            return;
        };
        let timing = SlotTimingParameters::for_slot(
            clock.genesis_time_millis(),
            clock.slot_duration_millis(),
            self.intervals_per_slot,
            block.slot(),
        );
        let Some(delay) = timing.offset_into_slot(clock.current_time_millis()) else {
            return;
        };

        match timing.classify_broadcast_delay(delay) {
            BroadcastDelay::TooLate => error!(
                "[qc-17] Block {} slot {} was broadcast too late ({}ms into slot); block likely to be orphaned",
                hex::encode(block.root()),
                block.slot(),
                delay
            ),
            BroadcastDelay::Delayed => warn!(
                "[qc-17] Block {} slot {} broadcast was delayed ({}ms into slot); block may be orphaned",
                hex::encode(block.root()),
                block.slot(),
                delay
            ),
            BroadcastDelay::OnTime => {}
        }
    }
}

#[async_trait]
impl BlockPublisherApi for BlockPublisher {
    async fn publish(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<PublishOutcome> {
        BlockPublisher::publish(self, block, blob_sidecars, level).await
    }
}
