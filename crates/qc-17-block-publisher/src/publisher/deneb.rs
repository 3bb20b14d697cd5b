//! Publisher for blob-bearing forks (Deneb onwards).
//!
//! Sidecars are checked against the block's commitments before import. On
//! publish the block goes first, then every sidecar in index order; a
//! sidecar that cannot be enqueued is recorded and the rest still go out.

use super::{import_channel_failure, BlockAndBlobSidecarsPublisher};
use crate::domain::{
    check_blob_sidecars, BroadcastReport, BroadcastValidationLevel,
    ImportAndBroadcastValidationResult, ImportFailureReason,
};
use crate::metrics::Metrics;
use crate::ports::{BlobSidecarGossipChannel, BlockGossipChannel, BlockImportChannel};
use async_trait::async_trait;
use shared_types::{BlobSidecar, SignedBlock};
use std::sync::Arc;
use tracing::{error, warn};

/// Block plus blob sidecar import and gossip.
pub struct BlockPublisherDeneb {
    import_channel: Arc<dyn BlockImportChannel>,
    block_gossip: Arc<dyn BlockGossipChannel>,
    blob_sidecar_gossip: Arc<dyn BlobSidecarGossipChannel>,
    max_blobs_per_block: usize,
    metrics: Option<Arc<Metrics>>,
}

impl BlockPublisherDeneb {
    /// Create the publisher with the fork's blob limit.
    pub fn new(
        import_channel: Arc<dyn BlockImportChannel>,
        block_gossip: Arc<dyn BlockGossipChannel>,
        blob_sidecar_gossip: Arc<dyn BlobSidecarGossipChannel>,
        max_blobs_per_block: usize,
    ) -> Self {
        Self {
            import_channel,
            block_gossip,
            blob_sidecar_gossip,
            max_blobs_per_block,
            metrics: None,
        }
    }

    /// Count sidecar broadcasts in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[async_trait]
impl BlockAndBlobSidecarsPublisher for BlockPublisherDeneb {
    async fn import_block_and_blob_sidecars(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> ImportAndBroadcastValidationResult {
        if let Err(violation) = check_blob_sidecars(&block, &blob_sidecars, self.max_blobs_per_block)
        {
            warn!(
                "[qc-17] Rejecting block {} slot {} before import: {}",
                hex::encode(block.root()),
                block.slot(),
                violation
            );
            return ImportAndBroadcastValidationResult::ImportFailed(
                ImportFailureReason::InvalidBlobSidecars(violation.to_string()),
            );
        }

        self.import_channel
            .import_block_and_blob_sidecars(block, blob_sidecars, level)
            .await
            .unwrap_or_else(import_channel_failure)
    }

    fn publish_block_and_blob_sidecars(
        &self,
        block: &Arc<SignedBlock>,
        blob_sidecars: &[Arc<BlobSidecar>],
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        match self.block_gossip.publish_block(block.clone()) {
            Ok(()) => report.block_enqueued = true,
            Err(e) => error!(
                "[qc-17] Failed to enqueue block {} slot {} for gossip: {}",
                hex::encode(block.root()),
                block.slot(),
                e
            ),
        }

        for sidecar in blob_sidecars {
            match self.blob_sidecar_gossip.publish_blob_sidecar(sidecar.clone()) {
                Ok(()) => report.blob_sidecars_enqueued += 1,
                Err(e) => {
                    error!(
                        "[qc-17] Failed to enqueue blob sidecar {} of block {} for gossip: {}",
                        sidecar.index,
                        hex::encode(block.root()),
                        e
                    );
                    report.failed_blob_sidecars.push(sidecar.index);
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_blob_sidecars(
                report.blob_sidecars_enqueued,
                report.failed_blob_sidecars.len(),
            );
        }

        report
    }
}
