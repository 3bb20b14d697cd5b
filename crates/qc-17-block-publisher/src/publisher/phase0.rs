//! Publisher for forks without blob sidecars (Phase0 through Capella).

use super::{import_channel_failure, BlockAndBlobSidecarsPublisher};
use crate::domain::{BroadcastReport, BroadcastValidationLevel, ImportAndBroadcastValidationResult};
use crate::ports::{BlockGossipChannel, BlockImportChannel};
use async_trait::async_trait;
use shared_types::{BlobSidecar, SignedBlock};
use std::sync::Arc;
use tracing::{error, warn};

/// Plain import, block-only gossip.
pub struct BlockPublisherPhase0 {
    import_channel: Arc<dyn BlockImportChannel>,
    block_gossip: Arc<dyn BlockGossipChannel>,
}

impl BlockPublisherPhase0 {
    /// Create the publisher.
    pub fn new(
        import_channel: Arc<dyn BlockImportChannel>,
        block_gossip: Arc<dyn BlockGossipChannel>,
    ) -> Self {
        Self {
            import_channel,
            block_gossip,
        }
    }
}

#[async_trait]
impl BlockAndBlobSidecarsPublisher for BlockPublisherPhase0 {
    async fn import_block_and_blob_sidecars(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> ImportAndBroadcastValidationResult {
        if !blob_sidecars.is_empty() {
            warn!(
                "[qc-17] Ignoring {} blob sidecars for pre-blob block at slot {}",
                blob_sidecars.len(),
                block.slot()
            );
        }
        self.import_channel
            .import_block(block, level)
            .await
            .unwrap_or_else(import_channel_failure)
    }

    fn publish_block_and_blob_sidecars(
        &self,
        block: &Arc<SignedBlock>,
        _blob_sidecars: &[Arc<BlobSidecar>],
    ) -> BroadcastReport {
        match self.block_gossip.publish_block(block.clone()) {
            Ok(()) => BroadcastReport::block_only(true),
            Err(e) => {
                error!(
                    "[qc-17] Failed to enqueue block {} slot {} for gossip: {}",
                    hex::encode(block.root()),
                    block.slot(),
                    e
                );
                BroadcastReport::block_only(false)
            }
        }
    }
}
