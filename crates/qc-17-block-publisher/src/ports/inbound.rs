//! Inbound ports (driving side - API)

use crate::domain::{BroadcastValidationLevel, PublishOutcome};
use crate::error::Result;
use async_trait::async_trait;
use shared_types::{BlobSidecar, SignedBlock};
use std::sync::Arc;

/// Primary port: publish a signed block produced by a validator duty
///
/// Import runs first; the block (and its blob sidecars) reach gossip only
/// if import succeeds at or above `level`. Repeated calls for the same root
/// are independent attempts and may broadcast twice.
#[async_trait]
pub trait BlockPublisherApi: Send + Sync {
    /// Import, then broadcast on success
    async fn publish(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<PublishOutcome>;
}
