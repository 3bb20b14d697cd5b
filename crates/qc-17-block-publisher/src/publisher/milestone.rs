//! Picks the publisher variant for a block from the fork schedule.

use super::{BlockAndBlobSidecarsPublisher, BlockPublisher, BlockPublisherDeneb, BlockPublisherPhase0};
use crate::config::{BlockPublisherConfig, ForkSchedule};
use crate::domain::{BroadcastValidationLevel, PublishOutcome};
use crate::error::{ConfigError, PublishError, Result};
use crate::metrics::Metrics;
use crate::ports::{
    BlobSidecarGossipChannel, BlockGossipChannel, BlockImportChannel, BlockPublisherApi,
    DutyMetrics, PerformanceTracker, SlotClock,
};
use async_trait::async_trait;
use shared_types::{BlobSidecar, Milestone, SignedBlock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Collaborators shared by every publisher variant.
#[derive(Clone)]
pub struct PublisherPorts {
    /// State-transition import
    pub import_channel: Arc<dyn BlockImportChannel>,
    /// Block gossip
    pub block_gossip: Arc<dyn BlockGossipChannel>,
    /// Blob sidecar gossip
    pub blob_sidecar_gossip: Arc<dyn BlobSidecarGossipChannel>,
    /// Duty metrics sink
    pub duty_metrics: Arc<dyn DutyMetrics>,
    /// Performance tracking sink
    pub performance_tracker: Arc<dyn PerformanceTracker>,
    /// Clock for late-broadcast logging
    pub slot_clock: Option<Arc<dyn SlotClock>>,
}

/// Routes each block to the publisher registered for its milestone.
pub struct MilestoneBasedBlockPublisher {
    fork_schedule: ForkSchedule,
    publishers: HashMap<Milestone, BlockPublisher>,
    duty_metrics: Arc<dyn DutyMetrics>,
    performance_tracker: Arc<dyn PerformanceTracker>,
}

impl MilestoneBasedBlockPublisher {
    /// Selector with no publishers registered.
    ///
    /// `duty_metrics` and `performance_tracker` hear about blocks no
    /// registered publisher can take.
    pub fn new(
        fork_schedule: ForkSchedule,
        duty_metrics: Arc<dyn DutyMetrics>,
        performance_tracker: Arc<dyn PerformanceTracker>,
    ) -> Self {
        Self {
            fork_schedule,
            publishers: HashMap::new(),
            duty_metrics,
            performance_tracker,
        }
    }

    /// Register `publisher` for `milestone`.
    pub fn with_publisher(mut self, milestone: Milestone, publisher: BlockPublisher) -> Self {
        self.publishers.insert(milestone, publisher);
        self
    }

    /// Build a publisher for every milestone in the configured schedule.
    pub fn from_config(
        config: &BlockPublisherConfig,
        ports: PublisherPorts,
        metrics: Option<Arc<Metrics>>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let phase0: Arc<dyn BlockAndBlobSidecarsPublisher> = Arc::new(BlockPublisherPhase0::new(
            ports.import_channel.clone(),
            ports.block_gossip.clone(),
        ));

        let mut selector = Self::new(
            config.fork_schedule.clone(),
            ports.duty_metrics.clone(),
            ports.performance_tracker.clone(),
        );
        for fork in &config.fork_schedule.forks {
            let variant: Arc<dyn BlockAndBlobSidecarsPublisher> =
                if fork.milestone.supports_blob_sidecars() {
                    let mut deneb = BlockPublisherDeneb::new(
                        ports.import_channel.clone(),
                        ports.block_gossip.clone(),
                        ports.blob_sidecar_gossip.clone(),
                        config.max_blobs_for(fork.milestone),
                    );
                    if let Some(metrics) = &metrics {
                        deneb = deneb.with_metrics(metrics.clone());
                    }
                    Arc::new(deneb)
                } else {
                    phase0.clone()
                };

            let mut publisher = BlockPublisher::new(
                variant,
                ports.duty_metrics.clone(),
                ports.performance_tracker.clone(),
            );
            if let Some(clock) = &ports.slot_clock {
                publisher =
                    publisher.with_slot_clock(clock.clone(), config.timeliness.intervals_per_slot);
            }
            selector.publishers.insert(fork.milestone, publisher);
        }

        info!(
            "[qc-17] Block publisher ready for milestones {:?}",
            config
                .fork_schedule
                .forks
                .iter()
                .map(|fork| fork.milestone)
                .collect::<Vec<_>>()
        );
        Ok(selector)
    }

    /// Milestone a block at `block`'s slot belongs to.
    pub fn milestone_for(&self, block: &SignedBlock) -> Milestone {
        self.fork_schedule.milestone_at_slot(block.slot())
    }

    /// Import and publish through the variant for `block`'s milestone.
    pub async fn publish(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<PublishOutcome> {
        let milestone = self.milestone_for(&block);
        match self.publishers.get(&milestone) {
            Some(publisher) => publisher.publish(block, blob_sidecars, level).await,
            None => {
                warn!(
                    "[qc-17] No block publisher for milestone {} (block slot {})",
                    milestone,
                    block.slot()
                );
                let err = PublishError::UnsupportedMilestone(milestone);
                let outcome = err.attempt_outcome();
                self.duty_metrics.on_block_publishing_attempt(&block, outcome);
                self.performance_tracker.save_produced_block(&block, outcome);
                Err(err)
            }
        }
    }
}

#[async_trait]
impl BlockPublisherApi for MilestoneBasedBlockPublisher {
    async fn publish(
        &self,
        block: Arc<SignedBlock>,
        blob_sidecars: Vec<Arc<BlobSidecar>>,
        level: BroadcastValidationLevel,
    ) -> Result<PublishOutcome> {
        MilestoneBasedBlockPublisher::publish(self, block, blob_sidecars, level).await
    }
}
