//! Metrics collection for block publishing subsystem

use crate::domain::PublishAttemptOutcome;
use crate::ports::DutyMetrics;
use shared_types::SignedBlock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for block publishing and timeliness
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total publish attempts
    pub publish_attempts: AtomicU64,

    /// Attempts that fully reached gossip
    pub blocks_published: AtomicU64,

    /// Attempts that reached gossip with some messages not enqueued
    pub partial_publishes: AtomicU64,

    /// Attempts rejected by import
    pub import_failures: AtomicU64,

    /// Attempts rejected by the broadcast validation gate
    pub validation_failures: AtomicU64,

    /// Blob sidecars enqueued for gossip
    pub blob_sidecars_published: AtomicU64,

    /// Blob sidecars that could not be enqueued
    pub blob_sidecar_failures: AtomicU64,

    /// Blocks that arrived before the attestation deadline
    pub timely_blocks: AtomicU64,

    /// Blocks that arrived at or after the attestation deadline
    pub late_blocks: AtomicU64,

    /// Arrivals ignored because the block's slot had not started
    pub future_arrivals: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a publish attempt
    pub fn record_publish_attempt(&self, outcome: PublishAttemptOutcome) {
        self.publish_attempts.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            PublishAttemptOutcome::Published => &self.blocks_published,
            PublishAttemptOutcome::PartiallyPublished => &self.partial_publishes,
            PublishAttemptOutcome::ImportFailed => &self.import_failures,
            PublishAttemptOutcome::BroadcastValidationFailed => &self.validation_failures,
            PublishAttemptOutcome::NotAttempted => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record blob sidecar broadcast results
    pub fn record_blob_sidecars(&self, enqueued: usize, failed: usize) {
        self.blob_sidecars_published
            .fetch_add(enqueued as u64, Ordering::Relaxed);
        self.blob_sidecar_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    /// Record a classified block arrival
    pub fn record_arrival(&self, timely: bool) {
        if timely {
            self.timely_blocks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.late_blocks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an arrival before slot start
    pub fn record_future_arrival(&self) {
        self.future_arrivals.fetch_add(1, Ordering::Relaxed);
    }

    /// Get publish attempts
    pub fn get_publish_attempts(&self) -> u64 {
        self.publish_attempts.load(Ordering::Relaxed)
    }

    /// Get fully published blocks
    pub fn get_blocks_published(&self) -> u64 {
        self.blocks_published.load(Ordering::Relaxed)
    }

    /// Get partial publishes
    pub fn get_partial_publishes(&self) -> u64 {
        self.partial_publishes.load(Ordering::Relaxed)
    }

    /// Get import failures
    pub fn get_import_failures(&self) -> u64 {
        self.import_failures.load(Ordering::Relaxed)
    }

    /// Get validation failures
    pub fn get_validation_failures(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
    }

    /// Get blob sidecars published
    pub fn get_blob_sidecars_published(&self) -> u64 {
        self.blob_sidecars_published.load(Ordering::Relaxed)
    }

    /// Get blob sidecar enqueue failures
    pub fn get_blob_sidecar_failures(&self) -> u64 {
        self.blob_sidecar_failures.load(Ordering::Relaxed)
    }

    /// Get timely blocks
    pub fn get_timely_blocks(&self) -> u64 {
        self.timely_blocks.load(Ordering::Relaxed)
    }

    /// Get late blocks
    pub fn get_late_blocks(&self) -> u64 {
        self.late_blocks.load(Ordering::Relaxed)
    }

    /// Get ignored future arrivals
    pub fn get_future_arrivals(&self) -> u64 {
        self.future_arrivals.load(Ordering::Relaxed)
    }

    /// Share of classified arrivals that were late
    pub fn get_late_block_ratio(&self) -> f64 {
        let late = self.late_blocks.load(Ordering::Relaxed);
        let total = late + self.timely_blocks.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        late as f64 / total as f64
    }
}

impl DutyMetrics for Metrics {
    fn on_block_publishing_attempt(&self, _block: &SignedBlock, outcome: PublishAttemptOutcome) {
        self.record_publish_attempt(outcome);
    }
}
