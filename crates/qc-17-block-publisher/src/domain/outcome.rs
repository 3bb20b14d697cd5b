//! Results of a publish attempt.

use shared_types::{Hash, Slot};

/// What the gossip layer accepted for broadcast.
///
/// Gossip is fire-and-forget: "enqueued" is the only signal available, not
/// delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Whether the block itself was enqueued.
    pub block_enqueued: bool,
    /// Number of blob sidecars enqueued.
    pub blob_sidecars_enqueued: usize,
    /// Indices of blob sidecars that could not be enqueued.
    pub failed_blob_sidecars: Vec<u64>,
}

impl BroadcastReport {
    /// Report for a block-only broadcast.
    pub fn block_only(block_enqueued: bool) -> Self {
        Self {
            block_enqueued,
            ..Self::default()
        }
    }

    /// Some part of the broadcast could not be enqueued.
    ///
    /// Nothing already sent is rolled back.
    pub fn is_partial(&self) -> bool {
        !self.block_enqueued || !self.failed_blob_sidecars.is_empty()
    }
}

/// Successful publish: the block was imported and handed to gossip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Root of the published block.
    pub block_root: Hash,
    /// Slot of the published block.
    pub slot: Slot,
    /// Import ran without a verified execution payload.
    pub optimistic: bool,
    /// What gossip accepted.
    pub broadcast: BroadcastReport,
}

/// Coarse outcome handed to duty metrics and performance tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PublishAttemptOutcome {
    /// Imported and fully enqueued for gossip.
    Published,
    /// Imported, but part of the broadcast could not be enqueued.
    PartiallyPublished,
    /// Block or sidecars were invalid, or import broke down.
    ImportFailed,
    /// Block refused by the broadcast validation gate.
    BroadcastValidationFailed,
    /// No publisher exists for the block's fork, or the pipeline aborted.
    NotAttempted,
}

impl PublishAttemptOutcome {
    /// Whether the block made it to gossip in any form.
    pub fn is_published(self) -> bool {
        matches!(self, Self::Published | Self::PartiallyPublished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_report() {
        assert!(!BroadcastReport::block_only(true).is_partial());
        assert!(BroadcastReport::block_only(false).is_partial());

        let report = BroadcastReport {
            block_enqueued: true,
            blob_sidecars_enqueued: 2,
            failed_blob_sidecars: vec![1],
        };
        assert!(report.is_partial());
    }

    #[test]
    fn test_attempt_outcome_published() {
        assert!(PublishAttemptOutcome::Published.is_published());
        assert!(PublishAttemptOutcome::PartiallyPublished.is_published());
        assert!(!PublishAttemptOutcome::ImportFailed.is_published());
    }
}
