//! Configuration types for block publishing

use crate::domain::INTERVALS_PER_SLOT;
use crate::error::ConfigError;
use serde::Deserialize;
use shared_types::{Epoch, Milestone, Slot};

/// Runtime configuration for block publishing
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BlockPublisherConfig {
    /// Fork activation schedule used to pick a publisher per block
    pub fork_schedule: ForkSchedule,

    /// Blob limit for Deneb blocks
    pub max_blobs_per_block: usize,

    /// Blob limit from Electra on
    pub max_blobs_per_block_electra: usize,

    /// Timeliness tracking
    pub timeliness: TimelinessConfig,
}

impl Default for BlockPublisherConfig {
    fn default() -> Self {
        Self {
            fork_schedule: ForkSchedule::default(),
            max_blobs_per_block: crate::DEFAULT_MAX_BLOBS_PER_BLOCK,
            max_blobs_per_block_electra: crate::DEFAULT_MAX_BLOBS_PER_BLOCK_ELECTRA,
            timeliness: TimelinessConfig::default(),
        }
    }
}

impl BlockPublisherConfig {
    /// Blob limit for blocks of `milestone`
    pub fn max_blobs_for(&self, milestone: Milestone) -> usize {
        match milestone {
            Milestone::Electra => self.max_blobs_per_block_electra,
            m if m.supports_blob_sidecars() => self.max_blobs_per_block,
            _ => 0,
        }
    }

    /// Reject configurations the publisher cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fork_schedule.validate()?;
        self.timeliness.validate()
    }
}

/// Timeliness tracker configuration
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimelinessConfig {
    /// Slot intervals; attestations are due after the first one (default: 3)
    pub intervals_per_slot: u64,

    /// Slots of history kept by `prune` (default: 64)
    pub retention_slots: u64,

    /// Hard cap on tracked roots (default: 1000)
    pub max_tracked_blocks: usize,
}

impl Default for TimelinessConfig {
    fn default() -> Self {
        Self {
            intervals_per_slot: INTERVALS_PER_SLOT,
            retention_slots: 64,
            max_tracked_blocks: 1_000,
        }
    }
}

impl TimelinessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.intervals_per_slot == 0 {
            return Err(ConfigError::Invalid(
                "intervals_per_slot must be positive".into(),
            ));
        }
        if self.max_tracked_blocks == 0 {
            return Err(ConfigError::Invalid(
                "max_tracked_blocks must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Activation epoch of one fork
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct ForkActivation {
    /// Fork family
    pub milestone: Milestone,
    /// First epoch of the fork
    pub epoch: Epoch,
}

/// Fork activation schedule
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ForkSchedule {
    /// Slots per epoch (default: 32)
    pub slots_per_epoch: u64,

    /// Activations in milestone order, starting at epoch 0
    pub forks: Vec<ForkActivation>,
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self::genesis(Milestone::Phase0)
    }
}

impl ForkSchedule {
    /// Schedule running `milestone` from genesis
    pub fn genesis(milestone: Milestone) -> Self {
        Self {
            slots_per_epoch: 32,
            forks: vec![ForkActivation {
                milestone,
                epoch: 0,
            }],
        }
    }

    /// Add a fork activating at `epoch`
    pub fn with_fork(mut self, milestone: Milestone, epoch: Epoch) -> Self {
        self.forks.push(ForkActivation { milestone, epoch });
        self
    }

    /// Milestone active at `slot`
    pub fn milestone_at_slot(&self, slot: Slot) -> Milestone {
        let epoch = slot / self.slots_per_epoch.max(1);
        self.forks
            .iter()
            .take_while(|fork| fork.epoch <= epoch)
            .last()
            .map(|fork| fork.milestone)
            .unwrap_or(Milestone::Phase0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.slots_per_epoch == 0 {
            return Err(ConfigError::Invalid("slots_per_epoch must be positive".into()));
        }
        match self.forks.first() {
            None => return Err(ConfigError::Invalid("fork schedule is empty".into())),
            Some(first) if first.epoch != 0 => {
                return Err(ConfigError::Invalid(
                    "first fork must activate at epoch 0".into(),
                ))
            }
            Some(_) => {}
        }
        for pair in self.forks.windows(2) {
            if pair[1].milestone <= pair[0].milestone || pair[1].epoch < pair[0].epoch {
                return Err(ConfigError::Invalid(format!(
                    "fork {} must follow {} in milestone and epoch order",
                    pair[1].milestone, pair[0].milestone
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BlockPublisherConfig::default();
        assert_eq!(config.max_blobs_per_block, crate::DEFAULT_MAX_BLOBS_PER_BLOCK);
        assert_eq!(config.timeliness.intervals_per_slot, 3);
        assert_eq!(config.fork_schedule.milestone_at_slot(1_000_000), Milestone::Phase0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_milestone_at_slot() {
        let schedule = ForkSchedule::genesis(Milestone::Phase0)
            .with_fork(Milestone::Capella, 2)
            .with_fork(Milestone::Deneb, 4);

        assert_eq!(schedule.milestone_at_slot(0), Milestone::Phase0);
        assert_eq!(schedule.milestone_at_slot(63), Milestone::Phase0);
        assert_eq!(schedule.milestone_at_slot(64), Milestone::Capella);
        assert_eq!(schedule.milestone_at_slot(127), Milestone::Capella);
        assert_eq!(schedule.milestone_at_slot(128), Milestone::Deneb);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn test_max_blobs_per_milestone() {
        let config = BlockPublisherConfig::default();
        assert_eq!(config.max_blobs_for(Milestone::Capella), 0);
        assert_eq!(config.max_blobs_for(Milestone::Deneb), 6);
        assert_eq!(config.max_blobs_for(Milestone::Electra), 9);
    }

    #[test]
    fn test_invalid_schedules() {
        let empty = ForkSchedule {
            slots_per_epoch: 32,
            forks: vec![],
        };
        assert!(empty.validate().is_err());

        let late_genesis = ForkSchedule {
            slots_per_epoch: 32,
            forks: vec![ForkActivation {
                milestone: Milestone::Phase0,
                epoch: 1,
            }],
        };
        assert!(late_genesis.validate().is_err());

        let backwards = ForkSchedule::genesis(Milestone::Deneb).with_fork(Milestone::Capella, 1);
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_invalid_timeliness() {
        let config = BlockPublisherConfig {
            timeliness: TimelinessConfig {
                intervals_per_slot: 0,
                ..TimelinessConfig::default()
            },
            ..BlockPublisherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let json = r#"{
            "fork_schedule": {
                "slots_per_epoch": 8,
                "forks": [
                    { "milestone": "capella", "epoch": 0 },
                    { "milestone": "deneb", "epoch": 10 }
                ]
            },
            "timeliness": { "retention_slots": 16 }
        }"#;
        let config: BlockPublisherConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fork_schedule.milestone_at_slot(80), Milestone::Deneb);
        assert_eq!(config.timeliness.retention_slots, 16);
        assert_eq!(config.timeliness.max_tracked_blocks, 1_000);
        assert_eq!(config.max_blobs_per_block, 6);
        assert!(config.validate().is_ok());
    }
}
