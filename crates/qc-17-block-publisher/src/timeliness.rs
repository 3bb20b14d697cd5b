//! # Block Timeliness Tracker
//!
//! Classifies, once per block root, whether a block arrived before the
//! attestation deadline of its slot, and answers whether this node is still
//! within its own proposer cutoff for a slot.
//!
//! ## State Machine (per root)
//!
//! ```text
//! Unset ──record_arrival──→ Timely | Late   (terminal)
//! ```
//!
//! The first effective `record_arrival` for a root wins. Later calls are
//! no-ops even when their timestamp would classify differently. Arrivals
//! before the block's slot has started never create a record.
//!
//! ## Retention
//!
//! Records older than `retention_slots` behind the slot passed to
//! [`BlockTimelinessTracker::prune`] are dropped, and the map never holds
//! more than `max_tracked_blocks` entries (oldest insertion evicted first).

use crate::config::TimelinessConfig;
use crate::domain::SlotTimingParameters;
use crate::metrics::Metrics;
use crate::ports::SlotClock;
use parking_lot::RwLock;
use shared_types::{Hash, SignedBlock, Slot};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Stored classification for one block root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelinessRecord {
    /// Slot of the block.
    pub slot: Slot,
    /// Arrived before the attestation deadline.
    pub timely: bool,
    /// How far into the slot the block arrived.
    pub arrival_offset_millis: u64,
}

/// Effect of a `record_arrival` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrivalRecord {
    /// This call created the record.
    Recorded(TimelinessRecord),
    /// A record already existed; nothing changed.
    AlreadyRecorded,
    /// Arrival precedes the block's slot start; nothing recorded.
    FutureArrival,
}

#[derive(Default)]
struct TrackerState {
    records: HashMap<Hash, TimelinessRecord>,
    insertion_order: VecDeque<Hash>,
}

/// Tracks block arrival timeliness per block root.
///
/// Thread-safe; share it via `Arc`. Writers take the write guard only for
/// the insert-if-absent itself, readers only take the read guard.
pub struct BlockTimelinessTracker {
    clock: Arc<dyn SlotClock>,
    config: TimelinessConfig,
    state: RwLock<TrackerState>,
    metrics: Option<Arc<Metrics>>,
}

impl BlockTimelinessTracker {
    /// Create a tracker reading slot timing from `clock`.
    pub fn new(clock: Arc<dyn SlotClock>, config: TimelinessConfig) -> Self {
        Self {
            clock,
            config,
            state: RwLock::new(TrackerState::default()),
            metrics: None,
        }
    }

    /// Count arrivals in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn timing(&self, slot: Slot) -> SlotTimingParameters {
        SlotTimingParameters::for_slot(
            self.clock.genesis_time_millis(),
            self.clock.slot_duration_millis(),
            self.config.intervals_per_slot,
            slot,
        )
    }

    /// Record when `block` was first seen.
    pub fn record_arrival(&self, block: &SignedBlock, arrival_time_millis: u64) -> ArrivalRecord {
        let root = block.root();
        let timing = self.timing(block.slot());

        let Some(offset) = timing.offset_into_slot(arrival_time_millis) else {
            debug!(
                "[qc-17] Block {} for slot {} arrived before its slot started, timeliness not recorded",
                hex::encode(root),
                block.slot()
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_future_arrival();
            }
            return ArrivalRecord::FutureArrival;
        };

        let record = TimelinessRecord {
            slot: block.slot(),
            timely: !timing.is_late_offset(offset),
            arrival_offset_millis: offset,
        };

        {
            let mut state = self.state.write();
            match state.records.entry(root) {
                Entry::Occupied(_) => return ArrivalRecord::AlreadyRecorded,
                Entry::Vacant(e) => {
                    e.insert(record);
                }
            }
            state.insertion_order.push_back(root);

            while state.records.len() > self.config.max_tracked_blocks {
                match state.insertion_order.pop_front() {
                    Some(oldest) => {
                        state.records.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        debug!(
            "[qc-17] Block {} slot {} arrived {}ms into slot: {}",
            hex::encode(root),
            record.slot,
            offset,
            if record.timely { "timely" } else { "late" }
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_arrival(record.timely);
        }

        ArrivalRecord::Recorded(record)
    }

    /// Recorded classification; `None` means unknown, not late.
    pub fn is_timely(&self, root: &Hash) -> Option<bool> {
        self.state.read().records.get(root).map(|r| r.timely)
    }

    /// `true` only for a recorded late block.
    pub fn is_late(&self, root: &Hash) -> bool {
        self.is_timely(root).map(|timely| !timely).unwrap_or(false)
    }

    /// Full record for `root`.
    pub fn timeliness(&self, root: &Hash) -> Option<TimelinessRecord> {
        self.state.read().records.get(root).copied()
    }

    /// Whether a block for `slot` produced now would still be on time.
    ///
    /// Reads the current time; keeps no state.
    pub fn is_proposing_on_time(&self, slot: Slot) -> bool {
        self.timing(slot)
            .is_within_proposer_cutoff(self.clock.current_time_millis())
    }

    /// Drop records for slots more than `retention_slots` before `current_slot`.
    ///
    /// Returns the number of records removed.
    pub fn prune(&self, current_slot: Slot) -> usize {
        let horizon = current_slot.saturating_sub(self.config.retention_slots);
        let mut guard = self.state.write();
        let state = &mut *guard;
        let before = state.records.len();
        state.records.retain(|_, record| record.slot >= horizon);
        let records = &state.records;
        state
            .insertion_order
            .retain(|root| records.contains_key(root));
        before - state.records.len()
    }

    /// Number of tracked roots.
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StubSlotClock;
    use proptest::prelude::*;
    use shared_types::BeaconBlock;

    const GENESIS_MS: u64 = 1_700_000_000_000;
    const MILLIS_PER_SLOT: u64 = 6_000;
    const SLOT: Slot = 1;

    fn block_at(slot: Slot, proposer_index: u64) -> SignedBlock {
        SignedBlock::new(
            BeaconBlock {
                slot,
                proposer_index,
                ..BeaconBlock::default()
            },
            [0u8; 96],
        )
    }

    fn setup() -> (Arc<StubSlotClock>, BlockTimelinessTracker, SignedBlock) {
        let clock = Arc::new(StubSlotClock::new(GENESIS_MS, MILLIS_PER_SLOT));
        let tracker = BlockTimelinessTracker::new(clock.clone(), TimelinessConfig::default());
        (clock, tracker, block_at(SLOT, 1))
    }

    fn time_into_slot(slot: Slot, millis: u64) -> u64 {
        GENESIS_MS + slot * MILLIS_PER_SLOT + millis
    }

    #[test]
    fn test_reports_timely_if_set() {
        let (_, tracker, block) = setup();
        tracker.record_arrival(&block, time_into_slot(SLOT, 500));
        assert_eq!(tracker.is_timely(&block.root()), Some(true));
        assert!(!tracker.is_late(&block.root()));
    }

    #[test]
    fn test_sets_timeliness_once() {
        let (_, tracker, block) = setup();
        tracker.record_arrival(&block, time_into_slot(SLOT, 500));
        // Would be late if this second call were not ignored.
        let second = tracker.record_arrival(&block, time_into_slot(SLOT, 3_500));
        assert_eq!(second, ArrivalRecord::AlreadyRecorded);
        assert_eq!(tracker.is_timely(&block.root()), Some(true));
        assert!(!tracker.is_late(&block.root()));
    }

    #[test]
    fn test_reports_late() {
        let (_, tracker, block) = setup();
        tracker.record_arrival(&block, time_into_slot(SLOT, 2_100));
        assert_eq!(tracker.is_timely(&block.root()), Some(false));
        assert!(tracker.is_late(&block.root()));
    }

    #[test]
    fn test_reports_late_at_limit() {
        let (_, tracker, block) = setup();
        tracker.record_arrival(&block, time_into_slot(SLOT, 2_000));
        assert_eq!(tracker.is_timely(&block.root()), Some(false));
        assert!(tracker.is_late(&block.root()));
    }

    #[test]
    fn test_block_from_future_is_not_recorded() {
        let (_, tracker, _) = setup();
        let future_block = block_at(5, 2);
        let result = tracker.record_arrival(&future_block, time_into_slot(SLOT, 2_100));
        assert_eq!(result, ArrivalRecord::FutureArrival);
        assert_eq!(tracker.is_timely(&future_block.root()), None);
        assert!(!tracker.is_late(&future_block.root()));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_block_from_previous_slot_is_late() {
        let (_, tracker, _) = setup();
        let old_block = block_at(0, 2);
        tracker.record_arrival(&old_block, time_into_slot(SLOT, 100));
        assert!(tracker.is_late(&old_block.root()));
    }

    #[test]
    fn test_reports_empty_if_not_set() {
        let (_, tracker, block) = setup();
        assert_eq!(tracker.is_timely(&block.root()), None);
        assert!(!tracker.is_late(&block.root()));
    }

    #[test]
    fn test_record_details() {
        let (_, tracker, block) = setup();
        let result = tracker.record_arrival(&block, time_into_slot(SLOT, 750));
        let expected = TimelinessRecord {
            slot: SLOT,
            timely: true,
            arrival_offset_millis: 750,
        };
        assert_eq!(result, ArrivalRecord::Recorded(expected));
        assert_eq!(tracker.timeliness(&block.root()), Some(expected));
    }

    #[test]
    fn test_proposing_before_slot_start_is_ok() {
        let (clock, tracker, _) = setup();
        clock.advance_time_by_millis(MILLIS_PER_SLOT - 500);
        assert!(tracker.is_proposing_on_time(SLOT));
    }

    #[test]
    fn test_proposing_at_slot_start_is_on_time() {
        let (clock, tracker, _) = setup();
        clock.advance_time_by_millis(MILLIS_PER_SLOT);
        assert!(tracker.is_proposing_on_time(SLOT));
    }

    #[test]
    fn test_proposing_late_if_attestations_due() {
        let (clock, tracker, _) = setup();
        clock.advance_time_by_millis(MILLIS_PER_SLOT + 2_000);
        assert!(!tracker.is_proposing_on_time(SLOT));
    }

    #[test]
    fn test_proposing_on_time_before_cutoff() {
        let (clock, tracker, _) = setup();
        clock.advance_time_by_millis(MILLIS_PER_SLOT + 999);
        assert!(tracker.is_proposing_on_time(SLOT));
    }

    #[test]
    fn test_proposing_late_at_half_way_to_attestation_due() {
        let (clock, tracker, _) = setup();
        clock.advance_time_by_millis(MILLIS_PER_SLOT + 1_000);
        assert!(!tracker.is_proposing_on_time(SLOT));
    }

    #[test]
    fn test_proposing_check_keeps_no_state() {
        let (clock, tracker, _) = setup();
        clock.advance_time_by_millis(MILLIS_PER_SLOT + 5_000);
        assert!(!tracker.is_proposing_on_time(SLOT));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_concurrent_writers_single_effective_write() {
        let (_, tracker, block) = setup();
        let tracker = Arc::new(tracker);

        let results: Vec<ArrivalRecord> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16u64)
                .map(|i| {
                    let tracker = tracker.clone();
                    let block = block.clone();
                    // Even threads timely, odd threads late.
                    let offset = if i % 2 == 0 { 100 } else { 4_000 };
                    scope.spawn(move || tracker.record_arrival(&block, time_into_slot(SLOT, offset)))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("writer thread panicked"))
                .collect()
        });

        let recorded: Vec<_> = results
            .iter()
            .filter_map(|r| match r {
                ArrivalRecord::Recorded(record) => Some(*record),
                _ => None,
            })
            .collect();
        assert_eq!(recorded.len(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| **r == ArrivalRecord::AlreadyRecorded)
                .count(),
            15
        );
        assert_eq!(tracker.is_timely(&block.root()), Some(recorded[0].timely));
    }

    #[test]
    fn test_prune_drops_old_slots() {
        let clock = Arc::new(StubSlotClock::new(GENESIS_MS, MILLIS_PER_SLOT));
        let config = TimelinessConfig {
            retention_slots: 4,
            ..TimelinessConfig::default()
        };
        let tracker = BlockTimelinessTracker::new(clock, config);

        let old = block_at(1, 1);
        let recent = block_at(8, 1);
        tracker.record_arrival(&old, time_into_slot(1, 10));
        tracker.record_arrival(&recent, time_into_slot(8, 10));

        assert_eq!(tracker.prune(10), 1);
        assert_eq!(tracker.is_timely(&old.root()), None);
        assert_eq!(tracker.is_timely(&recent.root()), Some(true));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let clock = Arc::new(StubSlotClock::new(GENESIS_MS, MILLIS_PER_SLOT));
        let config = TimelinessConfig {
            max_tracked_blocks: 2,
            ..TimelinessConfig::default()
        };
        let tracker = BlockTimelinessTracker::new(clock, config);

        let blocks: Vec<_> = (1..=3).map(|slot| block_at(slot, slot)).collect();
        for block in &blocks {
            tracker.record_arrival(block, time_into_slot(block.slot(), 10));
        }

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.is_timely(&blocks[0].root()), None);
        assert_eq!(tracker.is_timely(&blocks[2].root()), Some(true));
    }

    #[test]
    fn test_metrics_counted() {
        let (clock, _, block) = setup();
        let metrics = Arc::new(Metrics::new());
        let tracker = BlockTimelinessTracker::new(clock, TimelinessConfig::default())
            .with_metrics(metrics.clone());

        tracker.record_arrival(&block, time_into_slot(SLOT, 2_500));
        tracker.record_arrival(&block_at(9, 1), time_into_slot(SLOT, 0));

        assert_eq!(metrics.get_late_blocks(), 1);
        assert_eq!(metrics.get_timely_blocks(), 0);
        assert_eq!(metrics.get_future_arrivals(), 1);
    }

    proptest! {
        #[test]
        fn prop_timely_before_attestation_due(offset in 0u64..MILLIS_PER_SLOT / 3) {
            let (_, tracker, block) = setup();
            tracker.record_arrival(&block, time_into_slot(SLOT, offset));
            prop_assert_eq!(tracker.is_timely(&block.root()), Some(true));
            prop_assert!(!tracker.is_late(&block.root()));
        }

        #[test]
        fn prop_late_from_attestation_due(offset in MILLIS_PER_SLOT / 3..MILLIS_PER_SLOT * 4) {
            let (_, tracker, block) = setup();
            tracker.record_arrival(&block, time_into_slot(SLOT, offset));
            prop_assert_eq!(tracker.is_timely(&block.root()), Some(false));
            prop_assert!(tracker.is_late(&block.root()));
        }

        #[test]
        fn prop_first_write_wins(first in 0u64..MILLIS_PER_SLOT, second in 0u64..MILLIS_PER_SLOT) {
            let (_, tracker, block) = setup();
            tracker.record_arrival(&block, time_into_slot(SLOT, first));
            let before = tracker.is_timely(&block.root());
            tracker.record_arrival(&block, time_into_slot(SLOT, second));
            prop_assert_eq!(tracker.is_timely(&block.root()), before);
            prop_assert_eq!(before, Some(first < MILLIS_PER_SLOT / 3));
        }

        #[test]
        fn prop_proposer_cutoff(offset in 0u64..MILLIS_PER_SLOT) {
            let (clock, tracker, _) = setup();
            clock.advance_time_by_millis(MILLIS_PER_SLOT + offset);
            prop_assert_eq!(tracker.is_proposing_on_time(SLOT), offset < MILLIS_PER_SLOT / 6);
        }
    }
}
