//! Slot timing arithmetic.
//!
//! All values are milliseconds. Nothing here is stored: parameters are
//! derived per call from the genesis time and slot duration the slot clock
//! reports.

use shared_types::Slot;

/// Default number of intervals a slot is divided into; the attestation
/// deadline sits at the end of the first one.
pub const INTERVALS_PER_SLOT: u64 = 3;

/// How late a block broadcast went out within its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastDelay {
    /// Before half of the attestation deadline.
    OnTime,
    /// At or past half of the attestation deadline; block may be orphaned.
    Delayed,
    /// At or past the attestation deadline; block likely to be orphaned.
    TooLate,
}

/// Timing parameters of a single slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotTimingParameters {
    /// Wall-clock start of the slot.
    pub slot_start_millis: u64,
    /// Offset into the slot at which attestations are due.
    pub attestation_due_millis: u64,
    /// Offset into the slot by which a local proposal must be out.
    pub proposer_cutoff_millis: u64,
}

impl SlotTimingParameters {
    /// Derive the parameters for `slot`.
    pub fn for_slot(
        genesis_time_millis: u64,
        slot_duration_millis: u64,
        intervals_per_slot: u64,
        slot: Slot,
    ) -> Self {
        let slot_start_millis =
            genesis_time_millis.saturating_add(slot.saturating_mul(slot_duration_millis));
        let attestation_due_millis = slot_duration_millis / intervals_per_slot.max(1);
        Self {
            slot_start_millis,
            attestation_due_millis,
            proposer_cutoff_millis: attestation_due_millis / 2,
        }
    }

    /// Milliseconds between slot start and `time_millis`.
    ///
    /// `None` when `time_millis` is before the slot starts.
    pub fn offset_into_slot(&self, time_millis: u64) -> Option<u64> {
        time_millis.checked_sub(self.slot_start_millis)
    }

    /// Whether an arrival `offset` into the slot misses the attestation deadline.
    pub fn is_late_offset(&self, offset: u64) -> bool {
        offset >= self.attestation_due_millis
    }

    /// Classify a broadcast `delay` milliseconds into the slot.
    pub fn classify_broadcast_delay(&self, delay: u64) -> BroadcastDelay {
        if delay >= self.attestation_due_millis {
            BroadcastDelay::TooLate
        } else if delay >= self.attestation_due_millis / 2 {
            BroadcastDelay::Delayed
        } else {
            BroadcastDelay::OnTime
        }
    }

    /// Whether `now_millis` is still within the proposer cutoff.
    pub fn is_within_proposer_cutoff(&self, now_millis: u64) -> bool {
        match self.offset_into_slot(now_millis) {
            None | Some(0) => true,
            Some(offset) => offset < self.proposer_cutoff_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: u64 = 1_600_000_000_000;
    const SLOT_MS: u64 = 6_000;

    fn params(slot: Slot) -> SlotTimingParameters {
        SlotTimingParameters::for_slot(GENESIS, SLOT_MS, INTERVALS_PER_SLOT, slot)
    }

    #[test]
    fn test_derived_offsets() {
        let p = params(1);
        assert_eq!(p.slot_start_millis, GENESIS + SLOT_MS);
        assert_eq!(p.attestation_due_millis, 2_000);
        assert_eq!(p.proposer_cutoff_millis, 1_000);
    }

    #[test]
    fn test_offset_before_slot_start() {
        let p = params(2);
        assert_eq!(p.offset_into_slot(p.slot_start_millis - 1), None);
        assert_eq!(p.offset_into_slot(p.slot_start_millis), Some(0));
        assert_eq!(p.offset_into_slot(p.slot_start_millis + 42), Some(42));
    }

    #[test]
    fn test_late_boundary_is_inclusive() {
        let p = params(1);
        assert!(!p.is_late_offset(1_999));
        assert!(p.is_late_offset(2_000));
    }

    #[test]
    fn test_proposer_cutoff() {
        let p = params(1);
        let start = p.slot_start_millis;
        assert!(p.is_within_proposer_cutoff(start - 500));
        assert!(p.is_within_proposer_cutoff(start));
        assert!(p.is_within_proposer_cutoff(start + 999));
        assert!(!p.is_within_proposer_cutoff(start + 1_000));
        assert!(!p.is_within_proposer_cutoff(start + 2_000));
    }

    #[test]
    fn test_broadcast_delay_thresholds() {
        let p = params(1);
        assert_eq!(p.classify_broadcast_delay(0), BroadcastDelay::OnTime);
        assert_eq!(p.classify_broadcast_delay(999), BroadcastDelay::OnTime);
        assert_eq!(p.classify_broadcast_delay(1_000), BroadcastDelay::Delayed);
        assert_eq!(p.classify_broadcast_delay(1_999), BroadcastDelay::Delayed);
        assert_eq!(p.classify_broadcast_delay(2_000), BroadcastDelay::TooLate);
        assert_eq!(p.classify_broadcast_delay(5_999), BroadcastDelay::TooLate);
    }

    #[test]
    fn test_zero_intervals_does_not_divide_by_zero() {
        let p = SlotTimingParameters::for_slot(0, SLOT_MS, 0, 0);
        assert_eq!(p.attestation_due_millis, SLOT_MS);
    }
}
