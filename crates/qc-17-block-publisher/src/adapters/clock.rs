//! Slot clock adapters.

use crate::ports::SlotClock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Slot clock backed by the system wall clock.
#[derive(Clone, Copy, Debug)]
pub struct SystemSlotClock {
    genesis_time_millis: u64,
    slot_duration_millis: u64,
}

impl SystemSlotClock {
    /// Clock for a chain that started at `genesis_time_millis`.
    pub fn new(genesis_time_millis: u64, slot_duration_millis: u64) -> Self {
        Self {
            genesis_time_millis,
            slot_duration_millis,
        }
    }
}

impl SlotClock for SystemSlotClock {
    fn genesis_time_millis(&self) -> u64 {
        self.genesis_time_millis
    }

    fn slot_duration_millis(&self) -> u64 {
        self.slot_duration_millis
    }

    fn current_time_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually driven slot clock for simulations and tests.
///
/// Starts at genesis time and only moves when advanced.
#[derive(Debug)]
pub struct StubSlotClock {
    genesis_time_millis: u64,
    slot_duration_millis: u64,
    now_millis: AtomicU64,
}

impl StubSlotClock {
    /// Clock positioned at genesis.
    pub fn new(genesis_time_millis: u64, slot_duration_millis: u64) -> Self {
        Self {
            genesis_time_millis,
            slot_duration_millis,
            now_millis: AtomicU64::new(genesis_time_millis),
        }
    }

    /// Move the clock forward.
    pub fn advance_time_by_millis(&self, millis: u64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set_time_millis(&self, millis: u64) {
        self.now_millis.store(millis, Ordering::SeqCst);
    }
}

impl SlotClock for StubSlotClock {
    fn genesis_time_millis(&self) -> u64 {
        self.genesis_time_millis
    }

    fn slot_duration_millis(&self) -> u64 {
        self.slot_duration_millis
    }

    fn current_time_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}
