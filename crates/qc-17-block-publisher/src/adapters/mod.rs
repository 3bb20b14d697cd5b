//! Adapters for outbound ports that live inside this subsystem.

mod clock;

pub use clock::{StubSlotClock, SystemSlotClock};
