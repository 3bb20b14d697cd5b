//! # Domain Layer for Block Publishing
//!
//! Pure logic with no I/O: validation levels and import outcomes, slot
//! timing arithmetic, blob sidecar invariants and publish results.

mod invariants;
mod outcome;
mod slot_timing;
mod validation;

pub use invariants::*;
pub use outcome::*;
pub use slot_timing::*;
pub use validation::*;
