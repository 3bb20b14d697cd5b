//! # Quantum Chain - Block Publisher (Subsystem 17)
//!
//! **Bounded Context:** Block Production critical path (publish & timeliness)
//! **Architecture Compliance:** DDD + Hexagonal
//!
//! ## Purpose
//!
//! Once a validator duty has produced a signed block (and, from Deneb on, its
//! blob sidecars) this subsystem:
//! - imports it through the state-transition engine at the requested
//!   broadcast validation level,
//! - gossips it only if that import succeeded,
//! - reports the attempt to duty metrics and performance tracking.
//!
//! Alongside, the [`BlockTimelinessTracker`] records once per block root
//! whether the block arrived before the attestation deadline of its slot,
//! and tells a proposer whether it is still within its own cutoff.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - SystemSlotClock / StubSlotClock                  │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: BlockPublisherApi                       │
//! │  - Outbound: BlockImportChannel, BlockGossipChannel │
//! │    BlobSidecarGossipChannel, SlotClock,             │
//! │    DutyMetrics, PerformanceTracker                  │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - Broadcast validation gate                        │
//! │  - Slot timing arithmetic                           │
//! │  - Blob sidecar invariants                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Import Gate**: nothing is gossiped unless import succeeded at or
//!    above the requested validation level
//! 2. **Single Attempt**: one import per `publish` call, at most one broadcast
//! 3. **Write Once**: a block root's timeliness is set by the first arrival
//! 4. **Inclusive Late**: arriving exactly at the attestation deadline is late
//!
//! ## Module Structure
//!
//! - [`domain`]: Validation levels, import outcomes, slot timing, invariants
//! - [`ports`]: Hexagonal architecture interfaces (inbound/outbound)
//! - [`publisher`]: Import-then-publish pipeline and fork variants
//! - [`adapters`]: Slot clocks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Slot clock adapters
pub mod adapters;
/// Domain models and business logic
pub mod domain;
pub mod ports;
pub mod publisher;
pub mod timeliness;

mod config;
mod error;
mod metrics;

pub use config::{BlockPublisherConfig, ForkActivation, ForkSchedule, TimelinessConfig};
pub use error::{ConfigError, GossipError, ImportChannelError, PublishError, Result};
pub use metrics::Metrics;

pub use domain::{
    BlockImportResult, BroadcastDelay, BroadcastReport, BroadcastValidationLevel,
    BroadcastValidationResult, ImportAndBroadcastValidationResult, ImportFailureReason,
    PublishAttemptOutcome, PublishOutcome, SlotTimingParameters,
};

pub use ports::{
    BlobSidecarGossipChannel, BlockGossipChannel, BlockImportChannel, BlockPublisherApi,
    DutyMetrics, NoopPerformanceTracker, PerformanceTracker, SlotClock,
};

pub use publisher::{
    BlockAndBlobSidecarsPublisher, BlockPublisher, BlockPublisherDeneb, BlockPublisherPhase0,
    MilestoneBasedBlockPublisher, PublisherPorts,
};

pub use timeliness::{ArrivalRecord, BlockTimelinessTracker, TimelinessRecord};

/// Subsystem identifier for IPC communication
pub const SUBSYSTEM_ID: u8 = 17;

/// Default blob limit for Deneb blocks
pub const DEFAULT_MAX_BLOBS_PER_BLOCK: usize = 6;

/// Default blob limit from Electra on
pub const DEFAULT_MAX_BLOBS_PER_BLOCK_ELECTRA: usize = 9;
