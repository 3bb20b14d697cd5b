//! # Shared Types Crate
//!
//! Chain entities exchanged between the block-production critical path and
//! its collaborators (import, gossip, storage).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-subsystem types are defined here.
//! - **Immutable Blocks**: A `SignedBlock` fixes its root at construction and
//!   exposes read-only accessors only.

pub mod entities;

pub use entities::*;
