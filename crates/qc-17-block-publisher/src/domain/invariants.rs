//! Invariant checks a blob-bearing block and its sidecars must satisfy
//! before they are handed to import.

use shared_types::{BlobSidecar, SignedBlock};
use std::sync::Arc;
use thiserror::Error;

/// A sidecar set that does not belong to its block.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BlobSidecarViolation {
    /// Number of sidecars differs from the block's commitment count.
    #[error("expected {expected} blob sidecars, got {actual}")]
    CountMismatch {
        /// Commitments in the block.
        expected: usize,
        /// Sidecars supplied.
        actual: usize,
    },
    /// More blobs than the fork allows.
    #[error("{count} blobs exceed the limit of {max}")]
    TooManyBlobs {
        /// Commitments in the block.
        count: usize,
        /// Fork limit.
        max: usize,
    },
    /// Sidecar at `position` carries the wrong index.
    #[error("sidecar at position {position} has index {index}")]
    OutOfOrder {
        /// Position in the supplied list.
        position: usize,
        /// Index found there.
        index: u64,
    },
    /// Sidecar references another block.
    #[error("sidecar {index} references a different block")]
    WrongBlock {
        /// Sidecar index.
        index: u64,
    },
    /// Sidecar commitment differs from the block commitment.
    #[error("sidecar {index} commitment does not match the block")]
    CommitmentMismatch {
        /// Sidecar index.
        index: u64,
    },
}

/// INVARIANT: the sidecars are exactly the block's blobs, in index order.
pub fn check_blob_sidecars(
    block: &SignedBlock,
    blob_sidecars: &[Arc<BlobSidecar>],
    max_blobs_per_block: usize,
) -> Result<(), BlobSidecarViolation> {
    let commitments = block.blob_kzg_commitments();

    if commitments.len() > max_blobs_per_block {
        return Err(BlobSidecarViolation::TooManyBlobs {
            count: commitments.len(),
            max: max_blobs_per_block,
        });
    }

    if commitments.len() != blob_sidecars.len() {
        return Err(BlobSidecarViolation::CountMismatch {
            expected: commitments.len(),
            actual: blob_sidecars.len(),
        });
    }

    let root = block.root();
    for (position, (sidecar, commitment)) in blob_sidecars.iter().zip(commitments).enumerate() {
        if sidecar.index != position as u64 {
            return Err(BlobSidecarViolation::OutOfOrder {
                position,
                index: sidecar.index,
            });
        }
        if sidecar.block_root != root || sidecar.slot != block.slot() {
            return Err(BlobSidecarViolation::WrongBlock {
                index: sidecar.index,
            });
        }
        if sidecar.kzg_commitment != *commitment {
            return Err(BlobSidecarViolation::CommitmentMismatch {
                index: sidecar.index,
            });
        }
    }

    Ok(())
}
