//! # Core Domain Entities
//!
//! Chain entities shared by the block-production critical path.
//!
//! ## Clusters
//!
//! - **Chain**: `BeaconBlock`, `SignedBlock`, `Slot`, `Hash`
//! - **Forks**: `Milestone`
//! - **Data availability**: `BlobSidecar`, `KzgCommitment`, `KzgProof`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A slot number counted from genesis.
pub type Slot = u64;

/// An epoch number counted from genesis.
pub type Epoch = u64;

/// A 96-byte BLS signature.
pub type BlsSignature = [u8; 96];

/// The unsigned block message produced by a proposer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BeaconBlock {
    /// Slot this block was proposed for.
    pub slot: Slot,
    /// Index of the proposing validator.
    pub proposer_index: u64,
    /// Root of the parent block.
    pub parent_root: Hash,
    /// Post-state root.
    pub state_root: Hash,
    /// Root of the block body.
    pub body_root: Hash,
    /// KZG commitments for the blobs carried alongside this block.
    ///
    /// Always empty before `Milestone::Deneb`.
    pub blob_kzg_commitments: Vec<KzgCommitment>,
}

impl BeaconBlock {
    /// Compute the block root over every message field.
    pub fn compute_root(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.slot.to_le_bytes());
        hasher.update(self.proposer_index.to_le_bytes());
        hasher.update(self.parent_root);
        hasher.update(self.state_root);
        hasher.update(self.body_root);
        hasher.update((self.blob_kzg_commitments.len() as u64).to_le_bytes());
        for commitment in &self.blob_kzg_commitments {
            hasher.update(commitment.0);
        }
        hasher.finalize().into()
    }
}

/// A signed block as handed over by a validator duty.
///
/// The root is computed once at construction and never changes; the
/// struct exposes no mutable access. Deserialization recomputes the root
/// and ignores any root carried in the payload.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SignedBlockFields")]
pub struct SignedBlock {
    message: BeaconBlock,
    #[serde_as(as = "Bytes")]
    signature: BlsSignature,
    root: Hash,
}

#[serde_as]
#[derive(Deserialize)]
struct SignedBlockFields {
    message: BeaconBlock,
    #[serde_as(as = "Bytes")]
    signature: BlsSignature,
}

impl From<SignedBlockFields> for SignedBlock {
    fn from(fields: SignedBlockFields) -> Self {
        Self::new(fields.message, fields.signature)
    }
}

impl SignedBlock {
    /// Wrap a block message with its proposer signature.
    pub fn new(message: BeaconBlock, signature: BlsSignature) -> Self {
        let root = message.compute_root();
        Self {
            message,
            signature,
            root,
        }
    }

    /// The unsigned message.
    pub fn message(&self) -> &BeaconBlock {
        &self.message
    }

    /// The proposer signature.
    pub fn signature(&self) -> &BlsSignature {
        &self.signature
    }

    /// Block root (content hash of the message).
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Slot of the block.
    pub fn slot(&self) -> Slot {
        self.message.slot
    }

    /// Commitments the blob sidecars of this block must match.
    pub fn blob_kzg_commitments(&self) -> &[KzgCommitment] {
        &self.message.blob_kzg_commitments
    }
}

// =============================================================================
// CLUSTER B: FORKS
// =============================================================================

/// Protocol fork family, ordered by activation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// Genesis fork.
    Phase0,
    /// Sync committees.
    Altair,
    /// The merge.
    Bellatrix,
    /// Withdrawals.
    Capella,
    /// Blob sidecars introduced.
    Deneb,
    /// Raised blob limits.
    Electra,
}

impl Milestone {
    /// Whether blocks of this fork carry blob sidecars.
    pub fn supports_blob_sidecars(self) -> bool {
        self >= Milestone::Deneb
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Milestone::Phase0 => "phase0",
            Milestone::Altair => "altair",
            Milestone::Bellatrix => "bellatrix",
            Milestone::Capella => "capella",
            Milestone::Deneb => "deneb",
            Milestone::Electra => "electra",
        };
        f.write_str(name)
    }
}

// =============================================================================
// CLUSTER C: DATA AVAILABILITY
// =============================================================================

/// A 48-byte KZG commitment to a blob.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KzgCommitment(#[serde_as(as = "Bytes")] pub [u8; 48]);

/// A 48-byte KZG proof for a blob.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KzgProof(#[serde_as(as = "Bytes")] pub [u8; 48]);

/// Blob data gossiped next to the block that commits to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSidecar {
    /// Position of the blob within the block's commitment list.
    pub index: u64,
    /// Root of the block this sidecar belongs to.
    pub block_root: Hash,
    /// Slot of the block this sidecar belongs to.
    pub slot: Slot,
    /// Commitment to `blob`.
    pub kzg_commitment: KzgCommitment,
    /// Proof that `blob` matches `kzg_commitment`.
    pub kzg_proof: KzgProof,
    /// Raw blob bytes.
    pub blob: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_at(slot: Slot) -> BeaconBlock {
        BeaconBlock {
            slot,
            proposer_index: 7,
            parent_root: [1u8; 32],
            state_root: [2u8; 32],
            body_root: [3u8; 32],
            blob_kzg_commitments: vec![],
        }
    }

    #[test]
    fn test_root_is_deterministic() {
        let a = SignedBlock::new(block_at(5), [0u8; 96]);
        let b = SignedBlock::new(block_at(5), [9u8; 96]);
        // Signature is not part of the root.
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_root_covers_slot_and_commitments() {
        let base = SignedBlock::new(block_at(5), [0u8; 96]);
        let other_slot = SignedBlock::new(block_at(6), [0u8; 96]);
        assert_ne!(base.root(), other_slot.root());

        let mut with_blob = block_at(5);
        with_blob.blob_kzg_commitments.push(KzgCommitment([4u8; 48]));
        let with_blob = SignedBlock::new(with_blob, [0u8; 96]);
        assert_ne!(base.root(), with_blob.root());
    }

    #[test]
    fn test_milestone_ordering() {
        assert!(Milestone::Phase0 < Milestone::Capella);
        assert!(!Milestone::Capella.supports_blob_sidecars());
        assert!(Milestone::Deneb.supports_blob_sidecars());
        assert!(Milestone::Electra.supports_blob_sidecars());
        assert_eq!(Milestone::Deneb.to_string(), "deneb");
    }

    #[test]
    fn test_signed_block_serde() {
        let block = SignedBlock::new(block_at(3), [5u8; 96]);
        let json = serde_json::to_string(&block).unwrap();
        let decoded: SignedBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_deserialized_root_is_recomputed() {
        let block = SignedBlock::new(block_at(3), [5u8; 96]);
        let mut value = serde_json::to_value(&block).unwrap();
        value["root"] = serde_json::to_value([0xEEu8; 32]).unwrap();

        let decoded: SignedBlock = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.root(), decoded.message().compute_root());
        assert_eq!(decoded.root(), block.root());
    }

    #[test]
    fn test_deserialize_without_root() {
        let block = SignedBlock::new(block_at(4), [1u8; 96]);
        let mut value = serde_json::to_value(&block).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .remove("root");

        let decoded: SignedBlock = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, block);
    }
}
