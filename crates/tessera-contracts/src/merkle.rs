//! Merkle tree and inclusion-proof data types.
//!
//! Construction and verification live in `tessera-core::merkle`; this module
//! only defines the shapes that are persisted and exported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A binary hash tree over the event digests of a chain, stored level by level.
///
/// `levels[0]` holds the leaves in chain order; the last level holds the root.
/// The tree is a regenerable cache and is never consulted for tamper detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTree {
    pub levels: Vec<Vec<String>>,
    pub leaf_count: usize,
    pub built_at: DateTime<Utc>,
}

impl MerkleTree {
    /// The tree of an empty chain.
    pub fn empty() -> Self {
        Self {
            levels: Vec::new(),
            leaf_count: 0,
            built_at: Utc::now(),
        }
    }

    /// The root digest, or `None` for an empty tree.
    pub fn root(&self) -> Option<&str> {
        self.levels
            .last()
            .and_then(|level| level.first())
            .map(String::as_str)
    }
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub direction: Direction,
    pub sibling_hash: String,
}

/// The sibling path from one leaf up to the root.
///
/// A verifier holding only the root and this proof can confirm that a given
/// event occupies `leaf_index` without seeing any other event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Number of sibling hashes in the proof.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
