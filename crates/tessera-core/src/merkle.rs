//! Merkle tree construction and inclusion proofs.
//!
//! Leaves are `event_digest(event)` in chain order. Each parent is
//! SHA-256(left_hex ‖ right_hex); an odd trailing node is paired with itself.
//! A single-leaf tree's root is the leaf.
//!
//! `verify_proof` only needs the event, the proof, and a root, so it can be
//! run by a party that has never seen the rest of the chain.

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    event::Event,
    merkle::{Direction, MerkleProof, MerkleTree, ProofStep},
};

use crate::digest::event_digest;

/// Parent digest of two child digests.
pub fn node_hash(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build a tree over precomputed leaf digests.
pub fn build_tree(leaves: Vec<String>) -> MerkleTree {
    if leaves.is_empty() {
        return MerkleTree::empty();
    }

    let leaf_count = leaves.len();
    let mut levels = vec![leaves];

    loop {
        let Some(current) = levels.last() else { break };
        if current.len() <= 1 {
            break;
        }
        let next: Vec<String> = current
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                node_hash(left, right)
            })
            .collect();
        levels.push(next);
    }

    debug!(leaf_count, depth = levels.len(), "built merkle tree");

    MerkleTree {
        levels,
        leaf_count,
        built_at: Utc::now(),
    }
}

/// Build a tree over `events` in the given order.
pub fn build_merkle_tree(events: &[Event]) -> TesseraResult<MerkleTree> {
    let leaves = events
        .iter()
        .map(event_digest)
        .collect::<TesseraResult<Vec<_>>>()?;
    Ok(build_tree(leaves))
}

/// Collect the sibling path for the leaf at `index`.
///
/// Returns `IndexOutOfRange` when `index` is not a leaf of `tree`, and
/// `Serialization` when a (deserialized) tree is missing nodes.
pub fn create_proof(tree: &MerkleTree, index: usize) -> TesseraResult<MerkleProof> {
    if index >= tree.leaf_count {
        return Err(TesseraError::IndexOutOfRange {
            index,
            len: tree.leaf_count,
        });
    }

    let mut steps = Vec::new();
    let mut position = index;

    // Every level except the root contributes one sibling.
    let below_root = tree.levels.len().saturating_sub(1);
    for (depth, level) in tree.levels.iter().take(below_root).enumerate() {
        let own = level.get(position).ok_or_else(|| TesseraError::Serialization {
            reason: format!("merkle tree level {} has no node at {}", depth, position),
        })?;
        let (direction, sibling_index) = if position % 2 == 0 {
            (Direction::Right, position + 1)
        } else {
            (Direction::Left, position - 1)
        };
        let sibling = level.get(sibling_index).unwrap_or(own);
        steps.push(ProofStep {
            direction,
            sibling_hash: sibling.clone(),
        });
        position /= 2;
    }

    Ok(MerkleProof {
        leaf_index: index,
        steps,
    })
}

/// Fold a proof over a leaf digest and return the implied root.
pub fn root_from_leaf(leaf_hash: &str, proof: &MerkleProof) -> String {
    proof
        .steps
        .iter()
        .fold(leaf_hash.to_string(), |current, step| match step.direction {
            Direction::Right => node_hash(&current, &step.sibling_hash),
            Direction::Left => node_hash(&step.sibling_hash, &current),
        })
}

/// Check that `event` is included under `root` according to `proof`.
pub fn verify_proof(event: &Event, proof: &MerkleProof, root: &str) -> TesseraResult<bool> {
    let leaf = event_digest(event)?;
    Ok(root_from_leaf(&leaf, proof) == root)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use tessera_contracts::event::Origin;

    use super::*;

    fn events(n: usize) -> Vec<Event> {
        (0..n)
            .map(|i| {
                let mut details = serde_json::Map::new();
                details.insert("index".into(), json!(i));
                Event::new(format!("action-{}", i), details, "test", Origin::new("h", "u"))
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_tree() {
        let tree = build_merkle_tree(&[]).unwrap();
        assert_eq!(tree.leaf_count, 0);
        assert!(tree.root().is_none());
        assert!(matches!(
            create_proof(&tree, 0),
            Err(TesseraError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let evs = events(1);
        let tree = build_merkle_tree(&evs).unwrap();
        assert_eq!(tree.root().unwrap(), event_digest(&evs[0]).unwrap());

        let proof = create_proof(&tree, 0).unwrap();
        assert!(proof.is_empty());
        assert!(verify_proof(&evs[0], &proof, tree.root().unwrap()).unwrap());
    }

    #[test]
    fn odd_trailing_node_is_paired_with_itself() {
        let leaves: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let tree = build_tree(leaves);

        assert_eq!(tree.levels.len(), 3);
        assert_eq!(tree.levels[1][0], node_hash("a", "b"));
        assert_eq!(tree.levels[1][1], node_hash("c", "c"));
        assert_eq!(
            tree.root().unwrap(),
            node_hash(&node_hash("a", "b"), &node_hash("c", "c"))
        );
    }

    #[test]
    fn construction_is_deterministic() {
        let evs = events(6);
        let a = build_merkle_tree(&evs).unwrap();
        let b = build_merkle_tree(&evs).unwrap();
        assert_eq!(a.levels, b.levels);
    }

    #[test]
    fn every_proof_verifies_for_every_size() {
        for n in 1..=9 {
            let evs = events(n);
            let tree = build_merkle_tree(&evs).unwrap();
            let root = tree.root().unwrap().to_string();
            for (i, event) in evs.iter().enumerate() {
                let proof = create_proof(&tree, i).unwrap();
                assert_eq!(proof.leaf_index, i);
                assert!(
                    verify_proof(event, &proof, &root).unwrap(),
                    "proof for leaf {} of {} failed",
                    i,
                    n
                );
            }
        }
    }

    #[test]
    fn mutated_event_fails_proof() {
        let evs = events(5);
        let tree = build_merkle_tree(&evs).unwrap();
        let root = tree.root().unwrap();

        for i in 0..evs.len() {
            let proof = create_proof(&tree, i).unwrap();
            let mut tampered = evs[i].clone();
            tampered.action.push('x');
            assert!(!verify_proof(&tampered, &proof, root).unwrap());
        }
    }

    #[test]
    fn proof_for_one_leaf_does_not_verify_another() {
        let evs = events(4);
        let tree = build_merkle_tree(&evs).unwrap();
        let proof = create_proof(&tree, 0).unwrap();
        assert!(!verify_proof(&evs[1], &proof, tree.root().unwrap()).unwrap());
    }

    #[test]
    fn malformed_tree_is_an_error_not_a_panic() {
        let mut tree = build_merkle_tree(&events(4)).unwrap();
        tree.levels[0].truncate(1);
        assert!(matches!(
            create_proof(&tree, 3),
            Err(TesseraError::Serialization { .. })
        ));
    }
}
