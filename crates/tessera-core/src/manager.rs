//! The chain integrity manager: owner of one append-only HMAC chain.
//!
//! The manager enforces the chain model:
//!
//!   canonicalize → hash → link → persist → (later) recompute → report
//!
//! Persistence happens before an operation reports success. If the store
//! rejects a write, the in-memory chain is restored to what is on disk and
//! the error is returned.
//!
//! Verification reports at most one corruption per entry, and only for
//! entries whose own stored fields disagree with recomputation. An entry
//! downstream of a tampered ancestor is not blamed for the ancestor.

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use tessera_contracts::{
    error::TesseraResult,
    event::{ChainMeta, ChainedEvent, Event},
    export::{ChainExport, ExportedEntry},
    merkle::{MerkleProof, MerkleTree},
    report::{Corruption, CorruptionReason, IntegrityReport},
};

use crate::{
    digest::{canonical_bytes, event_digest, sha256_hex, ChainKey},
    merkle::{self, build_tree},
    traits::ChainStore,
};

/// The stored and the recomputed `chain_hash` of the previous entry.
///
/// A successor may legitimately link to either: the stored value is what it
/// was chained against, the recomputed value is what it should have been.
struct Predecessor {
    sequence: u64,
    stored: String,
    recomputed: String,
}

/// Owns the chain, its Merkle cache, and the store both are persisted to.
///
/// One manager per chain. Mutating operations take `&mut self`; the manager
/// assumes it is the only writer of its store.
pub struct ChainIntegrityManager {
    store: Box<dyn ChainStore>,
    key: ChainKey,
    chain: Vec<ChainedEvent>,
    tree: MerkleTree,
    next_sequence: u64,
}

impl ChainIntegrityManager {
    /// Load the chain from `store` and prepare it for appends.
    ///
    /// A cached Merkle tree is reused only when its leaf count matches the
    /// loaded chain; otherwise it is rebuilt in memory.
    pub fn open(store: Box<dyn ChainStore>, key: ChainKey) -> TesseraResult<Self> {
        let chain = store.load_chain()?;
        let tree = match store.load_tree()? {
            Some(tree) if tree.leaf_count == chain.len() => tree,
            cached => {
                if cached.is_some() {
                    debug!(entries = chain.len(), "cached merkle tree is stale; rebuilding");
                }
                tree_for(&chain)?
            }
        };

        let floor = store.load_meta()?.map_or(0, |m| m.next_sequence);
        let next_sequence = chain.last().map_or(0, |e| e.sequence + 1).max(floor);

        info!(entries = chain.len(), next_sequence, "audit chain opened");

        Ok(Self {
            store,
            key,
            chain,
            tree,
            next_sequence,
        })
    }

    /// All entries, in sequence order.
    pub fn entries(&self) -> &[ChainedEvent] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// The `chain_hash` a new entry would link to.
    pub fn head_hash(&self) -> &str {
        self.chain
            .last()
            .map(|e| e.chain_hash.as_str())
            .unwrap_or(ChainedEvent::GENESIS_HASH)
    }

    /// Sequence number the next append will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Root of the cached Merkle tree.
    pub fn merkle_root(&self) -> Option<&str> {
        self.tree.root()
    }

    /// The report written by the last verification pass.
    pub fn last_report(&self) -> TesseraResult<Option<IntegrityReport>> {
        self.store.load_report()
    }

    /// Append `event`, persist the chain, and return the new `chain_hash`.
    ///
    /// The event is canonicalized before anything else happens, so an event
    /// that cannot be serialized never reaches the chain.
    pub fn append(&mut self, event: Event) -> TesseraResult<String> {
        let bytes = canonical_bytes(&event)?;

        let previous_hash = self.head_hash().to_string();
        let sequence = self.next_sequence;
        let event_hash = sha256_hex(&bytes);
        let chain_hash = self.key.chain_hash(&bytes, &previous_hash);

        self.chain.push(ChainedEvent {
            sequence,
            timestamp: Utc::now(),
            event,
            event_hash,
            previous_hash,
            chain_hash: chain_hash.clone(),
            integrity_valid: true,
        });

        if let Err(err) = self.store.save_chain(&self.chain) {
            self.chain.pop();
            error!(sequence, error = %err, "append could not be persisted; rolled back");
            return Err(err);
        }

        self.next_sequence = sequence + 1;
        debug!(sequence, chain_hash = %chain_hash, "event appended");
        Ok(chain_hash)
    }

    /// Recompute every entry and report all corruptions found.
    ///
    /// Checks per entry, first failure wins:
    ///
    /// 1. `event_hash` against SHA-256 of the stored event
    /// 2. `chain_hash` against the HMAC of the stored event and `previous_hash`
    /// 3. `previous_hash` against the predecessor's stored or recomputed
    ///    `chain_hash` (the genesis sentinel for entry 0)
    /// 4. `sequence` greater than the predecessor's
    ///
    /// Updates every `integrity_valid` flag, rebuilds and saves the Merkle
    /// tree, and saves the report. The walk never stops early.
    pub fn verify(&mut self) -> TesseraResult<IntegrityReport> {
        let mut corruptions = Vec::new();
        let mut flags_changed = false;
        let mut predecessor: Option<Predecessor> = None;

        for (index, entry) in self.chain.iter_mut().enumerate() {
            let bytes = canonical_bytes(&entry.event)?;
            let event_hash = sha256_hex(&bytes);
            let chain_hash = self.key.chain_hash(&bytes, &entry.previous_hash);

            let finding = first_failure(index, entry, &event_hash, &chain_hash, predecessor.as_ref());
            let valid = finding.is_none();
            if entry.integrity_valid != valid {
                entry.integrity_valid = valid;
                flags_changed = true;
            }

            if let Some(corruption) = finding {
                warn!(
                    event_index = index,
                    reason = %corruption.reason,
                    expected = %corruption.expected,
                    actual = %corruption.actual,
                    "audit chain corruption detected"
                );
                corruptions.push(corruption);
            }

            predecessor = Some(Predecessor {
                sequence: entry.sequence,
                stored: entry.chain_hash.clone(),
                recomputed: chain_hash,
            });
        }

        self.rebuild_tree()?;
        if flags_changed {
            self.store.save_chain(&self.chain)?;
        }

        let report = IntegrityReport {
            valid: corruptions.is_empty(),
            events_verified: self.chain.len(),
            corruptions,
            merkle_root: self.tree.root().map(str::to_string),
            timestamp: Utc::now(),
        };
        self.store.save_report(&report)?;

        info!(
            events_verified = report.events_verified,
            corruptions = report.corruptions.len(),
            valid = report.valid,
            "audit chain verified"
        );

        Ok(report)
    }

    /// Inclusion proof for the entry at `index` against the current root.
    pub fn create_proof(&mut self, index: usize) -> TesseraResult<MerkleProof> {
        if self.tree.leaf_count != self.chain.len() {
            self.rebuild_tree()?;
        }
        merkle::create_proof(&self.tree, index)
    }

    /// Check an inclusion proof using only the event, the proof, and a root.
    pub fn verify_proof(event: &Event, proof: &MerkleProof, root: &str) -> TesseraResult<bool> {
        merkle::verify_proof(event, proof, root)
    }

    /// The longest prefix of entries flagged valid by the last verification.
    ///
    /// Entries after the first invalid one are excluded even if their own
    /// fields check out: they are chained to an ancestor that can no longer be
    /// trusted. Nothing is re-chained; call `verify` first so the flags are
    /// current.
    pub fn recover_valid_entries(&self) -> Vec<ChainedEvent> {
        self.chain
            .iter()
            .take_while(|e| e.integrity_valid)
            .cloned()
            .collect()
    }

    /// Replace the whole chain with `entries`, persisting before installing.
    ///
    /// The sequence high-water mark is saved first, so numbers handed out to
    /// dropped entries are never given out again, even after a reopen.
    pub fn replace_chain(&mut self, entries: Vec<ChainedEvent>) -> TesseraResult<()> {
        let next_sequence = entries
            .last()
            .map_or(0, |e| e.sequence + 1)
            .max(self.next_sequence);
        self.store.save_meta(&ChainMeta { next_sequence })?;
        self.store.save_chain(&entries)?;

        let previous_len = self.chain.len();
        self.chain = entries;
        self.next_sequence = next_sequence;
        self.rebuild_tree()?;

        warn!(
            previous_len,
            new_len = self.chain.len(),
            "audit chain replaced"
        );
        Ok(())
    }

    /// Verify, then bundle every entry with its inclusion proof.
    ///
    /// The bundle never includes the HMAC key.
    pub fn export_with_proofs(&mut self) -> TesseraResult<ChainExport> {
        let report = self.verify()?;

        let mut entries = Vec::with_capacity(self.chain.len());
        for (index, entry) in self.chain.iter().enumerate() {
            entries.push(ExportedEntry {
                entry: entry.clone(),
                proof: merkle::create_proof(&self.tree, index)?,
            });
        }

        info!(entries = entries.len(), "audit chain exported with proofs");

        Ok(ChainExport {
            export_id: Uuid::new_v4(),
            exported_at: Utc::now(),
            merkle_root: report.merkle_root.clone(),
            report,
            entries,
        })
    }

    fn rebuild_tree(&mut self) -> TesseraResult<()> {
        let tree = tree_for(&self.chain)?;
        self.store.save_tree(&tree)?;
        self.tree = tree;
        Ok(())
    }
}

impl std::fmt::Debug for ChainIntegrityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainIntegrityManager")
            .field("entries", &self.chain.len())
            .field("merkle_root", &self.tree.root())
            .finish_non_exhaustive()
    }
}

fn tree_for(chain: &[ChainedEvent]) -> TesseraResult<MerkleTree> {
    let leaves = chain
        .iter()
        .map(|e| event_digest(&e.event))
        .collect::<TesseraResult<Vec<_>>>()?;
    Ok(build_tree(leaves))
}

fn first_failure(
    index: usize,
    entry: &ChainedEvent,
    event_hash: &str,
    chain_hash: &str,
    predecessor: Option<&Predecessor>,
) -> Option<Corruption> {
    let corruption = |reason, expected: &str, actual: &str| Corruption {
        event_index: index,
        reason,
        expected: expected.to_string(),
        actual: actual.to_string(),
    };

    if entry.event_hash != event_hash {
        return Some(corruption(
            CorruptionReason::EventHashMismatch,
            event_hash,
            &entry.event_hash,
        ));
    }

    if entry.chain_hash != chain_hash {
        return Some(corruption(
            CorruptionReason::ChainHashMismatch,
            chain_hash,
            &entry.chain_hash,
        ));
    }

    let (linked, expected_link) = match predecessor {
        None => (
            entry.previous_hash == ChainedEvent::GENESIS_HASH,
            ChainedEvent::GENESIS_HASH,
        ),
        Some(prev) => (
            entry.previous_hash == prev.stored || entry.previous_hash == prev.recomputed,
            prev.stored.as_str(),
        ),
    };
    if !linked {
        return Some(corruption(
            CorruptionReason::PreviousHashMismatch,
            expected_link,
            &entry.previous_hash,
        ));
    }

    if let Some(prev) = predecessor {
        if entry.sequence <= prev.sequence {
            return Some(corruption(
                CorruptionReason::SequenceRegression,
                &format!("greater than {}", prev.sequence),
                &entry.sequence.to_string(),
            ));
        }
    }

    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
