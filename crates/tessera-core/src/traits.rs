//! The storage boundary of the chain integrity manager.
//!
//! The manager never touches the filesystem directly. It holds a
//! `Box<dyn ChainStore>` so the same logic runs against an on-disk store in
//! production and an in-memory fake in tests.

use tessera_contracts::{
    error::TesseraResult,
    event::{ChainMeta, ChainedEvent},
    merkle::MerkleTree,
    report::IntegrityReport,
};

/// Persistence for one chain instance: the chain itself, its Merkle cache,
/// the most recent integrity report, and the sequence high-water mark.
///
/// Every `save_*` must be atomic from a reader's point of view: a concurrent
/// `load_*` sees either the previous contents or the new contents, never a
/// partial write. A failed save must return `Err`; callers treat it as fatal.
pub trait ChainStore: Send + Sync {
    /// Load the full chain in sequence order. A store that has never been
    /// written returns an empty chain.
    fn load_chain(&self) -> TesseraResult<Vec<ChainedEvent>>;

    /// Replace the stored chain with `chain`.
    fn save_chain(&self, chain: &[ChainedEvent]) -> TesseraResult<()>;

    /// Load the cached Merkle tree, if one has been saved.
    fn load_tree(&self) -> TesseraResult<Option<MerkleTree>>;

    fn save_tree(&self, tree: &MerkleTree) -> TesseraResult<()>;

    /// Load the report written by the last verification pass, if any.
    fn load_report(&self) -> TesseraResult<Option<IntegrityReport>>;

    fn save_report(&self, report: &IntegrityReport) -> TesseraResult<()>;

    /// Load the metadata saved by the last truncation, if any.
    fn load_meta(&self) -> TesseraResult<Option<ChainMeta>>;

    fn save_meta(&self, meta: &ChainMeta) -> TesseraResult<()>;
}
