//! In-memory implementation of `ChainStore`.
//!
//! `InMemoryChainStore` keeps the chain and its side files behind an
//! `Arc<Mutex<_>>`. Clones share state, which lets a caller keep a handle to
//! the "disk" a manager writes to, inspect it, or alter it and reopen.

use std::sync::{Arc, Mutex, MutexGuard};

use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    event::{ChainMeta, ChainedEvent},
    merkle::MerkleTree,
    report::IntegrityReport,
};
use tessera_core::traits::ChainStore;

/// Everything an on-disk store would keep in its files.
#[derive(Debug, Default)]
pub struct InMemoryState {
    pub chain: Vec<ChainedEvent>,
    pub tree: Option<MerkleTree>,
    pub report: Option<IntegrityReport>,
    pub meta: Option<ChainMeta>,
    /// When true, every save fails with a storage error.
    pub fail_on_save: bool,
    /// Number of successful chain saves.
    pub chain_saves: u64,
}

/// A `ChainStore` that never touches the filesystem.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChainStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with an existing chain, as if it had been loaded from disk.
    pub fn with_chain(chain: Vec<ChainedEvent>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.chain = chain;
        }
        store
    }

    /// Lock the shared state for inspection or mutation.
    pub fn state(&self) -> TesseraResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| TesseraError::Storage {
            reason: format!("in-memory store lock poisoned: {}", e),
        })
    }

    fn writable(&self) -> TesseraResult<MutexGuard<'_, InMemoryState>> {
        let state = self.state()?;
        if state.fail_on_save {
            return Err(TesseraError::Storage {
                reason: "simulated storage failure".to_string(),
            });
        }
        Ok(state)
    }
}

impl ChainStore for InMemoryChainStore {
    fn load_chain(&self) -> TesseraResult<Vec<ChainedEvent>> {
        Ok(self.state()?.chain.clone())
    }

    fn save_chain(&self, chain: &[ChainedEvent]) -> TesseraResult<()> {
        let mut state = self.writable()?;
        state.chain = chain.to_vec();
        state.chain_saves += 1;
        Ok(())
    }

    fn load_tree(&self) -> TesseraResult<Option<MerkleTree>> {
        Ok(self.state()?.tree.clone())
    }

    fn save_tree(&self, tree: &MerkleTree) -> TesseraResult<()> {
        self.writable()?.tree = Some(tree.clone());
        Ok(())
    }

    fn load_report(&self) -> TesseraResult<Option<IntegrityReport>> {
        Ok(self.state()?.report.clone())
    }

    fn save_report(&self, report: &IntegrityReport) -> TesseraResult<()> {
        self.writable()?.report = Some(report.clone());
        Ok(())
    }

    fn load_meta(&self) -> TesseraResult<Option<ChainMeta>> {
        Ok(self.state()?.meta)
    }

    fn save_meta(&self, meta: &ChainMeta) -> TesseraResult<()> {
        self.writable()?.meta = Some(*meta);
        Ok(())
    }
}
