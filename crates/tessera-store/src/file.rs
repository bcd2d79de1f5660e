//! Directory-backed implementation of `ChainStore`.
//!
//! One directory per chain, pretty-printed JSON files:
//!
//!   chain.json            ordered `ChainedEvent` list (authoritative)
//!   merkle_tree.json      `MerkleTree` cache (safe to delete)
//!   integrity_proof.json  report from the last verification pass
//!   chain_meta.json       sequence high-water mark, written on truncation
//!
//! Every write goes to a sibling `*.tmp` file, is fsynced, and is renamed
//! over the target. A reader therefore sees either the old file or the new
//! one, and an unreadable file is reported as a storage or serialization
//! error, never as chain corruption.

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    event::{ChainMeta, ChainedEvent},
    merkle::MerkleTree,
    report::IntegrityReport,
};
use tessera_core::traits::ChainStore;

pub const CHAIN_FILE: &str = "chain.json";
pub const TREE_FILE: &str = "merkle_tree.json";
pub const REPORT_FILE: &str = "integrity_proof.json";
pub const META_FILE: &str = "chain_meta.json";

/// A `ChainStore` rooted at a storage directory.
#[derive(Debug, Clone)]
pub struct FileChainStore {
    dir: PathBuf,
}

impl FileChainStore {
    /// Use `dir` as the chain directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> TesseraResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| TesseraError::storage(format!("create {}", dir.display()), e))?;
        debug!(dir = %dir.display(), "file chain store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chain_path(&self) -> PathBuf {
        self.dir.join(CHAIN_FILE)
    }

    pub fn tree_path(&self) -> PathBuf {
        self.dir.join(TREE_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }
}

impl ChainStore for FileChainStore {
    fn load_chain(&self) -> TesseraResult<Vec<ChainedEvent>> {
        Ok(read_json::<Vec<ChainedEvent>>(&self.chain_path())?.unwrap_or_default())
    }

    fn save_chain(&self, chain: &[ChainedEvent]) -> TesseraResult<()> {
        write_json_atomic(&self.chain_path(), chain)
    }

    fn load_tree(&self) -> TesseraResult<Option<MerkleTree>> {
        read_json(&self.tree_path())
    }

    fn save_tree(&self, tree: &MerkleTree) -> TesseraResult<()> {
        write_json_atomic(&self.tree_path(), tree)
    }

    fn load_report(&self) -> TesseraResult<Option<IntegrityReport>> {
        read_json(&self.report_path())
    }

    fn save_report(&self, report: &IntegrityReport) -> TesseraResult<()> {
        write_json_atomic(&self.report_path(), report)
    }

    fn load_meta(&self) -> TesseraResult<Option<ChainMeta>> {
        read_json(&self.meta_path())
    }

    fn save_meta(&self, meta: &ChainMeta) -> TesseraResult<()> {
        write_json_atomic(&self.meta_path(), meta)
    }
}

/// Read and decode a JSON file; `Ok(None)` when it does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> TesseraResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TesseraError::storage(format!("read {}", path.display()), e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| TesseraError::Serialization {
            reason: format!("{} is not valid JSON for this record: {}", path.display(), e),
        })
}

/// Write `value` as pretty JSON to `path` via temp file, fsync, and rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> TesseraResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .map_err(|e| TesseraError::storage(format!("create {}", parent.display()), e))?;

    let file_name = path.file_name().ok_or_else(|| TesseraError::Storage {
        reason: format!("{} does not name a file", path.display()),
    })?;
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp = parent.join(tmp_name);

    let bytes = serde_json::to_vec_pretty(value)?;
    {
        let mut file = File::create(&tmp)
            .map_err(|e| TesseraError::storage(format!("create {}", tmp.display()), e))?;
        file.write_all(&bytes)
            .map_err(|e| TesseraError::storage(format!("write {}", tmp.display()), e))?;
        file.sync_all()
            .map_err(|e| TesseraError::storage(format!("sync {}", tmp.display()), e))?;
    }
    fs::rename(&tmp, path).map_err(|e| {
        TesseraError::storage(
            format!("rename {} to {}", tmp.display(), path.display()),
            e,
        )
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "file written atomically");
    Ok(())
}
