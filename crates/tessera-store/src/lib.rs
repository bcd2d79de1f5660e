//! # tessera-store
//!
//! Storage backends implementing [`ChainStore`](tessera_core::traits::ChainStore).
//!
//! - [`InMemoryChainStore`]: shared-state store for tests and ephemeral chains.
//! - [`FileChainStore`]: one directory per chain, written with
//!   temp-file-and-rename so readers never observe a partial file.
//!
//! [`write_json_atomic`] is exported for callers that write export bundles
//! next to a chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_core::{ChainIntegrityManager, ChainKey};
//! use tessera_store::FileChainStore;
//!
//! let store = FileChainStore::open("/var/lib/tessera")?;
//! let manager = ChainIntegrityManager::open(Box::new(store), ChainKey::new(secret)?)?;
//! ```

pub mod file;
pub mod memory;

pub use file::{read_json, write_json_atomic, FileChainStore};
pub use memory::{InMemoryChainStore, InMemoryState};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};
    use tempfile::tempdir;

    use tessera_contracts::{
        error::TesseraError,
        event::{Event, Origin},
        report::CorruptionReason,
    };
    use tessera_core::{traits::ChainStore, ChainIntegrityManager, ChainKey};

    use super::{FileChainStore, InMemoryChainStore};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn event(action: &str) -> Event {
        let mut details = serde_json::Map::new();
        details.insert("ticket".into(), json!(action.len()));
        Event::new(action, details, "ops", Origin::new("node-1", "svc"))
    }

    fn key() -> ChainKey {
        ChainKey::new("file-store-test-key").unwrap()
    }

    // ── In-memory store ───────────────────────────────────────────────────────

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = InMemoryChainStore::new();
        let mut manager = ChainIntegrityManager::open(Box::new(store.clone()), key()).unwrap();
        manager.append(event("a")).unwrap();
        manager.append(event("b")).unwrap();

        let state = store.state().unwrap();
        assert_eq!(state.chain.len(), 2);
        assert_eq!(state.chain_saves, 2);
    }

    #[test]
    fn test_memory_store_simulated_failure() {
        let store = InMemoryChainStore::new();
        store.state().unwrap().fail_on_save = true;
        let err = store.save_chain(&[]).unwrap_err();
        assert!(matches!(err, TesseraError::Storage { .. }));
    }

    #[test]
    fn test_memory_store_seeded_chain_is_loaded() {
        let source = InMemoryChainStore::new();
        let mut manager = ChainIntegrityManager::open(Box::new(source.clone()), key()).unwrap();
        manager.append(event("seed")).unwrap();
        let chain = source.load_chain().unwrap();

        let seeded = InMemoryChainStore::with_chain(chain.clone());
        assert_eq!(seeded.load_chain().unwrap(), chain);
    }

    // ── File store ────────────────────────────────────────────────────────────

    #[test]
    fn test_fresh_directory_is_an_empty_chain() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path().join("chain")).unwrap();
        assert!(store.load_chain().unwrap().is_empty());
        assert!(store.load_tree().unwrap().is_none());
        assert!(store.load_report().unwrap().is_none());
    }

    #[test]
    fn test_chain_survives_reopen() {
        let dir = tempdir().unwrap();
        let hashes: Vec<String> = {
            let store = FileChainStore::open(dir.path()).unwrap();
            let mut manager = ChainIntegrityManager::open(Box::new(store), key()).unwrap();
            ["a", "b", "c"]
                .iter()
                .map(|a| manager.append(event(a)).unwrap())
                .collect()
        };

        let store = FileChainStore::open(dir.path()).unwrap();
        let mut manager = ChainIntegrityManager::open(Box::new(store), key()).unwrap();
        let reloaded: Vec<String> = manager.entries().iter().map(|e| e.chain_hash.clone()).collect();
        assert_eq!(reloaded, hashes);
        assert!(manager.verify().unwrap().valid);
    }

    #[test]
    fn test_verify_writes_all_three_files_and_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path()).unwrap();
        let mut manager = ChainIntegrityManager::open(Box::new(store.clone()), key()).unwrap();
        manager.append(event("a")).unwrap();
        manager.verify().unwrap();

        assert!(store.chain_path().exists());
        assert!(store.tree_path().exists());
        assert!(store.report_path().exists());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    /// Corrupt B's event_hash directly in chain.json and verify after reload.
    #[test]
    fn test_on_disk_tamper_is_detected_after_reload() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path()).unwrap();
        {
            let mut manager = ChainIntegrityManager::open(Box::new(store.clone()), key()).unwrap();
            for a in ["A", "B", "C"] {
                manager.append(event(a)).unwrap();
            }
        }

        let raw = fs::read_to_string(store.chain_path()).unwrap();
        let mut doc: Value = serde_json::from_str(&raw).unwrap();
        doc[1]["event_hash"] = json!("0".repeat(64));
        fs::write(store.chain_path(), serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let mut manager = ChainIntegrityManager::open(Box::new(store), key()).unwrap();
        let report = manager.verify().unwrap();
        assert!(!report.valid);
        assert_eq!(report.corruptions.len(), 1);
        assert_eq!(report.corruptions[0].event_index, 1);
        assert_eq!(report.corruptions[0].reason, CorruptionReason::EventHashMismatch);
    }

    #[test]
    fn test_float_details_verify_after_reload() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path()).unwrap();
        {
            let mut manager = ChainIntegrityManager::open(Box::new(store.clone()), key()).unwrap();
            let mut details = serde_json::Map::new();
            details.insert("reading".into(), json!(1.0715660391465826e-75));
            details.insert("ratio".into(), json!(0.1 + 0.2));
            manager
                .append(Event::new("sample", details, "sensor", Origin::new("node-1", "svc")))
                .unwrap();
            assert!(manager.verify().unwrap().valid);
        }

        let mut manager = ChainIntegrityManager::open(Box::new(store), key()).unwrap();
        let report = manager.verify().unwrap();
        assert!(report.valid, "{:?}", report.corruptions);
    }

    #[test]
    fn test_sequence_high_water_mark_survives_reopen() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path()).unwrap();
        {
            let mut manager = ChainIntegrityManager::open(Box::new(store.clone()), key()).unwrap();
            for a in ["A", "B", "C"] {
                manager.append(event(a)).unwrap();
            }
            let prefix = manager.entries()[..1].to_vec();
            manager.replace_chain(prefix).unwrap();
        }
        assert!(store.meta_path().exists());

        let mut manager = ChainIntegrityManager::open(Box::new(store), key()).unwrap();
        manager.append(event("D")).unwrap();
        let sequences: Vec<u64> = manager.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 3]);
    }

    #[test]
    fn test_garbled_chain_file_is_an_error_not_a_corruption() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path()).unwrap();
        fs::write(store.chain_path(), "[{\"sequence\": 0, \"timest").unwrap();

        let err = ChainIntegrityManager::open(Box::new(store), key()).unwrap_err();
        assert!(matches!(err, TesseraError::Serialization { .. }));
    }

    #[test]
    fn test_deleted_tree_cache_is_regenerated() {
        let dir = tempdir().unwrap();
        let store = FileChainStore::open(dir.path()).unwrap();
        let root = {
            let mut manager = ChainIntegrityManager::open(Box::new(store.clone()), key()).unwrap();
            manager.append(event("x")).unwrap();
            manager.append(event("y")).unwrap();
            manager.verify().unwrap().merkle_root
        };

        fs::remove_file(store.tree_path()).unwrap();
        let manager = ChainIntegrityManager::open(Box::new(store), key()).unwrap();
        assert_eq!(manager.merkle_root().map(str::to_string), root);
    }

    #[test]
    fn test_write_json_atomic_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("exports").join("nested").join("out.json");
        super::write_json_atomic(&target, &json!({"ok": true})).unwrap();

        let read: Option<Value> = super::read_json(&target).unwrap();
        assert_eq!(read, Some(json!({"ok": true})));
    }
}
