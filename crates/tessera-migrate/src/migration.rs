//! Legacy replay into a fresh chain.
//!
//! Legacy hashes are never copied into the new chain. When a legacy record
//! carries them they are checked: `event_hash` against the digest of the
//! record's event, and `previous_hash` against the preceding record's
//! `chain_hash`. Mismatches are measured as legacy corruptions. A record
//! whose payload no longer matches its `event_hash` is left out of the new
//! chain; a broken link only means something before it is missing, so the
//! record itself is still migrated.
//!
//! Replay happens in memory. The target store receives the finished chain
//! in a single save, so a failure leaves it empty and the run can be retried.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use tessera_config::TesseraConfig;
use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    event::{json_kind, ChainedEvent, Event},
    export::ChainExport,
    report::{Corruption, CorruptionReason, IntegrityReport},
};
use tessera_core::{digest::event_digest, traits::ChainStore, ChainIntegrityManager, ChainKey};
use tessera_store::{write_json_atomic, FileChainStore, InMemoryChainStore};

use crate::policy::{AcceptancePolicy, MigrationMeasurement, RejectedRecord};

/// Result of one migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    /// The caller's policy verdict.
    pub accepted: bool,
    /// Verification of the rebuilt chain.
    pub report: IntegrityReport,
    /// Records appended to the new chain.
    pub migrated: usize,
    pub rejected: Vec<RejectedRecord>,
    /// Legacy records whose own stored hashes did not check out.
    pub legacy_corruptions: Vec<Corruption>,
    /// The rebuilt chain with per-entry inclusion proofs.
    pub export: ChainExport,
}

/// A legacy record: an event plus whatever hashes the old log kept.
#[derive(Debug, Deserialize)]
struct LegacyRecord {
    event: Event,
    event_hash: Option<String>,
    previous_hash: Option<String>,
    chain_hash: Option<String>,
}

/// Replays legacy records into an empty target store.
pub struct MigrationManager {
    store: Box<dyn ChainStore>,
    key: ChainKey,
    export_path: Option<PathBuf>,
}

impl MigrationManager {
    pub fn new(store: Box<dyn ChainStore>, key: ChainKey) -> Self {
        Self {
            store,
            key,
            export_path: None,
        }
    }

    /// Target the configured storage directory and export path.
    pub fn from_config(config: &TesseraConfig) -> TesseraResult<Self> {
        let store = FileChainStore::open(config.storage_dir()?)?;
        let mut manager = Self::new(Box::new(store), config.chain_key()?);
        manager.export_path = config.migration.export_path.clone();
        Ok(manager)
    }

    /// Also write the export bundle to `path`.
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn export_path(&self) -> Option<&Path> {
        self.export_path.as_deref()
    }

    /// Replay `records` and judge the result with `policy`.
    ///
    /// Fails with `MigrationFailed` when the target already holds entries.
    /// Malformed records are rejected individually and never reach the chain.
    pub fn migrate<I>(self, records: I, policy: &dyn AcceptancePolicy) -> TesseraResult<MigrationOutcome>
    where
        I: IntoIterator<Item = Value>,
    {
        let existing = self.store.load_chain()?.len();
        if existing > 0 {
            return Err(TesseraError::MigrationFailed {
                reason: format!("target chain already holds {} entries", existing),
            });
        }

        let mut staging =
            ChainIntegrityManager::open(Box::new(InMemoryChainStore::new()), self.key.clone())?;
        let mut rejected = Vec::new();
        let mut legacy_corruptions = Vec::new();
        let mut legacy_total = 0;
        let mut expected_previous = Some(ChainedEvent::GENESIS_HASH.to_string());

        for (index, record) in records.into_iter().enumerate() {
            legacy_total += 1;
            let record = match parse_record(record) {
                Ok(record) => record,
                Err(reason) => {
                    debug!(index, reason = %reason, "legacy record rejected");
                    rejected.push(RejectedRecord { index, reason });
                    expected_previous = None;
                    continue;
                }
            };

            let finding = check_legacy_hashes(index, &record, expected_previous.as_deref())?;
            expected_previous = record.chain_hash.clone();

            let keep = match finding {
                Some(corruption) => {
                    warn!(
                        event_index = index,
                        reason = %corruption.reason,
                        "legacy record fails its own hashes"
                    );
                    let keep = corruption.reason != CorruptionReason::EventHashMismatch;
                    legacy_corruptions.push(corruption);
                    keep
                }
                None => true,
            };
            if keep {
                staging.append(record.event)?;
            }
        }

        if let Err(err) = self.store.save_chain(staging.entries()) {
            warn!(staged = staging.len(), error = %err, "migrated chain not persisted; target left empty");
            return Err(err);
        }

        let mut manager = ChainIntegrityManager::open(self.store, self.key)?;
        let export = manager.export_with_proofs()?;
        if let Some(path) = &self.export_path {
            write_json_atomic(path, &export)?;
        }

        let report = export.report.clone();
        let accepted = policy.accept(&MigrationMeasurement {
            legacy_total,
            rejected: &rejected,
            legacy_corruptions: &legacy_corruptions,
            report: &report,
        });

        let migrated = manager.len();
        if accepted {
            info!(legacy_total, migrated, rejected = rejected.len(), "migration accepted");
        } else {
            warn!(
                legacy_total,
                migrated,
                rejected = rejected.len(),
                legacy_corruptions = legacy_corruptions.len(),
                corruptions = report.corruptions.len(),
                "migration rejected by acceptance policy"
            );
        }

        Ok(MigrationOutcome {
            accepted,
            report,
            migrated,
            rejected,
            legacy_corruptions,
            export,
        })
    }
}

impl std::fmt::Debug for MigrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationManager")
            .field("export_path", &self.export_path)
            .finish_non_exhaustive()
    }
}

/// Decode a legacy record: a chained record with an `event` field, or a
/// bare event.
fn parse_record(record: Value) -> Result<LegacyRecord, String> {
    let object = match record {
        Value::Object(map) => map,
        other => return Err(format!("expected a JSON object, got {}", json_kind(&other))),
    };

    if object.contains_key("event") {
        return serde_json::from_value(Value::Object(object))
            .map_err(|e| format!("not a valid chained record: {}", e));
    }

    let event = serde_json::from_value(Value::Object(object))
        .map_err(|e| format!("not a valid event: {}", e))?;
    Ok(LegacyRecord {
        event,
        event_hash: None,
        previous_hash: None,
        chain_hash: None,
    })
}

/// Compare the hashes a legacy record carries against what they should be.
///
/// `expected_previous` is the preceding record's `chain_hash` (genesis for
/// the first record), or `None` when it is unknown.
fn check_legacy_hashes(
    index: usize,
    record: &LegacyRecord,
    expected_previous: Option<&str>,
) -> TesseraResult<Option<Corruption>> {
    if let Some(stored) = &record.event_hash {
        let digest = event_digest(&record.event)?;
        if *stored != digest {
            return Ok(Some(Corruption {
                event_index: index,
                reason: CorruptionReason::EventHashMismatch,
                expected: digest,
                actual: stored.clone(),
            }));
        }
    }

    if let (Some(stored), Some(expected)) = (&record.previous_hash, expected_previous) {
        if stored != expected {
            return Ok(Some(Corruption {
                event_index: index,
                reason: CorruptionReason::PreviousHashMismatch,
                expected: expected.to_string(),
                actual: stored.clone(),
            }));
        }
    }

    Ok(None)
}
