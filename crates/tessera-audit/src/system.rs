//! The audit system facade.
//!
//! `AuditSystem` is what collaborators hold. It stamps origin metadata onto
//! each action, delegates chaining and verification to the
//! `ChainIntegrityManager`, and turns verification output into summaries and
//! repair outcomes.
//!
//! Reporting (`get_integrity_report`, `get_chain_summary`) never removes
//! data. `repair_chain_integrity` does.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use tessera_config::TesseraConfig;
use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    event::{json_kind, Event, Origin},
    export::ChainExport,
    merkle::MerkleProof,
    report::{ChainSummary, IntegrityReport, RepairOutcome},
};
use tessera_core::{traits::ChainStore, ChainIntegrityManager, ChainKey};
use tessera_store::{write_json_atomic, FileChainStore};

use crate::origin::detect_origin;

/// Public entry point for logging actions and querying chain integrity.
#[derive(Debug)]
pub struct AuditSystem {
    manager: ChainIntegrityManager,
    origin: Origin,
}

impl AuditSystem {
    /// Open the chain held by `store`.
    pub fn new(store: Box<dyn ChainStore>, key: ChainKey, origin: Origin) -> TesseraResult<Self> {
        let manager = ChainIntegrityManager::open(store, key)?;
        Ok(Self { manager, origin })
    }

    /// Open a file-backed chain at the configured storage directory.
    pub fn from_config(config: &TesseraConfig) -> TesseraResult<Self> {
        let store = FileChainStore::open(config.storage_dir()?)?;
        let key = config.chain_key()?;
        Self::new(Box::new(store), key, detect_origin(&config.origin))
    }

    /// Origin stamped onto every action this system logs.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn manager(&self) -> &ChainIntegrityManager {
        &self.manager
    }

    /// Record one action and return its `chain_hash`.
    ///
    /// `details` must serialize to a JSON object. Anything else is rejected
    /// before a hash is computed.
    pub fn log_action<D>(&mut self, action: &str, details: &D, category: &str) -> TesseraResult<String>
    where
        D: Serialize + ?Sized,
    {
        let details = details_object(details)?;
        let event = Event::new(action, details, category, self.origin.clone());
        let chain_hash = self.manager.append(event)?;

        info!(
            action = %action,
            category = %category,
            sequence = self.manager.len() - 1,
            chain_hash = %chain_hash,
            "action logged"
        );
        Ok(chain_hash)
    }

    /// Verify the chain and return only the verdict.
    ///
    /// Tools that surface results to people should prefer
    /// `get_integrity_report`, which carries the itemized corruptions.
    pub fn verify_chain_integrity(&mut self) -> TesseraResult<bool> {
        Ok(self.manager.verify()?.valid)
    }

    /// Verify the chain and return the full report.
    pub fn get_integrity_report(&mut self) -> TesseraResult<IntegrityReport> {
        self.manager.verify()
    }

    /// Verify the chain and condense the result into counts.
    pub fn get_chain_summary(&mut self) -> TesseraResult<ChainSummary> {
        let report = self.manager.verify()?;
        let corrupted = report.corruptions.len();

        Ok(ChainSummary {
            total: report.events_verified,
            valid: report.events_verified.saturating_sub(corrupted),
            corrupted,
            merkle_root: report.merkle_root,
            last_timestamp: self.manager.entries().last().map(|e| e.timestamp),
        })
    }

    /// Drop every entry from the first corruption onward and re-verify.
    ///
    /// Destructive. Only the longest valid prefix is kept: entries after the
    /// first corruption go too, even when their own hashes check out, because
    /// they link through an entry that can no longer be trusted. For a chain
    /// A, B, C with B tampered the repaired chain is `[A]`, length 1, not the
    /// two entries A and C.
    ///
    /// An intact chain is left untouched. When even the first entry is
    /// corrupt nothing is recoverable, so the chain is left as is and the
    /// outcome reports failure.
    pub fn repair_chain_integrity(&mut self) -> TesseraResult<RepairOutcome> {
        let report = self.manager.verify()?;
        let total = report.events_verified;

        if report.valid {
            return Ok(RepairOutcome {
                repaired: true,
                recovered_events: total,
                dropped_events: 0,
                remaining_corruptions: 0,
                message: "chain integrity intact; no repair needed".to_string(),
            });
        }

        let recovered = self.manager.recover_valid_entries();
        if recovered.is_empty() {
            warn!(
                corruptions = report.corruptions.len(),
                "first entry is corrupt; nothing recoverable, chain left unchanged"
            );
            return Ok(RepairOutcome {
                repaired: false,
                recovered_events: 0,
                dropped_events: 0,
                remaining_corruptions: report.corruptions.len(),
                message: "first entry is corrupt; no trustworthy prefix to keep, chain left unchanged"
                    .to_string(),
            });
        }

        let recovered_events = recovered.len();
        let dropped_events = total - recovered_events;
        warn!(
            recovered_events,
            dropped_events,
            first_corruption = report.corruptions.first().map(|c| c.event_index),
            "repairing audit chain by truncation"
        );

        self.manager.replace_chain(recovered)?;
        let after = self.manager.verify()?;
        let remaining_corruptions = after.corruptions.len();

        let message = if after.valid {
            format!(
                "kept {} verified entries, dropped {} from index {} onward",
                recovered_events, dropped_events, recovered_events
            )
        } else {
            format!(
                "kept {} entries but {} corruptions remain after truncation",
                recovered_events, remaining_corruptions
            )
        };

        info!(repaired = after.valid, remaining_corruptions, "repair finished");

        Ok(RepairOutcome {
            repaired: after.valid,
            recovered_events,
            dropped_events,
            remaining_corruptions,
            message,
        })
    }

    /// Inclusion proof for the entry at `index`.
    pub fn create_merkle_proof(&mut self, index: usize) -> TesseraResult<MerkleProof> {
        self.manager.create_proof(index)
    }

    /// Check an inclusion proof with no access to the chain.
    pub fn verify_merkle_proof(event: &Event, proof: &MerkleProof, root: &str) -> TesseraResult<bool> {
        ChainIntegrityManager::verify_proof(event, proof, root)
    }

    /// Verify, then write every entry with its proof to `path`.
    pub fn export_chain_with_proofs(&mut self, path: &Path) -> TesseraResult<ChainExport> {
        let export = self.manager.export_with_proofs()?;
        write_json_atomic(path, &export)?;
        info!(path = %path.display(), entries = export.entries.len(), "chain export written");
        Ok(export)
    }
}

fn details_object<D: Serialize + ?Sized>(details: &D) -> TesseraResult<Map<String, Value>> {
    let value = serde_json::to_value(details).map_err(|e| TesseraError::Serialization {
        reason: format!("action details are not canonicalizable: {}", e),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TesseraError::Serialization {
            reason: format!(
                "action details must serialize to a JSON object, got {}",
                json_kind(&other)
            ),
        }),
    }
}
