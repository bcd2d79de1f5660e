//! Export bundle: the whole chain with one inclusion proof per entry.
//!
//! Exports are meant for third parties. They carry digests and proofs but
//! never the HMAC key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{event::ChainedEvent, merkle::MerkleProof, report::IntegrityReport};

/// One chain entry paired with its proof against `ChainExport::merkle_root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub entry: ChainedEvent,
    pub proof: MerkleProof,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainExport {
    pub export_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub merkle_root: Option<String>,
    /// The verification pass the export was taken after.
    pub report: IntegrityReport,
    pub entries: Vec<ExportedEntry>,
}
