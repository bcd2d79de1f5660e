//! Integrity, summary, and repair reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an entry failed verification.
///
/// Only the first failing check is recorded per entry, in the order the
/// variants are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionReason {
    /// The stored `event_hash` does not match the digest of the stored event.
    EventHashMismatch,
    /// The stored `chain_hash` does not match the HMAC recomputed from the
    /// stored event and `previous_hash`.
    ChainHashMismatch,
    /// The stored `previous_hash` links to no version of the preceding entry:
    /// an entry was removed, inserted, or moved.
    PreviousHashMismatch,
    /// The entry's `sequence` is not greater than its predecessor's.
    SequenceRegression,
}

impl CorruptionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventHashMismatch => "event_hash_mismatch",
            Self::ChainHashMismatch => "chain_hash_mismatch",
            Self::PreviousHashMismatch => "previous_hash_mismatch",
            Self::SequenceRegression => "sequence_regression",
        }
    }
}

impl std::fmt::Display for CorruptionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tampered entry, with both digests kept for forensic diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corruption {
    pub event_index: usize,
    pub reason: CorruptionReason,
    /// The value recomputed during verification.
    pub expected: String,
    /// The value found in storage.
    pub actual: String,
}

/// The outcome of one full verification pass.
///
/// A report is built fresh on every call and is never reused after the chain
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub events_verified: usize,
    pub corruptions: Vec<Corruption>,
    /// Root of the tree rebuilt during this pass; `None` for an empty chain.
    pub merkle_root: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl IntegrityReport {
    /// Indices of every entry flagged in this report, in chain order.
    pub fn corrupted_indices(&self) -> Vec<usize> {
        self.corruptions.iter().map(|c| c.event_index).collect()
    }
}

/// Aggregate health figures derived from an `IntegrityReport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub total: usize,
    pub valid: usize,
    pub corrupted: usize,
    pub merkle_root: Option<String>,
    /// Capture time of the newest entry, if any.
    pub last_timestamp: Option<DateTime<Utc>>,
}

/// The result of a repair attempt.
///
/// Repair drops entries. `repaired` is only true when the shortened chain
/// verifies with zero corruptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub repaired: bool,
    pub recovered_events: usize,
    pub dropped_events: usize,
    pub remaining_corruptions: usize,
    pub message: String,
}
