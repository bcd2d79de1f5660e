//! Acceptance policies for a completed migration.
//!
//! The migration measures; the caller decides. A policy sees how many legacy
//! records were offered, which were rejected, which failed their own legacy
//! digests, and what verification reported on the rebuilt chain.

use serde::{Deserialize, Serialize};

use tessera_config::MigrationSettings;
use tessera_contracts::report::{Corruption, IntegrityReport};

/// A legacy record that never reached the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Position in the legacy input, 0-based.
    pub index: usize,
    pub reason: String,
}

/// Everything a policy may base its verdict on.
#[derive(Debug, Clone, Copy)]
pub struct MigrationMeasurement<'a> {
    pub legacy_total: usize,
    pub rejected: &'a [RejectedRecord],
    /// Mismatches between legacy records and their own stored hashes,
    /// indexed by position in the legacy input.
    pub legacy_corruptions: &'a [Corruption],
    pub report: &'a IntegrityReport,
}

impl MigrationMeasurement<'_> {
    /// Rejected records, legacy corruptions and reported corruptions, as a
    /// share of the legacy input. An empty input measures `0.0`.
    pub fn corruption_ratio(&self) -> f64 {
        if self.legacy_total == 0 {
            return 0.0;
        }
        let bad = self.rejected.len() + self.legacy_corruptions.len() + self.report.corruptions.len();
        bad as f64 / self.legacy_total as f64
    }
}

/// Decides whether a migration result is acceptable.
pub trait AcceptancePolicy {
    fn accept(&self, measurement: &MigrationMeasurement<'_>) -> bool;
}

impl<F> AcceptancePolicy for F
where
    F: Fn(&MigrationMeasurement<'_>) -> bool,
{
    fn accept(&self, measurement: &MigrationMeasurement<'_>) -> bool {
        self(measurement)
    }
}

/// Accept when the corruption ratio does not exceed the limit.
///
/// `MaxCorruptionRatio(0.0)` accepts only a flawless migration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxCorruptionRatio(pub f64);

impl MaxCorruptionRatio {
    pub fn from_settings(settings: &MigrationSettings) -> Self {
        Self(settings.max_corruption_ratio)
    }
}

impl AcceptancePolicy for MaxCorruptionRatio {
    fn accept(&self, measurement: &MigrationMeasurement<'_>) -> bool {
        measurement.corruption_ratio() <= self.0
    }
}
