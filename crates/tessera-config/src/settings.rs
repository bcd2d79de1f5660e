//! Configuration schema.
//!
//! A `TesseraConfig` is deserialized from TOML. Every section is optional in
//! the file; values that are still missing after environment overrides are
//! reported when they are first needed.
//!
//! Example:
//! ```toml
//! [chain]
//! storage_dir = "/var/lib/tessera"
//! secret_key = "change-me"        # usually supplied via TESSERA_SECRET_KEY
//!
//! [origin]
//! host = "audit-01"
//! user = "svc-audit"
//!
//! [migration]
//! max_corruption_ratio = 0.05
//! export_path = "/var/lib/tessera/migration-export.json"
//! ```

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TesseraConfig {
    #[serde(default)]
    pub chain: ChainSettings,

    #[serde(default)]
    pub origin: OriginSettings,

    #[serde(default)]
    pub migration: MigrationSettings,
}

/// Where the chain lives and how its links are authenticated.
#[derive(Clone, Default, Deserialize)]
pub struct ChainSettings {
    /// Directory holding `chain.json`, `merkle_tree.json`, and
    /// `integrity_proof.json`.
    pub storage_dir: Option<PathBuf>,

    /// HMAC secret. Prefer the `TESSERA_SECRET_KEY` environment variable over
    /// writing this into a file.
    pub secret_key: Option<String>,
}

impl std::fmt::Debug for ChainSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSettings")
            .field("storage_dir", &self.storage_dir)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Fixed origin metadata. Unset fields fall back to the process environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OriginSettings {
    pub host: Option<String>,
    pub user: Option<String>,
}

/// Inputs to the migration workflow's acceptance decision.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationSettings {
    /// Largest tolerated share of legacy records that are rejected or
    /// reported corrupt, in `[0.0, 1.0]`.
    #[serde(default)]
    pub max_corruption_ratio: f64,

    /// Where to write the migrated chain with per-event proofs.
    pub export_path: Option<PathBuf>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            max_corruption_ratio: 0.0,
            export_path: None,
        }
    }
}
