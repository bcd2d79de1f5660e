//! # tessera-migrate
//!
//! Rebuilds an untrusted legacy audit log as a fresh, HMAC-authenticated
//! chain and reports whether the result is acceptable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_migrate::{MaxCorruptionRatio, MigrationManager};
//!
//! let outcome = MigrationManager::new(Box::new(store), key)
//!     .with_export_path("export.json")
//!     .migrate(legacy_records, &MaxCorruptionRatio(0.05))?;
//!
//! if !outcome.accepted {
//!     for r in &outcome.rejected {
//!         eprintln!("record {}: {}", r.index, r.reason);
//!     }
//! }
//! ```

pub mod migration;
pub mod policy;

pub use migration::{MigrationManager, MigrationOutcome};
pub use policy::{AcceptancePolicy, MaxCorruptionRatio, MigrationMeasurement, RejectedRecord};

// ── Tests ─────────────────────────────────────────────────────────────────────
