//! # tessera-audit
//!
//! The audit system facade. Collaborators log actions here and ask for
//! integrity reports, summaries, repairs, proofs, and exports.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use serde_json::json;
//! use tessera_audit::AuditSystem;
//! use tessera_config::TesseraConfig;
//!
//! let config = TesseraConfig::load(None)?;
//! let mut audit = AuditSystem::from_config(&config)?;
//! audit.log_action("login", &json!({"user": "alice"}), "auth")?;
//!
//! let report = audit.get_integrity_report()?;
//! for c in &report.corruptions {
//!     eprintln!("entry {}: {}", c.event_index, c.reason);
//! }
//! ```

pub mod origin;
pub mod system;

pub use origin::{detect_origin, resolve_origin};
pub use system::AuditSystem;

// ── Tests ─────────────────────────────────────────────────────────────────────
