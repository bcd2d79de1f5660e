//! # tessera-config
//!
//! TOML-driven configuration for the TESSERA audit chain.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tessera_config::TesseraConfig;
//!
//! let config = TesseraConfig::load(Some(Path::new("tessera.toml")))?;
//! let key = config.chain_key()?;
//! let dir = config.storage_dir()?;
//! ```
//!
//! The secret key is never hard-coded. It comes from the file or, preferably,
//! from `TESSERA_SECRET_KEY`.

pub mod loader;
pub mod settings;

pub use loader::{ENV_SECRET_KEY, ENV_STORAGE_DIR};
pub use settings::{ChainSettings, MigrationSettings, OriginSettings, TesseraConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
