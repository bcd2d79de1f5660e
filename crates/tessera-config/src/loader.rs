//! Loading and resolving configuration.
//!
//! Resolution order, later wins:
//!
//! 1. Built-in defaults
//! 2. TOML file, if one is given
//! 3. `TESSERA_SECRET_KEY` / `TESSERA_STORAGE_DIR` from the environment

use std::path::{Path, PathBuf};

use tracing::debug;

use tessera_contracts::error::{TesseraError, TesseraResult};
use tessera_core::ChainKey;

use crate::settings::TesseraConfig;

/// Environment variable holding the HMAC secret.
pub const ENV_SECRET_KEY: &str = "TESSERA_SECRET_KEY";

/// Environment variable overriding `chain.storage_dir`.
pub const ENV_STORAGE_DIR: &str = "TESSERA_STORAGE_DIR";

impl TesseraConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `TesseraError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or carries an out-of-range value.
    pub fn from_toml_str(s: &str) -> TesseraResult<Self> {
        let config: TesseraConfig = toml::from_str(s).map_err(|e| TesseraError::ConfigError {
            reason: format!("failed to parse configuration TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> TesseraResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TesseraError::ConfigError {
            reason: format!("failed to read configuration file '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::from_toml_str(&contents)
    }

    /// Load `path` (when given), then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> TesseraResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides using `lookup` to read environment variables.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// clobber the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_SECRET_KEY).filter(|v| !v.is_empty()) {
            debug!("secret key taken from environment");
            self.chain.secret_key = Some(secret);
        }
        if let Some(dir) = lookup(ENV_STORAGE_DIR).filter(|v| !v.is_empty()) {
            debug!(storage_dir = %dir, "storage directory taken from environment");
            self.chain.storage_dir = Some(PathBuf::from(dir));
        }
    }

    /// The configured storage directory.
    pub fn storage_dir(&self) -> TesseraResult<&Path> {
        self.chain
            .storage_dir
            .as_deref()
            .ok_or_else(|| TesseraError::ConfigError {
                reason: format!(
                    "no storage directory configured; set chain.storage_dir or {}",
                    ENV_STORAGE_DIR
                ),
            })
    }

    /// Build the HMAC key from the configured secret.
    pub fn chain_key(&self) -> TesseraResult<ChainKey> {
        let secret = self
            .chain
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TesseraError::ConfigError {
                reason: format!(
                    "no secret key configured; set chain.secret_key or {}",
                    ENV_SECRET_KEY
                ),
            })?;
        ChainKey::new(secret.as_bytes())
    }

    fn validate(&self) -> TesseraResult<()> {
        let ratio = self.migration.max_corruption_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(TesseraError::ConfigError {
                reason: format!(
                    "migration.max_corruption_ratio must be within [0, 1], got {}",
                    ratio
                ),
            });
        }
        Ok(())
    }
}
