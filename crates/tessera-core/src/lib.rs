//! # tessera-core
//!
//! The tamper-evident chain engine for TESSERA.
//!
//! This crate provides:
//! - Hashing primitives and the injected HMAC key (`digest`)
//! - The Merkle tree builder and inclusion proofs (`merkle`)
//! - The `ChainStore` persistence trait (`traits`)
//! - The `ChainIntegrityManager` that ties them together (`manager`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tessera_core::{ChainIntegrityManager, ChainKey};
//!
//! let mut manager = ChainIntegrityManager::open(Box::new(store), ChainKey::new(secret)?)?;
//! manager.append(event)?;
//! let report = manager.verify()?;
//! ```

pub mod digest;
pub mod manager;
pub mod merkle;
pub mod traits;

pub use digest::ChainKey;
pub use manager::ChainIntegrityManager;
pub use traits::ChainStore;
