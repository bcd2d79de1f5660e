//! Event and chained-event types.
//!
//! `Event` is the caller-defined record. `ChainedEvent` wraps it with its
//! position in the chain and the digests that make tampering detectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Host name of the machine that logged the action.
    pub host: String,
    /// Account that logged the action.
    pub user: String,
}

impl Origin {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
        }
    }
}

/// A single auditable action, as supplied by a caller.
///
/// `details` is an arbitrary JSON object. Its keys are sorted when the event
/// is canonicalized, so insertion order never affects a digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// What happened (e.g. "policy_update", "record_export").
    pub action: String,
    /// Free-form structured detail.
    pub details: Map<String, Value>,
    /// Coarse grouping tag (e.g. "security", "migration").
    pub category: String,
    /// Host and user that produced the event.
    pub origin: Origin,
}

impl Event {
    pub fn new(
        action: impl Into<String>,
        details: Map<String, Value>,
        category: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            action: action.into(),
            details,
            category: category.into(),
            origin,
        }
    }
}

/// An `Event` bound into the chain.
///
/// `chain_hash` is an HMAC over the event's canonical bytes followed by
/// `previous_hash`, so altering any event, or splicing entries, breaks
/// verification for the altered entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainedEvent {
    /// Position in the chain, starting at 0. Strictly increasing and never
    /// reused, but gaps appear after a repair drops entries. Not covered by
    /// any digest; verification only checks that it increases.
    pub sequence: u64,

    /// Capture time. Informational only; not covered by any digest.
    pub timestamp: DateTime<Utc>,

    /// The logged event.
    pub event: Event,

    /// SHA-256 (hex) of the canonical event bytes.
    pub event_hash: String,

    /// `chain_hash` of the preceding entry, or `GENESIS_HASH`.
    pub previous_hash: String,

    /// HMAC-SHA256 (hex) of canonical event bytes ‖ `previous_hash`.
    pub chain_hash: String,

    /// Result of the most recent verification pass. Derived, not trusted.
    pub integrity_valid: bool,
}

impl ChainedEvent {
    /// The `previous_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Chain state that must survive truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainMeta {
    /// Lowest sequence number the next append may use.
    pub next_sequence: u64,
}

/// Short description of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
