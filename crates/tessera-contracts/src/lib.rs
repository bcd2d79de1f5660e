//! # tessera-contracts
//!
//! Shared types, reports, and error contracts for the TESSERA audit chain.
//!
//! Every crate in the workspace imports from here. No hashing or storage
//! logic lives in this crate, only data definitions and the error type.

pub mod error;
pub mod event;
pub mod export;
pub mod merkle;
pub mod report;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use error::TesseraError;
    use event::{json_kind, ChainMeta, ChainedEvent, Event, Origin};
    use merkle::{Direction, MerkleTree};
    use report::{CorruptionReason, IntegrityReport};
    use serde_json::json;

    // ── Event ────────────────────────────────────────────────────────────────

    #[test]
    fn genesis_hash_is_64_zeros() {
        assert_eq!(ChainedEvent::GENESIS_HASH.len(), 64);
        assert!(ChainedEvent::GENESIS_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn event_round_trips_through_json() {
        let mut details = serde_json::Map::new();
        details.insert("table".to_string(), json!("accounts"));
        details.insert("rows".to_string(), json!(12));
        let event = Event::new("export", details, "data", Origin::new("db-01", "ops"));

        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&encoded).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn chain_meta_defaults_to_zero() {
        assert_eq!(ChainMeta::default().next_sequence, 0);
        let decoded: ChainMeta = serde_json::from_str(r#"{"next_sequence":9}"#).unwrap();
        assert_eq!(decoded.next_sequence, 9);
    }

    #[test]
    fn json_kind_names_each_type() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!([1])), "an array");
        assert_eq!(json_kind(&json!("s")), "a string");
        assert_eq!(json_kind(&json!({})), "an object");
    }

    #[test]
    fn float_details_survive_json_reload_exactly() {
        let mut details = serde_json::Map::new();
        details.insert("reading".to_string(), json!(1.0715660391465826e-75));
        let event = Event::new("sample", details, "sensor", Origin::new("h", "u"));

        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&encoded).unwrap();
        assert_eq!(serde_json::to_string(&decoded).unwrap(), encoded);
    }

    // ── Reports ──────────────────────────────────────────────────────────────

    #[test]
    fn corruption_reason_serializes_snake_case() {
        let encoded = serde_json::to_string(&CorruptionReason::EventHashMismatch).unwrap();
        assert_eq!(encoded, "\"event_hash_mismatch\"");

        let decoded: CorruptionReason =
            serde_json::from_str("\"chain_hash_mismatch\"").unwrap();
        assert_eq!(decoded, CorruptionReason::ChainHashMismatch);
    }

    #[test]
    fn corruption_reason_display_matches_wire_name() {
        for reason in [
            CorruptionReason::EventHashMismatch,
            CorruptionReason::ChainHashMismatch,
            CorruptionReason::PreviousHashMismatch,
            CorruptionReason::SequenceRegression,
        ] {
            let wire = serde_json::to_string(&reason).unwrap();
            assert_eq!(wire.trim_matches('"'), reason.to_string());
        }
    }

    #[test]
    fn corrupted_indices_follow_report_order() {
        let report = IntegrityReport {
            valid: false,
            events_verified: 5,
            corruptions: vec![
                report::Corruption {
                    event_index: 1,
                    reason: CorruptionReason::EventHashMismatch,
                    expected: "a".into(),
                    actual: "b".into(),
                },
                report::Corruption {
                    event_index: 4,
                    reason: CorruptionReason::ChainHashMismatch,
                    expected: "c".into(),
                    actual: "d".into(),
                },
            ],
            merkle_root: None,
            timestamp: Utc::now(),
        };
        assert_eq!(report.corrupted_indices(), vec![1, 4]);
    }

    // ── Merkle types ─────────────────────────────────────────────────────────

    #[test]
    fn empty_tree_has_no_root() {
        assert_eq!(MerkleTree::empty().root(), None);
    }

    #[test]
    fn root_is_first_node_of_last_level() {
        let tree = MerkleTree {
            levels: vec![
                vec!["l0".into(), "l1".into()],
                vec!["root".into()],
            ],
            leaf_count: 2,
            built_at: Utc::now(),
        };
        assert_eq!(tree.root(), Some("root"));
    }

    #[test]
    fn direction_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Direction::Right).unwrap(), "\"right\"");
    }

    // ── TesseraError display messages ────────────────────────────────────────

    #[test]
    fn error_storage_display() {
        let err = TesseraError::storage(
            "write chain.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("storage error"));
        assert!(msg.contains("chain.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn error_index_out_of_range_display() {
        let err = TesseraError::IndexOutOfRange { index: 7, len: 3 };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn error_from_serde_json_is_serialization() {
        let bad = serde_json::from_str::<Event>("{not json").unwrap_err();
        let err: TesseraError = bad.into();
        assert!(matches!(err, TesseraError::Serialization { .. }));
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn error_config_display() {
        let err = TesseraError::ConfigError {
            reason: "secret key is empty".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("secret key is empty"));
    }
}
