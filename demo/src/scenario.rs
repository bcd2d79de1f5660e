//! Tamper-and-repair walkthrough on a throwaway in-memory chain.

use serde_json::json;

use tessera_audit::AuditSystem;
use tessera_contracts::{error::TesseraResult, event::Origin};
use tessera_core::ChainKey;
use tessera_store::InMemoryChainStore;

use crate::print_report;

/// Log A, B, C; alter B behind the chain's back; detect, repair, re-verify.
pub fn run() -> TesseraResult<bool> {
    println!("=== Scenario: tamper detection and repair ===");
    println!();

    // Throwaway chain, so a random key is enough.
    let key = ChainKey::new(uuid::Uuid::new_v4().as_bytes())?;
    let store = InMemoryChainStore::new();
    let origin = Origin::new("scenario-host", "scenario-user");
    let mut audit = AuditSystem::new(Box::new(store.clone()), key.clone(), origin.clone())?;

    for (action, step) in [("A", 1), ("B", 2), ("C", 3)] {
        let hash = audit.log_action(action, &json!({ "step": step }), "scenario")?;
        println!("  logged {}  chain_hash={}", action, hash);
    }
    println!();

    println!("  Altering the stored payload of entry 1 (B)...");
    {
        let mut state = store.state()?;
        if let Some(entry) = state.chain.get_mut(1) {
            entry.event.details.insert("step".into(), json!(999));
        }
    }
    let mut audit = AuditSystem::new(Box::new(store.clone()), key, origin)?;
    println!();

    let report = audit.get_integrity_report()?;
    print_report(&report);
    println!();

    let outcome = audit.repair_chain_integrity()?;
    println!("  Repair: {}", outcome.message);
    println!(
        "  Recovered {} / dropped {} / remaining corruptions {}",
        outcome.recovered_events, outcome.dropped_events, outcome.remaining_corruptions
    );
    println!();

    let after = audit.get_integrity_report()?;
    print_report(&after);
    println!();
    println!("  Scenario complete.");
    println!();

    Ok(!report.valid && after.valid && outcome.repaired)
}
