//! TESSERA audit chain operator CLI
//!
//! Logs actions into a file-backed chain, verifies it, repairs it, and
//! produces proofs and exports for third parties.
//!
//! Usage:
//!   tessera --config tessera.toml log --action login --details '{"user":"alice"}'
//!   tessera verify
//!   tessera summary
//!   tessera repair
//!   tessera proof 3
//!   tessera export chain-export.json
//!   tessera migrate legacy.json
//!   tessera scenario
//!
//! The secret key and storage directory come from the config file or from
//! `TESSERA_SECRET_KEY` and `TESSERA_STORAGE_DIR`.

mod scenario;

use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tessera_audit::AuditSystem;
use tessera_config::TesseraConfig;
use tessera_contracts::{
    error::{TesseraError, TesseraResult},
    report::IntegrityReport,
};
use tessera_migrate::{MaxCorruptionRatio, MigrationManager};

// ── CLI definition ────────────────────────────────────────────────────────────

/// TESSERA: tamper-evident audit chain.
#[derive(Parser)]
#[command(
    name = "tessera",
    about = "TESSERA tamper-evident audit chain",
    long_about = "Records actions in an HMAC-linked chain with a Merkle tree over it,\n\
                  and reports, repairs, proves, and exports its integrity."
)]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append one action to the chain.
    Log {
        #[arg(long)]
        action: String,
        #[arg(long, default_value = "general")]
        category: String,
        /// Details as a JSON object.
        #[arg(long, default_value = "{}")]
        details: String,
    },
    /// Verify the whole chain and list every corruption.
    Verify,
    /// Print entry counts and the current Merkle root.
    Summary,
    /// Drop every entry from the first corruption onward. Destructive.
    Repair,
    /// Print the inclusion proof for one entry.
    Proof {
        index: usize,
    },
    /// Write the chain with per-entry proofs to a file.
    Export {
        out: PathBuf,
    },
    /// Replay a legacy JSON array of records into the (empty) configured chain.
    Migrate {
        input: PathBuf,
        /// Overrides migration.max_corruption_ratio.
        #[arg(long)]
        max_ratio: Option<f64>,
        /// Overrides migration.export_path.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Walk through tamper detection and repair on a throwaway chain.
    Scenario,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=info (or debug) for more detail.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("tessera error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Run one command. `Ok(false)` means the command completed but found the
/// chain, repair, or migration unacceptable.
fn run(cli: Cli) -> TesseraResult<bool> {
    let config = TesseraConfig::load(cli.config.as_deref())?;
    debug!(config = ?cli.config, "configuration loaded");

    match cli.command {
        Command::Log {
            action,
            category,
            details,
        } => {
            let details: Value = serde_json::from_str(&details)?;
            let mut audit = AuditSystem::from_config(&config)?;
            let chain_hash = audit.log_action(&action, &details, &category)?;
            println!("{}", chain_hash);
            Ok(true)
        }
        Command::Verify => {
            let mut audit = AuditSystem::from_config(&config)?;
            let report = audit.get_integrity_report()?;
            print_report(&report);
            Ok(report.valid)
        }
        Command::Summary => {
            let mut audit = AuditSystem::from_config(&config)?;
            let summary = audit.get_chain_summary()?;
            println!("  Entries:      {}", summary.total);
            println!("  Valid:        {}", summary.valid);
            println!("  Corrupted:    {}", summary.corrupted);
            println!("  Merkle root:  {}", summary.merkle_root.as_deref().unwrap_or("-"));
            match summary.last_timestamp {
                Some(ts) => println!("  Last entry:   {}", ts.to_rfc3339()),
                None => println!("  Last entry:   -"),
            }
            Ok(summary.corrupted == 0)
        }
        Command::Repair => {
            let mut audit = AuditSystem::from_config(&config)?;
            let outcome = audit.repair_chain_integrity()?;
            println!("  Repaired:             {}", outcome.repaired);
            println!("  Recovered entries:    {}", outcome.recovered_events);
            println!("  Dropped entries:      {}", outcome.dropped_events);
            println!("  Remaining corruption: {}", outcome.remaining_corruptions);
            println!("  {}", outcome.message);
            Ok(outcome.repaired)
        }
        Command::Proof { index } => {
            let mut audit = AuditSystem::from_config(&config)?;
            let proof = audit.create_merkle_proof(index)?;
            println!("{}", serde_json::to_string_pretty(&proof)?);
            if let Some(root) = audit.manager().merkle_root() {
                eprintln!("root: {}", root);
            }
            Ok(true)
        }
        Command::Export { out } => {
            let mut audit = AuditSystem::from_config(&config)?;
            let export = audit.export_chain_with_proofs(&out)?;
            println!(
                "  Exported {} entries to {} (export id {})",
                export.entries.len(),
                out.display(),
                export.export_id
            );
            if !export.report.valid {
                print_report(&export.report);
            }
            Ok(export.report.valid)
        }
        Command::Migrate {
            input,
            max_ratio,
            export,
        } => {
            let raw = fs::read_to_string(&input)
                .map_err(|e| TesseraError::storage(format!("reading {}", input.display()), e))?;
            let records = match serde_json::from_str::<Value>(&raw)? {
                Value::Array(records) => records,
                _ => {
                    return Err(TesseraError::MigrationFailed {
                        reason: format!("{} must hold a JSON array of records", input.display()),
                    })
                }
            };

            let policy = match max_ratio {
                Some(ratio) => MaxCorruptionRatio(ratio),
                None => MaxCorruptionRatio::from_settings(&config.migration),
            };
            let mut manager = MigrationManager::from_config(&config)?;
            if let Some(path) = export {
                manager = manager.with_export_path(path);
            }

            let outcome = manager.migrate(records, &policy)?;
            println!("  Migrated:   {}", outcome.migrated);
            println!("  Rejected:   {}", outcome.rejected.len());
            for r in &outcome.rejected {
                println!("    record {}: {}", r.index, r.reason);
            }
            println!("  Legacy corruptions: {}", outcome.legacy_corruptions.len());
            for c in &outcome.legacy_corruptions {
                println!("    record {}: {}", c.event_index, c.reason);
                println!("      expected: {}", c.expected);
                println!("      actual:   {}", c.actual);
            }
            print_report(&outcome.report);
            println!("  Accepted:   {}", outcome.accepted);
            Ok(outcome.accepted)
        }
        Command::Scenario => scenario::run(),
    }
}

/// Print the verdict and every corruption, digests included.
pub(crate) fn print_report(report: &IntegrityReport) {
    let verdict = if report.valid { "VALID" } else { "CORRUPTED" };
    println!("  Chain integrity:  {}", verdict);
    println!("  Entries verified: {}", report.events_verified);
    println!("  Merkle root:      {}", report.merkle_root.as_deref().unwrap_or("-"));
    for c in &report.corruptions {
        println!("  [{}] {}", c.event_index, c.reason);
        println!("      expected: {}", c.expected);
        println!("      actual:   {}", c.actual);
    }
}
