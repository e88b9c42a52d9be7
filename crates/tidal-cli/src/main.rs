//! tidal-validate — a demonstration harness for the DID transaction validator.
//!
//! Loads a transaction envelope (and, optionally, a governance-parameter
//! file and a seed ledger of prior transactions) from disk, replays them
//! into an in-memory store, and reports whether the final transaction
//! would be accepted. This is a diagnostic tool, not a node: it has no
//! networking, no persistence, and no consensus of its own.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use tidal_core::types::{DidParams, DidPayload, DidTxRecord};
use tidal_state::MemoryStore;
use tidal_validator::ValidationContext;

#[derive(Parser, Debug)]
#[command(
    name = "tidal-validate",
    version,
    about = "Replay a DID transaction against a seeded ledger and report the verdict"
)]
struct Args {
    /// Path to the transaction envelope JSON to validate.
    tx: PathBuf,

    /// Path to a JSON file seeding prior accepted DID documents (array of
    /// DidTxRecord-shaped objects keyed by identifier). Optional.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Path to governance parameters (DidParams JSON). Defaults baked in
    /// when omitted.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Current chain height, for height-gated rules.
    #[arg(long, default_value_t = 0)]
    height: u32,

    /// Median-time-past, RFC3339. Defaults to the current time.
    #[arg(long)]
    median_time_past: Option<String>,

    /// Fee actually paid by the transaction, in sela.
    #[arg(long, default_value_t = 0)]
    fee_paid: u64,
}

/// A single seeded ledger entry: maps an identifier to its last accepted document.
#[derive(serde::Deserialize)]
struct SeedEntry {
    id: String,
    txid_hex: String,
    is_primitive: bool,
    did_doc: tidal_core::types::DidDocument,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tidal=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let tx_json = std::fs::read_to_string(&args.tx)
        .with_context(|| format!("reading transaction from {}", args.tx.display()))?;
    let tx: DidPayload = serde_json::from_str(&tx_json).context("parsing transaction envelope")?;

    let params: DidParams = match &args.params {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("reading params from {}", p.display()))?;
            serde_json::from_str(&raw).context("parsing governance params JSON")?
        }
        None => DidParams::default(),
    };

    let store = MemoryStore::new();
    if let Some(ledger_path) = &args.ledger {
        let raw = std::fs::read_to_string(ledger_path)
            .with_context(|| format!("reading ledger seed from {}", ledger_path.display()))?;
        let seeds: Vec<SeedEntry> = serde_json::from_str(&raw).context("parsing ledger seed JSON")?;
        for seed in seeds {
            info!(id = %seed.id, primitive = seed.is_primitive, "seeding prior document");
            store.record_did_tx(
                &seed.id,
                DidTxRecord {
                    txid_hex: seed.txid_hex,
                    operation: tx.header.operation,
                    did_doc: seed.did_doc,
                },
                seed.is_primitive,
            );
        }
    }

    let median_time_past = match &args.median_time_past {
        Some(s) => chrono::DateTime::parse_from_rfc3339(s)
            .context("parsing --median-time-past")?
            .with_timezone(&chrono::Utc),
        None => chrono::Utc::now(),
    };

    let ctx = ValidationContext {
        height: args.height,
        median_time_past,
        fee_paid: args.fee_paid,
        params: &params,
        store: &store,
        spv: &store,
    };

    match tidal_validator::validate(&tx, &ctx) {
        Ok(()) => {
            info!("transaction accepted");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "transaction rejected");
            std::process::exit(1);
        }
    }
}
