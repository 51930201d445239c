/// Building Registry v1: Command Replay Harness
///
/// Reads a JSON array of calls (`height`, `caller`, and a tagged
/// command), applies them in order against a configured admin, prints
/// each outcome and the final canonical hash.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use building_registry::hashing::canonical_hash;
use building_registry::{Command, CommandEnvelope, Principal, Registry, RegistryConfig};

#[derive(Parser, Debug)]
#[command(name = "building-registry")]
#[command(about = "Replay building registry commands and print the canonical state hash")]
struct Args {
    /// JSON file holding an array of calls
    calls: PathBuf,

    /// Admin identity
    #[arg(long, env = "BUILDING_REGISTRY_ADMIN")]
    admin: String,

    /// Exit non-zero if any call is rejected
    #[arg(long)]
    strict: bool,

    /// Print the final state as JSON
    #[arg(long)]
    dump_state: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Deserialize)]
struct Call {
    height: u64,
    caller: Principal,
    #[serde(flatten)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let data = fs::read_to_string(&args.calls)
        .with_context(|| format!("reading {}", args.calls.display()))?;
    let calls: Vec<Call> =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", args.calls.display()))?;
    tracing::info!(calls = calls.len(), admin = %args.admin, "replaying");

    let mut registry = Registry::new(RegistryConfig::new(args.admin.as_str()));
    let mut rejected = 0usize;

    for call in calls {
        let envelope = CommandEnvelope::new(
            registry.last_sequence() + 1,
            call.height,
            call.caller,
            call.command,
        );
        match registry.apply(&envelope) {
            Ok(receipt) => println!(
                "[OK] seq={} height={} {}",
                receipt.sequence, receipt.height, receipt.command
            ),
            Err(err) => {
                rejected += 1;
                let code = err.registry_error().map(|e| e.status_code()).unwrap_or(0);
                println!(
                    "[REJECTED] height={} {} code={}: {}",
                    envelope.height,
                    envelope.command.name(),
                    code,
                    err
                );
            }
        }
    }

    let state = registry.state();
    println!("\nrecords={} rejected={}", state.record_count(), rejected);
    println!("hash={}", canonical_hash(state));

    if args.dump_state {
        println!("{}", serde_json::to_string_pretty(state)?);
    }

    if args.strict && rejected > 0 {
        bail!("{} call(s) rejected", rejected);
    }
    Ok(())
}
