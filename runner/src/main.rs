// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # BEP-20 Script Runner
//!
//! Entry point for the `bep20-runner` binary. Parses CLI arguments,
//! initializes logging, and dispatches to a subcommand:
//!
//! - `run`     - deploy a ledger and replay a JSON script against it
//! - `addr`    - print the address a signer label resolves to
//! - `version` - print build version information

mod cli;
mod logging;
mod script;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;

use cli::{Commands, RunnerCli};

fn main() -> Result<()> {
    let cli = RunnerCli::parse();
    logging::init_logging(&cli.logging.log_level, cli.logging.log_format);

    match cli.command {
        Commands::Run(args) => run_script(args),
        Commands::Addr(args) => {
            println!("{}", bep20_contracts::Address::from_label(&args.label));
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Replays a script, prints the per-step report to stdout, and optionally
/// writes the final ledger snapshot.
fn run_script(args: cli::RunArgs) -> Result<()> {
    let script = script::load(&args.script)?;
    tracing::info!(
        script = %args.script.display(),
        token = %script.token.symbol,
        steps = script.steps.len(),
        "replaying script"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = script.run(&mut out, args.fail_fast)?;
    out.flush().context("failed to flush report")?;

    summary
        .token
        .check_supply_invariant()
        .context("ledger failed its supply audit")?;

    if let Some(path) = &args.snapshot {
        let json = serde_json::to_string_pretty(&summary.token)
            .context("failed to serialize ledger snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        tracing::info!(path = %path.display(), "snapshot written");
    }

    let failures = summary.failures();
    tracing::info!(
        executed = summary.reports.len(),
        failures,
        total_supply = %summary.token.total_supply(),
        "script finished"
    );
    if failures > 0 {
        bail!("{failures} step(s) did not meet their expectation");
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("bep20-runner {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
