//! # CLI Interface
//!
//! Defines the command-line argument structure for `bep20-runner` using
//! `clap` derive. Supports three subcommands: `run`, `addr`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// BEP-20 ledger script runner.
///
/// Deploys an in-memory token ledger, replays a JSON script of calls
/// against it, and reports every call's outcome as a JSON line on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "bep20-runner",
    about = "Replay scripted calls against an in-memory BEP-20 ledger",
    version,
    propagate_version = true
)]
pub struct RunnerCli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a ledger and replay a script against it.
    Run(RunArgs),
    /// Print the address derived from a signer label.
    Addr(AddrArgs),
    /// Print version information and exit.
    Version,
}

/// Logging flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct LoggingArgs {
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(
        long,
        global = true,
        env = "BEP20_LOG_LEVEL",
        default_value = "bep20_runner=info,bep20_contracts=info"
    )]
    pub log_level: String,

    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "BEP20_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the JSON script.
    pub script: PathBuf,

    /// Write the final ledger state as JSON to this path.
    #[arg(long, short = 's')]
    pub snapshot: Option<PathBuf>,

    /// Stop at the first step whose expectation fails.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the `addr` subcommand.
#[derive(Parser, Debug)]
pub struct AddrArgs {
    /// Signer label, e.g. `owner` or `addr1`.
    pub label: String,
}
