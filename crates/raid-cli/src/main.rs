//! # raid CLI entry point
//!
//! Parses command-line arguments, initialises logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use raid_cli::prove::{run_prove, ProveArgs};
use raid_cli::scenario::{run_run, RunArgs};

/// RAID head protocol tooling.
///
/// Replays publish scenarios against an in-process node and builds
/// proposer proofs.
#[derive(Parser, Debug)]
#[command(name = "raid", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    /// Path to node configuration (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a YAML scenario against a fresh node.
    Run(RunArgs),

    /// Compute a proposer leaf, its folded root, and optionally the encoded proof.
    Prove(ProveArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    // Logs go to stderr; stdout carries the command's JSON output.
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "raid CLI starting");

    let result = match cli.command {
        Commands::Run(args) => run_run(&args, cli.config.as_deref()),
        Commands::Prove(args) => run_prove(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
