// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `transit`: developer CLI for network ledgers.
//!
//! # Usage
//! ```text
//! transit [--log <filter>] [--config-dir <dir>] [--compact] <command>
//!
//!   inspect --network <file>
//!   replay  --network <file> [--seed <file>] [--to <id>] [--system <id>]
//!   lines   --network <file> [--seed <file>] [--to <id>] --system <id> --segment <id>
//!   verify  --network <file> [--seed <file>]
//! ```
//!
//! Logs go to stderr; results go to stdout. The exit code is non-zero when a
//! file cannot be read, the reducer refuses a step, or `verify` fails.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use transit_app_core::config::{ConfigError, ConfigService};
use transit_app_core::prefs::{CliPrefs, CLI_PREFS_KEY};
use transit_config_fs::FsConfigStore;

#[derive(Parser, Debug)]
#[command(name = "transit", version, about = "Inspect and replay transit network ledgers")]
struct Cli {
    /// `tracing` filter; overrides `RUST_LOG` and the saved preference
    #[arg(long, global = true)]
    log: Option<String>,
    /// Directory holding saved preferences (defaults to the user config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Emit single-line JSON
    #[arg(long, global = true)]
    compact: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Network file plus an optional seed state.
#[derive(clap::Args, Debug)]
struct Source {
    /// Region network JSON (id, size, ledger)
    #[arg(long)]
    network: PathBuf,
    /// Flat state the ledger starts from; empty when omitted
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tabulate the ledger entries of a network
    Inspect {
        /// Region network JSON
        #[arg(long)]
        network: PathBuf,
    },
    /// Replay the ledger and print the resulting state
    Replay {
        #[command(flatten)]
        source: Source,
        /// Stop once this alteration is the head; replays everything when omitted
        #[arg(long)]
        to: Option<String>,
        /// Print this system hydrated instead of the flat state
        #[arg(long)]
        system: Option<String>,
    },
    /// List the lines of a system that run over a segment
    Lines {
        #[command(flatten)]
        source: Source,
        /// Stop once this alteration is the head; replays everything when omitted
        #[arg(long)]
        to: Option<String>,
        /// System to search
        #[arg(long)]
        system: String,
        /// Segment the lines must use
        #[arg(long)]
        segment: String,
    },
    /// Apply the whole ledger, roll it all back, and compare against the seed
    Verify {
        #[command(flatten)]
        source: Source,
        /// Also refuse any step that leaves dangling references
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Prefs are best-effort; failures are reported once logging is up.
    let loaded = load_prefs(cli.config_dir.as_deref());
    let prefs = loaded.as_ref().ok().cloned().unwrap_or_default();
    init_tracing(cli.log.as_deref(), prefs.log_filter.as_deref())?;
    if let Err(err) = &loaded {
        warn!(%err, "could not load saved preferences; using defaults");
    }

    let out = commands::Output {
        pretty: prefs.pretty && !cli.compact,
    };
    let reducer = commands::reducer_for(&prefs);

    match cli.command {
        Commands::Inspect { network } => commands::inspect(&network),
        Commands::Replay { source, to, system } => {
            commands::replay(&source, reducer, to.as_deref(), system.as_deref(), out)
        }
        Commands::Lines {
            source,
            to,
            system,
            segment,
        } => commands::lines(&source, reducer, to.as_deref(), &system, &segment),
        Commands::Verify { source, strict } => {
            let reducer = if strict {
                transit_core::NetworkReducer::verifying()
            } else {
                reducer
            };
            commands::verify(&source, reducer)
        }
    }
}

fn load_prefs(config_dir: Option<&Path>) -> Result<CliPrefs, ConfigError> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir)?,
        None => FsConfigStore::new()?,
    };
    let config = ConfigService::new(store);
    match config.load::<CliPrefs>(CLI_PREFS_KEY)? {
        Some(prefs) => Ok(prefs),
        None => {
            // Persist defaults once if absent
            let prefs = CliPrefs::default();
            let _ = config.save(CLI_PREFS_KEY, &prefs);
            Ok(prefs)
        }
    }
}

/// `--log` wins over `RUST_LOG`, which wins over the saved filter.
fn init_tracing(flag: Option<&str>, saved: Option<&str>) -> Result<()> {
    let filter = match flag {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid --log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(saved.unwrap_or("warn")))
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
