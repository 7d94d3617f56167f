//! schedsim — scheduler simulator snapshot tool.
//!
//! # Usage
//!
//! ```text
//! schedsim export --data-dir /var/lib/schedsim --output snapshot.json
//! schedsim import --data-dir /tmp/replay --input snapshot.json
//! schedsim replicate --data-dir /tmp/replay --from /var/lib/schedsim
//! schedsim reset --data-dir /tmp/replay
//! schedsim config --config schedsim.toml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LOG_FILTER: &str = "info,schedsim=debug";

#[derive(Parser)]
#[command(
    name = "schedsim",
    about = "Scheduler simulator — export, import, replicate and reset cluster state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to schedsim.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory of the cluster store (overrides the config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the current cluster state as a snapshot.
    Export {
        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Log failed fetches and export what could be read.
        #[arg(long)]
        ignore_errors: bool,
    },
    /// Replay a snapshot into the cluster store.
    Import {
        /// Snapshot file written by `export`.
        #[arg(short, long)]
        input: PathBuf,

        /// Log failed applies and keep going.
        #[arg(long)]
        ignore_errors: bool,

        /// Keep the running scheduler configuration.
        #[arg(long)]
        ignore_scheduler_config: bool,
    },
    /// Copy another cluster store into this one.
    Replicate {
        /// Data directory of the cluster to copy.
        #[arg(long)]
        from: PathBuf,

        /// Log failed fetches and applies and keep going.
        #[arg(long)]
        ignore_errors: bool,

        /// Keep the running scheduler configuration.
        #[arg(long)]
        ignore_scheduler_config: bool,
    },
    /// Delete every user object and restore the default scheduler configuration.
    Reset {
        /// Log failed deletes and keep going.
        #[arg(long)]
        ignore_errors: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so an exported snapshot on stdout stays clean.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Command::Export {
            output,
            ignore_errors,
        } => commands::export::run(&config, output.as_deref(), ignore_errors).await,
        Command::Import {
            input,
            ignore_errors,
            ignore_scheduler_config,
        } => {
            commands::import::run(&config, &input, ignore_errors, ignore_scheduler_config).await
        }
        Command::Replicate {
            from,
            ignore_errors,
            ignore_scheduler_config,
        } => {
            commands::replicate::run(&config, &from, ignore_errors, ignore_scheduler_config).await
        }
        Command::Reset { ignore_errors } => commands::reset::run(&config, ignore_errors).await,
        Command::Config => commands::config::run(&config),
    }
}
