// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use filtercam::constants::timing;
use filtercam::errors::AppResult;
use filtercam::filters::FilterMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "filtercam")]
#[command(about = "Live camera filters with a snapshot gallery")]
#[command(version = filtercam::constants::app_info::version())]
struct Cli {
    /// Keep snapshots and favorites in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Configuration file (default: <config dir>/filtercam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live filter pipeline and report throughput
    Preview {
        /// Filter mode (none, cartoon, edge, blur, gray)
        #[arg(short, long)]
        filter: Option<FilterMode>,

        /// Filter intensity, clamped to 0-100
        #[arg(short, long, allow_hyphen_values = true)]
        intensity: Option<i32>,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Use a still image instead of the test pattern
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Capture one filtered snapshot
    Capture {
        /// Filter mode (none, cartoon, edge, blur, gray)
        #[arg(short, long)]
        filter: Option<FilterMode>,

        /// Filter intensity, clamped to 0-100
        #[arg(short, long, allow_hyphen_values = true)]
        intensity: Option<i32>,

        /// Use a still image instead of the test pattern
        #[arg(long)]
        image: Option<PathBuf>,

        /// Let the pipeline run this long before capturing
        #[arg(long, default_value_t = timing::CAPTURE_WARMUP.as_millis() as u64)]
        warmup_ms: u64,
    },

    /// List saved snapshots, most recent first
    List,

    /// Show the provenance of a snapshot
    Show {
        /// Snapshot name or id
        id: String,
    },

    /// Delete a snapshot
    Delete {
        /// Snapshot name or id
        id: String,
    },

    /// Toggle the favorite flag of a snapshot
    Favorite {
        /// Snapshot name or id
        id: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> AppResult<()> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=filtercam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let ctx = cli::Context::new(cli.config.as_deref(), cli.ephemeral)?;

    match cli.command {
        Commands::Preview {
            filter,
            intensity,
            seconds,
            image,
        } => cli::preview(&ctx, filter, intensity, seconds, image),
        Commands::Capture {
            filter,
            intensity,
            image,
            warmup_ms,
        } => cli::capture(&ctx, filter, intensity, image, warmup_ms),
        Commands::List => cli::list(&ctx),
        Commands::Show { id } => cli::show(&ctx, &id),
        Commands::Delete { id } => cli::delete(&ctx, &id),
        Commands::Favorite { id } => cli::favorite(&ctx, &id),
        Commands::Config => cli::print_config(&ctx),
    }
}
