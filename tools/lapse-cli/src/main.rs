//! Lapse CLI: per-monitor timelapse capture.
//!
//! Usage:
//!   lapse record [OPTIONS]     Capture frames until Ctrl+C or --ticks
//!   lapse status [--root DIR]  Show frame counts per monitor directory
//!   lapse verify [--root DIR]  Check that monitor directories are aligned
//!   lapse monitors             List detected monitors and their keys

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lapse_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "lapse",
    about = "Multi-monitor timelapse capture with index-aligned frame directories",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one frame per monitor on every tick
    Record {
        /// Capture root (defaults to the configured root)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Seconds between ticks
        #[arg(short, long)]
        interval: Option<f64>,

        /// Maximum concurrent monitor captures per tick
        #[arg(short, long)]
        parallel: Option<usize>,

        /// Capture backend: xcap|synthetic
        #[arg(short, long)]
        backend: Option<String>,

        /// Synthetic monitor layout, e.g. 1920x1080+0+0,1280x720+1920+0
        #[arg(long)]
        layout: Option<String>,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Show per-directory frame counts and MaxFrameCount
    Status {
        /// Capture root (defaults to the configured root)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Check that every directory is an index-aligned prefix of the longest one
    Verify {
        /// Capture root (defaults to the configured root)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// List detected monitors and their directory keys
    Monitors {
        /// Capture backend: xcap|synthetic
        #[arg(short, long)]
        backend: Option<String>,

        /// Synthetic monitor layout
        #[arg(long)]
        layout: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    lapse_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Record {
            root,
            interval,
            parallel,
            backend,
            layout,
            ticks,
        } => {
            if let Some(root) = root {
                config.root_dir = root;
            }
            if let Some(interval) = interval {
                config.capture.interval_secs = interval;
            }
            if let Some(parallel) = parallel {
                config.capture.max_parallel_captures = parallel;
            }
            if let Some(backend) = backend {
                config.capture.backend = backend;
            }
            commands::record::run(config, layout, ticks).await
        }
        Commands::Status { root } => commands::status::run(root.unwrap_or(config.root_dir)),
        Commands::Verify { root } => commands::verify::run(root.unwrap_or(config.root_dir)),
        Commands::Monitors { backend, layout } => {
            let backend = backend.unwrap_or(config.capture.backend);
            commands::monitors::run(&backend, layout.as_deref())
        }
    }
}
