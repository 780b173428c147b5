//! Castline CLI - Headless HLS Stream Checker
//!
//! Features:
//! - URL sanitizing (same rules the player applies to pasted text)
//! - One-shot stream load through the session controller
//! - Built-in sample stream catalog

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod probe;

/// Castline CLI - HLS stream session toolkit
#[derive(Parser)]
#[command(name = "castline")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Load HLS streams through the Castline session controller", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the stream URL from pasted text
    Sanitize {
        /// Text containing a URL
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Load a stream and report status until it plays or fails
    Play {
        /// Text containing the stream URL
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,

        /// Load a catalog preset instead
        #[arg(short, long, conflicts_with = "text")]
        preset: Option<String>,

        /// Pretend no streaming engine is available
        #[arg(long)]
        no_engine: bool,

        /// Declare native HLS support on the media element
        #[arg(long)]
        native: bool,

        /// Reject play requests as a blocked autoplay would
        #[arg(long)]
        block_autoplay: bool,

        /// Seconds to wait for the stream to settle
        #[arg(short, long, default_value = "15")]
        timeout: u64,

        /// Controller config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List sample streams
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    castline_core::init();

    match cli.command {
        Commands::Sanitize { text } => {
            if !commands::sanitize(&text.join(" "), &cli.format) {
                std::process::exit(1);
            }
        }
        Commands::Play {
            text,
            preset,
            no_engine,
            native,
            block_autoplay,
            timeout,
            config,
        } => {
            let opts = commands::PlayOptions {
                input: (!text.is_empty()).then(|| text.join(" ")),
                preset,
                no_engine,
                native,
                block_autoplay,
                timeout,
                config,
            };
            if !commands::play(opts, &cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::Catalog => {
            commands::list_catalog(&cli.format);
        }
    }

    Ok(())
}
