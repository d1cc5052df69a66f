//! echomark - identify audio clips against a fingerprint catalog.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{AudioCommand, ContextCommand, MatchCommand};

/// echomark - audio fingerprint catalog and matcher.
///
/// Reference clips are fingerprinted into named contexts ("music",
/// "prompts", ...). An unknown clip is then matched against one context.
///
/// Configuration is read from ~/.echomark/config.yaml; the catalog is kept
/// in ~/.echomark/data/catalog.json unless `global.snapshot` says otherwise.
#[derive(Parser)]
#[command(name = "echomark")]
#[command(about = "Audio fingerprint catalog and matcher")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.echomark/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage catalog contexts
    Context(ContextCommand),
    /// Manage catalogued audio
    Audio(AudioCommand),
    /// Identify a clip within a context
    Match(MatchCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Context(cmd) => cmd.run(&cli).await,
        Commands::Audio(cmd) => cmd.run(&cli).await,
        Commands::Match(cmd) => cmd.run(&cli).await,
    }
}
