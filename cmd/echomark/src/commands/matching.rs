//! Clip identification command.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use echomark_cli::MatchReport;

use super::{output, Session};
use crate::Cli;

/// Identify a clip against the audio of one context.
#[derive(Args)]
pub struct MatchCommand {
    /// Context to search
    context: String,

    /// Clip to identify
    file: PathBuf,

    /// Leading coefficients to compare, 1..=13 (default from config)
    #[arg(long)]
    coefs: Option<usize>,

    /// Per-coefficient tolerance; negative means the configured default
    #[arg(long, allow_negative_numbers = true)]
    tolerance: Option<f64>,
}

impl MatchCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let session = Session::open(cli)?;
        let outcome = session
            .recognizer
            .identify(&self.context, &self.file, self.coefs, self.tolerance)
            .await?;
        info!(
            "{}: {} ({} frames)",
            self.file.display(),
            outcome.status(),
            outcome.frame_count()
        );
        output(cli).write(&MatchReport::from(&outcome))
    }
}
