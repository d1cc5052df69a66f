//! Context management commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use super::{output, Session};
use crate::Cli;

/// Create, remove and list catalog contexts.
#[derive(Args)]
pub struct ContextCommand {
    #[command(subcommand)]
    command: ContextSubcommand,
}

#[derive(Subcommand)]
enum ContextSubcommand {
    /// Create a context
    Add {
        name: String,
        /// Directory hint stored with the context
        #[arg(long)]
        directory: Option<String>,
        /// Replace the directory of an existing context
        #[arg(long)]
        replace: bool,
    },
    /// Remove a context and everything catalogued in it
    Remove { name: String },
    /// List contexts
    List,
}

#[derive(Serialize)]
struct Removed<'a> {
    removed: &'a str,
}

impl ContextCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let session = Session::open(cli)?;
        let recognizer = &session.recognizer;
        match &self.command {
            ContextSubcommand::Add {
                name,
                directory,
                replace,
            } => {
                let ctx = recognizer
                    .add_context(name, directory.as_deref(), *replace)
                    .await?;
                session.save()?;
                output(cli).write(&ctx)
            }
            ContextSubcommand::Remove { name } => {
                recognizer.remove_context(name).await?;
                session.save()?;
                output(cli).write(&Removed { removed: name })
            }
            ContextSubcommand::List => output(cli).write(&recognizer.catalog().list_contexts()?),
        }
    }
}
