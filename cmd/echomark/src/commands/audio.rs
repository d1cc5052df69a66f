//! Audio catalog commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use echomark_fingerprint::{AddAudio, AudioRecord, IngestReport};

use super::{output, Session};
use crate::Cli;

/// Fingerprint, remove and list reference audio.
#[derive(Args)]
pub struct AudioCommand {
    #[command(subcommand)]
    command: AudioSubcommand,
}

#[derive(Subcommand)]
enum AudioSubcommand {
    /// Fingerprint a file into a context
    Add { context: String, file: PathBuf },
    /// Fingerprint every file of a directory into a context
    AddDir { context: String, dir: PathBuf },
    /// Remove an audio record by uuid
    Remove { uuid: String },
    /// List audio records, optionally of one context
    List { context: Option<String> },
}

#[derive(Serialize)]
struct Added<'a> {
    status: &'static str,
    #[serde(flatten)]
    record: &'a AudioRecord,
}

impl<'a> From<&'a AddAudio> for Added<'a> {
    fn from(add: &'a AddAudio) -> Self {
        Self {
            status: if add.is_created() { "created" } else { "duplicate" },
            record: add.record(),
        }
    }
}

#[derive(Serialize)]
struct FileResult<'a> {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a IngestReport> for FileResult<'a> {
    fn from(report: &'a IngestReport) -> Self {
        let path = report.path.display().to_string();
        match &report.result {
            Ok(add) => {
                let added = Added::from(add);
                Self {
                    path,
                    status: added.status,
                    uuid: Some(add.record().uuid.as_str()),
                    error: None,
                }
            }
            Err(e) => Self {
                path,
                status: "failed",
                uuid: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
struct Removed<'a> {
    removed: &'a str,
}

impl AudioCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let session = Session::open(cli)?;
        let recognizer = &session.recognizer;
        match &self.command {
            AudioSubcommand::Add { context, file } => {
                let add = recognizer.ingest(context, file).await?;
                if add.is_created() {
                    session.save()?;
                }
                output(cli).write(&Added::from(&add))
            }
            AudioSubcommand::AddDir { context, dir } => {
                let reports = recognizer.ingest_dir(context, dir).await?;
                if reports
                    .iter()
                    .any(|r| r.result.as_ref().is_ok_and(AddAudio::is_created))
                {
                    session.save()?;
                }
                let results: Vec<FileResult<'_>> = reports.iter().map(FileResult::from).collect();
                output(cli).write(&results)
            }
            AudioSubcommand::Remove { uuid } => {
                recognizer.remove_audio(uuid).await?;
                session.save()?;
                output(cli).write(&Removed { removed: uuid })
            }
            AudioSubcommand::List { context } => {
                output(cli).write(&recognizer.catalog().list_audio(context.as_deref())?)
            }
        }
    }
}
