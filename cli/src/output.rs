//! Output utilities for CLI tools.

use std::{fs::File, io::Write};

use echomark_fingerprint::MatchOutcome;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

/// Output configuration.
pub struct Output {
    pub format: OutputFormat,
    pub file: Option<String>,
}

impl Output {
    pub fn new(format: OutputFormat, file: Option<String>) -> Self {
        Self { format, file }
    }

    /// Renders a value in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }

    /// Writes a value to the output file, or stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let output = self.render(value)?;
        match &self.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                println!("{}", output);
            }
        }
        Ok(())
    }
}

/// Printable form of a match outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub status: &'static str,
    pub frame_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl From<&MatchOutcome> for MatchReport {
    fn from(outcome: &MatchOutcome) -> Self {
        let found = outcome.found();
        Self {
            status: outcome.status(),
            frame_count: outcome.frame_count(),
            match_count: found.map(|m| m.match_count),
            uuid: found.map(|m| m.record.uuid.clone()),
            name: found.map(|m| m.record.name.clone()),
            context: found.map(|m| m.record.context.clone()),
            hash: found.map(|m| m.record.hash.clone()),
        }
    }
}
