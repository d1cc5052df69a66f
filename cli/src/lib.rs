//! CLI utilities for echomark.
//!
//! Configuration loading, on-disk layout and result printing shared by the
//! command line tools.

pub mod config;
pub mod output;
pub mod paths;

pub use config::{load_config, Config, GlobalConfig};
pub use output::{MatchReport, Output, OutputFormat};
pub use paths::Paths;
