//! On-disk layout of echomark state.

use std::io;
use std::path::PathBuf;

/// Default base directory name under the home directory.
pub const DEFAULT_BASE_DIR: &str = ".echomark";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default catalog snapshot filename.
pub const DEFAULT_SNAPSHOT_FILE: &str = "catalog.json";

/// Locations of the config file and catalog data.
#[derive(Debug, Clone)]
pub struct Paths {
    pub base_dir: PathBuf,
}

impl Paths {
    /// `~/.echomark`.
    pub fn new() -> io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self::with_base(home.join(DEFAULT_BASE_DIR)))
    }

    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<base>/config.yaml`.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(DEFAULT_CONFIG_FILE)
    }

    /// `<base>/data`.
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// `<base>/data/catalog.json`.
    pub fn snapshot_file(&self) -> PathBuf {
        self.data_dir().join(DEFAULT_SNAPSHOT_FILE)
    }
}
