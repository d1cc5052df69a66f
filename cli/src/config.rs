//! Configuration file handling.
//!
//! The configuration lives in `~/.echomark/config.yaml`:
//!
//! ```yaml
//! global:
//!   tolerance: 0.001
//!   coefs: 1
//!   match_timeout_secs: 60
//!   snapshot: /var/lib/echomark/catalog.json
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};

use echomark_fingerprint::FingerprintConfig;
use serde::{Deserialize, Serialize};

use crate::paths::Paths;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,

    /// Path the config was read from (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// The `global:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(flatten)]
    pub fingerprint: FingerprintConfig,

    /// Catalog snapshot file; defaults to `~/.echomark/data/catalog.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}

impl Config {
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Snapshot file to load from and save to.
    pub fn snapshot_path(&self, paths: &Paths) -> PathBuf {
        self.global
            .snapshot
            .clone()
            .unwrap_or_else(|| paths.snapshot_file())
    }
}

/// Loads the configuration from `custom_path`, or from the default
/// location. A missing file yields the defaults; nothing is created.
pub fn load_config(paths: &Paths, custom_path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => p.to_path_buf(),
        None => paths.config_file(),
    };

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        Config::default()
    };
    cfg.global.fingerprint.validate()?;
    cfg.config_path = config_path;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path());
        let cfg = load_config(&paths, None).unwrap();
        assert_eq!(cfg.global.fingerprint, FingerprintConfig::default());
        assert_eq!(cfg.snapshot_path(&paths), paths.snapshot_file());
        assert_eq!(cfg.path(), paths.config_file());
        assert!(!paths.config_file().exists());
    }

    #[test]
    fn reads_global_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(
            &path,
            "global:\n  tolerance: 0.25\n  coefs: 3\n  snapshot: /data/cat.json\n",
        )
        .unwrap();

        let paths = Paths::with_base(dir.path());
        let cfg = load_config(&paths, Some(&path)).unwrap();
        assert_eq!(cfg.global.fingerprint.tolerance, 0.25);
        assert_eq!(cfg.global.fingerprint.coefs, 3);
        assert_eq!(cfg.global.fingerprint.match_timeout_secs, 60);
        assert_eq!(cfg.snapshot_path(&paths), PathBuf::from("/data/cat.json"));
    }

    #[test]
    fn rejects_bad_coefs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "global:\n  coefs: 20\n").unwrap();
        assert!(load_config(&Paths::with_base(dir.path()), Some(&path)).is_err());
    }

    #[test]
    fn serialized_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path());
        let mut cfg = Config::default();
        cfg.global.fingerprint.tolerance = 0.01;
        std::fs::write(paths.config_file(), serde_yaml::to_string(&cfg).unwrap()).unwrap();

        let again = load_config(&paths, None).unwrap();
        assert_eq!(again.global.fingerprint.tolerance, 0.01);
        assert_eq!(again.global.snapshot, None);
    }
}
