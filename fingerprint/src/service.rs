//! Async front-end over the catalog and matcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use echomark_audio::AudioError;
use echomark_store::Database;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::catalog::{display_name, Catalog};
use crate::config::{check_coefs, FingerprintConfig};
use crate::error::{FingerprintError, Result};
use crate::extract::extract_frames;
use crate::hash::file_hash;
use crate::matcher::Matcher;
use crate::types::{AddAudio, Context, Frame, MatchOutcome};

/// Result of ingesting one file of a directory.
#[derive(Debug)]
pub struct IngestReport {
    pub path: PathBuf,
    pub result: Result<AddAudio>,
}

/// Catalog service for async callers.
///
/// File hashing, extraction and matching run on the blocking pool.
/// Extraction is bounded by [`FingerprintConfig::extract_timeout`] and the
/// vote loop by [`FingerprintConfig::match_timeout`]. Mutations of one
/// context are serialized; matches never take the context lock.
///
/// A timed out extraction is abandoned, not cancelled: its worker thread
/// runs to completion and the result is discarded.
pub struct Recognizer {
    catalog: Catalog,
    matcher: Matcher,
    config: FingerprintConfig,
    locks: ContextLocks,
}

impl Recognizer {
    pub fn new(db: Arc<dyn Database>, config: FingerprintConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Catalog::new(db.clone())?;
        let matcher = Matcher::new(db).with_default_tolerance(config.tolerance);
        Ok(Self {
            catalog,
            matcher,
            config,
            locks: ContextLocks::default(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    pub async fn add_context(
        &self,
        name: &str,
        directory: Option<&str>,
        replace: bool,
    ) -> Result<Context> {
        let lock = self.locks.get(name);
        let _guard = lock.lock().await;
        self.catalog.add_context(name, directory, replace)
    }

    pub async fn remove_context(&self, name: &str) -> Result<()> {
        let lock = self.locks.get(name);
        let _guard = lock.lock().await;
        self.catalog.remove_context(name)
    }

    /// Fingerprints one file into `context`.
    pub async fn ingest(&self, context: &str, path: impl Into<PathBuf>) -> Result<AddAudio> {
        let path = path.into();
        let lock = self.locks.get(context);
        let _guard = lock.lock().await;

        self.catalog.get_context(context)?;
        let hash = {
            let path = path.clone();
            blocking(move || file_hash(&path)).await?
        };
        let existing = {
            let catalog = self.catalog.clone();
            let context = context.to_string();
            let hash = hash.clone();
            blocking(move || catalog.find_by_hash(&context, &hash)).await?
        };
        if let Some(existing) = existing {
            info!(
                "{} already catalogued in {} as {}",
                path.display(),
                context,
                existing.uuid
            );
            return Ok(AddAudio::Duplicate(existing));
        }

        let frames = self.extract(&path).await?;
        let catalog = self.catalog.clone();
        let context = context.to_string();
        let name = display_name(&path);
        blocking(move || catalog.insert_fingerprinted(&context, &name, &hash, &frames)).await
    }

    /// Fingerprints every regular file directly inside `dir`, in name
    /// order. Per-file failures are reported, not returned.
    pub async fn ingest_dir(&self, context: &str, dir: &Path) -> Result<Vec<IngestReport>> {
        self.catalog.get_context(context)?;

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let result = self.ingest(context, path.clone()).await;
            if let Err(e) = &result {
                warn!("Skipping {}: {}", path.display(), e);
            }
            reports.push(IngestReport { path, result });
        }
        Ok(reports)
    }

    pub async fn remove_audio(&self, uuid: &str) -> Result<()> {
        let record = self.catalog.get_audio(uuid)?;
        let lock = self.locks.get(&record.context);
        let _guard = lock.lock().await;
        self.catalog.remove_audio(uuid)
    }

    /// Matches a clip within `context`. `coefs` defaults to the configured
    /// count, `tolerance` to the configured default.
    pub async fn identify(
        &self,
        context: &str,
        path: impl Into<PathBuf>,
        coefs: Option<usize>,
        tolerance: Option<f64>,
    ) -> Result<MatchOutcome> {
        let coefs = coefs.unwrap_or(self.config.coefs);
        check_coefs(coefs)?;
        self.catalog.get_context(context)?;

        let path: PathBuf = path.into();
        let probe = self.extract(&path).await?;
        let deadline = Instant::now() + self.config.match_timeout();
        let matcher = self.matcher.clone();
        let context = context.to_string();
        blocking(move || {
            matcher.match_frames_until(&context, &probe, coefs, tolerance, Some(deadline))
        })
        .await
    }

    async fn extract(&self, path: &Path) -> Result<Vec<Frame>> {
        let len = tokio::fs::metadata(path)
            .await
            .map_err(|source| AudioError::Open {
                path: path.display().to_string(),
                source,
            })?
            .len();
        let limit = self.config.extract_timeout(len);
        let owned = path.to_path_buf();
        match tokio::time::timeout(limit, blocking(move || extract_frames(&owned))).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Extraction of {} exceeded {:?}", path.display(), limit);
                Err(FingerprintError::Timeout("extraction", limit))
            }
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FingerprintError::Task(e.to_string()))?
}

/// One async mutex per context name.
#[derive(Default)]
struct ContextLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ContextLocks {
    fn get(&self, context: &str) -> Arc<AsyncMutex<()>> {
        self.inner
            .lock()
            .entry(context.to_string())
            .or_default()
            .clone()
    }
}
