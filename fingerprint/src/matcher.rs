//! Tolerance-window vote matching.
//!
//! Every probe frame becomes a box query over the first `C` coefficient
//! columns, `coefN BETWEEN p[N] - tol AND p[N] + tol`, restricted to one
//! context. Each audio record with at least one stored frame inside the box
//! gets one vote for that probe frame. Votes are accumulated in a scratch
//! table private to the match, and the record with the most votes wins.
//!
//! Ties go to the candidate that received its first vote earliest (the
//! lowest scratch `rowid` among its votes).

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use echomark_store::{check_identifier, Database, Value};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::{check_coefs, resolve_tolerance, DEFAULT_TOLERANCE};
use crate::error::{FingerprintError, Result};
use crate::extract::extract_frames;
use crate::schema::{coef_column, AUDIO_TABLE, CONTEXT_TABLE, FINGERPRINT_TABLE};
use crate::types::{AudioRecord, Frame, MatchOutcome, MatchResult};

/// Ranks catalogued audio against probe frames.
#[derive(Clone, Debug)]
pub struct Matcher {
    db: Arc<dyn Database>,
    default_tolerance: f64,
}

impl Matcher {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            default_tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Tolerance used when a request gives none or a negative one.
    pub fn with_default_tolerance(mut self, tolerance: f64) -> Self {
        self.default_tolerance = tolerance;
        self
    }

    pub fn default_tolerance(&self) -> f64 {
        self.default_tolerance
    }

    /// Extracts `path` and matches it within `context`.
    pub fn match_file(
        &self,
        context: &str,
        path: &Path,
        coefs: usize,
        tolerance: Option<f64>,
    ) -> Result<MatchOutcome> {
        check_coefs(coefs)?;
        self.require_context(context)?;
        let probe = extract_frames(path)?;
        self.match_frames(context, &probe, coefs, tolerance)
    }

    pub fn match_frames(
        &self,
        context: &str,
        probe: &[Frame],
        coefs: usize,
        tolerance: Option<f64>,
    ) -> Result<MatchOutcome> {
        self.match_frames_until(context, probe, coefs, tolerance, None)
    }

    /// Like [`Matcher::match_frames`], giving up with
    /// [`FingerprintError::Timeout`] once `deadline` passes.
    pub fn match_frames_until(
        &self,
        context: &str,
        probe: &[Frame],
        coefs: usize,
        tolerance: Option<f64>,
        deadline: Option<Instant>,
    ) -> Result<MatchOutcome> {
        check_coefs(coefs)?;
        let tolerance = resolve_tolerance(tolerance, self.default_tolerance);
        self.require_context(context)?;

        let frame_count = probe.len();
        if probe.is_empty() {
            return Ok(MatchOutcome::NotFound { frame_count: 0 });
        }

        let scratch = ScratchTable::create(self.db.as_ref())?;
        let vote_sql = vote_sql(scratch.name(), coefs);
        let started = Instant::now();

        for frame in probe {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(FingerprintError::Timeout("match", started.elapsed()));
            }
            let mut params: Vec<Value> = Vec::with_capacity(1 + 2 * coefs);
            params.push(context.into());
            for &c in &frame.coefs[..coefs] {
                params.push((c - tolerance).into());
                params.push((c + tolerance).into());
            }
            let voters = self.db.execute(&vote_sql, &params)?;
            trace!("Probe frame {}: {} candidates", frame.index, voters);
        }

        let top = self.db.query_one(
            &format!(
                "SELECT audio_uuid, COUNT(*) AS votes FROM {} \
                 GROUP BY audio_uuid ORDER BY votes DESC, MIN(rowid) ASC LIMIT 1",
                scratch.name()
            ),
            &[],
        )?;
        drop(scratch);

        let Some(top) = top else {
            debug!("No match in {} for {} probe frames", context, frame_count);
            return Ok(MatchOutcome::NotFound { frame_count });
        };
        let uuid = top.text("audio_uuid")?;
        let match_count = top.integer("votes")? as usize;
        let record = self.lookup(uuid)?;

        debug!(
            "Matched {} ({}) in {}: {}/{} frames, tolerance {}",
            record.name, record.uuid, context, match_count, frame_count, tolerance
        );
        Ok(MatchOutcome::Found(MatchResult {
            record,
            frame_count,
            match_count,
        }))
    }

    fn require_context(&self, context: &str) -> Result<()> {
        let row = self.db.query_one(
            &format!("SELECT name FROM {CONTEXT_TABLE} WHERE name = ?1"),
            &[context.into()],
        )?;
        match row {
            Some(_) => Ok(()),
            None => Err(FingerprintError::not_found("context", context)),
        }
    }

    fn lookup(&self, uuid: &str) -> Result<AudioRecord> {
        let row = self.db.query_one(
            &format!("SELECT uuid, name, context, hash FROM {AUDIO_TABLE} WHERE uuid = ?1"),
            &[uuid.into()],
        )?;
        match row {
            Some(r) => Ok(AudioRecord::from_record(&r)?),
            None => Err(FingerprintError::not_found("audio", uuid)),
        }
    }
}

/// `INSERT INTO scratch SELECT ... GROUP BY audio_uuid`: one row per
/// distinct candidate inside the box. Parameters: `?1` context, then a
/// lower/upper pair per coefficient.
fn vote_sql(scratch: &str, coefs: usize) -> String {
    let ranges: String = (0..coefs)
        .map(|i| {
            format!(
                " AND {} BETWEEN ?{} AND ?{}",
                coef_column(i),
                2 + 2 * i,
                3 + 2 * i
            )
        })
        .collect();
    format!(
        "INSERT INTO {scratch} (audio_uuid) SELECT audio_uuid FROM {FINGERPRINT_TABLE} \
         WHERE context = ?1{ranges} GROUP BY audio_uuid"
    )
}

/// Vote table of one match session, dropped when the guard goes away.
struct ScratchTable<'a> {
    db: &'a dyn Database,
    name: String,
}

impl<'a> ScratchTable<'a> {
    fn create(db: &'a dyn Database) -> Result<Self> {
        let name = format!("scratch_{}", Uuid::new_v4().simple());
        check_identifier(&name)?;
        db.execute_batch(&format!(
            "CREATE TEMP TABLE {name} (audio_uuid TEXT NOT NULL)"
        ))?;
        trace!("Created {}", name);
        Ok(Self { db, name })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ScratchTable<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .db
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", self.name))
        {
            warn!("Failed to drop {}: {}", self.name, e);
        }
    }
}
