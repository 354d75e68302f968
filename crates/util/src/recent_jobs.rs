//! Recently viewed job ids, newest first.
//!
//! The list is a small JSON array of `{ "id", "ts" }` records (timestamps in
//! milliseconds) kept at `<config_dir>/resultgrid/recent_jobs.json` unless
//! `RESULTGRID_RECENT_JOBS_PATH` points elsewhere. The in-memory copy sits
//! behind a `Mutex` so one store can be shared across threads.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::path_processing::{app_file_path, expand_tilde};

/// Environment variable overriding the recent jobs file location.
pub const RECENT_JOBS_PATH_ENV: &str = "RESULTGRID_RECENT_JOBS_PATH";
pub const RECENT_JOBS_FILE_NAME: &str = "recent_jobs.json";
pub const DEFAULT_RECENT_JOBS_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum RecentJobsError {
    #[error("recent jobs I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("recent jobs serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentJob {
    pub id: String,
    /// Last time the job was viewed.
    #[serde(with = "ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RecentJobs {
    path: PathBuf,
    entries: Mutex<Vec<RecentJob>>,
    max_entries: usize,
    persist_to_disk: bool,
}

impl RecentJobs {
    /// Opens the store at `path`, or at the default location when omitted.
    pub fn new<P: Into<Option<PathBuf>>>(path: P) -> Result<Self, RecentJobsError> {
        Self::with_limit(path, DEFAULT_RECENT_JOBS_LIMIT)
    }

    pub fn with_limit<P: Into<Option<PathBuf>>>(path: P, max_entries: usize) -> Result<Self, RecentJobsError> {
        let path = match path.into() {
            Some(path) => expand_tilde(&path.to_string_lossy()),
            None => default_recent_jobs_path(),
        };
        let mut entries = load_entries(&path)?;
        entries.truncate(max_entries);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            max_entries,
            persist_to_disk: true,
        })
    }

    pub fn with_defaults() -> Result<Self, RecentJobsError> {
        Self::new(None::<PathBuf>)
    }

    /// A store that never touches the filesystem.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            entries: Mutex::new(Vec::new()),
            max_entries: DEFAULT_RECENT_JOBS_LIMIT,
            persist_to_disk: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Vec<RecentJob> {
        self.lock().clone()
    }

    /// Moves `id` to the top with the current time. Blank ids are ignored and
    /// reported as `false`.
    pub fn push(&self, id: &str) -> Result<bool, RecentJobsError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(false);
        }

        let mut entries = self.lock();
        entries.retain(|entry| entry.id != id);
        entries.insert(
            0,
            RecentJob {
                id: id.to_string(),
                ts: Utc::now(),
            },
        );
        entries.truncate(self.max_entries);
        debug!(id, total = entries.len(), "recorded recent job");
        self.save_locked(&entries)?;
        Ok(true)
    }

    /// Returns whether an entry was removed.
    pub fn remove(&self, id: &str) -> Result<bool, RecentJobsError> {
        let id = id.trim();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.save_locked(&entries)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), RecentJobsError> {
        let mut entries = self.lock();
        entries.clear();
        if self.persist_to_disk {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecentJob>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self, entries: &[RecentJob]) -> Result<(), RecentJobsError> {
        if !self.persist_to_disk {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

pub fn default_recent_jobs_path() -> PathBuf {
    app_file_path(RECENT_JOBS_PATH_ENV, RECENT_JOBS_FILE_NAME)
}

fn load_entries(path: &Path) -> Result<Vec<RecentJob>, RecentJobsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(items)) => {
            let mut entries: Vec<RecentJob> = items.iter().filter_map(parse_entry).collect();
            entries.sort_by(|left, right| right.ts.cmp(&left.ts));
            Ok(entries)
        }
        Ok(_) => {
            warn!(path = %path.display(), "recent jobs file is not a list; starting empty");
            Ok(Vec::new())
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse recent jobs file; starting empty");
            Ok(Vec::new())
        }
    }
}

/// Reads one stored record leniently: ids may be numbers, and a missing or
/// invalid timestamp becomes "now".
fn parse_entry(item: &Value) -> Option<RecentJob> {
    let id = match item.get("id")? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if id.is_empty() {
        return None;
    }
    let ts = item
        .get("ts")
        .and_then(Value::as_f64)
        .filter(|millis| millis.is_finite())
        .and_then(|millis| DateTime::from_timestamp_millis(millis as i64))
        .unwrap_or_else(Utc::now);
    Some(RecentJob { id, ts })
}
