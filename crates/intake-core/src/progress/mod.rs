//! Durable set of completed document identifiers.
//!
//! The set lives in a JSON array file, one per run instance. Every `record`
//! rewrites it through a temp file + fsync + rename, inside a single critical
//! section, so concurrent callers never lose each other's updates and a crash
//! leaves either the old or the new set on disk.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::PersistenceError;

/// Durable record of which documents have completed.
///
/// Once `record(id)` returns `Ok`, every later `load()` (including after a
/// restart) contains `id`. The set never shrinks.
pub trait ProgressStore: Send + Sync {
    fn load(&self) -> Result<BTreeSet<String>, PersistenceError>;
    fn record(&self, id: &str) -> Result<(), PersistenceError>;
}

/// Temp file used for the atomic replace: `progress_x.json` → `progress_x.json.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(".tmp");
    PathBuf::from(o)
}

/// JSON-array progress file.
#[derive(Debug)]
pub struct ProgressFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_set(&self) -> Result<BTreeSet<String>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(PersistenceError::io("read progress", &self.path, e)),
        };
        let ids: Vec<String> =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(ids.into_iter().collect())
    }

    fn write_set(&self, ids: &BTreeSet<String>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::io("create dir", parent, e))?;
        }
        let json = serde_json::to_vec(ids)?;
        let tmp = temp_path(&self.path);
        {
            let mut f =
                fs::File::create(&tmp).map_err(|e| PersistenceError::io("create", &tmp, e))?;
            f.write_all(&json)
                .map_err(|e| PersistenceError::io("write", &tmp, e))?;
            f.sync_all()
                .map_err(|e| PersistenceError::io("fsync", &tmp, e))?;
        }
        fs::rename(&tmp, &self.path)
            .map_err(|e| PersistenceError::io("rename", &self.path, e))?;
        sync_parent_dir(&self.path);
        Ok(())
    }
}

/// Best effort: make the rename itself durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}

impl ProgressStore for ProgressFile {
    fn load(&self) -> Result<BTreeSet<String>, PersistenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read_set()
    }

    fn record(&self, id: &str) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut ids = self.read_set()?;
        if !ids.insert(id.to_string()) {
            return Ok(());
        }
        self.write_set(&ids)?;
        tracing::debug!(doc = id, processed = ids.len(), "progress recorded");
        Ok(())
    }
}
