//! JSON-backed price ledger.

use fs4::fs_std::FileExt;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PersistenceError, PersistenceResult};
use crate::ledger::{merge_with_changes, PriceChange, PriceLedger, PriceRange};
use crate::types::catalog::Book;

/// Ledger persisted as a pretty-printed JSON object of `isbn -> [min, max]`.
///
/// Updates are serialized across processes by an exclusive lock on a
/// sidecar `<ledger>.lock` file and land through an atomic rename, so a
/// reader never sees a half-written ledger.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Read the whole ledger. A missing file is an empty ledger.
    pub fn load(&self) -> PersistenceResult<PriceLedger> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PriceLedger::new()),
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };

        let object: serde_json::Map<String, Value> =
            serde_json::from_str(&raw).map_err(|e| PersistenceError::json(&self.path, e))?;

        object
            .into_iter()
            .map(|(key, value)| {
                let range = self.parse_range(&key, value)?;
                Ok((key, range))
            })
            .collect()
    }

    /// Replace the ledger on disk with `ledger`.
    pub fn save(&self, ledger: &PriceLedger) -> PersistenceResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;

        let body = serde_json::to_string_pretty(ledger)
            .map_err(|e| PersistenceError::json(&self.path, e))?;

        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| PersistenceError::io(dir, e))?;
        temp.write_all(body.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| PersistenceError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| PersistenceError::io(&self.path, e.error))?;

        debug!(path = %self.path.display(), entries = ledger.len(), "Wrote price ledger");
        Ok(())
    }

    /// Load, merge `catalog`, and save while holding the ledger lock.
    pub fn update(&self, catalog: &[Book]) -> PersistenceResult<(PriceLedger, Vec<PriceChange>)> {
        let _guard = self.lock()?;
        let current = self.load()?;
        let (updated, changes) = merge_with_changes(&current, catalog);
        self.save(&updated)?;
        Ok((updated, changes))
    }

    /// Block until the exclusive ledger lock is held; released on drop.
    fn lock(&self) -> PersistenceResult<File> {
        let lock_path = self.lock_path();
        if let Some(dir) = lock_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| PersistenceError::io(&lock_path, e))?;
        FileExt::lock_exclusive(&file).map_err(|source| PersistenceError::Lock {
            path: lock_path.clone(),
            source,
        })?;
        Ok(file)
    }

    fn parse_range(&self, key: &str, value: Value) -> PersistenceResult<PriceRange> {
        let invalid = |reason: String| PersistenceError::InvalidRecord {
            path: self.path.clone(),
            key: key.to_string(),
            reason,
        };

        let pair = match value {
            Value::Array(pair) if pair.len() == 2 => pair,
            other => return Err(invalid(format!("expected [min, max], found {}", other))),
        };
        let (Some(min), Some(max)) = (pair[0].as_f64(), pair[1].as_f64()) else {
            return Err(invalid(format!("non-numeric bounds {:?}", pair)));
        };
        PriceRange::new(min, max).ok_or_else(|| invalid(format!("min {} exceeds max {}", min, max)))
    }
}
