//! Timestamped catalog snapshots.
//!
//! Each run writes `scrape-YYYY-MM-DD_HH-MM-SS.json` (local time). The
//! newest snapshot is the one whose *name* carries the latest timestamp;
//! file system times only order files whose names do not parse.

use chrono::{Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::error::{PersistenceError, PersistenceResult};
use crate::types::catalog::{catalog_from_value, catalog_to_value, Book};

const PREFIX: &str = "scrape-";
const EXTENSION: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MAX_COLLISIONS: u32 = 1000;

/// Directory of snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `books` stamped with the current local time.
    pub fn save(&self, books: &[Book]) -> PersistenceResult<PathBuf> {
        self.save_at(books, Local::now().naive_local())
    }

    /// Write `books` stamped with `at`. Never overwrites an existing file:
    /// a same-second collision gets a `-1`, `-2`, ... suffix.
    pub fn save_at(&self, books: &[Book], at: NaiveDateTime) -> PersistenceResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;
        let stamp = at.format(TIMESTAMP_FORMAT).to_string();
        let body = serde_json::to_string_pretty(&catalog_to_value(books))
            .map_err(|e| PersistenceError::json(&self.dir, e))?;

        for attempt in 0..MAX_COLLISIONS {
            let name = match attempt {
                0 => format!("{}{}{}", PREFIX, stamp, EXTENSION),
                n => format!("{}{}-{}{}", PREFIX, stamp, n, EXTENSION),
            };
            let path = self.dir.join(name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(PersistenceError::io(&path, e)),
            };
            file.write_all(body.as_bytes())
                .map_err(|e| PersistenceError::io(&path, e))?;

            debug!(path = %path.display(), books = books.len(), "Wrote snapshot");
            return Ok(path);
        }
        Err(PersistenceError::io(
            self.dir.join(format!("{}{}{}", PREFIX, stamp, EXTENSION)),
            std::io::Error::new(ErrorKind::AlreadyExists, "too many snapshots within one second"),
        ))
    }

    /// The most recent snapshot, or `None` when there is none.
    pub fn load_latest(&self) -> PersistenceResult<Option<Vec<Book>>> {
        let Some(path) = self.latest_path()? else {
            return Ok(None);
        };
        self.load(&path).map(Some)
    }

    /// Read one snapshot file, tagged or legacy.
    pub fn load(&self, path: &Path) -> PersistenceResult<Vec<Book>> {
        let raw = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
        let value = serde_json::from_str(&raw).map_err(|e| PersistenceError::json(path, e))?;
        catalog_from_value(value).map_err(|e| PersistenceError::InvalidRecord {
            path: path.to_path_buf(),
            key: "snapshot".to_string(),
            reason: e.to_string(),
        })
    }

    /// Path of the most recent snapshot file.
    pub fn latest_path(&self) -> PersistenceResult<Option<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(&self.dir, e)),
        };

        let mut best: Option<(SnapshotOrder, PathBuf)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| PersistenceError::io(&self.dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(PREFIX) || !name.ends_with(EXTENSION) {
                continue;
            }

            let order = match parse_snapshot_name(&name) {
                Some((stamp, suffix)) => SnapshotOrder::Named(stamp, suffix),
                None => {
                    warn!(file = %name, "Snapshot name has no readable timestamp");
                    SnapshotOrder::Unnamed(file_time(&entry.path()))
                }
            };

            if best.as_ref().map_or(true, |(current, _)| order > *current) {
                best = Some((order, entry.path()));
            }
        }

        Ok(best.map(|(_, path)| path))
    }
}

/// Sort key for snapshot files. Any parseable name sorts after every
/// unparseable one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SnapshotOrder {
    Unnamed(Option<SystemTime>),
    Named(NaiveDateTime, u32),
}

/// Timestamp and collision suffix from `scrape-<stamp>[-N].json`.
pub fn parse_snapshot_name(name: &str) -> Option<(NaiveDateTime, u32)> {
    let stem = name.strip_prefix(PREFIX)?.strip_suffix(EXTENSION)?;
    // The stamp itself contains dashes; it has a fixed width.
    let stamp_len = "YYYY-MM-DD_HH-MM-SS".len();
    let stamp = stem.get(..stamp_len)?;
    let at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

    match &stem[stamp_len..] {
        "" => Some((at, 0)),
        rest => rest.strip_prefix('-')?.parse().ok().map(|n| (at, n)),
    }
}

fn file_time(path: &Path) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    meta.created().or_else(|_| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_parse_snapshot_name() {
        assert_eq!(
            parse_snapshot_name("scrape-2024-03-09_14-05-00.json"),
            Some((at(14, 5, 0), 0))
        );
        assert_eq!(
            parse_snapshot_name("scrape-2024-03-09_14-05-00-2.json"),
            Some((at(14, 5, 0), 2))
        );
        assert_eq!(parse_snapshot_name("scrape-latest.json"), None);
        assert_eq!(parse_snapshot_name("scrape-2024-03-09_14-05-00-x.json"), None);
        assert_eq!(parse_snapshot_name("record_prices.json"), None);
    }

    #[test]
    fn test_same_second_saves_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let first = store.save_at(&[], at(9, 0, 0)).unwrap();
        let second = store.save_at(&[], at(9, 0, 0)).unwrap();
        let third = store.save_at(&[], at(9, 0, 0)).unwrap();

        assert!(first.ends_with("scrape-2024-03-09_09-00-00.json"));
        assert!(second.ends_with("scrape-2024-03-09_09-00-00-1.json"));
        assert!(third.ends_with("scrape-2024-03-09_09-00-00-2.json"));
        assert_eq!(store.latest_path().unwrap(), Some(third));
    }

    #[test]
    fn test_named_beats_unnamed() {
        let unnamed = SnapshotOrder::Unnamed(Some(SystemTime::now()));
        assert!(SnapshotOrder::Named(at(0, 0, 0), 0) > unnamed);
        assert!(SnapshotOrder::Named(at(1, 0, 0), 0) > SnapshotOrder::Named(at(0, 59, 59), 7));
    }
}
