//! On-disk snapshots of remote pricing data.
//!
//! A snapshot is a timestamped local copy of one dataset, stored as a single
//! JSON file `{ "<dataset>": <payload>, "datetime": "<ISO-8601>" }`. This
//! module is pure data access; the staleness policy lives in [`crate::cache`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced when reading or writing snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot has ever been written for this dataset.
    #[error("no snapshot on disk for dataset '{0}'")]
    NotFound(String),
    /// The snapshot file exists but cannot be read or parsed.
    ///
    /// Corrupt snapshots are surfaced, never silently discarded.
    #[error("corrupt snapshot {path}: {reason}")]
    Corrupt {
        /// Path of the unreadable file.
        path: PathBuf,
        /// What went wrong while decoding it.
        reason: String,
    },
    /// Writing the snapshot file (or creating its directory) failed.
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        /// Path of the file being written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// A timestamped copy of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// The dataset payload.
    pub payload: T,
    /// When the payload was fetched from the remote API.
    pub fetched_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    /// Wrap a freshly fetched payload with the current time.
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
        }
    }

    /// Age of the snapshot relative to the current time.
    #[must_use]
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

/// Reads and writes dataset snapshots under a fixed local directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{dataset}_snapshot.json"))
    }

    /// Load the snapshot for `dataset`.
    ///
    /// # Errors
    ///
    /// `SnapshotError::NotFound` if no file exists for the dataset, or
    /// `SnapshotError::Corrupt` if the file cannot be parsed.
    pub fn load<T: DeserializeOwned>(&self, dataset: &str) -> Result<Snapshot<T>, SnapshotError> {
        let path = self.path(dataset);
        if !path.exists() {
            return Err(SnapshotError::NotFound(dataset.to_string()));
        }

        let raw = fs::read_to_string(&path).map_err(|e| corrupt(&path, &e.to_string()))?;
        let body: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| corrupt(&path, &e.to_string()))?;

        let fetched_at = body
            .get("datetime")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| corrupt(&path, "missing 'datetime' field"))?
            .parse::<DateTime<Utc>>()
            .map_err(|e| corrupt(&path, &format!("bad timestamp: {e}")))?;

        let payload = body
            .get(dataset)
            .ok_or_else(|| corrupt(&path, &format!("missing '{dataset}' field")))?;
        let payload: T = serde_json::from_value(payload.clone())
            .map_err(|e| corrupt(&path, &e.to_string()))?;

        Ok(Snapshot {
            payload,
            fetched_at,
        })
    }

    /// Persist the snapshot for `dataset`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// `SnapshotError::Write` on directory creation or file write failure.
    pub fn save<T: Serialize>(
        &self,
        dataset: &str,
        snapshot: &Snapshot<T>,
    ) -> Result<(), SnapshotError> {
        let path = self.path(dataset);
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Write {
            path: path.clone(),
            source,
        })?;

        let mut body = serde_json::Map::new();
        body.insert(
            dataset.to_string(),
            serde_json::to_value(&snapshot.payload).map_err(|e| SnapshotError::Write {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?,
        );
        body.insert(
            "datetime".to_string(),
            serde_json::Value::String(snapshot.fetched_at.to_rfc3339()),
        );

        let json = serde_json::Value::Object(body).to_string();
        fs::write(&path, json).map_err(|source| SnapshotError::Write { path, source })
    }
}

fn corrupt(path: &Path, reason: &str) -> SnapshotError {
    SnapshotError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn store() -> (SnapshotStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        (SnapshotStore::new(dir.path()), dir)
    }

    #[test]
    fn load_missing_dataset_is_not_found() {
        let (store, _dir) = store();
        let err = store
            .load::<BTreeMap<String, f64>>("conversions")
            .expect_err("must fail");
        assert!(matches!(err, SnapshotError::NotFound(ref d) if d == "conversions"));
    }

    #[test]
    fn save_then_load_roundtrips_payload_and_timestamp() {
        let (store, _dir) = store();
        let mut payload = BTreeMap::new();
        payload.insert("EUR".to_string(), 0.9_f64);
        let snapshot = Snapshot::now(payload.clone());

        store.save("conversions", &snapshot).expect("save");
        let loaded: Snapshot<BTreeMap<String, f64>> =
            store.load("conversions").expect("load");

        assert_eq!(loaded.payload, payload);
        // RFC 3339 keeps sub-second precision, so the timestamp survives.
        assert_eq!(loaded.fetched_at, snapshot.fetched_at);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = TempDir::new().expect("temp dir");
        let nested = dir.path().join("data").join("snapshots");
        let store = SnapshotStore::new(&nested);

        store
            .save("currencies", &Snapshot::now(BTreeMap::from([(
                "USD".to_string(),
                "United States Dollar".to_string(),
            )])))
            .expect("save");

        assert!(nested.join("currencies_snapshot.json").exists());
    }

    #[test]
    fn unparseable_file_is_corrupt_not_missing() {
        let (store, dir) = store();
        std::fs::write(dir.path().join("currencies_snapshot.json"), "not json")
            .expect("write");

        let err = store
            .load::<BTreeMap<String, String>>("currencies")
            .expect_err("must fail");
        assert!(matches!(err, SnapshotError::Corrupt { .. }));
    }

    #[test]
    fn missing_datetime_is_corrupt() {
        let (store, dir) = store();
        std::fs::write(
            dir.path().join("currencies_snapshot.json"),
            r#"{"currencies":{}}"#,
        )
        .expect("write");

        let err = store
            .load::<BTreeMap<String, String>>("currencies")
            .expect_err("must fail");
        assert!(matches!(err, SnapshotError::Corrupt { .. }));
    }

    #[test]
    fn corrupt_file_is_left_in_place() {
        let (store, dir) = store();
        let path = dir.path().join("conversions_snapshot.json");
        std::fs::write(&path, "{broken").expect("write");

        let _ = store.load::<BTreeMap<String, f64>>("conversions");
        assert!(path.exists(), "corrupt snapshots are never auto-deleted");
    }
}
