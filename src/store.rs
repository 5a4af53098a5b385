//! Snapshot persistence.
//!
//! One JSON file per date, named `<source>_<YYYY-MM-DD>_<stage>.json`. Only
//! the `cleaned` stage takes part in a series.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Snapshot;

static SNAPSHOT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<source>.+)_(?P<date>[^_]+)_cleaned\.json$").unwrap());

/// Result type for snapshot storage
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while reading or writing snapshots
#[derive(Debug, Error)]
pub enum StoreError {
    /// No snapshot file exists for a requested date
    #[error("snapshot not found for date {date}")]
    SnapshotNotFound { date: NaiveDate },

    /// Reading or writing a snapshot file failed
    #[error("failed to access snapshot '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A snapshot file is not valid snapshot JSON
    #[error("failed to parse snapshot '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Pipeline stage a snapshot file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Written progressively while detail pages are scraped
    Updated,
    /// Final form, placeholder suites removed
    Cleaned,
}

impl Stage {
    fn suffix(self) -> &'static str {
        match self {
            Stage::Updated => "updated",
            Stage::Cleaned => "cleaned",
        }
    }
}

/// Snapshots in strictly increasing date order
#[derive(Debug, Clone, Default)]
pub struct SnapshotSeries {
    snapshots: Vec<Snapshot>,
}

impl SnapshotSeries {
    /// Order snapshots by date; of several sharing a date, the first given is kept
    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        let mut by_date = BTreeMap::new();
        for snapshot in snapshots {
            if by_date.contains_key(&snapshot.date) {
                warn!("Duplicate snapshot for {}, keeping the first", snapshot.date);
                continue;
            }
            by_date.insert(snapshot.date, snapshot);
        }
        Self {
            snapshots: by_date.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.snapshots.iter().map(|s| s.date).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Adjacent `(prev, curr)` pairs in ascending date order
    pub fn pairs(&self) -> impl Iterator<Item = (&Snapshot, &Snapshot)> {
        self.snapshots.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// Snapshot files of one source inside a data directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    source: String,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            source: source.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self, date: NaiveDate, stage: Stage) -> String {
        format!("{}_{}_{}.json", self.source, date.format("%Y-%m-%d"), stage.suffix())
    }

    pub fn path_for(&self, date: NaiveDate, stage: Stage) -> PathBuf {
        self.dir.join(self.file_name(date, stage))
    }

    /// Write a snapshot to its dated file, returning the path written
    pub fn save(&self, snapshot: &Snapshot, stage: Stage) -> Result<PathBuf> {
        let path = self.path_for(snapshot.date, stage);
        let json = to_json(snapshot)?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Saved snapshot to {}", path.display());
        Ok(path)
    }

    /// Load the cleaned snapshot for one date
    pub fn load_date(&self, date: NaiveDate) -> Result<Snapshot> {
        let path = self.path_for(date, Stage::Cleaned);
        read_snapshot(&path).map_err(|err| match err {
            StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                StoreError::SnapshotNotFound { date }
            }
            other => other,
        })
    }

    /// Load every cleaned snapshot in the data directory
    pub fn load_series(&self) -> Result<SnapshotSeries> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        self.series_from_names(names)
    }

    /// Build a series from candidate file names inside the data directory.
    ///
    /// Names outside the naming convention are ignored; names whose date does
    /// not parse are logged and skipped.
    pub fn series_from_names<I, S>(&self, names: I) -> Result<SnapshotSeries>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dated: BTreeMap<NaiveDate, String> = BTreeMap::new();
        let mut names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        names.sort();

        for name in names {
            let Some(date) = self.snapshot_date(&name) else {
                continue;
            };
            if let Some(existing) = dated.get(&date) {
                warn!("Duplicate snapshot date {} in {}, keeping {}", date, name, existing);
                continue;
            }
            dated.insert(date, name);
        }

        let mut snapshots = Vec::with_capacity(dated.len());
        for (date, name) in dated {
            let snapshot = read_snapshot(&self.dir.join(&name)).map_err(|err| match err {
                StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                    StoreError::SnapshotNotFound { date }
                }
                other => other,
            })?;
            if snapshot.date != date {
                warn!("{} records date {}, ordering by file name", name, snapshot.date);
            }
            snapshots.push(Snapshot { date, ..snapshot });
        }

        info!("Loaded {} snapshots from {}", snapshots.len(), self.dir.display());
        Ok(SnapshotSeries { snapshots })
    }

    /// Date embedded in a cleaned snapshot file name of this source
    pub fn snapshot_date(&self, name: &str) -> Option<NaiveDate> {
        let captures = SNAPSHOT_NAME.captures(name)?;
        if &captures["source"] != self.source {
            return None;
        }
        match NaiveDate::parse_from_str(&captures["date"], "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!("Invalid date in file: {}", name);
                None
            }
        }
    }
}

/// Serialize a snapshot in its persisted form (JSON, 4-space indent)
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn from_json(json: &str) -> serde_json::Result<Snapshot> {
    serde_json::from_str(json)
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_json(&json).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })
}
