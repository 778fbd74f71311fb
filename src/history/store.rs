//! Bounded snapshot store backed by a JSON file.

use super::models::{HistoryDocument, HistoryDocumentRef, Snapshot};

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// History file error types.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("history file I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed history file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only snapshot history with FIFO eviction.
///
/// Index 0 is the oldest retained snapshot; entries are never reordered.
#[derive(Debug)]
pub struct ReportHistory {
    path: PathBuf,
    bound: usize,
    snapshots: VecDeque<Snapshot>,
}

impl ReportHistory {
    /// Create an empty history persisted at `path`, holding at most `bound` snapshots.
    pub fn new<P: AsRef<Path>>(path: P, bound: usize) -> Self {
        let bound = bound.max(1);
        Self {
            path: path.as_ref().to_path_buf(),
            bound,
            snapshots: VecDeque::new(),
        }
    }

    /// Load the history at `path`.
    ///
    /// A missing or unreadable file yields an empty history. If the file holds
    /// more than `bound` snapshots only the newest are kept.
    pub fn load<P: AsRef<Path>>(path: P, bound: usize) -> Self {
        let mut history = Self::new(path, bound);

        match read_snapshots(&history.path) {
            Ok(snapshots) => {
                tracing::info!(
                    "Loaded {} existing reports from {}",
                    snapshots.len(),
                    history.path.display()
                );
                for snapshot in snapshots {
                    history.append(snapshot);
                }
            }
            Err(PersistenceError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No existing {} found, starting fresh", history.path.display());
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load {}: {}. Starting fresh",
                    history.path.display(),
                    e
                );
            }
        }

        history
    }

    /// Push a snapshot, evicting from the front until the bound holds.
    pub fn append(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.bound {
            self.snapshots.pop_front();
        }
    }

    /// Replace the backing file with the current history.
    ///
    /// The document is encoded in place; the file write runs on the blocking pool.
    pub async fn persist(&self) -> Result<(), PersistenceError> {
        let bytes = self.encode()?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| PersistenceError::Io(io::Error::other(e)))?
    }

    /// Serialize the history as the `{"reports": [...]}` document.
    fn encode(&self) -> Result<Vec<u8>, PersistenceError> {
        let doc = HistoryDocumentRef {
            reports: &self.snapshots,
        };
        Ok(serde_json::to_vec(&doc)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    /// Snapshots, oldest first.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }
}

impl<'a> IntoIterator for &'a ReportHistory {
    type Item = &'a Snapshot;
    type IntoIter = std::collections::vec_deque::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// The temporary is renamed over the target, so readers see either the old
/// or the new file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Read the snapshots stored at `path`, oldest first.
pub fn read_snapshots(path: &Path) -> Result<Vec<Snapshot>, PersistenceError> {
    let data = std::fs::read(path)?;
    let doc: HistoryDocument = serde_json::from_slice(&data)?;
    Ok(doc.reports)
}
