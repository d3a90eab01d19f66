//! Full-text search index over the notes tree.
//!
//! One document per indexable note, keyed by the note's absolute path.
//! Every mutation is a single commit, so a reader sees a document either
//! fully old or fully new.

mod extract;
mod snippet;
mod store;

pub use extract::DefaultExtractor;
pub use store::TantivyIndex;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncReport, SyncResult};

/// A stored index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDocument {
    pub path: PathBuf,
    pub title: String,
    /// Modification time in nanoseconds since the Unix epoch
    pub last_mod: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub path: PathBuf,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

/// Outcome of a bulk index pass.
#[derive(Debug, Default)]
pub struct ReconcileStats {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Notes left out of the batch because their text could not be extracted
    pub failures: Vec<SyncError>,
}

impl ReconcileStats {
    pub fn changed(&self) -> usize {
        self.added + self.updated + self.removed
    }
}

impl From<ReconcileStats> for SyncReport {
    fn from(stats: ReconcileStats) -> Self {
        Self {
            indexed: stats.added + stats.updated,
            removed: stats.removed,
            failures: stats.failures,
            ..Default::default()
        }
    }
}

/// The search index as seen by the sync engine.
pub trait NoteIndex: Send + Sync {
    /// Discard everything and index every note from scratch.
    fn reset_all(&self) -> SyncResult<ReconcileStats>;

    /// Bring the index in line with the notes tree using modification times.
    fn reconcile(&self) -> SyncResult<ReconcileStats>;

    /// Insert or replace the document for `path`.
    fn add_note(&self, path: &Path) -> SyncResult<()>;

    /// Replace the document for `path`.
    fn update_note(&self, path: &Path) -> SyncResult<()>;

    fn delete_note(&self, path: &Path) -> SyncResult<()>;

    /// Drop `from` and index `to` in one commit.
    fn move_note(&self, from: &Path, to: &Path) -> SyncResult<()>;

    /// Drop every document at or under `dir`. Returns how many were dropped.
    fn delete_under(&self, dir: &Path) -> SyncResult<usize>;

    fn lookup(&self, path: &Path) -> SyncResult<Option<IndexDocument>>;

    fn search(&self, query: &str, limit: usize) -> SyncResult<Vec<SearchHit>>;

    /// Number of stored documents.
    fn len(&self) -> SyncResult<u64>;

    fn is_empty(&self) -> SyncResult<bool> {
        Ok(self.len()? == 0)
    }
}
