//! Errors raised by the sync engine.
//!
//! Every variant is scoped to a single path or a single index batch. None of
//! them is fatal to the process; callers collect them into a [`SyncReport`]
//! and carry on with sibling work.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used by build, index and sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Source note could not be read.
    #[error("cannot read `{}`: {source}", path.display())]
    ContentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Build artifact or index directory could not be written.
    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plain text could not be extracted for indexing.
    #[error("cannot extract text from `{}`: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    /// The index store rejected a batch, even after one retry.
    #[error("index commit failed: {0}")]
    IndexCommit(#[source] tantivy::TantivyError),

    /// Any other index failure (open, read, search).
    #[error("index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// Search query could not be parsed.
    #[error("invalid query: {0}")]
    Query(#[from] tantivy::query::QueryParserError),

    /// A directory could not be enumerated.
    #[error("cannot walk `{}`: {reason}", path.display())]
    Walk { path: PathBuf, reason: String },
}

impl SyncError {
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::ContentRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn extraction(path: &Path, reason: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Path the error is scoped to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ContentRead { path, .. }
            | Self::Write { path, .. }
            | Self::Extraction { path, .. }
            | Self::Walk { path, .. } => Some(path),
            Self::IndexCommit(_) | Self::Index(_) | Self::Query(_) => None,
        }
    }
}

// ============================================================================
// SyncReport
// ============================================================================

/// Outcome of a multi-leaf operation: what succeeded and what failed.
///
/// A failed leaf never stops its siblings; its error lands here.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Notes and listings written to the build tree
    pub compiled: usize,
    /// Documents added or replaced in the index
    pub indexed: usize,
    /// Artifacts or documents removed
    pub removed: usize,
    pub failures: Vec<SyncError>,
}

impl SyncReport {
    /// Keep the value of a successful leaf, or record its failure.
    pub fn record<T>(&mut self, result: SyncResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.failures.push(e);
                None
            }
        }
    }

    pub fn fail(&mut self, error: SyncError) {
        self.failures.push(error);
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.compiled += other.compiled;
        self.indexed += other.indexed;
        self.removed += other.removed;
        self.failures.extend(other.failures);
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether anything in either view changed.
    pub fn touched(&self) -> bool {
        self.compiled + self.indexed + self.removed > 0
    }

    /// Log every failure under `module`.
    pub fn log_failures(&self, module: &str) {
        for failure in &self.failures {
            crate::log!(module; "{}", failure);
        }
    }

    /// One-line multi-error detail for the watch status block.
    pub fn failure_detail(&self) -> String {
        self.failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = SyncError::read(
            Path::new("/notes/a.md"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/notes/a.md"));
        assert!(msg.contains("gone"));
        assert_eq!(err.path(), Some(Path::new("/notes/a.md")));
    }

    #[test]
    fn test_report_record_and_merge() {
        let mut report = SyncReport::default();
        assert_eq!(report.record(Ok::<_, SyncError>(3)), Some(3));
        assert_eq!(
            report.record::<()>(Err(SyncError::extraction(Path::new("/n/x.pdf"), "bad"))),
            None
        );
        report.compiled = 2;

        let mut other = SyncReport::default();
        other.indexed = 1;
        other.fail(SyncError::extraction(Path::new("/n/y.pdf"), "bad"));
        report.merge(other);

        assert_eq!(report.compiled, 2);
        assert_eq!(report.indexed, 1);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_ok());
        assert!(report.touched());
        assert_eq!(report.failure_detail().lines().count(), 2);
    }

    #[test]
    fn test_extraction_reason() {
        let err = SyncError::extraction(Path::new("/notes/x.pdf"), "pdftotext not found");
        assert!(err.to_string().contains("pdftotext not found"));
    }
}
