//! Notebook listings: the immediate children of one notebook directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::path::{COMPILED_EXT, PathMapper};

/// A compiled note as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedNote {
    pub title: String,
    /// Compiled file name, relative to the listing page
    pub file: String,
}

impl ListedNote {
    pub fn for_note(note: &Path) -> Self {
        let title = note
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file: format!("{title}.{COMPILED_EXT}"),
            title,
        }
    }
}

/// Child notebooks and compiled notes of a notebook, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub notebooks: Vec<String>,
    pub notes: Vec<ListedNote>,
}

/// Immediate children of a notebook directory as source paths.
#[derive(Debug, Default)]
pub struct Children {
    pub notebooks: Vec<PathBuf>,
    pub notes: Vec<PathBuf>,
}

impl Children {
    /// Valid child notebooks and compiled notes of `dir`, sorted by path.
    pub fn read(mapper: &PathMapper, dir: &Path) -> SyncResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| SyncError::Walk {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut children = Self::default();
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.is_dir() {
                if mapper.is_notebook_path(&path) {
                    children.notebooks.push(path);
                }
            } else if mapper.is_compiled_note(&path) {
                children.notes.push(path);
            }
        }
        children.notebooks.sort();
        children.notes.sort();
        Ok(children)
    }

    pub fn listing(&self) -> Listing {
        Listing {
            notebooks: self
                .notebooks
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
            notes: self.notes.iter().map(|p| ListedNote::for_note(p)).collect(),
        }
    }
}
