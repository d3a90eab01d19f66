//! `[notes]` section configuration.
//!
//! ```toml
//! [notes]
//! root = "~/notes"              # Notes root (relative to this file)
//! exclude = ["assets", ".git"]  # Directory names never treated as notebooks
//! ```
//!
//! Directories whose name starts with `.` or `_` are always excluded.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory names that are never notebooks: resource folders and
/// sync/VCS metadata.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "_resources",
    "assets",
    ".SyncArchive",
    ".SyncID",
    ".SyncIgnore",
    ".sync",
    ".DS_Store",
    ".swp",
    ".swo",
    ".stfolder",
    ".git",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesSectionConfig {
    /// Notes root. `None` means the directory holding the config file.
    pub root: Option<PathBuf>,

    /// Exact directory names excluded from the notebook tree.
    pub exclude: Vec<String>,
}

impl Default for NotesSectionConfig {
    fn default() -> Self {
        Self {
            root: None,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_notes_defaults() {
        let config = test_parse_config("");
        assert!(config.notes.root.is_none());
        assert!(config.notes.exclude.iter().any(|e| e == "_resources"));
        assert!(config.notes.exclude.iter().any(|e| e == ".git"));
    }

    #[test]
    fn test_notes_custom_exclude() {
        let config = test_parse_config("[notes]\nroot = \"~/notes\"\nexclude = [\"archive\"]");
        assert_eq!(config.notes.exclude, vec!["archive".to_string()]);
        assert_eq!(
            config.notes.root.as_deref(),
            Some(std::path::Path::new("~/notes"))
        );
    }
}
