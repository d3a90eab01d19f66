//! Filesystem change events, already paired and classified.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::path::normalize_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created { path: PathBuf, is_dir: bool },
    Modified { path: PathBuf, is_dir: bool },
    Deleted { path: PathBuf, is_dir: bool },
    Moved { from: PathBuf, to: PathBuf, is_dir: bool },
}

impl FsEvent {
    pub fn is_dir(&self) -> bool {
        match self {
            Self::Created { is_dir, .. }
            | Self::Modified { is_dir, .. }
            | Self::Deleted { is_dir, .. }
            | Self::Moved { is_dir, .. } => *is_dir,
        }
    }

    /// The path the event is about (the destination for moves).
    pub fn path(&self) -> &Path {
        match self {
            Self::Created { path, .. } | Self::Modified { path, .. } | Self::Deleted { path, .. } => {
                path
            }
            Self::Moved { to, .. } => to,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Modified { .. } => "modified",
            Self::Deleted { .. } => "deleted",
            Self::Moved { .. } => "moved",
        }
    }

    /// Same event with every path in absolute, symlink-resolved form.
    pub fn normalized(self) -> Self {
        match self {
            Self::Created { path, is_dir } => Self::Created {
                path: normalize_path(&path),
                is_dir,
            },
            Self::Modified { path, is_dir } => Self::Modified {
                path: normalize_path(&path),
                is_dir,
            },
            Self::Deleted { path, is_dir } => Self::Deleted {
                path: normalize_path(&path),
                is_dir,
            },
            Self::Moved { from, to, is_dir } => Self::Moved {
                from: normalize_path(&from),
                to: normalize_path(&to),
                is_dir,
            },
        }
    }
}

impl fmt::Display for FsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moved { from, to, .. } => {
                write!(f, "moved {} -> {}", from.display(), to.display())
            }
            _ => write!(f, "{} {}", self.label(), self.path().display()),
        }
    }
}
