//! Mapping between the notes tree and its compiled mirror.

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

use super::fs::{clean_path, encode_segment, with_trailing_separator};
use crate::config::NotesConfig;
use crate::config::section::DEFAULT_EXCLUDES;

/// File name of a notebook's listing page.
pub const LISTING_FILE: &str = "index.html";

/// Extension of every compiled note.
pub const COMPILED_EXT: &str = "html";

/// Label of the root breadcrumb.
pub const ROOT_LABEL: &str = "notes";

/// One breadcrumb: a label and, for every crumb but the current page, a
/// link to that ancestor's listing relative to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub href: Option<String>,
}

/// Pure path arithmetic over the notes root, build root and index root.
///
/// Classification predicates live in `classify.rs`.
#[derive(Debug, Clone)]
pub struct PathMapper {
    pub(super) root: PathBuf,
    pub(super) build_root: PathBuf,
    pub(super) index_root: PathBuf,
    pub(super) exclude: FxHashSet<String>,
    pub(super) indexed: FxHashSet<String>,
}

impl PathMapper {
    /// Mapper with the default exclusion list and indexed extensions.
    pub fn new(root: &Path, build_dir: &str, index_dir: &str) -> Self {
        let root = clean_path(root);
        Self {
            build_root: root.join(build_dir),
            index_root: root.join(index_dir),
            root,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
            indexed: ["md", "html", "txt", "pdf"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    pub fn from_config(config: &NotesConfig) -> Self {
        let mut mapper = Self::new(config.root(), &config.build.dir, &config.index.dir);
        mapper.exclude = config.notes.exclude.iter().cloned().collect();
        mapper.indexed = config.index.extensions.iter().cloned().collect();
        mapper
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    /// Path relative to the notes root, if it lies under it.
    pub fn source_relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok()
    }

    /// Rebase a source path onto the build root.
    ///
    /// Paths already inside the build root are returned as they are; `.`,
    /// `..` and repeated separators are collapsed.
    pub fn to_build_path(&self, source: &Path) -> PathBuf {
        let clean = clean_path(source);
        if clean.starts_with(&self.build_root) {
            return clean;
        }
        match clean.strip_prefix(&self.root) {
            Ok(rel) => self.build_root.join(rel),
            Err(_) => clean,
        }
    }

    /// Directory form of [`to_build_path`](Self::to_build_path), ending in
    /// exactly one separator.
    pub fn to_build_dir_string(&self, source_dir: &Path) -> String {
        with_trailing_separator(&self.to_build_path(source_dir))
    }

    /// Source directory mirrored by a build directory.
    pub fn source_for_build(&self, build: &Path) -> Option<PathBuf> {
        let clean = clean_path(build);
        let rel = clean.strip_prefix(&self.build_root).ok()?;
        if rel.as_os_str().is_empty() {
            return Some(self.root.clone());
        }
        Some(self.root.join(rel))
    }

    /// Compiled artifact path for a note, plus the note's original extension.
    pub fn compiled_file_for(&self, note: &Path) -> (PathBuf, Option<String>) {
        let build = self.to_build_path(note);
        let ext = build
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        (build.with_extension(COMPILED_EXT), ext)
    }

    /// Listing page path for a notebook directory.
    pub fn listing_file_for(&self, dir: &Path) -> PathBuf {
        self.to_build_path(dir).join(LISTING_FILE)
    }

    /// Breadcrumbs for a build path.
    ///
    /// `is_dir` marks a notebook directory (rendered as its listing page);
    /// otherwise the path is a compiled note and its extension is stripped
    /// from the last crumb.
    pub fn breadcrumbs(&self, build_path: &Path, is_dir: bool) -> Vec<Crumb> {
        let rel = build_path.strip_prefix(&self.build_root).unwrap_or(Path::new(""));
        let mut labels: Vec<String> = std::iter::once(ROOT_LABEL.to_string())
            .chain(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned()),
            )
            .collect();

        if !is_dir
            && labels.len() > 1
            && let Some(last) = labels.last_mut()
            && let Some(stem) = Path::new(last.as_str()).file_stem()
        {
            *last = stem.to_string_lossy().into_owned();
        }

        // Depth of the directory the page lives in, below the build root.
        let page_depth = if is_dir {
            labels.len() - 1
        } else {
            labels.len().saturating_sub(2)
        };
        let last = labels.len() - 1;

        labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Crumb {
                href: (i != last)
                    .then(|| format!("{}{LISTING_FILE}", "../".repeat(page_depth.saturating_sub(i)))),
                label,
            })
            .collect()
    }

    /// Relative prefix that leads from a note's compiled artifact back to
    /// the note's source directory.
    ///
    /// The artifact sits `1 + dir_depth` levels below the notes root (the
    /// build dir itself plus the note's directory), so that many `../`
    /// climb out of the build tree before the source directory is appended.
    pub fn link_base(&self, source: &Path) -> String {
        let rel_dir = self
            .source_relative(source)
            .and_then(Path::parent)
            .unwrap_or(Path::new(""));
        let segments: Vec<String> = rel_dir
            .components()
            .map(|c| encode_segment(&c.as_os_str().to_string_lossy()))
            .collect();

        let mut base = "../".repeat(1 + segments.len());
        for segment in segments {
            base.push_str(&segment);
            base.push('/');
        }
        base
    }
}
