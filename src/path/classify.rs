//! Note / notebook classification.
//!
//! A directory is a notebook when every segment between the notes root and
//! the directory is allowed: no leading `.` or `_`, and no exact match with
//! the exclusion list. Matching is per segment, so a notebook called
//! `my assets` is fine while `assets` is not.

use std::path::{Component, Path};

use super::mapper::{COMPILED_EXT, LISTING_FILE, PathMapper};
use crate::core::NoteKind;

impl PathMapper {
    /// Whether a single directory name is excluded from the notebook tree.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        name.starts_with('.') || name.starts_with('_') || self.exclude.contains(name)
    }

    /// Whether the path lies inside the build tree or index storage.
    pub fn is_generated(&self, path: &Path) -> bool {
        path.starts_with(&self.build_root) || path.starts_with(&self.index_root)
    }

    /// Pure check: `dir` is the notes root or a non-excluded directory
    /// under it. Does not touch the filesystem, so it also answers for
    /// directories that were just deleted.
    pub fn is_notebook_path(&self, dir: &Path) -> bool {
        let Some(rel) = self.source_relative(dir) else {
            return false;
        };
        !self.is_generated(dir)
            && rel.components().all(|c| match c {
                Component::Normal(name) => !self.is_excluded_name(&name.to_string_lossy()),
                _ => false,
            })
    }

    /// `dir` is an existing directory and a notebook.
    pub fn is_valid_notebook(&self, dir: &Path) -> bool {
        dir.is_dir() && self.is_notebook_path(dir)
    }

    /// Kind of a note by extension, regardless of location.
    #[inline]
    pub fn note_kind(&self, path: &Path) -> Option<NoteKind> {
        NoteKind::from_path(path)
    }

    /// `path` has a note extension, does not claim the listing page's
    /// file name, and sits directly inside a notebook. Pure; usable for
    /// deleted paths.
    pub fn is_valid_note(&self, path: &Path) -> bool {
        let Some(kind) = self.note_kind(path) else {
            return false;
        };
        !claims_listing_name(path, kind)
            && path.parent().is_some_and(|dir| self.is_notebook_path(dir))
    }

    /// A valid note that gets a compiled artifact (markdown or HTML).
    pub fn is_compiled_note(&self, path: &Path) -> bool {
        self.is_valid_note(path) && self.note_kind(path).is_some_and(NoteKind::is_compiled)
    }

    /// A valid note whose extension is configured for indexing.
    pub fn is_indexable(&self, path: &Path) -> bool {
        self.is_valid_note(path)
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.indexed.contains(&e.to_ascii_lowercase()))
    }
}

/// `index.html` itself, or a compiled note that would be written over
/// its notebook's listing (`index.md`).
fn claims_listing_name(path: &Path, kind: NoteKind) -> bool {
    let artifact = if kind.is_compiled() {
        path.with_extension(COMPILED_EXT)
    } else {
        path.to_path_buf()
    };
    artifact
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(LISTING_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn mapper() -> PathMapper {
        PathMapper::new(Path::new("/n"), ".build", ".searchindex")
    }

    #[test]
    fn test_notebook_paths() {
        let m = mapper();
        assert!(m.is_notebook_path(Path::new("/n")));
        assert!(m.is_notebook_path(Path::new("/n/some_notebook")));
        assert!(m.is_notebook_path(Path::new("/n/some_notebook/nested book")));
        assert!(!m.is_notebook_path(Path::new("/n/.build")));
        assert!(!m.is_notebook_path(Path::new("/n/.searchindex/x")));
        assert!(!m.is_notebook_path(Path::new("/n/_resources")));
        assert!(!m.is_notebook_path(Path::new("/n/book/assets")));
        assert!(!m.is_notebook_path(Path::new("/n/book/.git/objects")));
        assert!(!m.is_notebook_path(Path::new("/elsewhere")));
    }

    #[test]
    fn test_exclusion_is_exact_segment() {
        let m = mapper();
        // Substrings of excluded names do not exclude
        assert!(m.is_notebook_path(Path::new("/n/my assets")));
        assert!(m.is_notebook_path(Path::new("/n/assets-2020")));
        assert!(m.is_notebook_path(Path::new("/n/git")));
    }

    #[test]
    fn test_valid_notes() {
        let m = mapper();
        assert!(m.is_valid_note(Path::new("/n/my note.md")));
        assert!(m.is_valid_note(Path::new("/n/book/page.html")));
        assert!(m.is_valid_note(Path::new("/n/book/paper.pdf")));
        assert!(m.is_valid_note(Path::new("/n/todo.txt")));
        assert!(!m.is_valid_note(Path::new("/n/index.html")));
        assert!(!m.is_valid_note(Path::new("/n/book/image.png")));
        assert!(!m.is_valid_note(Path::new("/n/assets/readme.md")));
        assert!(!m.is_valid_note(Path::new("/n/.build/a.html")));
        assert!(!m.is_valid_note(Path::new("/other/a.md")));
    }

    #[test]
    fn test_listing_name_reserved() {
        let m = mapper();
        assert!(!m.is_valid_note(Path::new("/n/book/index.md")));
        assert!(!m.is_valid_note(Path::new("/n/book/INDEX.html")));
        assert!(!m.is_compiled_note(Path::new("/n/index.md")));
        // Not compiled, so nothing collides with the listing
        assert!(m.is_valid_note(Path::new("/n/book/index.txt")));
        assert!(m.is_valid_note(Path::new("/n/book/index.pdf")));
        assert!(m.is_valid_note(Path::new("/n/book/indexes.md")));
    }

    #[test]
    fn test_compiled_and_indexable() {
        let mut m = mapper();
        assert!(m.is_compiled_note(Path::new("/n/a.md")));
        assert!(!m.is_compiled_note(Path::new("/n/a.pdf")));
        assert!(m.is_indexable(Path::new("/n/a.pdf")));

        m.indexed = ["md".to_string()].into_iter().collect();
        assert!(m.is_indexable(Path::new("/n/a.md")));
        assert!(!m.is_indexable(Path::new("/n/a.txt")));
    }

    #[test]
    fn test_valid_notebook_requires_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let root: PathBuf = temp.path().canonicalize().unwrap();
        std::fs::create_dir(root.join("book")).unwrap();
        let m = PathMapper::new(&root, ".build", ".searchindex");
        assert!(m.is_valid_notebook(&root.join("book")));
        assert!(!m.is_valid_notebook(&root.join("missing")));
    }
}
