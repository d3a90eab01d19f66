//! Note discovery over the live tree.

use jwalk::WalkDir;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::mapper::PathMapper;

/// Every file under `dir` that passes `keep`, skipping excluded and
/// generated directories without descending into them.
///
/// Unreadable entries are skipped.
pub fn walk_files<F>(mapper: &PathMapper, dir: &Path, keep: F) -> Vec<PathBuf>
where
    F: Fn(&PathMapper, &Path) -> bool,
{
    let pruner = Arc::new(mapper.clone());
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .skip_hidden(false)
        .process_read_dir(move |depth, _, _, children| {
            // The walk root itself is reported once with no depth
            if depth.is_none() {
                return;
            }
            children.retain(|entry| match entry {
                Ok(e) if e.file_type().is_dir() => {
                    let path = e.path();
                    !pruner.is_generated(&path)
                        && !pruner.is_excluded_name(&e.file_name().to_string_lossy())
                }
                _ => true,
            });
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| keep(mapper, p))
        .collect();
    files.sort();
    files
}

/// Indexable notes under `dir`.
pub fn indexable_notes(mapper: &PathMapper, dir: &Path) -> Vec<PathBuf> {
    walk_files(mapper, dir, PathMapper::is_indexable)
}

/// Notes under `dir` that get a compiled artifact.
pub fn compiled_notes(mapper: &PathMapper, dir: &Path) -> Vec<PathBuf> {
    walk_files(mapper, dir, PathMapper::is_compiled_note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathMapper) {
        setup_in("")
    }

    fn setup_in(root_name: &str) -> (TempDir, PathMapper) {
        let dir = TempDir::new().unwrap();
        let mut root = dir.path().canonicalize().unwrap();
        if !root_name.is_empty() {
            root.push(root_name);
        }
        let mapper = PathMapper::new(&root, ".build", ".searchindex");
        for (path, body) in [
            ("a.md", "a"),
            ("book/b.html", "<p>b</p>"),
            ("book/c.txt", "c"),
            ("book/image.png", ""),
            ("assets/d.md", "d"),
            ("_drafts/e.md", "e"),
            (".build/a.html", ""),
            ("index.html", ""),
        ] {
            let p = root.join(path);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, body).unwrap();
        }
        (dir, mapper)
    }

    #[test]
    fn test_indexable_notes() {
        let (_dir, mapper) = setup();
        let root = mapper.root().to_path_buf();
        let found = indexable_notes(&mapper, &root);
        assert_eq!(
            found,
            vec![root.join("a.md"), root.join("book/b.html"), root.join("book/c.txt")]
        );
    }

    #[test]
    fn test_compiled_notes_skip_text() {
        let (_dir, mapper) = setup();
        let root = mapper.root().to_path_buf();
        let found = compiled_notes(&mapper, &root.join("book"));
        assert_eq!(found, vec![root.join("book/b.html")]);
    }

    #[test]
    fn test_root_with_hidden_name() {
        for name in [".notes", "_notes"] {
            let (_dir, mapper) = setup_in(name);
            let root = mapper.root().to_path_buf();
            let found = indexable_notes(&mapper, &root);
            assert_eq!(found.len(), 3, "root {name}");
            assert_eq!(compiled_notes(&mapper, &root).len(), 2, "root {name}");
        }
    }
}
