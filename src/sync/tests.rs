//! Event scenarios against a real notes tree in a temp dir.

use super::*;
use crate::build::{BuildTree, MarkdownOptions, Templates};
use crate::config::section::MarkdownConfig;
use crate::index::{DefaultExtractor, NoteIndex, TantivyIndex};
use crate::link::Relocation;
use crate::path::PathMapper;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

struct CountingNotifier(Arc<AtomicUsize>);

impl Notifier for CountingNotifier {
    fn refresh(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    index: Arc<TantivyIndex>,
    handler: ChangeHandler,
    refreshes: Arc<AtomicUsize>,
}

const NOTES: &[(&str, &str)] = &[
    ("my note.md", "# my note\n\nsome text"),
    (
        "another note.html",
        r#"<p><a href="some_notebook/a cool note.md">cool</a> <img src="pic.png" /></p>"#,
    ),
    (
        "some_notebook/a cool note.md",
        "a cool note links [empty](<nested book/empty.md>) and ![pic](../pic.png)",
    ),
    ("some_notebook/nested book/empty.md", ""),
    ("pic.png", "png"),
];

impl Fixture {
    fn new() -> Self {
        Self::with(&[])
    }

    fn with(extra: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for (path, body) in NOTES.iter().chain(extra) {
            write(&root.join(path), body);
        }
        let (index, handler, refreshes) = Self::handler(&root);
        let mut fixture = Self {
            _dir: dir,
            root,
            index,
            handler,
            refreshes,
        };
        let report = fixture.handler.reset();
        assert!(report.is_ok(), "{:?}", report.failures);
        fixture
    }

    fn handler(root: &Path) -> (Arc<TantivyIndex>, ChangeHandler, Arc<AtomicUsize>) {
        let mapper = Arc::new(PathMapper::new(root, ".build", ".searchindex"));
        let markdown = MarkdownOptions::from(&MarkdownConfig::default());
        let build = BuildTree::new(mapper.clone(), Arc::new(Templates::default()), markdown.clone());
        let extractor = Arc::new(DefaultExtractor::new(markdown, None));
        let index = Arc::new(TantivyIndex::new(mapper.clone(), extractor, 50_000_000));
        let refreshes = Arc::new(AtomicUsize::new(0));
        let handler = ChangeHandler::new(
            mapper,
            build,
            index.clone(),
            Box::new(CountingNotifier(refreshes.clone())),
        );
        (index, handler, refreshes)
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn compiled(&self, rel: &str) -> PathBuf {
        self.root.join(".build").join(rel)
    }

    fn read_compiled(&self, rel: &str) -> String {
        fs::read_to_string(self.compiled(rel)).unwrap()
    }

    fn read_source(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    fn indexed(&self, rel: &str) -> bool {
        self.index.lookup(&self.path(rel)).unwrap().is_some()
    }

    fn handle(&mut self, event: FsEvent) {
        let report = self.handler.handle(event);
        assert!(report.is_ok(), "{:?}", report.failures);
    }

    fn assert_mirror(&self) {
        assert_mirror(&self.root);
    }
}

/// Every build directory has a source notebook and a listing, and every
/// compiled note has a source note.
fn assert_mirror(root: &Path) {
    let build_root = root.join(".build");
    for entry in jwalk::WalkDir::new(&build_root).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let rel = path.strip_prefix(&build_root).unwrap();
        let source = root.join(rel);
        if entry.file_type().is_dir() {
            assert!(source.is_dir(), "orphan notebook {}", path.display());
            assert!(path.join("index.html").is_file(), "no listing in {}", path.display());
        } else if rel.file_name().is_some_and(|n| n != "index.html") {
            let md = source.with_extension("md");
            assert!(md.is_file() || source.is_file(), "orphan artifact {}", path.display());
        }
    }
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn created(path: PathBuf, is_dir: bool) -> FsEvent {
    FsEvent::Created { path, is_dir }
}

fn deleted(path: PathBuf, is_dir: bool) -> FsEvent {
    FsEvent::Deleted { path, is_dir }
}

fn moved(from: PathBuf, to: PathBuf, is_dir: bool) -> FsEvent {
    FsEvent::Moved { from, to, is_dir }
}

// ============================================================================
// Notes
// ============================================================================

#[test]
fn test_on_created() {
    let mut f = Fixture::new();
    let path = f.path("a new note.md");
    write(&path, "# a new note");
    f.handle(created(path, false));

    assert!(f.indexed("a new note.md"));
    assert!(f.compiled("a new note.html").is_file());
    assert!(f.read_compiled("index.html").contains("a%20new%20note.html"));
    assert_eq!(f.refreshes.load(Ordering::SeqCst), 1);
    f.assert_mirror();
}

#[test]
fn test_on_created_text_note_indexed_only() {
    let mut f = Fixture::new();
    let path = f.path("some_notebook/todo.txt");
    write(&path, "buy milk");
    f.handle(created(path, false));

    assert!(f.indexed("some_notebook/todo.txt"));
    assert!(!f.compiled("some_notebook/todo.html").exists());
}

#[test]
fn test_on_deleted() {
    let mut f = Fixture::new();
    assert!(f.indexed("my note.md"));
    assert!(f.compiled("my note.html").is_file());
    assert!(f.read_compiled("index.html").contains("my%20note.html"));

    let path = f.path("my note.md");
    fs::remove_file(&path).unwrap();
    f.handle(deleted(path, false));

    assert!(!f.indexed("my note.md"));
    assert!(!f.compiled("my note.html").exists());
    assert!(!f.read_compiled("index.html").contains("my%20note.html"));
    f.assert_mirror();
}

#[test]
fn test_on_modified() {
    let mut f = Fixture::new();
    let path = f.path("my note.md");
    write(&path, "a changed note");
    f.handle(FsEvent::Modified {
        path,
        is_dir: false,
    });

    assert!(f.read_compiled("my note.html").contains("<p>a changed note</p>"));
    let doc = f.index.lookup(&f.path("my note.md")).unwrap().unwrap();
    assert_eq!(doc.content, "a changed note");
}

#[test]
fn test_compile_is_idempotent() {
    let mut f = Fixture::new();
    let before = f.read_compiled("some_notebook/a cool note.html");
    f.handle(FsEvent::Modified {
        path: f.path("some_notebook/a cool note.md"),
        is_dir: false,
    });
    assert_eq!(f.read_compiled("some_notebook/a cool note.html"), before);
}

#[test]
fn test_on_moved() {
    let mut f = Fixture::new();
    let from = f.path("my note.md");
    let to = f.path("some_notebook/my moved note.md");
    fs::rename(&from, &to).unwrap();
    f.handle(moved(from, to, false));

    assert!(!f.indexed("my note.md"));
    assert!(!f.compiled("my note.html").exists());
    assert!(!f.read_compiled("index.html").contains("my%20note.html"));

    assert!(f.indexed("some_notebook/my moved note.md"));
    assert!(f.compiled("some_notebook/my moved note.html").is_file());
    assert!(
        f.read_compiled("some_notebook/index.html")
            .contains("my%20moved%20note.html")
    );
    f.assert_mirror();
}

#[test]
fn test_on_moved_into_excluded() {
    let mut f = Fixture::new();
    let from = f.path("my note.md");
    let to = f.path("_archive/my note.md");
    fs::create_dir_all(f.path("_archive")).unwrap();
    fs::rename(&from, &to).unwrap();
    f.handle(moved(from, to, false));

    assert!(!f.indexed("my note.md"));
    assert!(!f.indexed("_archive/my note.md"));
    assert!(!f.compiled("my note.html").exists());
    assert!(!f.compiled("_archive").exists());
    f.assert_mirror();
}

// ============================================================================
// Notebooks
// ============================================================================

#[test]
fn test_on_created_directory() {
    let mut f = Fixture::new();
    let path = f.path("new notebook");
    fs::create_dir_all(&path).unwrap();
    f.handle(created(path, true));

    assert!(f.compiled("new notebook/index.html").is_file());
    assert!(f.read_compiled("index.html").contains("new%20notebook/index.html"));
    f.assert_mirror();
}

#[test]
fn test_on_created_directory_with_content() {
    let mut f = Fixture::new();
    write(&f.path("copied/inner/deep.md"), "deep");
    f.handle(created(f.path("copied"), true));

    assert!(f.compiled("copied/inner/deep.html").is_file());
    assert!(f.indexed("copied/inner/deep.md"));
    f.assert_mirror();
}

#[test]
fn test_on_deleted_directory() {
    let mut f = Fixture::new();
    let path = f.path("some_notebook");
    fs::remove_dir_all(&path).unwrap();
    f.handle(deleted(path, true));

    assert!(!f.compiled("some_notebook").exists());
    assert!(!f.read_compiled("index.html").contains("some_notebook/index.html"));
    assert!(!f.indexed("some_notebook/a cool note.md"));
    assert!(!f.indexed("some_notebook/nested book/empty.md"));
    f.assert_mirror();
}

#[test]
fn test_on_moved_directory() {
    let mut f = Fixture::new();
    let from = f.path("some_notebook");
    let to = f.path("moved_notebook");
    fs::rename(&from, &to).unwrap();
    f.handle(moved(from, to, true));

    let listing = f.read_compiled("index.html");
    assert!(!listing.contains("some_notebook/index.html"));
    assert!(listing.contains("moved_notebook/index.html"));

    assert!(!f.compiled("some_notebook").exists());
    assert!(!f.indexed("some_notebook/a cool note.md"));

    assert!(f.compiled("moved_notebook").is_dir());
    assert!(f.compiled("moved_notebook/nested book/empty.html").is_file());
    assert!(f.indexed("moved_notebook/a cool note.md"));
    assert!(f.indexed("moved_notebook/nested book/empty.md"));

    // Inbound link from outside the moved notebook follows it.
    let source = f.read_source("another note.html");
    assert!(source.contains(r#"href="moved_notebook/a%20cool%20note.md""#));
    // Links inside the notebook and back out of it are still right.
    let moved_note = f.read_source("moved_notebook/a cool note.md");
    assert!(moved_note.contains("<nested book/empty.md>"));
    assert!(moved_note.contains("(../pic.png)"));
    f.assert_mirror();
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_update_references_markdown() {
    let mut f = Fixture::new();
    let note = "some_notebook/a cool note.md";
    let compiled = "some_notebook/a cool note.html";
    assert!(f.read_source(note).contains("<nested book/empty.md>"));
    assert!(f.read_compiled(compiled).contains("nested%20book/empty.html"));

    let relocation = Relocation::new(
        f.path("some_notebook/nested book/empty.md"),
        f.path("moved empty note.md"),
        false,
    );
    let report = f.handler.update_references(&relocation);
    assert!(report.is_ok());

    let source = f.read_source(note);
    assert!(!source.contains("<nested book/empty.md>"));
    assert!(source.contains("<../moved empty note.md>"));
    let page = f.read_compiled(compiled);
    assert!(!page.contains("nested%20book/empty.html"));
    assert!(page.contains("../moved%20empty%20note.html"));
}

#[test]
fn test_update_references_html() {
    let mut f = Fixture::new();
    let relocation = Relocation::new(
        f.path("some_notebook/a cool note.md"),
        f.path("moved cool note.md"),
        false,
    );
    f.handler.update_references(&relocation);

    let source = f.read_source("another note.html");
    assert!(!source.contains("some_notebook/a cool note.md"));
    assert!(source.contains(r#"href="moved%20cool%20note.md""#));
    let page = f.read_compiled("another note.html");
    assert!(page.contains("moved%20cool%20note.html"));
}

#[test]
fn test_move_propagates_references() {
    let mut f = Fixture::with(&[("a.md", "see [b](b.md)"), ("b.md", "b"), ("sub/keep.md", "")]);
    let from = f.path("b.md");
    let to = f.path("sub/b.md");
    fs::rename(&from, &to).unwrap();
    f.handle(moved(from, to, false));

    assert!(f.read_source("a.md").contains("[b](sub/b.md)"));
    assert!(f.read_compiled("a.html").contains(r#"href="sub/b.html""#));
}

#[test]
fn test_moved_note_outbound_links() {
    let mut f = Fixture::new();
    let from = f.path("some_notebook/a cool note.md");
    let to = f.path("a cool note.md");
    fs::rename(&from, &to).unwrap();
    f.handle(moved(from, to, false));

    let source = f.read_source("a cool note.md");
    assert!(source.contains("<some_notebook/nested book/empty.md>"));
    assert!(source.contains("(pic.png)"));
    // Inbound link from the html note follows too.
    assert!(
        f.read_source("another note.html")
            .contains(r#"href="a%20cool%20note.md""#)
    );
}

#[test]
fn test_moved_resource_updates_links() {
    let mut f = Fixture::new();
    let from = f.path("pic.png");
    let to = f.path("images/pic.png");
    fs::create_dir_all(f.path("images")).unwrap();
    fs::rename(&from, &to).unwrap();
    f.handle(moved(from, to, false));

    assert!(f.read_source("some_notebook/a cool note.md").contains("(../images/pic.png)"));
    assert!(f.read_source("another note.html").contains(r#"src="images/pic.png""#));
    assert!(
        f.read_compiled("another note.html")
            .contains(r#"src="../images/pic.png""#)
    );
}

// ============================================================================
// Filtering and bulk
// ============================================================================

#[test]
fn test_ignores_generated_paths() {
    let mut f = Fixture::new();
    let path = f.compiled("stray.html");
    write(&path, "x");
    let report = f.handler.handle(created(path, false));
    assert!(!report.touched());
    let report = f.handler.handle(FsEvent::Modified {
        path: f.path(".searchindex/meta.json"),
        is_dir: false,
    });
    assert!(!report.touched());
    assert_eq!(f.refreshes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_ignores_directory_modified() {
    let mut f = Fixture::new();
    let report = f.handler.handle(FsEvent::Modified {
        path: f.path("some_notebook"),
        is_dir: true,
    });
    assert!(!report.touched());
}

#[test]
fn test_cold_start_catches_up() {
    let f = Fixture::new();
    let note = f.path("my note.md");
    let gone = f.path("some_notebook/nested book/empty.md");
    let gone_compiled = f.compiled("some_notebook/nested book/empty.html");
    // Release the first index's writer, as a stopped watcher would.
    let Fixture {
        _dir, root, index, handler, ..
    } = f;
    drop(handler);
    drop(index);

    fs::write(&note, "edited offline").unwrap();
    fs::File::options()
        .write(true)
        .open(&note)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();
    fs::remove_file(&gone).unwrap();

    let (index, mut handler, _) = Fixture::handler(&root);
    let report = handler.cold_start();
    assert!(report.is_ok(), "{:?}", report.failures);

    let doc = index.lookup(&note).unwrap().unwrap();
    assert_eq!(doc.content, "edited offline");
    assert!(index.lookup(&gone).unwrap().is_none());
    assert!(!gone_compiled.exists());
    assert_mirror(&root);

    // A second pass has nothing left to do.
    assert_eq!(index.reconcile().unwrap().changed(), 0);
}
