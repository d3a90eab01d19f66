//! Build tree: the compiled HTML mirror of the notes tree.
//!
//! Every notebook gets a directory with an `index.html` listing; every
//! markdown or HTML note gets a compiled page with breadcrumbs and
//! rewritten links. The tree is rebuilt wholesale at startup and then
//! patched one note or notebook at a time.

mod listing;
mod markdown;
mod template;

pub use listing::{Children, ListedNote, Listing};
pub use markdown::MarkdownOptions;
pub use template::Templates;

use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::NoteKind;
use crate::error::{SyncError, SyncReport, SyncResult};
use crate::link::{LinkRewriter, rewrite_html};
use crate::logger::ProgressLine;
use crate::path::{LISTING_FILE, PathMapper, compiled_notes};
use crate::{debug, log};

pub struct BuildTree {
    mapper: Arc<PathMapper>,
    templates: Arc<Templates>,
    markdown: MarkdownOptions,
}

impl BuildTree {
    pub fn new(mapper: Arc<PathMapper>, templates: Arc<Templates>, markdown: MarkdownOptions) -> Self {
        Self {
            mapper,
            templates,
            markdown,
        }
    }

    // ========================================================================
    // Whole tree
    // ========================================================================

    /// Ensure the build root exists; with `reset`, start from an empty one.
    pub fn prepare(&self, reset: bool) -> SyncResult<()> {
        let build_root = self.mapper.build_root();
        if reset {
            remove_dir_if_exists(build_root)?;
        }
        fs::create_dir_all(build_root).map_err(|e| SyncError::write(build_root, e))
    }

    /// Rebuild the whole tree from scratch.
    pub fn build(&self) -> SyncReport {
        let mut report = SyncReport::default();
        if report.record(self.prepare(true)).is_none() {
            return report;
        }

        let root = self.mapper.root().to_path_buf();
        let notes = compiled_notes(&self.mapper, &root);
        let count = |kind: NoteKind| {
            notes
                .iter()
                .filter(|p| NoteKind::from_path(p) == Some(kind))
                .count()
        };
        let progress = ProgressLine::new(
            "build",
            &[
                ("markdown", count(NoteKind::Markdown)),
                ("html", count(NoteKind::Html)),
            ],
        );

        let (_, tree) = self.compile_tree(&root, Some(&progress));
        progress.finish();
        report.merge(tree);

        log!("build"; "compiled {} pages into {}", report.compiled, self.mapper.build_root().display());
        report
    }

    /// Compile `dir` and everything below it.
    ///
    /// Child build directories are recreated before recursing, and the
    /// directory's own listing is written last.
    pub fn compile_notebook_tree(&self, dir: &Path) -> (Listing, SyncReport) {
        self.compile_tree(dir, None)
    }

    fn compile_tree(&self, dir: &Path, progress: Option<&ProgressLine>) -> (Listing, SyncReport) {
        let mut report = SyncReport::default();
        let Some(children) = report.record(Children::read(&self.mapper, dir)) else {
            return (Listing::default(), report);
        };

        for child in &children.notebooks {
            let child_build = self.mapper.to_build_path(child);
            if report.record(recreate_dir(&child_build)).is_none() {
                continue;
            }
            let (_, child_report) = self.compile_tree(child, progress);
            report.merge(child_report);
        }

        let results: Vec<SyncResult<PathBuf>> = children
            .notes
            .par_iter()
            .map(|note| {
                let result = self.compile_note(note);
                if let Some(progress) = progress
                    && let Some(kind) = NoteKind::from_path(note)
                {
                    progress.inc(kind.name());
                }
                result
            })
            .collect();
        for result in results {
            if report.record(result).is_some() {
                report.compiled += 1;
            }
        }

        let listing = children.listing();
        if report.record(self.write_listing(dir, &listing)).is_some() {
            report.compiled += 1;
        }
        (listing, report)
    }

    // ========================================================================
    // Single note
    // ========================================================================

    /// Compile one note into its build artifact and return the artifact path.
    ///
    /// Notes with no content after trimming produce an empty file.
    pub fn compile_note(&self, source: &Path) -> SyncResult<PathBuf> {
        let (target, ext) = self.mapper.compiled_file_for(source);
        let bytes = fs::read(source).map_err(|e| SyncError::read(source, e))?;
        let raw = String::from_utf8_lossy(&bytes);

        let markup = match ext.as_deref().and_then(NoteKind::from_extension) {
            Some(NoteKind::Markdown) => self.markdown.to_html(&raw),
            _ => raw.into_owned(),
        };

        let page = if markup.trim().is_empty() {
            String::new()
        } else {
            let rewriter = LinkRewriter::for_note(&self.mapper, source);
            let body = rewrite_html(&markup, |link| rewriter.rewrite(link)).unwrap_or(markup);
            let title = source
                .file_stem()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default();
            let crumbs = self.mapper.breadcrumbs(&target, false);
            self.templates.render_note(&title, &crumbs, &body)
        };

        write_file(&target, page.as_bytes())?;
        debug!("build"; "compiled {}", target.display());
        Ok(target)
    }

    /// Remove a note's artifact. Returns whether anything was removed.
    pub fn delete_note(&self, source: &Path) -> SyncResult<bool> {
        let (target, _) = self.mapper.compiled_file_for(source);
        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::write(&target, e)),
        }
    }

    // ========================================================================
    // Notebooks
    // ========================================================================

    /// Remove a notebook's build subtree. Returns whether it existed.
    pub fn delete_notebook(&self, source: &Path) -> SyncResult<bool> {
        let target = self.mapper.to_build_path(source);
        // Only strict subdirectories of the build root
        match self.mapper.source_for_build(&target) {
            Some(dir) if dir != self.mapper.root() => {}
            _ => return Ok(false),
        }
        debug!("build"; "remove {}", self.mapper.to_build_dir_string(source));
        remove_dir_if_exists(&target)
    }

    /// Rewrite `dir`'s listing from its current immediate children.
    pub fn index_notebook(&self, dir: &Path) -> SyncResult<()> {
        let listing = Children::read(&self.mapper, dir)?.listing();
        self.write_listing(dir, &listing)
    }

    /// Set up the build directory of a new notebook and compile whatever
    /// it already holds.
    pub fn create_notebook(&self, dir: &Path) -> SyncReport {
        let mut report = SyncReport::default();
        let target = self.mapper.to_build_path(dir);
        if report.record(recreate_dir(&target)).is_some() {
            let (_, tree) = self.compile_notebook_tree(dir);
            report.merge(tree);
        }
        report
    }

    fn write_listing(&self, dir: &Path, listing: &Listing) -> SyncResult<()> {
        let build_dir = self.mapper.to_build_path(dir);
        let crumbs = self.mapper.breadcrumbs(&build_dir, true);
        let title = crumbs.last().map(|c| c.label.as_str()).unwrap_or_default();
        let page = self.templates.render_notebook(title, &crumbs, listing);
        write_file(&build_dir.join(LISTING_FILE), page.as_bytes())
    }
}

// ============================================================================
// File helpers
// ============================================================================

fn write_file(path: &Path, contents: &[u8]) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::write(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| SyncError::write(path, e))
}

fn remove_dir_if_exists(dir: &Path) -> SyncResult<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SyncError::write(dir, e)),
    }
}

fn recreate_dir(dir: &Path) -> SyncResult<()> {
    remove_dir_if_exists(dir)?;
    fs::create_dir_all(dir).map_err(|e| SyncError::write(dir, e))
}
