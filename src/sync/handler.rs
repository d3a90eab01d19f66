//! Applies filesystem events to the build tree and the search index.

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::event::FsEvent;
use super::notifier::Notifier;
use crate::build::BuildTree;
use crate::error::{SyncError, SyncReport, SyncResult};
use crate::index::NoteIndex;
use crate::link::{Relocation, rewrite_references};
use crate::path::{PathMapper, compiled_notes, indexable_notes};
use crate::{debug, log};

/// Dispatches each event to the build tree and the index.
///
/// Mutating methods take `&mut self`, so a full reset can never interleave
/// with event handling on the same handler.
pub struct ChangeHandler {
    mapper: Arc<PathMapper>,
    build: BuildTree,
    index: Arc<dyn NoteIndex>,
    notifier: Box<dyn Notifier>,
}

impl ChangeHandler {
    pub fn new(
        mapper: Arc<PathMapper>,
        build: BuildTree,
        index: Arc<dyn NoteIndex>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            mapper,
            build,
            index,
            notifier,
        }
    }

    // ========================================================================
    // Bulk
    // ========================================================================

    /// Rebuild the build tree and the index from scratch.
    pub fn reset(&mut self) -> SyncReport {
        let mut report = self.build.build();
        match self.index.reset_all() {
            Ok(stats) => report.merge(stats.into()),
            Err(e) => report.fail(e),
        }
        report
    }

    /// Rebuild the build tree and catch the index up with changes made
    /// while nothing was watching.
    pub fn cold_start(&mut self) -> SyncReport {
        let mut report = self.build.build();
        match self.index.reconcile() {
            Ok(stats) => {
                log!("index"; "reconciled: {} added, {} updated, {} removed",
                    stats.added, stats.updated, stats.removed);
                report.merge(stats.into());
            }
            Err(e) => report.fail(e),
        }
        report
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn handle(&mut self, event: FsEvent) -> SyncReport {
        let event = event.normalized();
        debug!("watch"; "{}", event);

        let mut change = Change::default();
        match &event {
            FsEvent::Created { path, is_dir: false } => self.note_created(path, &mut change),
            FsEvent::Created { path, is_dir: true } => self.notebook_created(path, &mut change),
            FsEvent::Modified { path, is_dir: false } => self.note_modified(path, &mut change),
            FsEvent::Modified { is_dir: true, .. } => {}
            FsEvent::Deleted { path, is_dir: false } => self.note_deleted(path, &mut change),
            FsEvent::Deleted { path, is_dir: true } => self.notebook_deleted(path, &mut change),
            FsEvent::Moved { from, to, is_dir } => self.moved(from, to, *is_dir, &mut change),
        }

        let report = self.finish(change);
        if report.touched() {
            self.notifier.refresh();
        }
        report
    }

    fn note_created(&self, path: &Path, change: &mut Change) {
        if !self.mapper.is_valid_note(path) || !path.is_file() {
            return;
        }
        if self.mapper.is_compiled_note(path) {
            if change.report.record(self.build.compile_note(path)).is_some() {
                change.report.compiled += 1;
            }
            change.relist_parent(path);
        }
        if self.mapper.is_indexable(path) && change.report.record(self.index.add_note(path)).is_some() {
            change.report.indexed += 1;
        }
    }

    fn notebook_created(&self, dir: &Path, change: &mut Change) {
        if !self.mapper.is_valid_notebook(dir) {
            return;
        }
        change.report.merge(self.build.create_notebook(dir));
        self.index_tree(dir, change);
        change.relist_parent(dir);
    }

    fn note_modified(&self, path: &Path, change: &mut Change) {
        if !self.mapper.is_valid_note(path) || !path.is_file() {
            return;
        }
        if self.mapper.is_compiled_note(path)
            && change.report.record(self.build.compile_note(path)).is_some()
        {
            change.report.compiled += 1;
        }
        if self.mapper.is_indexable(path)
            && change.report.record(self.index.update_note(path)).is_some()
        {
            change.report.indexed += 1;
        }
    }

    fn note_deleted(&self, path: &Path, change: &mut Change) {
        if !self.mapper.is_valid_note(path) {
            return;
        }
        if self.mapper.is_compiled_note(path) {
            if change.report.record(self.build.delete_note(path)) == Some(true) {
                change.report.removed += 1;
            }
            change.relist_parent(path);
        }
        if change.report.record(self.index.delete_note(path)).is_some() {
            change.report.removed += 1;
        }
    }

    fn notebook_deleted(&self, dir: &Path, change: &mut Change) {
        if !self.mapper.is_notebook_path(dir) || dir == self.mapper.root() {
            return;
        }
        if change.report.record(self.build.delete_notebook(dir)) == Some(true) {
            change.report.removed += 1;
        }
        if let Some(count) = change.report.record(self.index.delete_under(dir)) {
            change.report.removed += count;
        }
        change.relist_parent(dir);
    }

    fn moved(&mut self, from: &Path, to: &Path, is_dir: bool, change: &mut Change) {
        let root = self.mapper.root();
        if !from.starts_with(root) && !to.starts_with(root) {
            return;
        }

        if is_dir {
            self.notebook_deleted(from, change);
            self.notebook_created(to, change);
        } else if self.mapper.is_valid_note(from) && self.mapper.is_indexable(to) && to.is_file() {
            // Artifacts as for delete + create; the index moves in one commit.
            self.move_note(from, to, change);
        } else {
            self.note_deleted(from, change);
            self.note_created(to, change);
        }

        if to.starts_with(root) && !self.mapper.is_generated(to) {
            let relocation = Relocation::new(from, to, is_dir);
            let references = self.update_references(&relocation);
            change.report.merge(references);
        }
    }

    fn move_note(&self, from: &Path, to: &Path, change: &mut Change) {
        if self.mapper.is_compiled_note(from) {
            if change.report.record(self.build.delete_note(from)) == Some(true) {
                change.report.removed += 1;
            }
            change.relist_parent(from);
        }
        if self.mapper.is_compiled_note(to) {
            if change.report.record(self.build.compile_note(to)).is_some() {
                change.report.compiled += 1;
            }
            change.relist_parent(to);
        }
        if change.report.record(self.index.move_note(from, to)).is_some() {
            change.report.indexed += 1;
        }
    }

    /// Index every note under a directory that just appeared.
    fn index_tree(&self, dir: &Path, change: &mut Change) {
        for note in indexable_notes(&self.mapper, dir) {
            if change.report.record(self.index.add_note(&note)).is_some() {
                change.report.indexed += 1;
            }
        }
    }

    /// Rewrite listings touched by the event, after every artifact below
    /// them is written.
    fn finish(&self, mut change: Change) -> SyncReport {
        for dir in std::mem::take(&mut change.relist) {
            if !self.mapper.is_valid_notebook(&dir) {
                continue;
            }
            if change.report.record(self.build.index_notebook(&dir)).is_some() {
                change.report.compiled += 1;
            }
        }
        change.report
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Rewrite every note whose source links into the relocated path, then
    /// recompile and reindex the rewritten notes.
    pub fn update_references(&mut self, relocation: &Relocation) -> SyncReport {
        let mut report = SyncReport::default();
        let notes = compiled_notes(&self.mapper, self.mapper.root());

        let mapper = &*self.mapper;
        let rewrites: Vec<SyncResult<Option<(PathBuf, String)>>> = notes
            .par_iter()
            .map(|note| rewritten_source(mapper, note, relocation))
            .collect();

        for rewrite in rewrites {
            let Some(Some((note, text))) = report.record(rewrite) else {
                continue;
            };
            if report
                .record(fs::write(&note, text).map_err(|e| SyncError::write(&note, e)))
                .is_none()
            {
                continue;
            }
            debug!("link"; "updated references in {}", note.display());
            if report.record(self.build.compile_note(&note)).is_some() {
                report.compiled += 1;
            }
            if self.mapper.is_indexable(&note) && report.record(self.index.update_note(&note)).is_some() {
                report.indexed += 1;
            }
        }
        report
    }
}

/// New source text for `note` if any of its links follow the relocation.
fn rewritten_source(
    mapper: &PathMapper,
    note: &Path,
    relocation: &Relocation,
) -> SyncResult<Option<(PathBuf, String)>> {
    let Some(kind) = mapper.note_kind(note) else {
        return Ok(None);
    };
    let text = fs::read_to_string(note).map_err(|e| SyncError::read(note, e))?;
    Ok(rewrite_references(&text, kind, note, relocation).map(|new| (note.to_path_buf(), new)))
}

/// Work accumulated while handling one event.
#[derive(Default)]
struct Change {
    report: SyncReport,
    relist: BTreeSet<PathBuf>,
}

impl Change {
    fn relist_parent(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            self.relist.insert(parent.to_path_buf());
        }
    }
}
