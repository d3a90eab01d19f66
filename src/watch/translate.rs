//! Raw `notify` events to [`FsEvent`]s.
//!
//! Rename halves are paired by tracker id (inotify), by arrival order
//! (Windows), or arrive already paired (`RenameMode::Both`). A `From` half
//! still unpaired when the debouncer flushes becomes a delete; a `To` half
//! without a source becomes a create.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};

use crate::path::PathMapper;
use crate::sync::FsEvent;

pub(super) struct Translator {
    mapper: Arc<PathMapper>,
    /// Rename sources waiting for their destination half
    pending: Vec<(Option<usize>, PathBuf)>,
    /// Pair already emitted from `From`/`To` halves; inotify repeats it as `Both`
    last_pair: Option<(PathBuf, PathBuf)>,
}

impl Translator {
    pub(super) fn new(mapper: Arc<PathMapper>) -> Self {
        Self {
            mapper,
            pending: Vec::new(),
            last_pair: None,
        }
    }

    pub(super) fn translate(&mut self, event: &notify::Event) -> Vec<FsEvent> {
        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        let events = match event.kind {
            EventKind::Create(kind) => event
                .paths
                .iter()
                .map(|path| FsEvent::Created {
                    path: path.clone(),
                    is_dir: kind == CreateKind::Folder || path.is_dir(),
                })
                .collect(),
            EventKind::Remove(kind) => event
                .paths
                .iter()
                .map(|path| FsEvent::Deleted {
                    path: path.clone(),
                    is_dir: kind == RemoveKind::Folder || self.was_dir(path),
                })
                .collect(),
            // mtime/atime/chmod noise
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(ModifyKind::Name(mode)) => self.rename(event, mode),
            EventKind::Modify(_) => event
                .paths
                .iter()
                .map(|path| FsEvent::Modified {
                    path: path.clone(),
                    is_dir: path.is_dir(),
                })
                .collect(),
            _ => Vec::new(),
        };

        events
            .into_iter()
            .filter_map(|e| self.drop_ignored(e))
            .collect()
    }

    fn rename(&mut self, event: &notify::Event, mode: RenameMode) -> Vec<FsEvent> {
        let tracker = event.attrs.tracker();
        match mode {
            RenameMode::From => {
                self.pending
                    .extend(event.paths.iter().map(|p| (tracker, p.clone())));
                Vec::new()
            }
            RenameMode::To => event
                .paths
                .iter()
                .map(|to| match self.take_pending(tracker) {
                    Some(from) => {
                        self.last_pair = Some((from.clone(), to.clone()));
                        moved(from, to.clone())
                    }
                    None => FsEvent::Created {
                        path: to.clone(),
                        is_dir: to.is_dir(),
                    },
                })
                .collect(),
            RenameMode::Both => {
                let [from, to] = event.paths.as_slice() else {
                    return Vec::new();
                };
                let pair = (from.clone(), to.clone());
                if self.last_pair.as_ref() == Some(&pair) {
                    self.last_pair = None;
                    return Vec::new();
                }
                // The halves of this pair may still be queued without a tracker
                self.pending.retain(|(_, p)| p != from);
                vec![moved(pair.0, pair.1)]
            }
            // FSEvents reports each side alone with no way to pair them
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|path| {
                    if path.exists() {
                        FsEvent::Created {
                            path: path.clone(),
                            is_dir: path.is_dir(),
                        }
                    } else {
                        FsEvent::Deleted {
                            path: path.clone(),
                            is_dir: self.was_dir(path),
                        }
                    }
                })
                .collect(),
        }
    }

    /// Oldest rename source with the same tracker (or, without trackers,
    /// the oldest untracked one).
    fn take_pending(&mut self, tracker: Option<usize>) -> Option<PathBuf> {
        let pos = self.pending.iter().position(|(t, _)| *t == tracker)?;
        Some(self.pending.remove(pos).1)
    }

    /// Rename sources that never found a destination: moved out of the
    /// watched tree.
    pub(super) fn take_unpaired(&mut self) -> Vec<FsEvent> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter_map(|(_, path)| {
                let is_dir = self.was_dir(&path);
                self.drop_ignored(FsEvent::Deleted { path, is_dir })
            })
            .collect()
    }

    pub(super) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// A path that no longer exists was a directory if the build tree
    /// still mirrors it as one.
    fn was_dir(&self, path: &Path) -> bool {
        self.mapper.note_kind(path).is_none() && self.mapper.to_build_path(path).is_dir()
    }

    fn ignored(&self, path: &Path) -> bool {
        self.mapper.is_generated(path) || is_temp_file(path)
    }

    /// Drop events on generated or temporary paths. A move between an
    /// ignored and a watched path keeps only the watched side, so an
    /// editor's `save to temp, rename over` arrives as a create.
    fn drop_ignored(&self, event: FsEvent) -> Option<FsEvent> {
        match event {
            FsEvent::Moved { from, to, is_dir } => {
                match (self.ignored(&from), self.ignored(&to)) {
                    (false, false) => Some(FsEvent::Moved { from, to, is_dir }),
                    (true, false) => Some(FsEvent::Created { path: to, is_dir }),
                    (false, true) => Some(FsEvent::Deleted { path: from, is_dir }),
                    (true, true) => None,
                }
            }
            other if self.ignored(other.path()) => None,
            other => Some(other),
        }
    }
}

fn moved(from: PathBuf, to: PathBuf) -> FsEvent {
    let is_dir = to.is_dir();
    FsEvent::Moved { from, to, is_dir }
}

/// Editor artifacts: backups, swap files, dotfiles.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
