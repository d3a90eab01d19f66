use std::path::Path;
use std::time::{Duration, Instant};

use crate::sync::FsEvent;

/// Minimum gap between two handled batches.
pub(super) const COOLDOWN_MS: u64 = 800;

/// Timing and deduplication for translated events.
///
/// Unlike a path-keyed map, events stay in arrival order: a move followed
/// by a write to its destination must be handled in that order.
pub(super) struct Debouncer {
    pub(super) events: Vec<FsEvent>,
    window: Duration,
    pub(super) last_event: Option<Instant>,
    pub(super) last_flush: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            events: Vec::new(),
            window,
            last_event: None,
            last_flush: None,
        }
    }

    /// Queue an event, merging it with the latest queued event for the
    /// same path:
    /// - Deleted + Created/Modified: restored, keep the new event
    /// - Created/Modified + Deleted: Created vanishes, Modified becomes Deleted
    /// - Modified + Created: Created
    /// - otherwise the first event wins
    ///
    /// Moves are never merged.
    pub(super) fn push(&mut self, event: FsEvent) {
        self.touch();
        self.merge(event);
    }

    /// Restart the quiet window without queueing anything.
    pub(super) fn touch(&mut self) {
        self.last_event = Some(Instant::now());
    }

    /// Queue an event without restarting the quiet window.
    pub(super) fn merge(&mut self, event: FsEvent) {
        if matches!(event, FsEvent::Moved { .. }) {
            crate::debug!("watch"; "queue {}", event);
            self.events.push(event);
            return;
        }

        let Some(pos) = self.latest_for(event.path()) else {
            crate::debug!("watch"; "queue {}", event);
            self.events.push(event);
            return;
        };

        let existing = self.events[pos].label();
        match (existing, event.label()) {
            ("deleted", "created" | "modified") | ("modified", "created" | "deleted") => {
                crate::debug!("watch"; "replace {} with {}", existing, event);
                self.events.remove(pos);
                self.events.push(event);
            }
            ("created", "deleted") => {
                crate::debug!("watch"; "discard created+deleted: {}", event.path().display());
                self.events.remove(pos);
            }
            ("moved", _) => self.events.push(event),
            _ => {}
        }
    }

    /// Index of the latest queued event touching `path`.
    fn latest_for(&self, path: &Path) -> Option<usize> {
        self.events.iter().rposition(|e| match e {
            FsEvent::Moved { from, to, .. } => from == path || to == path,
            other => other.path() == path,
        })
    }

    /// Take the queue once the window and cooldown have elapsed, with each
    /// event checked against what is on disk now.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<FsEvent>> {
        if !self.is_ready() {
            return None;
        }

        let events = std::mem::take(&mut self.events);
        self.last_event = None;

        let events = correct_by_existence(events);
        if events.is_empty() {
            return None;
        }

        self.last_flush = Some(Instant::now());
        Some(events)
    }

    pub(super) fn is_ready(&self) -> bool {
        self.is_quiet() && !self.events.is_empty()
    }

    /// The window and cooldown have both elapsed since the last activity.
    pub(super) fn is_quiet(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < self.window {
            return false;
        }

        if let Some(last_flush) = self.last_flush
            && last_flush.elapsed() < Duration::from_millis(COOLDOWN_MS)
        {
            return false;
        }

        true
    }

    /// How long the loop may block before the queue could become ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let window_remaining = self.window.saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_flush
            .map(|t| Duration::from_millis(COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        window_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Reconcile queued kinds with the filesystem.
///
/// Events describe what happened some time ago; by the time the batch is
/// handled a created file may be gone again, or a deleted one restored by
/// an atomic save.
fn correct_by_existence(events: Vec<FsEvent>) -> Vec<FsEvent> {
    events
        .into_iter()
        .filter_map(|event| match event {
            FsEvent::Created { ref path, .. } if !path.exists() => {
                crate::debug!("watch"; "discard created (gone): {}", path.display());
                None
            }
            FsEvent::Modified { path, is_dir } if !path.exists() => {
                crate::debug!("watch"; "upgrade modified->deleted: {}", path.display());
                Some(FsEvent::Deleted { path, is_dir })
            }
            FsEvent::Deleted { path, .. } if path.exists() => {
                let is_dir = path.is_dir();
                crate::debug!("watch"; "restored: {}", path.display());
                if is_dir {
                    Some(FsEvent::Created { path, is_dir })
                } else {
                    Some(FsEvent::Modified { path, is_dir })
                }
            }
            FsEvent::Moved { from, to, is_dir } if !to.exists() => {
                crate::debug!("watch"; "moved then gone: {}", to.display());
                Some(FsEvent::Deleted { path: from, is_dir })
            }
            other => Some(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn created(path: &Path) -> FsEvent {
        FsEvent::Created {
            path: path.to_path_buf(),
            is_dir: false,
        }
    }

    fn modified(path: &Path) -> FsEvent {
        FsEvent::Modified {
            path: path.to_path_buf(),
            is_dir: false,
        }
    }

    fn deleted(path: &Path) -> FsEvent {
        FsEvent::Deleted {
            path: path.to_path_buf(),
            is_dir: false,
        }
    }

    fn ready(debouncer: &mut Debouncer) -> Vec<FsEvent> {
        debouncer.last_event = Some(Instant::now() - Duration::from_secs(1));
        debouncer.take_if_ready().unwrap_or_default()
    }

    #[test]
    fn test_empty_not_ready() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(!debouncer.is_ready());
        assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
    }

    #[test]
    fn test_waits_for_quiet_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.push(modified(Path::new("/n/a.md")));
        assert!(!debouncer.is_ready());
        assert!(debouncer.sleep_duration() <= Duration::from_millis(300));
        assert!(debouncer.sleep_duration() >= Duration::from_millis(1));
    }

    #[test]
    fn test_cooldown_after_flush() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.md");
        fs::write(&a, "a").unwrap();

        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.push(modified(&a));
        assert_eq!(ready(&mut debouncer).len(), 1);

        debouncer.push(modified(&a));
        debouncer.last_event = Some(Instant::now() - Duration::from_secs(1));
        assert!(!debouncer.is_ready());

        debouncer.last_flush = Some(Instant::now() - Duration::from_millis(COOLDOWN_MS + 1));
        assert!(debouncer.is_ready());
    }

    #[test]
    fn test_first_modify_wins() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        let a = Path::new("/n/a.md");
        debouncer.push(modified(a));
        debouncer.push(modified(a));
        debouncer.push(created(Path::new("/n/b.md")));
        debouncer.push(modified(Path::new("/n/b.md")));
        assert_eq!(debouncer.events, vec![modified(a), created(Path::new("/n/b.md"))]);
    }

    #[test]
    fn test_created_then_deleted_discarded() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        let a = Path::new("/n/a.md");
        debouncer.push(created(a));
        debouncer.push(modified(a));
        debouncer.push(deleted(a));
        assert!(debouncer.events.is_empty());
    }

    #[test]
    fn test_modified_then_deleted() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        let a = Path::new("/n/a.md");
        debouncer.push(modified(a));
        debouncer.push(deleted(a));
        assert_eq!(debouncer.events, vec![deleted(a)]);
    }

    #[test]
    fn test_deleted_then_created_is_restore() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        let a = Path::new("/n/a.md");
        debouncer.push(deleted(a));
        debouncer.push(modified(Path::new("/n/b.md")));
        debouncer.push(created(a));
        assert_eq!(
            debouncer.events,
            vec![modified(Path::new("/n/b.md")), created(a)]
        );
    }

    #[test]
    fn test_moves_keep_order() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        let from = PathBuf::from("/n/a.md");
        let to = PathBuf::from("/n/sub/a.md");
        debouncer.push(FsEvent::Moved {
            from: from.clone(),
            to: to.clone(),
            is_dir: false,
        });
        debouncer.push(modified(&to));
        debouncer.push(modified(&to));

        assert_eq!(debouncer.events.len(), 2);
        assert!(matches!(debouncer.events[0], FsEvent::Moved { .. }));
        assert_eq!(debouncer.events[1], modified(&to));
    }

    #[test]
    fn test_correct_by_existence() {
        let temp = TempDir::new().unwrap();
        let here = temp.path().join("here.md");
        let gone = temp.path().join("gone.md");
        fs::write(&here, "x").unwrap();

        let events = correct_by_existence(vec![
            created(&gone),
            modified(&gone),
            deleted(&here),
            FsEvent::Moved {
                from: temp.path().join("old.md"),
                to: gone.clone(),
                is_dir: false,
            },
        ]);

        assert_eq!(
            events,
            vec![
                deleted(&gone),
                modified(&here),
                deleted(&temp.path().join("old.md")),
            ]
        );
    }

    #[test]
    fn test_restored_directory_is_created() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("book");
        fs::create_dir(&dir).unwrap();

        let events = correct_by_existence(vec![FsEvent::Deleted {
            path: dir.clone(),
            is_dir: true,
        }]);
        assert_eq!(events, vec![FsEvent::Created { path: dir, is_dir: true }]);
    }
}
