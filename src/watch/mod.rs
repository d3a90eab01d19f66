//! Watch mode.
//!
//! The watcher starts before the startup build so anything that changes
//! while the build runs is queued, not lost.
//!
//! ```text
//! notify → Translator (pairing, filtering) → Debouncer (timing, dedup) → ChangeHandler
//! ```

mod debouncer;
mod translate;


use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::core::{is_shutdown, register_shutdown};
use crate::error::SyncReport;
use crate::logger::{status_error, status_success};
use crate::path::PathMapper;
use crate::sync::{ChangeHandler, FsEvent};
use crate::utils::plural_count;
use crate::{debug, log};

use debouncer::Debouncer;
use translate::Translator;

/// Recursive watcher on the notes root.
pub struct NoteWatcher {
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<notify::Event>>,
    mapper: Arc<PathMapper>,
    translator: Translator,
    debouncer: Debouncer,
}

impl NoteWatcher {
    /// Start watching immediately. Events buffer in the channel until
    /// [`run`](Self::run) is called.
    pub fn start(mapper: Arc<PathMapper>, debounce: Duration) -> Result<Self> {
        let (tx, rx) = channel::unbounded();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(mapper.root(), RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", mapper.root().display()))?;

        debug!("watch"; "watching {}", mapper.root().display());

        Ok(Self {
            _watcher: watcher,
            rx,
            translator: Translator::new(Arc::clone(&mapper)),
            debouncer: Debouncer::new(debounce),
            mapper,
        })
    }

    /// Feed events to `handler` until Ctrl+C or the watcher goes away.
    pub fn run(mut self, handler: &mut ChangeHandler) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        register_shutdown(shutdown_tx);

        log!("watch"; "watching for changes in {}", self.mapper.root().display());

        let rx = self.rx.clone();
        while !is_shutdown() {
            let timeout = self.debouncer.sleep_duration();
            let mut stopped = false;
            crossbeam::select! {
                recv(rx) -> msg => match msg {
                    Ok(Ok(event)) => self.queue(&event),
                    Ok(Err(e)) => log!("watch"; "notify error: {}", e),
                    Err(_) => {
                        log!("watch"; "watcher stopped");
                        stopped = true;
                    }
                },
                recv(shutdown_rx) -> _ => stopped = true,
                default(timeout) => {}
            }
            if stopped {
                break;
            }

            if let Some(events) = self.take_ready() {
                dispatch(handler, &self.mapper, events);
            }
        }

        Ok(())
    }

    fn queue(&mut self, event: &notify::Event) {
        for event in self.translator.translate(event) {
            self.debouncer.push(event);
        }
        if self.translator.has_pending() {
            self.debouncer.touch();
        }
    }

    /// Rename sources still unpaired once the window is quiet were moved
    /// out of the tree; they join the batch as deletes.
    fn take_ready(&mut self) -> Option<Vec<FsEvent>> {
        if self.translator.has_pending() && self.debouncer.is_quiet() {
            for event in self.translator.take_unpaired() {
                self.debouncer.merge(event);
            }
        }
        self.debouncer.take_if_ready()
    }
}

/// Apply one batch, one event at a time, in order.
fn dispatch(handler: &mut ChangeHandler, mapper: &PathMapper, events: Vec<FsEvent>) {
    let count = events.len();
    let mut total = SyncReport::default();
    let mut last = String::new();

    for event in events {
        last = describe(mapper, &event);
        total.merge(handler.handle(event));
    }

    if !total.is_ok() {
        let summary = plural_count(total.failures.len(), "failure");
        status_error(&summary, &total.failure_detail());
    } else if total.touched() {
        match count {
            1 => status_success(&last),
            n => status_success(&plural_count(n, "change")),
        }
    }
}

/// `modified: notebook/note.md`, relative to the notes root.
fn describe(mapper: &PathMapper, event: &FsEvent) -> String {
    let rel = |p: &Path| {
        mapper
            .source_relative(p)
            .unwrap_or(p)
            .display()
            .to_string()
    };
    match event {
        FsEvent::Moved { from, to, .. } => format!("moved: {} -> {}", rel(from), rel(to)),
        other => format!("{}: {}", other.label(), rel(other.path())),
    }
}
