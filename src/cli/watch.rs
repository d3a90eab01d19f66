//! `folio watch`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::common;
use crate::config::NotesConfig;
use crate::watch::NoteWatcher;

/// Bring both views up to date, then follow changes until Ctrl+C.
///
/// The watcher is attached before the startup build; anything edited
/// while it runs is handled right after.
pub fn watch(config: &NotesConfig, reset_index: bool) -> Result<()> {
    let mapper = common::mapper(config);
    let watcher = NoteWatcher::start(
        Arc::clone(&mapper),
        Duration::from_millis(config.watch.debounce_ms),
    )?;

    let mut handler = common::change_handler(config, &mapper)?;

    let start = Instant::now();
    let report = if reset_index {
        handler.reset()
    } else {
        handler.cold_start()
    };
    common::log_report("build", &report, start);

    watcher.run(&mut handler)
}
