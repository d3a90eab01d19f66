//! `folio build` and `folio reconcile`.

use std::time::Instant;

use anyhow::Result;

use super::common;
use crate::config::NotesConfig;
use crate::error::SyncReport;
use crate::index::NoteIndex;
use crate::log;

/// Rebuild the build tree and the search index from scratch.
pub fn build_all(config: &NotesConfig) -> Result<()> {
    let start = Instant::now();
    let mapper = common::mapper(config);
    let mut handler = common::change_handler(config, &mapper)?;

    log!("build"; "notes root {}", mapper.root().display());
    let report = handler.reset();
    common::finish("build", &report, start)
}

/// Catch the index up with the notes tree. The build tree is left alone.
pub fn reconcile(config: &NotesConfig) -> Result<()> {
    let start = Instant::now();
    let mapper = common::mapper(config);
    let index = common::open_index(config, &mapper);

    let stats = index.reconcile()?;
    log!("index"; "{} added, {} updated, {} removed",
        stats.added, stats.updated, stats.removed);

    let report: SyncReport = stats.into();
    report.log_failures("error");
    if !report.is_ok() {
        anyhow::bail!("{} notes could not be indexed", report.failures.len());
    }
    log!("index"; "done in {:.2?}", start.elapsed());
    Ok(())
}
