//! Wiring shared by the subcommands: one mapper, one index, one handler.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use crate::build::{BuildTree, MarkdownOptions, Templates};
use crate::config::NotesConfig;
use crate::error::SyncReport;
use crate::index::{DefaultExtractor, TantivyIndex};
use crate::log;
use crate::path::PathMapper;
use crate::sync::{ChangeHandler, LogNotifier};
use crate::utils::plural_count;

pub(super) fn mapper(config: &NotesConfig) -> Arc<PathMapper> {
    Arc::new(PathMapper::from_config(config))
}

/// The index is opened lazily; creating the handle touches nothing on disk.
pub(super) fn open_index(config: &NotesConfig, mapper: &Arc<PathMapper>) -> Arc<TantivyIndex> {
    let markdown = MarkdownOptions::from(&config.build.markdown);
    let extractor = DefaultExtractor::new(markdown, config.index.pdftotext.clone());
    Arc::new(TantivyIndex::new(
        Arc::clone(mapper),
        Arc::new(extractor),
        config.index.writer_memory,
    ))
}

pub(super) fn change_handler(
    config: &NotesConfig,
    mapper: &Arc<PathMapper>,
) -> Result<ChangeHandler> {
    let templates = Templates::load(config.build.templates.as_deref())
        .context("Failed to load templates")?;
    let build = BuildTree::new(
        Arc::clone(mapper),
        Arc::new(templates),
        MarkdownOptions::from(&config.build.markdown),
    );
    let index = open_index(config, mapper);
    Ok(ChangeHandler::new(
        Arc::clone(mapper),
        build,
        index,
        Box::new(LogNotifier),
    ))
}

/// Log a bulk run's outcome. Failures are listed one per line.
pub(super) fn log_report(module: &'static str, report: &SyncReport, start: Instant) {
    log!(module; "{} compiled, {} indexed, {} removed in {:.2?}",
        plural_count(report.compiled, "file"),
        plural_count(report.indexed, "document"),
        report.removed,
        start.elapsed());
    report.log_failures("error");
}

/// Like [`log_report`], but a run with failures is an error.
pub(super) fn finish(module: &'static str, report: &SyncReport, start: Instant) -> Result<()> {
    log_report(module, report, start);
    if !report.is_ok() {
        bail!("{} during {}", plural_count(report.failures.len(), "failure"), module);
    }
    Ok(())
}
