//! `folio search` and `folio show`.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::args::SearchArgs;
use super::common;
use crate::config::NotesConfig;
use crate::index::{IndexDocument, NoteIndex, SearchHit};
use crate::log;
use crate::path::{PathMapper, normalize_path};
use crate::utils::date::DateTimeUtc;
use crate::utils::plural_count;

/// Run a full-text query and print the hits, best first.
pub fn search(config: &NotesConfig, args: &SearchArgs) -> Result<()> {
    let mapper = common::mapper(config);
    let index = common::open_index(config, &mapper);

    let query = args.query_string();
    let hits = index.search(&query, args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        log!("search"; "no notes match `{}`", query);
        return Ok(());
    }

    for hit in &hits {
        print_hit(&mapper, hit);
    }
    log!("search"; "{}", plural_count(hits.len(), "hit"));
    Ok(())
}

fn print_hit(mapper: &PathMapper, hit: &SearchHit) {
    let rel = mapper.source_relative(&hit.path).unwrap_or(&hit.path);
    println!(
        "{} {}",
        rel.display().bold(),
        format!("({:.2})", hit.score).dimmed()
    );
    if !hit.snippet.is_empty() {
        println!("  {}", hit.snippet.replace('\n', " "));
    }
}

/// `show --json` output: the stored document plus a readable timestamp.
#[derive(Serialize)]
struct ShownDocument<'a> {
    #[serde(flatten)]
    document: &'a IndexDocument,
    modified: String,
}

/// Print what the index holds for one note.
pub fn show(config: &NotesConfig, path: &Path, json: bool) -> Result<()> {
    let mapper = common::mapper(config);
    let index = common::open_index(config, &mapper);

    let path = normalize_path(&config.root().join(path));
    let Some(document) = index.lookup(&path)? else {
        bail!("`{}` is not in the index", path.display());
    };
    let modified = DateTimeUtc::from_unix_nanos(document.last_mod).to_rfc3339();

    if json {
        let shown = ShownDocument {
            document: &document,
            modified,
        };
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("{}    {}", "title".dimmed(), document.title.bold());
    println!("{}     {}", "path".dimmed(), document.path.display());
    println!("{} {}", "modified".dimmed(), modified);
    println!();
    println!("{}", document.content);
    Ok(())
}
