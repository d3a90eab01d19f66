//! Tantivy-backed note index.
//!
//! The writer is opened on the first mutation only, so read-only commands
//! can search while a watcher holds the writer lock.

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, QueryParser, TermQuery};
use tantivy::schema::{Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TEXT, Value};
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, TantivyError, Term,
};

use super::extract::TextExtractor;
use super::snippet::extract_snippet;
use super::{IndexDocument, NoteIndex, ReconcileStats, SearchHit};
use crate::error::{SyncError, SyncResult};
use crate::path::{PathMapper, indexable_notes};
use crate::{debug, log};

const TITLE: &str = "title";
const PATH: &str = "path";
const LAST_MOD: &str = "last_mod";
const CONTENT: &str = "content";

/// Longest snippet shown per search hit, in characters.
const SNIPPET_CHARS: usize = 150;

fn schema() -> Schema {
    let mut builder = Schema::builder();
    builder.add_text_field(TITLE, TEXT | STORED);
    builder.add_text_field(PATH, STRING | STORED);
    builder.add_u64_field(LAST_MOD, STORED | INDEXED);
    builder.add_text_field(CONTENT, TEXT | STORED);
    builder.build()
}

// ============================================================================
// Fields
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Fields {
    title: Field,
    path: Field,
    last_mod: Field,
    content: Field,
}

impl Fields {
    /// `None` when the stored schema lacks one of our fields.
    fn resolve(schema: &Schema) -> Option<Self> {
        Some(Self {
            title: schema.get_field(TITLE).ok()?,
            path: schema.get_field(PATH).ok()?,
            last_mod: schema.get_field(LAST_MOD).ok()?,
            content: schema.get_field(CONTENT).ok()?,
        })
    }

    fn to_tantivy(self, doc: &IndexDocument) -> TantivyDocument {
        let mut out = TantivyDocument::default();
        out.add_text(self.title, &doc.title);
        out.add_text(self.path, key_of(&doc.path));
        out.add_u64(self.last_mod, doc.last_mod);
        out.add_text(self.content, &doc.content);
        out
    }

    fn text(self, doc: &TantivyDocument, field: Field) -> String {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    fn key(self, doc: &TantivyDocument) -> String {
        self.text(doc, self.path)
    }

    fn last_mod(self, doc: &TantivyDocument) -> u64 {
        doc.get_first(self.last_mod)
            .and_then(|v| v.as_u64())
            .unwrap_or_default()
    }

    fn from_tantivy(self, doc: &TantivyDocument) -> IndexDocument {
        IndexDocument {
            path: PathBuf::from(self.key(doc)),
            title: self.text(doc, self.title),
            last_mod: self.last_mod(doc),
            content: self.text(doc, self.content),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

enum Op {
    Delete(String),
    Add(IndexDocument),
}

struct Store {
    index: Index,
    reader: IndexReader,
    fields: Fields,
    writer: Option<IndexWriter>,
}

impl Store {
    fn open(dir: &Path) -> SyncResult<Self> {
        let index = open_index(dir)?;
        let fields = Fields::resolve(&index.schema()).ok_or_else(|| {
            TantivyError::SchemaError("index schema is missing note fields".to_string())
        })?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            reader,
            fields,
            writer: None,
        })
    }

    /// Stage `ops` and commit them as one batch.
    fn apply(&mut self, ops: &[Op], writer_memory: usize) -> SyncResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let fields = self.fields;
        if self.writer.is_none() {
            self.writer = Some(self.index.writer(writer_memory)?);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        commit_with_retry(&mut WriterBatch { writer, fields, ops })?;
        self.reader.reload()?;
        Ok(())
    }
}

/// One batch against the writer: staged and committed together, or rolled
/// back together.
trait Batch {
    fn commit(&mut self) -> tantivy::Result<()>;
    fn rollback(&mut self) -> tantivy::Result<()>;
}

struct WriterBatch<'a> {
    writer: &'a mut IndexWriter,
    fields: Fields,
    ops: &'a [Op],
}

impl Batch for WriterBatch<'_> {
    fn commit(&mut self) -> tantivy::Result<()> {
        stage(self.writer, self.fields, self.ops)?;
        self.writer.commit()?;
        Ok(())
    }

    fn rollback(&mut self) -> tantivy::Result<()> {
        self.writer.rollback()?;
        Ok(())
    }
}

/// A failed commit is rolled back and the batch retried once; a second
/// failure surfaces as [`SyncError::IndexCommit`].
fn commit_with_retry(batch: &mut impl Batch) -> SyncResult<()> {
    let mut retried = false;
    loop {
        let Err(e) = batch.commit() else {
            return Ok(());
        };
        batch.rollback().map_err(SyncError::IndexCommit)?;
        if retried {
            return Err(SyncError::IndexCommit(e));
        }
        log!("index"; "commit failed, retrying batch: {}", e);
        retried = true;
    }
}

fn stage(writer: &IndexWriter, fields: Fields, ops: &[Op]) -> tantivy::Result<()> {
    for op in ops {
        match op {
            Op::Delete(key) => {
                writer.delete_term(Term::from_field_text(fields.path, key));
            }
            Op::Add(doc) => {
                writer.add_document(fields.to_tantivy(doc))?;
            }
        }
    }
    Ok(())
}

/// Open the index in `dir`, recreating it when it is unreadable or was
/// written with a different schema.
fn open_index(dir: &Path) -> SyncResult<Index> {
    fs::create_dir_all(dir).map_err(|e| SyncError::write(dir, e))?;
    if dir.join("meta.json").is_file() {
        match Index::open_in_dir(dir) {
            Ok(index) if Fields::resolve(&index.schema()).is_some() => return Ok(index),
            Ok(_) => log!("index"; "schema changed, recreating {}", dir.display()),
            Err(e) => log!("index"; "cannot open {}: {}, recreating", dir.display(), e),
        }
        recreate_dir(dir)?;
    }
    Ok(Index::create_in_dir(dir, schema())?)
}

fn recreate_dir(dir: &Path) -> SyncResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(SyncError::write(dir, e)),
    }
    fs::create_dir_all(dir).map_err(|e| SyncError::write(dir, e))
}

fn key_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Modification time in nanoseconds since the Unix epoch.
fn mtime_of(path: &Path) -> io::Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    Ok(u64::try_from(nanos).unwrap_or(u64::MAX))
}

// ============================================================================
// TantivyIndex
// ============================================================================

pub struct TantivyIndex {
    mapper: Arc<PathMapper>,
    extractor: Arc<dyn TextExtractor>,
    writer_memory: usize,
    store: Mutex<Option<Store>>,
}

impl TantivyIndex {
    /// Nothing is opened until the first operation.
    pub fn new(
        mapper: Arc<PathMapper>,
        extractor: Arc<dyn TextExtractor>,
        writer_memory: usize,
    ) -> Self {
        Self {
            mapper,
            extractor,
            writer_memory,
            store: Mutex::new(None),
        }
    }

    fn apply(&self, ops: &[Op]) -> SyncResult<()> {
        let mut guard = self.store.lock();
        let store = match guard.take() {
            Some(store) => guard.insert(store),
            None => guard.insert(Store::open(self.mapper.index_root())?),
        };
        store.apply(ops, self.writer_memory)
    }

    /// Searcher and fields of the last committed state, without holding
    /// the store lock while searching.
    fn snapshot(&self) -> SyncResult<(Index, Searcher, Fields)> {
        let mut guard = self.store.lock();
        let store = match guard.take() {
            Some(store) => guard.insert(store),
            None => guard.insert(Store::open(self.mapper.index_root())?),
        };
        Ok((store.index.clone(), store.reader.searcher(), store.fields))
    }

    /// Build the document for one note. The mtime is read before the text,
    /// so an edit racing the extraction leaves a stale mtime behind and
    /// the next reconcile picks it up.
    fn document(&self, path: &Path) -> SyncResult<IndexDocument> {
        let kind = self
            .mapper
            .note_kind(path)
            .ok_or_else(|| SyncError::extraction(path, "not a note"))?;
        let last_mod = mtime_of(path).map_err(|e| SyncError::read(path, e))?;
        let content = self.extractor.extract(path, kind)?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(IndexDocument {
            path: path.to_path_buf(),
            title,
            last_mod,
            content,
        })
    }

    /// Extract documents in parallel, splitting off the failures.
    fn documents(&self, paths: &[PathBuf]) -> (Vec<IndexDocument>, Vec<SyncError>) {
        let results: Vec<SyncResult<IndexDocument>> =
            paths.par_iter().map(|p| self.document(p)).collect();
        let mut docs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(doc) => docs.push(doc),
                Err(e) => failures.push(e),
            }
        }
        (docs, failures)
    }

    /// Every stored key with its recorded modification time.
    fn stored_mtimes(&self) -> SyncResult<FxHashMap<String, u64>> {
        let (_, searcher, fields) = self.snapshot()?;
        let addresses = searcher.search(&AllQuery, &DocSetCollector)?;
        let mut stored = FxHashMap::default();
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            stored.insert(fields.key(&doc), fields.last_mod(&doc));
        }
        Ok(stored)
    }
}

impl NoteIndex for TantivyIndex {
    fn reset_all(&self) -> SyncResult<ReconcileStats> {
        let notes = indexable_notes(&self.mapper, self.mapper.root());
        let (docs, failures) = self.documents(&notes);
        let stats = ReconcileStats {
            added: docs.len(),
            failures,
            ..Default::default()
        };

        let mut guard = self.store.lock();
        // Dropping the store releases the writer lock before the wipe.
        *guard = None;
        recreate_dir(self.mapper.index_root())?;
        let store = guard.insert(Store::open(self.mapper.index_root())?);
        let ops: Vec<Op> = docs.into_iter().map(Op::Add).collect();
        store.apply(&ops, self.writer_memory)?;

        log!("index"; "indexed {} notes", stats.added);
        Ok(stats)
    }

    fn reconcile(&self) -> SyncResult<ReconcileStats> {
        let stored = self.stored_mtimes()?;
        let live = indexable_notes(&self.mapper, self.mapper.root());
        let live_keys: FxHashSet<String> = live.iter().map(|p| key_of(p)).collect();

        let mut stats = ReconcileStats::default();
        let mut deletes = Vec::new();
        let mut vanished: Vec<&String> = stored.keys().filter(|k| !live_keys.contains(*k)).collect();
        vanished.sort();
        for key in vanished {
            deletes.push(Op::Delete(key.clone()));
            stats.removed += 1;
        }

        let queued: Vec<PathBuf> = live
            .into_iter()
            .filter(|path| match stored.get(&key_of(path)) {
                None => true,
                Some(&recorded) => mtime_of(path).is_ok_and(|m| m > recorded),
            })
            .collect();
        let (docs, failures) = self.documents(&queued);
        stats.failures = failures;

        let mut adds = Vec::with_capacity(docs.len());
        for doc in docs {
            let key = key_of(&doc.path);
            if stored.contains_key(&key) {
                deletes.push(Op::Delete(key));
                stats.updated += 1;
            } else {
                stats.added += 1;
            }
            adds.push(Op::Add(doc));
        }

        deletes.extend(adds);
        self.apply(&deletes)?;
        debug!("index"; "reconciled: +{} ~{} -{}", stats.added, stats.updated, stats.removed);
        Ok(stats)
    }

    fn add_note(&self, path: &Path) -> SyncResult<()> {
        let doc = self.document(path)?;
        self.apply(&[Op::Delete(key_of(path)), Op::Add(doc)])
    }

    fn update_note(&self, path: &Path) -> SyncResult<()> {
        self.add_note(path)
    }

    fn delete_note(&self, path: &Path) -> SyncResult<()> {
        self.apply(&[Op::Delete(key_of(path))])
    }

    fn move_note(&self, from: &Path, to: &Path) -> SyncResult<()> {
        let doc = self.document(to)?;
        self.apply(&[Op::Delete(key_of(from)), Op::Delete(key_of(to)), Op::Add(doc)])
    }

    fn delete_under(&self, dir: &Path) -> SyncResult<usize> {
        let ops: Vec<Op> = self
            .stored_mtimes()?
            .into_keys()
            .filter(|key| Path::new(key).starts_with(dir))
            .map(Op::Delete)
            .collect();
        self.apply(&ops)?;
        Ok(ops.len())
    }

    fn lookup(&self, path: &Path) -> SyncResult<Option<IndexDocument>> {
        let (_, searcher, fields) = self.snapshot()?;
        let query = TermQuery::new(
            Term::from_field_text(fields.path, &key_of(path)),
            IndexRecordOption::Basic,
        );
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        match top.first() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher.doc(*address)?;
                Ok(Some(fields.from_tantivy(&doc)))
            }
            None => Ok(None),
        }
    }

    fn search(&self, query: &str, limit: usize) -> SyncResult<Vec<SearchHit>> {
        let (index, searcher, fields) = self.snapshot()?;
        let parser = QueryParser::for_index(&index, vec![fields.title, fields.content]);
        let parsed = parser.parse_query(query)?;
        let top = searcher.search(&parsed, &TopDocs::with_limit(limit.max(1)))?;

        let mut hits = Vec::with_capacity(top.len());
        for (score, address) in top {
            let doc: TantivyDocument = searcher.doc(address)?;
            let content = fields.text(&doc, fields.content);
            hits.push(SearchHit {
                path: PathBuf::from(fields.key(&doc)),
                title: fields.text(&doc, fields.title),
                snippet: extract_snippet(&content, query, SNIPPET_CHARS),
                score,
            });
        }
        Ok(hits)
    }

    fn len(&self) -> SyncResult<u64> {
        let (_, searcher, _) = self.snapshot()?;
        Ok(searcher.num_docs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails the first `failures` commits.
    #[derive(Default)]
    struct FlakyBatch {
        failures: usize,
        commits: usize,
        rollbacks: usize,
    }

    impl Batch for FlakyBatch {
        fn commit(&mut self) -> tantivy::Result<()> {
            self.commits += 1;
            if self.commits <= self.failures {
                return Err(TantivyError::SystemError("disk full".to_string()));
            }
            Ok(())
        }

        fn rollback(&mut self) -> tantivy::Result<()> {
            self.rollbacks += 1;
            Ok(())
        }
    }

    #[test]
    fn test_commit_first_try() {
        let mut batch = FlakyBatch::default();
        commit_with_retry(&mut batch).unwrap();
        assert_eq!((batch.commits, batch.rollbacks), (1, 0));
    }

    #[test]
    fn test_commit_retried_once() {
        let mut batch = FlakyBatch {
            failures: 1,
            ..Default::default()
        };
        commit_with_retry(&mut batch).unwrap();
        assert_eq!((batch.commits, batch.rollbacks), (2, 1));
    }

    #[test]
    fn test_commit_fails_after_retry() {
        let mut batch = FlakyBatch {
            failures: usize::MAX,
            ..Default::default()
        };
        let err = commit_with_retry(&mut batch).unwrap_err();
        assert!(matches!(err, SyncError::IndexCommit(_)));
        assert_eq!((batch.commits, batch.rollbacks), (2, 2));
    }
}
