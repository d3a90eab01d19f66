//! Source-side reference updates after a note or notebook moves.
//!
//! Every relative link in a note's *source* text is resolved against the
//! note's pre-move directory, relocated if it pointed at (or into) the moved
//! path, and re-expressed relative to the note's post-move directory. One
//! pass therefore fixes inbound links to the moved path and the moved
//! notes' own outbound links.

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::core::link::split_suffix;
use crate::core::{LinkKind, NoteKind};
use crate::path::{clean_path, relative_path, to_link};
use crate::utils::html::{escape, unescape};

/// `[text](target)` and `![alt](target "title")`
static RE_MD_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\]\(\s*(<[^>\n]*>|[^)\n]*?)(?:\s+"[^"\n]*"|\s+'[^'\n]*')?\s*\)"#).unwrap()
});

/// `[id]: target`
static RE_MD_REFDEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ {0,3}\[[^\]\n]+\]:[ \t]*(<[^>\n]*>|\S+)").unwrap());

/// `href="..."`, `src='...'`, `href=unquoted`
static RE_HTML_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:href|src)\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+)"#).unwrap()
});

/// A move of a note or a notebook, as absolute normalized paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
    pub is_dir: bool,
}

impl Relocation {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            is_dir,
        }
    }

    /// New location of `path` if the move carried it along.
    pub fn relocate(&self, path: &Path) -> Option<PathBuf> {
        Self::rebase(path, &self.from, &self.to, self.is_dir)
    }

    /// Location `path` had before the move (itself if it did not move).
    pub fn original(&self, path: &Path) -> PathBuf {
        Self::rebase(path, &self.to, &self.from, self.is_dir).unwrap_or_else(|| path.to_path_buf())
    }

    fn rebase(path: &Path, from: &Path, to: &Path, is_dir: bool) -> Option<PathBuf> {
        if path == from {
            return Some(to.to_path_buf());
        }
        if !is_dir {
            return None;
        }
        path.strip_prefix(from).ok().map(|rel| to.join(rel))
    }
}

/// How a link target is written in the source, which decides how the
/// replacement is decoded and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Markdown,
    Angle,
    Attribute,
}

struct Target {
    range: Range<usize>,
    syntax: Syntax,
}

/// Rewrite the relative links in `text`, the source of the note now at
/// `note`, for `relocation`. Returns the new text if any link changed.
pub fn rewrite_references(
    text: &str,
    kind: NoteKind,
    note: &Path,
    relocation: &Relocation,
) -> Option<String> {
    let old_dir = relocation.original(note).parent()?.to_path_buf();
    let new_dir = note.parent()?.to_path_buf();

    let targets = find_targets(text, kind);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut changed = false;

    for target in targets {
        if target.range.start < cursor {
            continue;
        }
        let raw = &text[target.range.clone()];
        let Some(new) = rewrite_target(raw, target.syntax, &old_dir, &new_dir, relocation)
        else {
            continue;
        };
        out.push_str(&text[cursor..target.range.start]);
        out.push_str(&new);
        cursor = target.range.end;
        changed = true;
    }

    if !changed {
        return None;
    }
    out.push_str(&text[cursor..]);
    Some(out)
}

/// Byte ranges of link targets, sorted by position, quotes and angle
/// brackets excluded.
fn find_targets(text: &str, kind: NoteKind) -> Vec<Target> {
    let mut targets = Vec::new();

    if kind == NoteKind::Markdown {
        for re in [&*RE_MD_INLINE, &*RE_MD_REFDEF] {
            for caps in re.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let s = m.as_str();
                if s.starts_with('<') && s.ends_with('>') && s.len() >= 2 {
                    targets.push(Target {
                        range: m.start() + 1..m.end() - 1,
                        syntax: Syntax::Angle,
                    });
                } else {
                    targets.push(Target {
                        range: m.range(),
                        syntax: Syntax::Markdown,
                    });
                }
            }
        }
    }

    for caps in RE_HTML_ATTR.captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        let s = m.as_str();
        let quoted = s.len() >= 2 && (s.starts_with('"') || s.starts_with('\''));
        let range = if quoted {
            m.start() + 1..m.end() - 1
        } else {
            m.range()
        };
        targets.push(Target {
            range,
            syntax: Syntax::Attribute,
        });
    }

    targets.sort_by_key(|t| t.range.start);
    targets
}

/// New text for one link target, or `None` when it stays as it is.
fn rewrite_target(
    raw: &str,
    syntax: Syntax,
    old_dir: &Path,
    new_dir: &Path,
    relocation: &Relocation,
) -> Option<String> {
    if !LinkKind::is_file_relative(raw) {
        return None;
    }
    let (raw_path, suffix) = split_suffix(raw);
    if raw_path.is_empty() {
        return None;
    }

    let unescaped = match syntax {
        Syntax::Attribute => unescape(raw_path),
        Syntax::Markdown | Syntax::Angle => raw_path.into(),
    };
    let decoded = percent_decode_str(&unescaped).decode_utf8_lossy();

    let old_target = clean_path(&old_dir.join(&*decoded));
    let new_target = relocation
        .relocate(&old_target)
        .unwrap_or_else(|| old_target.clone());

    if old_dir == new_dir && new_target == old_target {
        return None;
    }

    // Keep the author's style: literal spaces stay literal in markdown,
    // attributes are always percent-encoded.
    let encode = match syntax {
        Syntax::Attribute => true,
        Syntax::Markdown | Syntax::Angle => !raw_path.contains(' '),
    };
    let mut link = to_link(&relative_path(new_dir, &new_target), encode);
    if link.is_empty() {
        link.push('.');
    }
    if raw_path.ends_with('/') {
        link.push('/');
    }
    if syntax == Syntax::Attribute {
        link = escape(&link).into_owned();
    }
    link.push_str(suffix);

    (link != raw).then_some(link)
}
