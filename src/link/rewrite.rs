//! Relative link rewriting for compiled notes.
//!
//! A compiled note lives in the build tree, but the resources it links to
//! (images, PDFs, HTML pages) stay in the live notes tree. Every relative
//! link therefore gets a prefix that climbs out of the build tree back to
//! the note's source directory, except markdown links, which point at
//! another compiled note next to this one.
//!
//! | link in `book/a.md` | compiled link |
//! |---------------------|---------------|
//! | `https://x.org`     | unchanged |
//! | `#intro`, `/abs`    | unchanged |
//! | `b.md#intro`        | `b.html#intro` |
//! | `img.png`           | `../../book/img.png` |
//! | `page.html`         | `../../book/page.html` |

use std::borrow::Cow;
use std::path::Path;

use crate::core::link::split_suffix;
use crate::core::{LinkKind, NoteKind};
use crate::path::{COMPILED_EXT, PathMapper};

#[derive(Debug, Clone)]
pub struct LinkRewriter {
    base: String,
}

impl LinkRewriter {
    /// Rewriter for the note at `source`.
    pub fn for_note(mapper: &PathMapper, source: &Path) -> Self {
        Self {
            base: mapper.link_base(source),
        }
    }

    /// Prefix applied to links that resolve back into the source tree.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rewrite<'a>(&self, link: &'a str) -> Cow<'a, str> {
        if !matches!(LinkKind::parse(link), LinkKind::FileRelative(_)) {
            return Cow::Borrowed(link);
        }

        let trimmed = link.strip_prefix("./").unwrap_or(link);
        let (path, suffix) = split_suffix(trimmed);
        if path.is_empty() {
            return Cow::Borrowed(link);
        }

        match NoteKind::from_path(Path::new(path)) {
            Some(NoteKind::Markdown) => {
                let stem = path.rsplit_once('.').map_or(path, |(stem, _)| stem);
                Cow::Owned(format!("{stem}.{COMPILED_EXT}{suffix}"))
            }
            _ => Cow::Owned(format!("{}{trimmed}", self.base)),
        }
    }
}
