//! Path normalization utilities.
//!
//! - `normalize_path`: absolute, symlink-resolved form that also works for
//!   paths that no longer exist (deleted or moved-away notes)
//! - `clean_path`: lexical `.`/`..` collapse, no I/O
//! - `relative_path` / `to_link`: relative URL paths between two locations

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::path::{Component, Path, PathBuf};

/// Characters escaped inside a single link path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalize a file system path to absolute form.
///
/// The parent directory is canonicalized (the nearest existing ancestor if
/// the parent itself is gone) and the remaining components are re-appended,
/// so a deleted note still maps to the same key it had while it existed.
/// The final component is never resolved, so a symlinked note keeps its own
/// path.
///
/// ```ignore
/// let abs = normalize_path(Path::new("./notes/a.md"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let cleaned = clean_path(&absolute);

    let Some(name) = cleaned.file_name() else {
        return cleaned.canonicalize().unwrap_or(cleaned);
    };

    let mut tail = vec![name.to_os_string()];
    let mut dir = cleaned.parent();
    while let Some(current) = dir {
        if let Ok(mut base) = current.canonicalize() {
            base.extend(tail.iter().rev());
            return base;
        }
        if let Some(name) = current.file_name() {
            tail.push(name.to_os_string());
        }
        dir = current.parent();
    }
    cleaned
}

/// Collapse `.` and `..` components and repeated separators lexically.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path from directory `from_dir` to `to`. Both must be absolute
/// and clean.
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component.as_os_str());
    }
    out
}

/// Render a relative path as a `/`-separated link, percent-encoding each
/// segment when `encode` is set.
pub fn to_link(path: &Path, encode: bool) -> String {
    path.components()
        .map(|c| {
            let segment = c.as_os_str().to_string_lossy();
            if encode {
                encode_segment(&segment)
            } else {
                segment.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode one link path segment.
#[inline]
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// String form of a directory path with exactly one trailing separator.
pub fn with_trailing_separator(path: &Path) -> String {
    let mut s = path.to_string_lossy().into_owned();
    while s.len() > 1 && s.ends_with(std::path::MAIN_SEPARATOR) {
        s.pop();
    }
    if !s.ends_with(std::path::MAIN_SEPARATOR) {
        s.push(std::path::MAIN_SEPARATOR);
    }
    s
}
