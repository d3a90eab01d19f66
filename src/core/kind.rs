//! Note kinds recognized by extension.

use std::path::Path;

/// The kind of content file a note is.
///
/// Markdown and HTML notes are compiled into the build tree; every kind
/// can be indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Markdown,
    Html,
    Text,
    Pdf,
}

impl NoteKind {
    /// All known kinds, in listing order.
    pub const ALL: [Self; 4] = [Self::Markdown, Self::Html, Self::Text, Self::Pdf];

    /// Resolve a kind from a bare extension (without the dot), case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Resolve a kind from a path's extension.
    #[inline]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether this kind gets a compiled artifact in the build tree.
    #[inline]
    pub const fn is_compiled(self) -> bool {
        matches!(self, Self::Markdown | Self::Html)
    }

    /// Short name used in logs and progress counters.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(NoteKind::from_extension("md"), Some(NoteKind::Markdown));
        assert_eq!(NoteKind::from_extension("MD"), Some(NoteKind::Markdown));
        assert_eq!(NoteKind::from_extension("htm"), Some(NoteKind::Html));
        assert_eq!(NoteKind::from_extension("pdf"), Some(NoteKind::Pdf));
        assert_eq!(NoteKind::from_extension("png"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            NoteKind::from_path(Path::new("/notes/a cool note.md")),
            Some(NoteKind::Markdown)
        );
        assert_eq!(NoteKind::from_path(Path::new("/notes/README")), None);
    }

    #[test]
    fn test_is_compiled() {
        assert!(NoteKind::Markdown.is_compiled());
        assert!(NoteKind::Html.is_compiled());
        assert!(!NoteKind::Text.is_compiled());
        assert!(!NoteKind::Pdf.is_compiled());
    }
}
