//! Link classification utilities.

/// Syntactic classification of links found in note markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// External link with URL scheme (https://, mailto:, file:, etc.)
    External(&'a str),
    /// Pure fragment/anchor link (#section). Value is anchor without `#`.
    Fragment(&'a str),
    /// Root-absolute path (/usr/share/doc, /notes/a.md).
    Absolute(&'a str),
    /// File-relative path (./image.png, ../other.md).
    FileRelative(&'a str),
}

impl<'a> LinkKind<'a> {
    /// Parse a link string into its syntactic kind.
    #[inline]
    pub fn parse(link: &'a str) -> Self {
        if is_external_link(link) {
            Self::External(link)
        } else if let Some(anchor) = link.strip_prefix('#') {
            Self::Fragment(anchor)
        } else if link.starts_with('/') {
            Self::Absolute(link)
        } else {
            Self::FileRelative(link)
        }
    }

    /// Check if link is file-relative, the only kind that gets rewritten.
    #[inline]
    pub fn is_file_relative(link: &str) -> bool {
        matches!(LinkKind::parse(link), LinkKind::FileRelative(_))
    }
}

/// Check whether a link starts with a URL scheme (`scheme:`).
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Split a link into its path and the `?query#fragment` suffix.
///
/// The suffix keeps its leading `?` or `#` so it can be re-attached verbatim.
///
/// ```ignore
/// assert_eq!(split_suffix("b.md#intro"), ("b.md", "#intro"));
/// assert_eq!(split_suffix("b.md"), ("b.md", ""));
/// ```
#[inline]
pub fn split_suffix(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(pos) => link.split_at(pos),
        None => (link, ""),
    }
}
