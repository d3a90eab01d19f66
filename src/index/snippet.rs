//! Search result snippets.

/// Marker placed where a snippet was cut.
const ELLIPSIS: &str = "...";

/// Up to `max_chars` characters of `text` around the first query term.
///
/// Falls back to the start of the text when no term occurs in it.
pub fn extract_snippet(text: &str, query: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.is_empty() || max_chars == 0 {
        return String::new();
    }

    let lower: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    let chars: Vec<char> = text.chars().collect();
    // Lowercasing can change the length; only trust positions when it does not.
    let first_hit = if lower.len() == chars.len() {
        query
            .split_whitespace()
            .map(|term| term.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|term| !term.is_empty())
            .filter_map(|term| {
                let needle: Vec<char> = term.chars().flat_map(char::to_lowercase).collect();
                lower.windows(needle.len()).position(|w| w == needle.as_slice())
            })
            .min()
    } else {
        None
    };

    let start = first_hit.map_or(0, |pos| pos.saturating_sub(max_chars / 3));
    let end = (start + max_chars).min(chars.len());
    let body: String = chars[start..end].iter().collect::<String>();
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut snippet = String::with_capacity(body.len() + 2 * ELLIPSIS.len());
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&body);
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}
