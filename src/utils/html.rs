//! HTML entity escaping for template output and attribute values, and
//! text extraction from markup.

use std::borrow::Cow;

/// Longest entity name we try to decode (`&thetasym;` is 8).
const MAX_ENTITY_LEN: usize = 10;

#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters. Borrows when nothing needs escaping.
///
/// ```ignore
/// assert_eq!(escape("<b>"), "&lt;b&gt;");
/// ```
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Decode the common named entities and numeric references.
///
/// Unknown or unterminated references are kept verbatim.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let decoded = rest[1..]
            .find(';')
            .filter(|end| *end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&rest[1..=end]).map(|c| (c, end + 2)));

        match decoded {
            Some((c, consumed)) => {
                result.push(c);
                rest = &rest[consumed..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        s => {
            let num = s.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ============================================================================
// Text extraction
// ============================================================================

/// Elements whose text is never content.
const SKIPPED: &[&str] = &["script", "style", "head", "template", "noscript"];

/// Elements that end a line of text.
const BLOCKS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote",
    "section", "article", "table", "ul", "ol", "title",
];

/// Visible text of an HTML document, one line per block.
pub fn html_text(html: &str) -> String {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return html.trim().to_string();
    };
    let parser = dom.parser();
    let mut out = String::with_capacity(html.len() / 2);
    for handle in dom.children() {
        collect_text(*handle, parser, &mut out);
    }

    out.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(handle: tl::NodeHandle, parser: &tl::Parser, out: &mut String) {
    let Some(node) = handle.get(parser) else {
        return;
    };
    match node {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            if SKIPPED.contains(&name.as_str()) {
                return;
            }
            for child in tag.children().top().iter() {
                collect_text(*child, parser, out);
            }
            if BLOCKS.contains(&name.as_str()) {
                out.push('\n');
            }
        }
        tl::Node::Raw(bytes) => {
            out.push_str(&unescape(&bytes.as_utf8_str()));
        }
        tl::Node::Comment(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &amp; b"), "a & b");
        assert_eq!(unescape("&lt;p&gt;"), "<p>");
        assert_eq!(unescape("&#39;&#x41;"), "'A");
        assert_eq!(unescape("fish & chips"), "fish & chips");
        assert_eq!(unescape("&unknown;"), "&unknown;");
        assert_eq!(unescape("trailing &"), "trailing &");
    }

    #[test]
    fn test_html_text() {
        let html = "<html><head><title>x</title><style>p{}</style></head>\
                    <body><h1>Title</h1><p>one &amp; <b>two</b></p>\
                    <script>var a = 1;</script><!-- note --></body></html>";
        assert_eq!(html_text(html), "Title\none & two");
    }
}
