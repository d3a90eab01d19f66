//! Markdown rendering with pulldown-cmark.

use pulldown_cmark::{Event, Options, Parser, TagEnd, html};

use crate::config::section::MarkdownConfig;
use crate::utils::html::html_text;

/// Options for markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
    /// Enable heading attributes extension (e.g., `# Heading {#custom-id}`)
    pub heading_attributes: bool,
}

impl From<&MarkdownConfig> for MarkdownOptions {
    fn from(config: &MarkdownConfig) -> Self {
        Self {
            tables: config.tables,
            footnotes: config.footnotes,
            strikethrough: config.strikethrough,
            task_lists: config.task_lists,
            heading_attributes: config.heading_attributes,
        }
    }
}

impl MarkdownOptions {
    /// Convert to pulldown-cmark Options
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.heading_attributes {
            opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        opts
    }

    /// Render markdown to an HTML fragment.
    pub fn to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.to_pulldown_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }

    /// Visible text of a markdown document, one line per block.
    ///
    /// Block HTML embedded in the markdown contributes its text content;
    /// inline tags are dropped and the text between them kept.
    pub fn to_plain_text(&self, markdown: &str) -> String {
        let mut out = String::with_capacity(markdown.len());
        // Block HTML arrives split into several events; strip it as a whole
        let mut raw_html = String::new();
        for event in Parser::new_ext(markdown, self.to_pulldown_options()) {
            if let Event::Html(html) = &event {
                raw_html.push_str(html);
                continue;
            }
            flush_html(&mut raw_html, &mut out);
            match event {
                Event::Text(text) | Event::Code(text) => out.push_str(&text),
                Event::InlineMath(math) | Event::DisplayMath(math) => out.push_str(&math),
                Event::SoftBreak | Event::HardBreak => out.push(' '),
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::CodeBlock
                    | TagEnd::HtmlBlock
                    | TagEnd::TableCell
                    | TagEnd::TableRow,
                ) => out.push('\n'),
                _ => {}
            }
        }
        flush_html(&mut raw_html, &mut out);
        out.trim().to_string()
    }
}

fn flush_html(raw_html: &mut String, out: &mut String) {
    if !raw_html.is_empty() {
        out.push_str(&html_text(raw_html));
        raw_html.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> MarkdownOptions {
        MarkdownOptions::from(&MarkdownConfig::default())
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(options().to_html("a changed note").trim(), "<p>a changed note</p>");
    }

    #[test]
    fn test_links_kept_verbatim() {
        let html = options().to_html("[next](other%20note.md) ![img](pic.png)");
        assert!(html.contains(r#"href="other%20note.md""#));
        assert!(html.contains(r#"src="pic.png""#));
    }

    #[test]
    fn test_tables_follow_options() {
        let table = "| a | b |\n|---|---|\n| 1 | 2 |";
        assert!(options().to_html(table).contains("<table>"));
        let plain = MarkdownOptions::default();
        assert!(!plain.to_html(table).contains("<table>"));
    }

    #[test]
    fn test_plain_text() {
        let text = options().to_plain_text("# Title\n\nsome *emphasis* and `code`\n\n- one\n- two");
        assert_eq!(text, "Title\nsome emphasis and code\none\ntwo");
    }

    #[test]
    fn test_plain_text_keeps_html_text() {
        let text = options().to_plain_text(
            "<div class=\"callout\">zebra migration notes</div>\n\nintro with <b>bold</b> words",
        );
        assert_eq!(text, "zebra migration notes\nintro with bold words");
    }

    #[test]
    fn test_plain_text_skips_scripts() {
        assert_eq!(options().to_plain_text("<script>\nlet a = 1;\n</script>\n\ntext"), "text");
    }
}
