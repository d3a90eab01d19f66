//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! dir = ".build"              # Compiled mirror, inside the notes root
//! templates = "templates"     # Optional dir with note.html / notebook.html
//!
//! [build.markdown]
//! tables = true
//! footnotes = true
//! strikethrough = true
//! task_lists = true
//! heading_attributes = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Build directory name under the notes root.
    pub dir: String,

    /// Directory holding custom `note.html` / `notebook.html` templates.
    pub templates: Option<PathBuf>,

    /// Markdown extensions.
    pub markdown: MarkdownConfig,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            dir: ".build".to_string(),
            templates: None,
            markdown: MarkdownConfig::default(),
        }
    }
}

/// `[build.markdown]` extension switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub task_lists: bool,
    pub heading_attributes: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            heading_attributes: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.dir, ".build");
        assert!(config.build.templates.is_none());
        assert!(config.build.markdown.tables);
        assert!(!config.build.markdown.heading_attributes);
    }

    #[test]
    fn test_build_markdown_override() {
        let config = test_parse_config("[build.markdown]\ntables = false");
        assert!(!config.build.markdown.tables);
        assert!(config.build.markdown.footnotes);
    }
}
