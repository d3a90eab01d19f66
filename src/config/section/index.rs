//! `[index]` section configuration.
//!
//! ```toml
//! [index]
//! dir = ".searchindex"
//! extensions = ["md", "html", "txt", "pdf"]
//! pdftotext = "/usr/bin/pdftotext"   # Default: looked up on PATH
//! writer_memory = 50000000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSectionConfig {
    /// Index directory name under the notes root.
    pub dir: String,

    /// Extensions (without dot) whose notes are indexed.
    pub extensions: Vec<String>,

    /// Explicit `pdftotext` executable.
    pub pdftotext: Option<PathBuf>,

    /// Writer heap budget in bytes.
    pub writer_memory: usize,
}

impl Default for IndexSectionConfig {
    fn default() -> Self {
        Self {
            dir: ".searchindex".to_string(),
            extensions: ["md", "html", "txt", "pdf"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            pdftotext: None,
            writer_memory: 50_000_000,
        }
    }
}
