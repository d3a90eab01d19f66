//! Plain-text extraction for indexing.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::build::MarkdownOptions;
use crate::core::NoteKind;
use crate::error::{SyncError, SyncResult};
use crate::utils::html::html_text;

/// Turns a note into the plain text stored as its document content.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, kind: NoteKind) -> SyncResult<String>;
}

/// Markdown is rendered and stripped, HTML stripped, text kept verbatim,
/// PDFs run through `pdftotext`.
#[derive(Debug, Clone)]
pub struct DefaultExtractor {
    markdown: MarkdownOptions,
    pdftotext: Option<PathBuf>,
}

impl DefaultExtractor {
    /// `pdftotext` falls back to a PATH lookup when not configured.
    pub fn new(markdown: MarkdownOptions, pdftotext: Option<PathBuf>) -> Self {
        let pdftotext = pdftotext.or_else(|| which::which("pdftotext").ok());
        Self {
            markdown,
            pdftotext,
        }
    }

    fn pdf_text(&self, path: &Path) -> SyncResult<String> {
        let Some(program) = &self.pdftotext else {
            return Err(SyncError::extraction(path, "pdftotext not found"));
        };
        let output = Command::new(program)
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| SyncError::extraction(path, format!("{}: {e}", program.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SyncError::extraction(
                path,
                format!("pdftotext exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl TextExtractor for DefaultExtractor {
    fn extract(&self, path: &Path, kind: NoteKind) -> SyncResult<String> {
        if kind == NoteKind::Pdf {
            return self.pdf_text(path);
        }
        let bytes = fs::read(path).map_err(|e| SyncError::read(path, e))?;
        let raw = String::from_utf8_lossy(&bytes);
        Ok(match kind {
            NoteKind::Markdown => self.markdown.to_plain_text(&raw),
            NoteKind::Html => html_text(&raw),
            _ => raw.trim().to_string(),
        })
    }
}
