//! Page templates for compiled notes and notebook listings.
//!
//! A template is plain HTML with `{{ name }}` placeholders. Substitution is
//! single-pass, so placeholder-like text inside a note's own content is
//! left alone. Unknown placeholders are kept verbatim.

use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use super::listing::Listing;
use crate::error::{SyncError, SyncResult};
use crate::path::{Crumb, encode_segment};
use crate::utils::html::escape;

const NOTE_TEMPLATE: &str = include_str!("templates/note.html");
const NOTEBOOK_TEMPLATE: &str = include_str!("templates/notebook.html");

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").unwrap());

#[derive(Debug, Clone)]
pub struct Templates {
    note: String,
    notebook: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            note: NOTE_TEMPLATE.to_string(),
            notebook: NOTEBOOK_TEMPLATE.to_string(),
        }
    }
}

impl Templates {
    /// Built-in templates, overridden per file by `note.html` /
    /// `notebook.html` in `dir` when present.
    pub fn load(dir: Option<&Path>) -> SyncResult<Self> {
        let mut templates = Self::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };
        for (name, slot) in [
            ("note.html", &mut templates.note),
            ("notebook.html", &mut templates.notebook),
        ] {
            let path = dir.join(name);
            if path.is_file() {
                *slot = fs::read_to_string(&path).map_err(|e| SyncError::read(&path, e))?;
            }
        }
        Ok(templates)
    }

    pub fn render_note(&self, title: &str, crumbs: &[Crumb], content: &str) -> String {
        let crumbs = render_crumbs(crumbs);
        fill(&self.note, |name| match name {
            "title" => Some(escape(title).into_owned()),
            "crumbs" => Some(crumbs.clone()),
            "content" => Some(content.to_string()),
            _ => None,
        })
    }

    pub fn render_notebook(&self, title: &str, crumbs: &[Crumb], listing: &Listing) -> String {
        let crumbs = render_crumbs(crumbs);
        fill(&self.notebook, |name| match name {
            "title" => Some(escape(title).into_owned()),
            "crumbs" => Some(crumbs.clone()),
            "notebooks" => Some(render_notebooks(listing)),
            "notes" => Some(render_notes(listing)),
            _ => None,
        })
    }
}

fn fill<F>(template: &str, value: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            value(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn render_crumbs(crumbs: &[Crumb]) -> String {
    let parts: Vec<String> = crumbs
        .iter()
        .map(|crumb| {
            let label = escape(&crumb.label);
            match &crumb.href {
                Some(href) => format!(r#"<a href="{}">{label}</a>"#, escape(href)),
                None => format!("<span>{label}</span>"),
            }
        })
        .collect();
    format!(r#"<nav class="crumbs">{}</nav>"#, parts.join(" / "))
}

fn render_notebooks(listing: &Listing) -> String {
    listing
        .notebooks
        .iter()
        .map(|name| {
            format!(
                r#"    <li class="notebook"><a href="{}/index.html">{}</a></li>"#,
                escape(&encode_segment(name)),
                escape(name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_notes(listing: &Listing) -> String {
    listing
        .notes
        .iter()
        .map(|note| {
            format!(
                r#"    <li class="note"><a href="{}">{}</a></li>"#,
                escape(&encode_segment(&note.file)),
                escape(&note.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
