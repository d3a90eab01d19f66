//! Configuration sections of `folio.toml`.

mod build;
mod index;
mod notes;
mod watch;

pub use build::{BuildSectionConfig, MarkdownConfig};
pub use index::IndexSectionConfig;
pub use notes::{DEFAULT_EXCLUDES, NotesSectionConfig};
pub use watch::WatchSectionConfig;
