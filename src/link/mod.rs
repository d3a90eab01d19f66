//! Link handling: compiled-link rewriting and source reference updates.

mod html;
mod references;
mod rewrite;

pub use html::rewrite_html;
pub use references::{Relocation, rewrite_references};
pub use rewrite::LinkRewriter;
