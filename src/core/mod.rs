//! Core types shared across the sync engine.

mod kind;
pub mod link;
mod state;

pub use kind::NoteKind;
pub use link::LinkKind;
pub use state::{is_shutdown, register_shutdown, setup_shutdown_handler};
