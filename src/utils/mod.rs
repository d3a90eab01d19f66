//! Small shared helpers.

pub mod date;
pub mod html;
mod plural;

pub use plural::plural_count;
