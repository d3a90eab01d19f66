//! Path mapping and classification for the notes tree.

mod classify;
mod fs;
mod mapper;
mod walk;

pub use fs::{clean_path, encode_segment, normalize_path, relative_path, to_link};
pub use mapper::{COMPILED_EXT, Crumb, LISTING_FILE, PathMapper};
pub use walk::{compiled_notes, indexable_notes};
