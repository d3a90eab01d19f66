//! Command-line interface module.

mod args;
pub mod build;
mod common;
pub mod search;
pub mod watch;

pub use args::{Cli, Commands, SearchArgs};
