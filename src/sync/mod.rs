//! Incremental sync: filesystem events in, build tree and index updates out.

mod event;
mod handler;
mod notifier;

pub use event::FsEvent;
pub use handler::ChangeHandler;
pub use notifier::{LogNotifier, Notifier};

#[cfg(test)]
mod tests;
