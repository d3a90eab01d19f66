//! Refresh signal for whatever displays the build tree.

use crate::debug;

/// Told after every event that changed the build tree or the index.
/// Fire-and-forget: a notifier never fails the sync.
pub trait Notifier: Send {
    fn refresh(&self);
}

/// Notifier that only leaves a trace in the verbose log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn refresh(&self) {
        debug!("watch"; "refresh");
    }
}
