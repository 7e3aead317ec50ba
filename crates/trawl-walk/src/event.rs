//! Search lifecycle notifications.

use std::path::PathBuf;

use tokio::sync::mpsc;

/// A lifecycle notification emitted by [`Finder::find_observed`].
///
/// For one run: zero or more `Match`, at most one `Error`, then exactly
/// one `End`.
///
/// [`Finder::find_observed`]: crate::Finder::find_observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// A file matched. Sent per root once the root's walk completes, and
    /// never in directory-only mode.
    Match(PathBuf),
    /// The run failed.
    Error(String),
    /// The run is over.
    End,
}

/// Optional event sink. A dropped receiver is ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Notifier<'a> {
    tx: Option<&'a mpsc::UnboundedSender<SearchEvent>>,
}

impl<'a> Notifier<'a> {
    pub(crate) fn new(tx: Option<&'a mpsc::UnboundedSender<SearchEvent>>) -> Self {
        Self { tx }
    }

    pub(crate) fn emit(&self, event: SearchEvent) {
        if let Some(tx) = self.tx {
            let _ = tx.send(event);
        }
    }
}
