//! Conversion of matched entries into results.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use trawl_core::{Entry, EntryStats, SearchError};

/// A search result: a bare path, or a path with its stat snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Match {
    /// Path only.
    Path(PathBuf),
    /// Path plus stats.
    WithStats { path: PathBuf, stats: EntryStats },
}

impl Match {
    /// Path of the matched entry.
    pub fn path(&self) -> &Path {
        match self {
            Self::Path(path) | Self::WithStats { path, .. } => path,
        }
    }

    /// Stats, when they were requested.
    pub fn stats(&self) -> Option<&EntryStats> {
        match self {
            Self::Path(_) => None,
            Self::WithStats { stats, .. } => Some(stats),
        }
    }

    /// Consume the result, returning its path.
    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Path(path) | Self::WithStats { path, .. } => path,
        }
    }
}

/// Shapes matched entries. Only entries that already passed filtering
/// reach the formatter, so stats are never fetched for rejected ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFormatter {
    include_stats: bool,
}

impl ResultFormatter {
    /// Create a formatter.
    pub fn new(include_stats: bool) -> Self {
        Self { include_stats }
    }

    /// Format one matched entry.
    pub fn format(&self, entry: Entry) -> Result<Match, SearchError> {
        if !self.include_stats {
            return Ok(Match::Path(entry.into_path()));
        }
        let stats = entry.stats()?;
        Ok(Match::WithStats {
            path: entry.into_path(),
            stats,
        })
    }

    /// Format all matches in order, failing on the first stat error.
    pub fn format_all(&self, entries: Vec<Entry>) -> Result<Vec<Match>, SearchError> {
        entries.into_iter().map(|entry| self.format(entry)).collect()
    }
}
