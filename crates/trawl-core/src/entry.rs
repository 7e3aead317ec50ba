//! Filesystem entries visited during a search.
//!
//! Every stat-backed query on [`Entry`] goes to the filesystem on its own
//! and can fail on its own. Nothing is cached, so a predicate that only
//! looks at the name never pays for a `stat` call.

use std::borrow::Cow;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(unix)]
use std::os::unix::fs::{FileTypeExt, MetadataExt};

use globset::GlobSet;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::SearchError;

/// Type of a filesystem entry, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Unix domain socket.
    Socket,
    /// Other file types (fifos, devices, etc.).
    Other,
}

impl EntryKind {
    fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            return Self::Directory;
        }
        if file_type.is_file() {
            return Self::File;
        }
        #[cfg(unix)]
        if file_type.is_socket() {
            return Self::Socket;
        }
        Self::Other
    }
}

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Last status change time (if available).
    pub changed: Option<SystemTime>,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    fn from_metadata(path: &Path, metadata: &Metadata) -> Result<Self, SearchError> {
        Ok(Self {
            modified: metadata.modified().map_err(|e| SearchError::io(path, e))?,
            accessed: metadata.accessed().ok(),
            changed: changed_time(metadata),
            created: metadata.created().ok(),
        })
    }
}

/// Full stat snapshot of an entry, attached to results when stats are
/// requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStats {
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Timestamps.
    pub timestamps: Timestamps,
    /// Permission bits (0 where unsupported).
    pub mode: u32,
    /// Inode number (0 where unsupported).
    pub inode: u64,
    /// Device ID (0 where unsupported).
    pub device: u64,
    /// Number of hard links (1 where unsupported).
    pub nlink: u64,
    /// Owner user ID (0 where unsupported).
    pub uid: u32,
    /// Owner group ID (0 where unsupported).
    pub gid: u32,
}

impl EntryStats {
    /// Build a snapshot from already-fetched metadata. Fails when the
    /// platform cannot report a modification time.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Result<Self, SearchError> {
        #[cfg(unix)]
        let (mode, inode, device, nlink, uid, gid) = (
            metadata.mode(),
            metadata.ino(),
            metadata.dev(),
            metadata.nlink(),
            metadata.uid(),
            metadata.gid(),
        );
        #[cfg(not(unix))]
        let (mode, inode, device, nlink, uid, gid) = (0, 0, 0, 1, 0, 0);

        Ok(Self {
            kind: EntryKind::from_metadata(metadata),
            size: metadata.len(),
            timestamps: Timestamps::from_metadata(path, metadata)?,
            mode,
            inode,
            device,
            nlink,
            uid,
            gid,
        })
    }
}

/// A single file or directory reached from a search root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    path: PathBuf,
    depth: u32,
}

impl Entry {
    /// Create an entry at the given depth below its root.
    pub fn new(path: impl Into<PathBuf>, depth: u32) -> Self {
        Self {
            path: path.into(),
            depth,
        }
    }

    /// Create the entry for a search root (depth 0).
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self::new(path, 0)
    }

    /// Full path of this entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the entry, returning its path.
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Final path component, or the whole path when there is none.
    pub fn name(&self) -> Cow<'_, str> {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.path.to_string_lossy(),
        }
    }

    /// Number of directory levels between the root and this entry.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Fetch metadata, following symlinks.
    pub fn metadata(&self) -> Result<Metadata, SearchError> {
        std::fs::metadata(&self.path).map_err(|e| SearchError::io(&self.path, e))
    }

    /// Whether this entry is a directory (following symlinks).
    pub fn is_dir(&self) -> Result<bool, SearchError> {
        Ok(self.metadata()?.is_dir())
    }

    /// Async variant of [`Entry::is_dir`].
    pub async fn is_dir_async(&self) -> Result<bool, SearchError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| SearchError::io(&self.path, e))?;
        Ok(metadata.is_dir())
    }

    /// Whether this entry is hidden.
    ///
    /// On Unix this is a dot-prefixed name. On Windows the hidden file
    /// attribute is consulted as well, which needs a stat call.
    pub fn is_hidden(&self) -> Result<bool, SearchError> {
        let dotted = self
            .path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));

        #[cfg(windows)]
        {
            use std::os::windows::fs::MetadataExt;
            const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
            if !dotted {
                return Ok(self.metadata()?.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0);
            }
        }

        Ok(dotted)
    }

    /// Whether this entry is a Unix domain socket.
    pub fn is_socket(&self) -> Result<bool, SearchError> {
        Ok(EntryKind::from_metadata(&self.metadata()?) == EntryKind::Socket)
    }

    /// Size in bytes.
    pub fn size(&self) -> Result<u64, SearchError> {
        Ok(self.metadata()?.len())
    }

    /// Last modification time.
    pub fn modified(&self) -> Result<SystemTime, SearchError> {
        self.metadata()?
            .modified()
            .map_err(|e| SearchError::io(&self.path, e))
    }

    /// Last access time.
    pub fn accessed(&self) -> Result<SystemTime, SearchError> {
        self.metadata()?
            .accessed()
            .map_err(|e| SearchError::io(&self.path, e))
    }

    /// Last status change time. Falls back to the modification time on
    /// platforms without a ctime.
    pub fn changed(&self) -> Result<SystemTime, SearchError> {
        let metadata = self.metadata()?;
        match changed_time(&metadata) {
            Some(time) => Ok(time),
            None => metadata
                .modified()
                .map_err(|e| SearchError::io(&self.path, e)),
        }
    }

    /// Whether the entry name matches any pattern in the set.
    pub fn matches_glob(&self, globs: &GlobSet) -> bool {
        globs.is_match(self.name().as_ref())
    }

    /// Full stat snapshot.
    pub fn stats(&self) -> Result<EntryStats, SearchError> {
        EntryStats::from_metadata(&self.path, &self.metadata()?)
    }

    /// List the immediate children of this directory, sorted by name.
    pub fn list_children(&self) -> Result<Vec<Entry>, SearchError> {
        let reader = std::fs::read_dir(&self.path).map_err(|e| SearchError::io(&self.path, e))?;

        let mut children = Vec::new();
        for item in reader {
            let item = item.map_err(|e| SearchError::io(&self.path, e))?;
            children.push(Entry::new(item.path(), self.depth + 1));
        }
        children.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

        Ok(children)
    }

    /// Async variant of [`Entry::list_children`].
    pub async fn list_children_async(&self) -> Result<Vec<Entry>, SearchError> {
        let mut reader = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| SearchError::io(&self.path, e))?;

        let mut children = Vec::new();
        while let Some(item) = reader
            .next_entry()
            .await
            .map_err(|e| SearchError::io(&self.path, e))?
        {
            children.push(Entry::new(item.path(), self.depth + 1));
        }
        children.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

        Ok(children)
    }
}

#[cfg(unix)]
fn changed_time(metadata: &Metadata) -> Option<SystemTime> {
    let secs = u64::try_from(metadata.ctime()).ok()?;
    let nanos = u32::try_from(metadata.ctime_nsec()).ok()?;
    SystemTime::UNIX_EPOCH.checked_add(std::time::Duration::new(secs, nanos))
}

#[cfg(not(unix))]
fn changed_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}
