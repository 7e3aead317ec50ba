//! Recursive traversal of a single root.
//!
//! The blocking and async walks share the same pruning, tracking and
//! filtering rules and produce the same entries in the same order:
//! children are visited in name order, files of a subtree appear where
//! the subtree's directory appears among its siblings.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use trawl_core::{Entry, Predicate, SearchConfig, SearchError};

/// Directory listings the async walk keeps open at once, across all
/// clones of a walker.
const MAX_OPEN_LISTINGS: usize = 64;

/// Walks roots, applying depth and hidden-directory pruning and the
/// effective predicate.
#[derive(Clone)]
pub struct Walker {
    max_depth: Option<u32>,
    ignore_hidden_dirs: bool,
    directories_only: bool,
    predicate: Predicate,
    listings: Arc<Semaphore>,
}

/// What a directory subtree contributed.
#[derive(Debug, Default)]
struct Walked {
    files: Vec<Entry>,
    dirs: Vec<Entry>,
}

impl Walked {
    fn extend(&mut self, other: Walked) {
        self.files.extend(other.files);
        self.dirs.extend(other.dirs);
    }
}

/// How a listed child is handled.
enum Classified {
    Directory(Entry),
    File(Entry),
}

impl Walker {
    /// Create a walker for the given configuration and effective predicate.
    pub fn new(config: &SearchConfig, predicate: Predicate) -> Self {
        Self::with_listing_limit(config, predicate, MAX_OPEN_LISTINGS)
    }

    /// Like [`Walker::new`], with at most `limit` directory listings in
    /// flight during async walks.
    pub fn with_listing_limit(config: &SearchConfig, predicate: Predicate, limit: usize) -> Self {
        Self {
            max_depth: config.max_depth,
            ignore_hidden_dirs: config.ignore_hidden_dirs,
            directories_only: config.directories_only,
            predicate,
            listings: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Whether the walker returns directories instead of files.
    pub fn directories_only(&self) -> bool {
        self.directories_only
    }

    /// Walk one root with blocking calls.
    pub fn walk_sync(&self, root: Entry) -> Result<Vec<Entry>, SearchError> {
        debug!(root = %root.path().display(), "walking root");
        let mut walked = Walked::default();
        self.visit_sync(root, &mut walked)?;
        self.finish(walked)
    }

    /// Walk one root, awaiting each directory listing before descending.
    /// Sibling subdirectories are walked concurrently, but only a bounded
    /// number of listings are open at any time.
    pub async fn walk(&self, root: Entry) -> Result<Vec<Entry>, SearchError> {
        debug!(root = %root.path().display(), "walking root");
        let walked = self.visit(root).await?;
        self.finish(walked)
    }

    fn finish(&self, walked: Walked) -> Result<Vec<Entry>, SearchError> {
        if !self.directories_only {
            return Ok(walked.files);
        }
        let mut matched = Vec::new();
        for dir in walked.dirs {
            if (self.predicate)(&dir)? {
                matched.push(dir);
            }
        }
        Ok(matched)
    }

    /// Prune decision for a directory. The root itself is never pruned.
    fn is_pruned(&self, dir: &Entry) -> Result<bool, SearchError> {
        if dir.depth() == 0 {
            return Ok(false);
        }
        if self.max_depth.is_some_and(|max| dir.depth() > max) {
            trace!(dir = %dir.path().display(), "pruned by depth");
            return Ok(true);
        }
        if self.ignore_hidden_dirs && dir.is_hidden()? {
            trace!(dir = %dir.path().display(), "pruned hidden directory");
            return Ok(true);
        }
        Ok(false)
    }

    fn should_track(&self, dir: &Entry) -> bool {
        self.directories_only && dir.depth() > 0
    }

    fn keep_file(&self, file: &Entry) -> Result<bool, SearchError> {
        (self.predicate)(file)
    }

    fn visit_sync(&self, dir: Entry, walked: &mut Walked) -> Result<(), SearchError> {
        if self.is_pruned(&dir)? {
            return Ok(());
        }
        trace!(dir = %dir.path().display(), "listing");
        let children = dir.list_children()?;
        if self.should_track(&dir) {
            walked.dirs.push(dir);
        }

        for child in children {
            match classify(child, child_is_dir_sync) {
                Classified::Directory(sub) => self.visit_sync(sub, walked)?,
                Classified::File(file) => {
                    if self.keep_file(&file)? {
                        walked.files.push(file);
                    }
                }
            }
        }
        Ok(())
    }

    fn visit(&self, dir: Entry) -> BoxFuture<'_, Result<Walked, SearchError>> {
        async move {
            let mut walked = Walked::default();
            if self.is_pruned(&dir)? {
                return Ok(walked);
            }
            trace!(dir = %dir.path().display(), "listing");
            let children = {
                let _permit = self.listings.acquire().await.map_err(|e| SearchError::TaskFailed {
                    message: e.to_string(),
                })?;
                dir.list_children_async().await?
            };
            if self.should_track(&dir) {
                walked.dirs.push(dir);
            }

            let parts = future::try_join_all(children.into_iter().map(|child| async move {
                let is_dir = child.is_dir_async().await;
                match classify(child, |_| is_dir) {
                    Classified::Directory(sub) => self.visit(sub).await,
                    Classified::File(file) => {
                        let mut part = Walked::default();
                        if self.keep_file(&file)? {
                            part.files.push(file);
                        }
                        Ok(part)
                    }
                }
            }))
            .await?;

            for part in parts {
                walked.extend(part);
            }
            Ok(walked)
        }
        .boxed()
    }
}

fn child_is_dir_sync(child: &Entry) -> Result<bool, SearchError> {
    child.is_dir()
}

/// Decide whether a child is descended into. A failed type check is the
/// one failure absorbed here: the child is handled as a file.
fn classify<F>(child: Entry, is_dir: F) -> Classified
where
    F: FnOnce(&Entry) -> Result<bool, SearchError>,
{
    match is_dir(&child) {
        Ok(true) => Classified::Directory(child),
        Ok(false) => Classified::File(child),
        Err(err) => {
            trace!(path = %child.path().display(), %err, "type check failed, treating as file");
            Classified::File(child)
        }
    }
}
