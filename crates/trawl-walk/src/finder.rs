//! Fluent search builder and controller.

use std::path::PathBuf;

use futures::future;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use trawl_core::filter::{self, Predicate, negate, predicate};
use trawl_core::{ConfigError, Entry, FilterChain, SearchConfig, SearchError, TimeField};

use crate::engine::Walker;
use crate::event::{Notifier, SearchEvent};
use crate::format::{Match, ResultFormatter};
use crate::resolver::PathResolver;

/// A configured search. Every builder call consumes and returns the
/// finder; running it only borrows, so one finder can be run repeatedly
/// and each run composes its own effective predicate.
///
/// Invalid expressions and patterns do not fail the builder call. The
/// first one is kept and returned by the next run, before any filesystem
/// access.
///
/// ```rust,no_run
/// use trawl_walk::Finder;
///
/// let matches = Finder::new()
///     .path("/var/log")
///     .ext(["log"])
///     .size(">1mb")
///     .find_sync()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Finder {
    config: SearchConfig,
    filters: FilterChain,
    config_error: Option<ConfigError>,
}

impl Finder {
    /// Create a finder over the current directory with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a finder from an existing configuration.
    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Current filter chain.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Add a root.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.roots.push(path.into());
        self
    }

    /// Add several roots.
    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.roots.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Limit how many directory levels below each root are searched.
    /// `0` searches only the roots' direct children.
    pub fn depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = Some(max_depth);
        self
    }

    /// Exclude hidden files from the results.
    pub fn ignore_hidden_files(self) -> Self {
        self.add_predicate(negate(filter::hidden()))
    }

    /// Do not descend into hidden directories.
    pub fn ignore_hidden_dirs(mut self) -> Self {
        self.config.ignore_hidden_dirs = true;
        self
    }

    /// Attach stats to every result.
    pub fn include_stats(mut self) -> Self {
        self.config.include_stats = true;
        self
    }

    /// Return directories instead of files.
    pub fn directories(mut self) -> Self {
        self.config.directories_only = true;
        self
    }

    /// Match Unix domain sockets only.
    pub fn socket(self) -> Self {
        self.add_predicate(filter::socket())
    }

    /// Match names ending in any of the extensions (leading dot optional).
    pub fn ext<I, S>(self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_predicate(filter::extension(extensions))
    }

    /// Match sizes satisfying an expression such as `"<10kb"`.
    pub fn size(self, expression: &str) -> Self {
        self.add_checked(filter::size(expression))
    }

    /// Match zero-byte entries.
    pub fn empty(self) -> Self {
        self.add_predicate(filter::empty())
    }

    /// Match names against any of the glob patterns.
    pub fn glob<I, S>(self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_checked(filter::glob(patterns))
    }

    /// Exclude entries whose full path matches any of the regexes.
    pub fn discard<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self = self.add_checked(filter::path_regex(pattern.as_ref()).map(negate));
        }
        self
    }

    /// Match modification ages such as `"< 2 days"`.
    pub fn modified(self, expression: &str) -> Self {
        self.add_checked(filter::age(TimeField::Modified, expression))
    }

    /// Match access ages.
    pub fn accessed(self, expression: &str) -> Self {
        self.add_checked(filter::age(TimeField::Accessed, expression))
    }

    /// Match status change ages.
    pub fn changed(self, expression: &str) -> Self {
        self.add_checked(filter::age(TimeField::Changed, expression))
    }

    /// Add a custom predicate.
    pub fn add_filter<F>(self, f: F) -> Self
    where
        F: Fn(&Entry) -> Result<bool, SearchError> + Send + Sync + 'static,
    {
        self.add_predicate(predicate(f))
    }

    /// Invert the whole composed filter chain.
    pub fn negate(mut self) -> Self {
        self.filters.negate();
        self
    }

    fn add_predicate(mut self, p: Predicate) -> Self {
        self.filters.add(p);
        self
    }

    fn add_checked(mut self, p: Result<Predicate, ConfigError>) -> Self {
        match p {
            Ok(p) => self.filters.add(p),
            Err(err) => {
                self.config_error.get_or_insert(err);
            }
        }
        self
    }

    fn prepare(&self) -> Result<(Walker, Vec<PathBuf>), SearchError> {
        if let Some(err) = &self.config_error {
            return Err(err.clone().into());
        }
        let roots = PathResolver::new(self.config.max_depth).resolve(self.config.effective_roots());
        debug!(roots = roots.len(), filters = self.filters.len(), "starting search");
        Ok((Walker::new(&self.config, self.filters.compose()), roots))
    }

    /// Run the search with blocking calls, one root at a time.
    pub fn find_sync(&self) -> Result<Vec<Match>, SearchError> {
        let (walker, roots) = self.prepare()?;

        let mut matched = Vec::new();
        for root in roots {
            matched.extend(walker.walk_sync(Entry::root(root))?);
        }

        ResultFormatter::new(self.config.include_stats).format_all(matched)
    }

    /// Run the search, walking all roots concurrently.
    pub async fn find(&self) -> Result<Vec<Match>, SearchError> {
        self.observe(Notifier::new(None)).await
    }

    /// Run the search and report lifecycle events to `events`.
    pub async fn find_observed(
        &self,
        events: &mpsc::UnboundedSender<SearchEvent>,
    ) -> Result<Vec<Match>, SearchError> {
        self.observe(Notifier::new(Some(events))).await
    }

    /// Run the search and hand the outcome to `callback` before
    /// returning it.
    pub async fn find_with_callback<F>(&self, callback: F) -> Result<Vec<Match>, SearchError>
    where
        F: FnOnce(&Result<Vec<Match>, SearchError>),
    {
        let result = self.find().await;
        callback(&result);
        result
    }

    /// Run several finders concurrently and concatenate their results in
    /// argument order.
    pub async fn any<I>(finders: I) -> Result<Vec<Match>, SearchError>
    where
        I: IntoIterator<Item = Finder>,
    {
        let finders: Vec<Finder> = finders.into_iter().collect();
        let results = future::try_join_all(finders.iter().map(|finder| finder.find())).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn observe(&self, notifier: Notifier<'_>) -> Result<Vec<Match>, SearchError> {
        let result = self.run(notifier).await;
        if let Err(err) = &result {
            warn!(%err, "search aborted");
            notifier.emit(SearchEvent::Error(err.to_string()));
        }
        notifier.emit(SearchEvent::End);
        result
    }

    async fn run(&self, notifier: Notifier<'_>) -> Result<Vec<Match>, SearchError> {
        let (walker, roots) = self.prepare()?;
        let root_count = roots.len();

        // Dropping the set on an early return aborts the other roots.
        let mut tasks = JoinSet::new();
        for (index, root) in roots.into_iter().enumerate() {
            let walker = walker.clone();
            tasks.spawn(async move { (index, walker.walk(Entry::root(root)).await) });
        }

        let mut per_root: Vec<Vec<Entry>> = vec![Vec::new(); root_count];
        while let Some(joined) = tasks.join_next().await {
            let (index, walked) = joined.map_err(|e| SearchError::TaskFailed {
                message: e.to_string(),
            })?;
            let entries = walked?;
            if !walker.directories_only() {
                for entry in &entries {
                    notifier.emit(SearchEvent::Match(entry.path().to_path_buf()));
                }
            }
            per_root[index] = entries;
        }

        let matched = per_root.into_iter().flatten().collect();
        ResultFormatter::new(self.config.include_stats).format_all(matched)
    }
}
