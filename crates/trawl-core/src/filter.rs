//! Predicate composition.
//!
//! A [`FilterChain`] is an AND of predicates with one chain-wide negation
//! switch. Exclusions are built by wrapping a single predicate in
//! [`negate`] and adding it like any other filter, so they keep AND
//! semantics no matter how the chain-wide switch is set.

use std::fmt;
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::compare::{AgeComparison, SizeComparison};
use crate::entry::Entry;
use crate::error::{ConfigError, SearchError};

/// A shareable predicate over entries. Stat failures inside a predicate
/// are returned, never turned into `false`.
pub type Predicate = Arc<dyn Fn(&Entry) -> Result<bool, SearchError> + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&Entry) -> Result<bool, SearchError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Logical negation of a single predicate.
pub fn negate(inner: Predicate) -> Predicate {
    predicate(move |entry| Ok(!inner(entry)?))
}

/// Ordered list of predicates plus a chain-level negation flag.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Predicate>,
    negated: bool,
}

impl FilterChain {
    /// Create an empty chain, which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn add(&mut self, filter: Predicate) {
        self.filters.push(filter);
    }

    /// Negate the whole composed chain. Setting it twice has no further
    /// effect.
    pub fn negate(&mut self) {
        self.negated = true;
    }

    /// Whether the chain-level negation is set.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Number of predicates in the chain.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no predicates.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Compose the chain into the effective predicate. The returned value
    /// owns a snapshot of the filters, so later additions do not affect
    /// it.
    pub fn compose(&self) -> Predicate {
        let filters = self.filters.clone();
        let negated = self.negated;
        predicate(move |entry| {
            let mut all = true;
            for filter in &filters {
                if !filter(entry)? {
                    all = false;
                    break;
                }
            }
            Ok(all != negated)
        })
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .field("negated", &self.negated)
            .finish()
    }
}

/// Matches entries whose name ends with one of the extensions. A leading
/// dot on each extension is optional.
pub fn extension<I, S>(extensions: I) -> Predicate
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let suffixes: Vec<String> = extensions
        .into_iter()
        .map(|ext| format!(".{}", ext.as_ref().trim_start_matches('.')))
        .collect();
    predicate(move |entry| {
        let name = entry.name();
        Ok(suffixes
            .iter()
            .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix.as_str())))
    })
}

/// Matches entries whose size satisfies the expression.
pub fn size(expression: &str) -> Result<Predicate, ConfigError> {
    let cmp = SizeComparison::parse(expression).map_err(ConfigError::Expression)?;
    Ok(predicate(move |entry| Ok(cmp.matches(entry.size()?))))
}

/// Matches zero-byte entries.
pub fn empty() -> Predicate {
    predicate(|entry| Ok(entry.size()? == 0))
}

/// Which timestamp a time filter looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Modified,
    Accessed,
    Changed,
}

/// Matches entries whose timestamp age satisfies the expression.
pub fn age(field: TimeField, expression: &str) -> Result<Predicate, ConfigError> {
    let cmp = AgeComparison::parse(expression).map_err(ConfigError::Expression)?;
    Ok(predicate(move |entry| {
        let time = match field {
            TimeField::Modified => entry.modified()?,
            TimeField::Accessed => entry.accessed()?,
            TimeField::Changed => entry.changed()?,
        };
        Ok(cmp.matches(time))
    }))
}

/// Matches entries whose name matches any of the glob patterns.
pub fn glob<I, S>(patterns: I) -> Result<Predicate, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let globs = build_globset(patterns)?;
    Ok(predicate(move |entry| Ok(entry.matches_glob(&globs))))
}

fn build_globset<I, S>(patterns: I) -> Result<GlobSet, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ConfigError::Pattern {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::Pattern {
        pattern: String::new(),
        message: e.to_string(),
    })
}

/// Matches entries whose full path contains a match for the regex.
pub fn path_regex(pattern: &str) -> Result<Predicate, ConfigError> {
    let re = Regex::new(pattern).map_err(|e| ConfigError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(predicate(move |entry| {
        Ok(re.is_match(entry.path().to_string_lossy().as_ref()))
    }))
}

/// Matches hidden entries.
pub fn hidden() -> Predicate {
    predicate(|entry| entry.is_hidden())
}

/// Matches Unix domain sockets.
pub fn socket() -> Predicate {
    predicate(|entry| entry.is_socket())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(value: bool) -> Predicate {
        predicate(move |_| Ok(value))
    }

    fn eval(p: &Predicate, path: &str) -> bool {
        p(&Entry::new(path, 1)).unwrap()
    }

    #[test]
    fn test_empty_chain_matches_everything() {
        let chain = FilterChain::new();
        assert!(eval(&chain.compose(), "/a/b"));
    }

    #[test]
    fn test_and_semantics() {
        let mut chain = FilterChain::new();
        chain.add(always(true));
        chain.add(always(false));
        assert!(!eval(&chain.compose(), "/x"));
    }

    #[test]
    fn test_negation_inverts_composed_result() {
        let mut chain = FilterChain::new();
        chain.add(always(true));
        chain.add(always(false));
        chain.negate();
        // !(true && false), not (!true && !false)
        assert!(eval(&chain.compose(), "/x"));

        chain.negate();
        assert!(chain.is_negated());
        assert!(eval(&chain.compose(), "/x"));
    }

    #[test]
    fn test_compose_is_a_snapshot() {
        let mut chain = FilterChain::new();
        let composed = chain.compose();
        chain.add(always(false));
        assert!(eval(&composed, "/x"));
        assert!(!eval(&chain.compose(), "/x"));
    }

    #[test]
    fn test_extension_forms() {
        let p = extension(["txt", ".json", "tar.gz"]);
        assert!(eval(&p, "/r/a.txt"));
        assert!(eval(&p, "/r/b.json"));
        assert!(eval(&p, "/r/c.tar.gz"));
        assert!(!eval(&p, "/r/d.gz"));
        assert!(!eval(&p, "/r/.txt"));
        assert!(!eval(&p, "/r/txt"));
    }

    #[test]
    fn test_glob_matches_name_only() {
        let p = glob(["*.rs", "Cargo.*"]).unwrap();
        assert!(eval(&p, "/src/lib.rs"));
        assert!(eval(&p, "/Cargo.toml"));
        assert!(!eval(&p, "/src.rs/readme"));
    }

    #[test]
    fn test_discard_via_negated_regex() {
        let p = negate(path_regex("node_modules").unwrap());
        assert!(!eval(&p, "/app/node_modules/x.js"));
        assert!(eval(&p, "/app/src/x.js"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(glob(["a[b"]), Err(ConfigError::Pattern { .. })));
        assert!(matches!(path_regex("("), Err(ConfigError::Pattern { .. })));
        assert!(matches!(size("big"), Err(ConfigError::Expression(_))));
    }

    #[test]
    fn test_stat_error_propagates_through_chain() {
        let mut chain = FilterChain::new();
        chain.add(empty());
        let composed = chain.compose();
        assert!(composed(&Entry::new("/no/such/file", 1)).is_err());
    }
}
