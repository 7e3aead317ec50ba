//! Root path normalization and deduplication.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;

/// Normalizes configured roots before traversal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver {
    max_depth: Option<u32>,
}

impl PathResolver {
    /// Create a resolver for a search with the given depth limit.
    pub fn new(max_depth: Option<u32>) -> Self {
        Self { max_depth }
    }

    /// Normalize and deduplicate roots, keeping first-seen order.
    ///
    /// Without a depth limit, roots lying inside another root are dropped
    /// so their subtree is not walked twice. With a depth limit every
    /// distinct root is kept, nested ones included.
    pub fn resolve<I, P>(&self, roots: I) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        // Keyed by absolute form so `.` and the cwd spelled out collapse.
        let mut unique: IndexMap<PathBuf, PathBuf> = IndexMap::new();
        for root in roots {
            let normalized = normalize(root.as_ref());
            let key = absolute_key(&normalized);
            unique.entry(key).or_insert(normalized);
        }

        if self.max_depth.is_some() {
            return unique.into_values().collect();
        }

        let keys: Vec<PathBuf> = unique.keys().cloned().collect();
        unique
            .into_iter()
            .filter(|(key, _)| !keys.iter().any(|other| is_descendant(key, other)))
            .map(|(_, normalized)| normalized)
            .collect()
    }
}

/// Lexically normalize a path: drop `.` segments, fold `..` into the
/// preceding segment, collapse repeated and trailing separators.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

fn absolute_key(normalized: &Path) -> PathBuf {
    std::path::absolute(normalized)
        .map(|abs| normalize(&abs))
        .unwrap_or_else(|_| normalized.to_path_buf())
}

/// Whether `path` lies strictly below `ancestor`.
fn is_descendant(path: &Path, ancestor: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}
