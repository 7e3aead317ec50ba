//! Search configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for a search, excluding the filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SearchConfig {
    /// Root paths to search. Empty means the current directory.
    #[builder(default)]
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Maximum directory depth below each root (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Do not descend into hidden directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub ignore_hidden_dirs: bool,

    /// Return directories instead of files.
    #[builder(default = "false")]
    #[serde(default)]
    pub directories_only: bool,

    /// Attach a stat snapshot to every result.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_stats: bool,
}

impl SearchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref roots) = self.roots {
            if roots.iter().any(|root| root.as_os_str().is_empty()) {
                return Err("Root path cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl SearchConfig {
    /// Create a new search config builder.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Create a simple config searching a single root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
            ..Self::default()
        }
    }

    /// Configured roots, or the current directory when none are set.
    pub fn effective_roots(&self) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.roots.clone()
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: None,
            ignore_hidden_dirs: false,
            directories_only: false,
            include_stats: false,
        }
    }
}
