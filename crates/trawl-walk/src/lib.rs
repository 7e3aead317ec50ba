//! Traversal engine and search controller for trawl.
//!
//! This crate walks configured roots and returns the entries accepted by a
//! composed filter chain.
//!
//! # Overview
//!
//! - **Root resolution** normalizes and deduplicates roots, and drops
//!   nested roots when no depth limit is set
//! - **Blocking and async walks** that produce identical results
//! - **Pruning** by depth and hidden directories
//! - **Lifecycle events** (`Match`, `Error`, `End`) over a tokio channel
//!
//! # Example
//!
//! ```rust,no_run
//! use trawl_walk::Finder;
//!
//! let recent_logs = Finder::new()
//!     .paths(["/var/log", "/tmp"])
//!     .ext(["log", "txt"])
//!     .modified("< 2 days")
//!     .ignore_hidden_dirs()
//!     .find_sync()
//!     .unwrap();
//!
//! for m in recent_logs {
//!     println!("{}", m.path().display());
//! }
//! ```
//!
//! # Lifecycle events
//!
//! ```rust,no_run
//! use tokio::sync::mpsc;
//! use trawl_walk::{Finder, SearchEvent};
//!
//! # async fn run() {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let finder = Finder::new().path(".").empty();
//! let _ = finder.find_observed(&tx).await;
//!
//! while let Ok(event) = rx.try_recv() {
//!     if let SearchEvent::Match(path) = event {
//!         println!("empty: {}", path.display());
//!     }
//! }
//! # }
//! ```

mod engine;
mod event;
mod finder;
mod format;
mod resolver;

pub use engine::Walker;
pub use event::SearchEvent;
pub use finder::Finder;
pub use format::{Match, ResultFormatter};
pub use resolver::{PathResolver, normalize};

// Re-export core types for convenience
pub use trawl_core::{
    Entry, EntryKind, EntryStats, FilterChain, Predicate, SearchConfig, SearchError, Timestamps,
};
