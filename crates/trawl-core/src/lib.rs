//! Core types and filters for trawl.
//!
//! This crate provides the pieces a search is assembled from: the
//! filesystem [`Entry`] capability, human-readable size and age
//! [comparisons](compare), the [`FilterChain`] that composes predicates,
//! and the immutable [`SearchConfig`].

pub mod compare;
mod config;
mod entry;
mod error;
pub mod filter;

pub use compare::{AgeComparison, Operator, SizeComparison};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use entry::{Entry, EntryKind, EntryStats, Timestamps};
pub use error::{ConfigError, ExpressionError, SearchError};
pub use filter::{FilterChain, Predicate, TimeField};
