//! Tubefetch Core Library
//!
//! This library turns a list of search queries into a deduplicated set of
//! downloaded media items. Queries are expanded into candidate identifiers by
//! a search provider, and each identifier is handed to an external fetch tool
//! under a global concurrency limit, with a persistent ledger that prevents
//! repeat work across runs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`ledger`] - Completed/failed identifier ledgers and the append-only completion log
//! - [`pipeline`] - Slot pool, stage trackers, expansion and download stages, driver
//! - [`search`] - Search provider seam and the YouTube Data API client
//! - [`fetch`] - Fetch seam and the external download command wrapper
//! - [`input`] - Streaming query-file reader

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod fetch;
pub mod input;
pub mod ledger;
pub mod pipeline;
pub mod search;

mod item;

// Re-export commonly used types
pub use fetch::{CommandFetcher, FetchCommand, FetchError, FetchOutput, Fetcher};
pub use input::{InputError, QueryReader};
pub use item::ItemId;
pub use ledger::{CompletionLog, LedgerError, LedgerPaths, LedgerSnapshot};
pub use pipeline::{
    DEFAULT_PARALLELISM, FailurePolicy, Pipeline, PipelineConfig, PipelineError, PipelineStats,
    SlotPool, StageState, StageTracker,
};
pub use search::{
    DEFAULT_MAX_RESULTS, ResultKind, SearchError, SearchHit, SearchPage, SearchProvider,
    YouTubeSearch,
};
