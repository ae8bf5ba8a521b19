//! Error types for the pipeline module.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::input::InputError;
use crate::ledger::LedgerError;
use crate::search::SearchError;

use super::{MAX_PARALLELISM, MIN_PARALLELISM};

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid parallelism value provided.
    #[error(
        "invalid parallelism value {value}: must be between {MIN_PARALLELISM} and {MAX_PARALLELISM}"
    )]
    InvalidParallelism {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Ledger load or append failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Query input could not be read.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// A search call failed.
    #[error("search failed for query {query:?}: {source}")]
    Search {
        /// The query being expanded.
        query: String,
        /// The provider error.
        #[source]
        source: SearchError,
    },

    /// A fetch failed.
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    /// Work was submitted to a stage after it stopped accepting.
    #[error("{stage} stage no longer accepts work")]
    StageSealed {
        /// The stage name.
        stage: &'static str,
    },

    /// The slot pool was closed while waiting for a slot.
    #[error("slot pool closed unexpectedly")]
    SlotsClosed,

    /// A stage task panicked.
    #[error("{stage} task panicked: {message}")]
    TaskPanicked {
        /// The stage whose task panicked.
        stage: &'static str,
        /// The join error text.
        message: String,
    },

    /// The run was cancelled from outside before it finished.
    #[error("interrupted before all work finished")]
    Interrupted,
}

impl PipelineError {
    /// Returns true for errors confined to one query or one identifier.
    ///
    /// Only these may be contained under [`FailurePolicy::Continue`](super::FailurePolicy::Continue);
    /// everything else always ends the run.
    #[must_use]
    pub fn is_per_unit(&self) -> bool {
        matches!(self, Self::Search { .. } | Self::Fetch(_))
    }

    pub(crate) fn task_panicked(stage: &'static str, error: &tokio::task::JoinError) -> Self {
        Self::TaskPanicked {
            stage,
            message: error.to_string(),
        }
    }
}
