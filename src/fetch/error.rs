use std::path::PathBuf;

use thiserror::Error;

use crate::ItemId;

/// Errors that can occur while fetching an item.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch program is not on `PATH`.
    #[error("fetch program {program:?} not found on PATH: {source}")]
    ProgramNotFound {
        /// The program name that was looked up.
        program: String,
        /// The lookup error.
        #[source]
        source: which::Error,
    },

    /// The process could not be started.
    #[error("failed to start {program} for {id}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: PathBuf,
        /// The identifier being fetched.
        id: ItemId,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure.
    #[error("fetch failed for {id} ({status}): {stderr}")]
    Failed {
        /// The identifier being fetched.
        id: ItemId,
        /// Exit status description.
        status: String,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },
}

impl FetchError {
    /// Creates a failure error from captured process output.
    pub fn failed(
        id: ItemId,
        status: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Failed {
            id,
            status: status.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns true when the tool ran and rejected the identifier.
    ///
    /// Only these failures belong in the failure ledger; a missing program
    /// or a failed spawn says nothing about the item.
    #[must_use]
    pub fn is_item_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
