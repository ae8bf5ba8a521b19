//! Error types for the ledger module.

use std::path::PathBuf;

use thiserror::Error;

use crate::ItemId;

/// Errors that can occur while loading or appending to the ledgers.
///
/// Every variant is fatal to a run: the pipeline cannot skip known work
/// without a trustworthy ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A ledger file does not exist and creation was not requested.
    #[error("ledger file not found: {path} (create it or pass --init-ledgers)")]
    Missing {
        /// The missing ledger path.
        path: PathBuf,
    },

    /// Reading or opening a ledger file failed.
    #[error("IO error reading ledger {path}: {source}")]
    Read {
        /// The ledger path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Appending or syncing an entry failed.
    #[error("IO error appending {id} to {path}: {source}")]
    Append {
        /// The ledger path.
        path: PathBuf,
        /// The identifier being recorded.
        id: ItemId,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The log was already closed by the driver.
    #[error("completion log already closed, cannot record {id}")]
    Closed {
        /// The identifier that could not be recorded.
        id: ItemId,
    },
}

impl LedgerError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates an append error.
    pub fn append(path: impl Into<PathBuf>, id: ItemId, source: std::io::Error) -> Self {
        Self::Append {
            path: path.into(),
            id,
            source,
        }
    }
}
