//! Persistent record of identifiers already completed or failed.
//!
//! Two newline-delimited files back the ledger:
//!
//! - the completion log, read at startup and appended to as downloads finish
//! - the failure log, read at startup and appended to when a fetch fails
//!
//! [`LedgerSnapshot`] is the immutable view loaded once before the pipeline
//! starts. It is shared by reference with every download task and is never
//! mutated, so lookups need no locking. All writes go through
//! [`CompletionLog`], which serializes them behind a single lock.
//!
//! # Example
//!
//! ```no_run
//! use tubefetch_core::ledger::{CompletionLog, LedgerPaths, LedgerSnapshot};
//! use tubefetch_core::ItemId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = LedgerPaths::new("dled.txt", "fails.txt");
//! let snapshot = LedgerSnapshot::load(&paths, false).await?;
//! let log = CompletionLog::open(&paths).await?;
//!
//! let id = ItemId::from("dQw4w9WgXcQ");
//! if !snapshot.is_known(&id) && log.claim(&id).await {
//!     log.record_completed(&id).await?;
//! }
//! log.close().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod log;

pub use error::LedgerError;
pub use log::CompletionLog;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument};

use crate::ItemId;

/// Default completion log file name.
pub const DEFAULT_COMPLETED_LOG: &str = "dled.txt";

/// Default failure log file name.
pub const DEFAULT_FAILED_LOG: &str = "fails.txt";

/// Locations of the two ledger files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    /// Completion log path.
    pub completed: PathBuf,
    /// Failure log path.
    pub failed: PathBuf,
}

impl LedgerPaths {
    /// Creates a path pair.
    pub fn new(completed: impl Into<PathBuf>, failed: impl Into<PathBuf>) -> Self {
        Self {
            completed: completed.into(),
            failed: failed.into(),
        }
    }
}

impl Default for LedgerPaths {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETED_LOG, DEFAULT_FAILED_LOG)
    }
}

/// Immutable view of both ledgers as they were at startup.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    completed: HashSet<ItemId>,
    failed: HashSet<ItemId>,
}

impl LedgerSnapshot {
    /// Builds a snapshot from in-memory sets.
    #[must_use]
    pub fn from_sets(completed: HashSet<ItemId>, failed: HashSet<ItemId>) -> Self {
        Self { completed, failed }
    }

    /// Loads both ledger files.
    ///
    /// When `create_missing` is false, an absent file is an error. When true,
    /// an absent file is created empty so the next append has somewhere to go.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Missing`] for an absent file (unless created),
    /// or [`LedgerError::Read`] when a file cannot be opened or scanned.
    #[instrument(level = "debug", skip(paths), fields(completed = %paths.completed.display(), failed = %paths.failed.display()))]
    pub async fn load(paths: &LedgerPaths, create_missing: bool) -> Result<Self, LedgerError> {
        let completed = read_ids(&paths.completed, create_missing).await?;
        let failed = read_ids(&paths.failed, create_missing).await?;

        info!(
            completed = completed.len(),
            failed = failed.len(),
            "ledgers loaded"
        );

        Ok(Self { completed, failed })
    }

    /// Returns true if the identifier is in either ledger.
    #[must_use]
    pub fn is_known(&self, id: &ItemId) -> bool {
        self.completed.contains(id) || self.failed.contains(id)
    }

    /// Returns true if the identifier completed in an earlier run.
    #[must_use]
    pub fn is_completed(&self, id: &ItemId) -> bool {
        self.completed.contains(id)
    }

    /// Returns true if the identifier failed in an earlier run.
    #[must_use]
    pub fn is_failed(&self, id: &ItemId) -> bool {
        self.failed.contains(id)
    }

    /// Number of completed identifiers at startup.
    #[must_use]
    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    /// Number of failed identifiers at startup.
    #[must_use]
    pub fn failed_len(&self) -> usize {
        self.failed.len()
    }
}

async fn read_ids(path: &Path, create_missing: bool) -> Result<HashSet<ItemId>, LedgerError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if !create_missing {
                return Err(LedgerError::Missing {
                    path: path.to_path_buf(),
                });
            }
            File::create(path)
                .await
                .map_err(|e| LedgerError::read(path, e))?;
            info!(path = %path.display(), "created empty ledger");
            return Ok(HashSet::new());
        }
        Err(e) => return Err(LedgerError::read(path, e)),
    };

    let mut ids = HashSet::new();
    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| LedgerError::read(path, e))?
    {
        let id = line.strip_suffix('\r').unwrap_or(&line);
        if id.trim().is_empty() {
            continue;
        }
        ids.insert(ItemId::from(id));
    }

    debug!(path = %path.display(), entries = ids.len(), "read ledger");
    Ok(ids)
}
