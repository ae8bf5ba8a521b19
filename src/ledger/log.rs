use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{LedgerError, LedgerPaths};
use crate::ItemId;

/// Shared append-only writer for both ledger files.
///
/// One lock guards the open file handles and the set of identifiers claimed
/// during this run. Every append writes one line and syncs it to stable
/// storage before the lock is released, so a crash never leaves a partial
/// line that a later run would misread.
#[derive(Debug)]
pub struct CompletionLog {
    completed_path: PathBuf,
    failed_path: PathBuf,
    state: Mutex<LogState>,
}

#[derive(Debug)]
struct LogState {
    files: Option<LogFiles>,
    claimed: HashSet<ItemId>,
}

#[derive(Debug)]
struct LogFiles {
    completed: File,
    failed: File,
}

impl CompletionLog {
    /// Opens both ledger files for appending, creating them if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Read`] if either file cannot be opened.
    pub async fn open(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let completed = open_append(&paths.completed).await?;
        let failed = open_append(&paths.failed).await?;

        Ok(Self {
            completed_path: paths.completed.clone(),
            failed_path: paths.failed.clone(),
            state: Mutex::new(LogState {
                files: Some(LogFiles { completed, failed }),
                claimed: HashSet::new(),
            }),
        })
    }

    /// Claims an identifier for this run.
    ///
    /// Returns false if the identifier was already claimed, meaning another
    /// download task owns it and this occurrence must be skipped.
    pub async fn claim(&self, id: &ItemId) -> bool {
        self.state.lock().await.claimed.insert(id.clone())
    }

    /// Number of identifiers claimed so far in this run.
    pub async fn claimed_len(&self) -> usize {
        self.state.lock().await.claimed.len()
    }

    /// Appends an identifier to the completion log and syncs it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Append`] if the write or sync fails, or
    /// [`LedgerError::Closed`] after [`close`](Self::close).
    #[instrument(level = "debug", skip(self, id), fields(id = %id))]
    pub async fn record_completed(&self, id: &ItemId) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let files = state
            .files
            .as_mut()
            .ok_or_else(|| LedgerError::Closed { id: id.clone() })?;
        append_line(&mut files.completed, &self.completed_path, id).await
    }

    /// Appends an identifier to the failure log and syncs it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Append`] if the write or sync fails, or
    /// [`LedgerError::Closed`] after [`close`](Self::close).
    #[instrument(level = "debug", skip(self, id), fields(id = %id))]
    pub async fn record_failed(&self, id: &ItemId) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let files = state
            .files
            .as_mut()
            .ok_or_else(|| LedgerError::Closed { id: id.clone() })?;
        append_line(&mut files.failed, &self.failed_path, id).await
    }

    /// Syncs and releases both file handles. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Read`] if the final sync fails.
    pub async fn close(&self) -> Result<(), LedgerError> {
        let Some(mut files) = self.state.lock().await.files.take() else {
            return Ok(());
        };
        files
            .completed
            .sync_all()
            .await
            .map_err(|e| LedgerError::read(&self.completed_path, e))?;
        files
            .failed
            .sync_all()
            .await
            .map_err(|e| LedgerError::read(&self.failed_path, e))?;
        debug!("ledger files closed");
        Ok(())
    }
}

async fn open_append(path: &Path) -> Result<File, LedgerError> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| LedgerError::read(path, e))
}

async fn append_line(file: &mut File, path: &Path, id: &ItemId) -> Result<(), LedgerError> {
    let line = format!("{id}\n");
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| LedgerError::append(path, id.clone(), e))?;
    file.flush()
        .await
        .map_err(|e| LedgerError::append(path, id.clone(), e))?;
    file.sync_data()
        .await
        .map_err(|e| LedgerError::append(path, id.clone(), e))?;
    debug!(id = %id, path = %path.display(), "ledger entry appended");
    Ok(())
}
