//! Per-stage pending-work tracking and the two-stage drain protocol.
//!
//! Each stage owns a [`StageTracker`] that moves through three states:
//!
//! - `Accepting`: new work may still be submitted
//! - `Draining`: submission has ended but work is still pending
//! - `Closed`: submission has ended and nothing is pending
//!
//! Work must be counted with [`StageTracker::add`] before it becomes visible
//! to the consuming stage, so a waiter can never observe `Closed` while a
//! unit is in transit.

use tokio::sync::watch;
use tracing::{debug, warn};

use super::PipelineError;

/// Lifecycle state of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Work may still be submitted.
    Accepting,
    /// No new work; some still pending.
    Draining,
    /// No new work and nothing pending.
    Closed,
}

#[derive(Debug, Clone, Copy, Default)]
struct StageCounts {
    pending: usize,
    submitted: usize,
    sealed: bool,
}

impl StageCounts {
    fn state(self) -> StageState {
        match (self.sealed, self.pending) {
            (false, _) => StageState::Accepting,
            (true, 0) => StageState::Closed,
            (true, _) => StageState::Draining,
        }
    }
}

/// Pending-work counter for one stage.
#[derive(Debug)]
pub struct StageTracker {
    name: &'static str,
    counts: watch::Sender<StageCounts>,
}

impl StageTracker {
    /// Creates an accepting tracker with nothing pending.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        let (counts, _) = watch::channel(StageCounts::default());
        Self { name, counts }
    }

    /// Stage name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Counts one unit of work. Must happen before the unit is handed on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageSealed`] if submission already ended.
    pub fn add(&self) -> Result<(), PipelineError> {
        let accepted = self.counts.send_if_modified(|counts| {
            if counts.sealed {
                return false;
            }
            counts.pending += 1;
            counts.submitted += 1;
            true
        });
        if accepted {
            Ok(())
        } else {
            Err(PipelineError::StageSealed { stage: self.name })
        }
    }

    /// Marks one unit of work as finished.
    pub fn done(&self) {
        let decremented = self.counts.send_if_modified(|counts| {
            if counts.pending == 0 {
                return false;
            }
            counts.pending -= 1;
            true
        });
        if !decremented {
            warn!(stage = self.name, "done() called with nothing pending");
        }
    }

    /// Ends submission. Idempotent.
    pub fn seal(&self) {
        self.counts.send_if_modified(|counts| {
            if counts.sealed {
                return false;
            }
            counts.sealed = true;
            true
        });
        debug!(stage = self.name, pending = self.pending(), "stage sealed");
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> StageState {
        self.counts.borrow().state()
    }

    /// Units counted but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.counts.borrow().pending
    }

    /// Units counted since creation.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.counts.borrow().submitted
    }

    /// Waits until the stage is [`StageState::Closed`].
    pub async fn wait_closed(&self) {
        let mut rx = self.counts.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|counts| counts.state() == StageState::Closed).await;
    }
}

/// Query-stage and download-stage trackers for one run.
#[derive(Debug)]
pub struct CompletionTracker {
    queries: StageTracker,
    downloads: StageTracker,
}

impl CompletionTracker {
    /// Creates both trackers in the accepting state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queries: StageTracker::new("queries"),
            downloads: StageTracker::new("downloads"),
        }
    }

    /// The query stage tracker.
    #[must_use]
    pub fn queries(&self) -> &StageTracker {
        &self.queries
    }

    /// The download stage tracker.
    #[must_use]
    pub fn downloads(&self) -> &StageTracker {
        &self.downloads
    }

    /// Waits for the query stage to close, then the download stage.
    pub async fn wait_all(&self) {
        self.queries.wait_closed().await;
        debug!("query stage drained");
        self.downloads.wait_closed().await;
        debug!("download stage drained");
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}
