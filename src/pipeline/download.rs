//! Download stage: dispatcher loop plus one task per identifier.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::slots::{Slot, SlotPool};
use super::{CompletionTracker, FailurePolicy, PipelineError, PipelineStats, Shutdown};
use crate::ItemId;
use crate::fetch::Fetcher;
use crate::ledger::{CompletionLog, LedgerSnapshot};

/// What happened to one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Fetched,
    SkippedKnown,
    SkippedDuplicate,
    Abandoned,
}

pub(super) struct DownloadStage {
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) ledger: Arc<LedgerSnapshot>,
    pub(super) log: Arc<CompletionLog>,
    pub(super) slots: SlotPool,
    pub(super) policy: FailurePolicy,
    pub(super) tracker: Arc<CompletionTracker>,
    pub(super) stats: Arc<PipelineStats>,
    pub(super) shutdown: Arc<Shutdown>,
}

impl DownloadStage {
    /// Takes a slot for every identifier before spawning its task, so slot
    /// scarcity blocks this loop and, through the bounded channel, the
    /// expansion stage.
    #[instrument(name = "dispatcher", skip_all, fields(parallelism = self.slots.capacity()))]
    pub(super) async fn run(self, mut id_rx: mpsc::Receiver<ItemId>) {
        let stage = Arc::new(self);
        let mut tasks = JoinSet::new();

        loop {
            let id = tokio::select! {
                biased;
                () = stage.shutdown.cancelled() => break,
                id = id_rx.recv() => match id {
                    Some(id) => id,
                    None => break,
                },
            };

            let slot = tokio::select! {
                biased;
                () = stage.shutdown.cancelled() => {
                    stage.tracker.downloads().done();
                    break;
                }
                slot = stage.slots.acquire() => match slot {
                    Ok(slot) => slot,
                    Err(error) => {
                        stage.tracker.downloads().done();
                        stage.shutdown.fail(error);
                        break;
                    }
                },
            };

            let unit = Arc::clone(&stage);
            tasks.spawn(async move { unit.process(id, slot).await });

            while let Some(joined) = tasks.try_join_next() {
                stage.reap(joined);
            }
        }

        debug!(in_flight = tasks.len(), "dispatcher waiting for download tasks");
        while let Some(joined) = tasks.join_next().await {
            stage.reap(joined);
        }
    }

    fn reap(&self, joined: Result<(), JoinError>) {
        if let Err(error) = joined {
            self.shutdown
                .fail(PipelineError::task_panicked("download", &error));
        }
    }

    /// Runs one unit. The slot goes back to the pool before the unit is
    /// counted as finished, so the drain wait never completes while a slot is
    /// still held.
    async fn process(&self, id: ItemId, slot: Slot) {
        match self.download_one(&id).await {
            Ok(outcome) => debug!(id = %id, ?outcome, "download unit finished"),
            Err(error) if error.is_per_unit() && self.policy == FailurePolicy::Continue => {
                warn!(id = %id, error = %error, "download failed, continuing");
            }
            Err(error) => self.shutdown.fail(error),
        }

        drop(slot);
        self.tracker.downloads().done();
    }

    async fn download_one(&self, id: &ItemId) -> Result<Outcome, PipelineError> {
        if self.ledger.is_known(id) {
            self.stats.increment_skipped_known();
            debug!(id = %id, "already in ledger, skipping");
            return Ok(Outcome::SkippedKnown);
        }

        if !self.log.claim(id).await {
            self.stats.increment_skipped_duplicate();
            debug!(id = %id, "already claimed this run, skipping");
            return Ok(Outcome::SkippedDuplicate);
        }

        if self.shutdown.is_cancelled() {
            return Ok(Outcome::Abandoned);
        }

        let fetched = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Ok(Outcome::Abandoned),
            fetched = self.fetcher.fetch(id) => fetched,
        };

        match fetched {
            Ok(output) => {
                self.log.record_completed(id).await?;
                self.stats.increment_fetched();
                info!(id = %id, "fetched");
                if !output.stdout.is_empty() {
                    debug!(id = %id, stdout = %output.stdout.trim_end(), "fetch output");
                }
                Ok(Outcome::Fetched)
            }
            Err(error) => {
                self.stats.increment_failed();
                if error.is_item_failure() {
                    self.log.record_failed(id).await?;
                }
                Err(PipelineError::Fetch(error))
            }
        }
    }
}
