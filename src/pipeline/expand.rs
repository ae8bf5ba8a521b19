//! Expansion stage: query -> search -> candidate identifiers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{CompletionTracker, FailurePolicy, PipelineError, PipelineStats, Shutdown};
use crate::ItemId;
use crate::search::{SearchPage, SearchProvider};

pub(super) struct ExpansionStage {
    pub(super) search: Arc<dyn SearchProvider>,
    pub(super) page: SearchPage,
    pub(super) policy: FailurePolicy,
    pub(super) tracker: Arc<CompletionTracker>,
    pub(super) stats: Arc<PipelineStats>,
    pub(super) shutdown: Arc<Shutdown>,
}

impl ExpansionStage {
    /// Consumes queries until the channel closes, then seals the download
    /// stage and drops `id_tx`, closing the identifier channel.
    ///
    /// Queries are handled one at a time, so by the time the loop ends every
    /// search has returned and every identifier it produced has been counted.
    #[instrument(name = "expansion", skip_all, fields(provider = self.search.name()))]
    pub(super) async fn run(
        self,
        mut query_rx: mpsc::Receiver<String>,
        id_tx: mpsc::Sender<ItemId>,
    ) {
        loop {
            let query = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                query = query_rx.recv() => match query {
                    Some(query) => query,
                    None => break,
                },
            };

            info!(query = %query, "query started");
            let result = self.expand_query(&query, &id_tx).await;
            self.tracker.queries().done();

            match result {
                Ok(forwarded) => debug!(query = %query, forwarded, "query expanded"),
                Err(error) if error.is_per_unit() && self.policy == FailurePolicy::Continue => {
                    self.stats.increment_search_failures();
                    warn!(query = %query, error = %error, "search failed, continuing");
                }
                Err(error) => {
                    self.shutdown.fail(error);
                    break;
                }
            }
        }

        self.tracker.downloads().seal();
        debug!("identifier channel closing");
    }

    async fn expand_query(
        &self,
        query: &str,
        id_tx: &mpsc::Sender<ItemId>,
    ) -> Result<usize, PipelineError> {
        let hits = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Ok(0),
            hits = self.search.search(query, &self.page) => hits.map_err(|source| PipelineError::Search {
                query: query.to_string(),
                source,
            })?,
        };
        self.stats.increment_queries();

        let mut forwarded = 0;
        for hit in hits {
            let Some(id) = hit.playable_id() else {
                self.stats.increment_dropped();
                continue;
            };

            // Count before sending so the drain wait never sees zero while
            // this identifier is in the channel.
            self.tracker.downloads().add()?;
            self.stats.increment_candidates();
            if id_tx.send(id).await.is_err() {
                // Dispatcher is gone; only happens on shutdown.
                self.tracker.downloads().done();
                return Ok(forwarded);
            }
            forwarded += 1;
        }
        Ok(forwarded)
    }
}
