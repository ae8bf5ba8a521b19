//! Bounded-concurrency fan-out/fan-in pipeline.
//!
//! ```text
//! queries ──► expansion stage ──► identifier channel ──► download stage ──► ledger
//!            (one search each)    (capacity = N)        (N slots)
//! ```
//!
//! The driver ([`Pipeline::run`]) feeds queries from the input, counting each
//! one in the query [`StageTracker`] before sending it. The expansion stage
//! searches each query and counts every playable identifier in the download
//! tracker before forwarding it. The download stage takes a slot per
//! identifier, skips anything the ledger already knows, fetches the rest, and
//! appends each success to the completion log.
//!
//! The run is over when both trackers reach [`StageState::Closed`].
//!
//! # Failure handling
//!
//! Under [`FailurePolicy::FailFast`] (the default) the first error cancels the
//! run: in-flight fetches are dropped (killing their processes), nothing new
//! starts, and [`Pipeline::run`] returns that error after syncing the ledger.
//! Under [`FailurePolicy::Continue`] search and fetch errors are counted and
//! the run drains normally. Ledger errors always end the run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tubefetch_core::{
//!     CommandFetcher, FetchCommand, LedgerPaths, Pipeline, PipelineConfig, YouTubeSearch,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new(4)?;
//! let search = Arc::new(YouTubeSearch::new("api-key")?);
//! let fetcher = Arc::new(CommandFetcher::new(FetchCommand::default().resolve()?));
//! let pipeline = Pipeline::new(config, search, fetcher);
//!
//! let stats = pipeline
//!     .run_files("todl.txt", &LedgerPaths::default(), false)
//!     .await?;
//! println!("fetched {}, skipped {}", stats.fetched(), stats.skipped_known());
//! # Ok(())
//! # }
//! ```

mod download;
mod error;
mod expand;
mod slots;
mod stats;
mod tracker;

pub use error::PipelineError;
pub use slots::{Slot, SlotPool};
pub use stats::PipelineStats;
pub use tracker::{CompletionTracker, StageState, StageTracker};

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::fetch::Fetcher;
use crate::input::QueryReader;
use crate::ledger::{CompletionLog, LedgerPaths, LedgerSnapshot};
use crate::search::{SearchPage, SearchProvider};

use download::DownloadStage;
use expand::ExpansionStage;

/// Minimum allowed parallelism.
const MIN_PARALLELISM: usize = 1;

/// Maximum allowed parallelism.
const MAX_PARALLELISM: usize = 64;

/// Default number of download slots.
pub const DEFAULT_PARALLELISM: usize = 4;

/// What to do when a single query or identifier fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// End the whole run on the first error.
    #[default]
    FailFast,
    /// Count the failure and keep going.
    Continue,
}

/// Pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    parallelism: usize,
    page: SearchPage,
    failure_policy: FailurePolicy,
}

impl PipelineConfig {
    /// Creates a config with `parallelism` slots and default paging.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParallelism`] if the value is outside
    /// the valid range (1-64).
    pub fn new(parallelism: usize) -> Result<Self, PipelineError> {
        if !(MIN_PARALLELISM..=MAX_PARALLELISM).contains(&parallelism) {
            return Err(PipelineError::InvalidParallelism { value: parallelism });
        }
        Ok(Self {
            parallelism,
            page: SearchPage::default(),
            failure_policy: FailurePolicy::default(),
        })
    }

    /// Sets the search paging.
    #[must_use]
    pub fn with_page(mut self, page: SearchPage) -> Self {
        self.page = page;
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Number of download slots (and channel capacity).
    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Search paging.
    #[must_use]
    pub fn page(&self) -> SearchPage {
        self.page
    }

    /// Failure policy.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            page: SearchPage::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Run-wide cancellation plus the first fatal error.
#[derive(Debug)]
pub(crate) struct Shutdown {
    token: CancellationToken,
    first_error: Mutex<Option<PipelineError>>,
}

impl Shutdown {
    fn new(token: CancellationToken) -> Self {
        Self {
            token,
            first_error: Mutex::new(None),
        }
    }

    /// Records `error` if it is the first, then cancels the run.
    pub(crate) fn fail(&self, error: PipelineError) {
        if let Ok(mut slot) = self.first_error.lock() {
            if slot.is_none() {
                error!(error = %error, "fatal error, stopping pipeline");
                *slot = Some(error);
            } else {
                debug!(error = %error, "additional error after shutdown");
            }
        }
        self.token.cancel();
    }

    pub(crate) async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn take_error(&self) -> Option<PipelineError> {
        self.first_error.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Wires the stages together and drives one run.
pub struct Pipeline {
    config: PipelineConfig,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Creates a pipeline.
    pub fn new(
        config: PipelineConfig,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            search,
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to cancel the run from outside (for example on Ctrl-C).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Loads the ledgers, opens the completion log, and runs over the query
    /// file at `input`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`PipelineError`].
    pub async fn run_files(
        &self,
        input: impl AsRef<Path>,
        ledger_paths: &LedgerPaths,
        create_missing_ledgers: bool,
    ) -> Result<PipelineStats, PipelineError> {
        let ledger = LedgerSnapshot::load(ledger_paths, create_missing_ledgers).await?;
        let log = Arc::new(CompletionLog::open(ledger_paths).await?);
        let queries = QueryReader::open(input).await?;
        self.run(queries, ledger, log).await
    }

    /// Runs the pipeline over `queries`.
    ///
    /// The completion log is closed before returning, on success and on
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`PipelineError`], or
    /// [`PipelineError::Interrupted`] if the external token was cancelled.
    #[instrument(skip_all, fields(parallelism = self.config.parallelism))]
    pub async fn run<R>(
        &self,
        mut queries: QueryReader<R>,
        ledger: LedgerSnapshot,
        log: Arc<CompletionLog>,
    ) -> Result<PipelineStats, PipelineError>
    where
        R: AsyncBufRead + Unpin,
    {
        let parallelism = self.config.parallelism;
        let tracker = Arc::new(CompletionTracker::new());
        let stats = Arc::new(PipelineStats::new());
        let shutdown = Arc::new(Shutdown::new(self.cancel.child_token()));
        let slots = SlotPool::new(parallelism);

        let (query_tx, query_rx) = mpsc::channel::<String>(parallelism);
        let (id_tx, id_rx) = mpsc::channel(parallelism);

        let expansion = ExpansionStage {
            search: Arc::clone(&self.search),
            page: self.config.page,
            policy: self.config.failure_policy,
            tracker: Arc::clone(&tracker),
            stats: Arc::clone(&stats),
            shutdown: Arc::clone(&shutdown),
        };
        let downloads = DownloadStage {
            fetcher: Arc::clone(&self.fetcher),
            ledger: Arc::new(ledger),
            log: Arc::clone(&log),
            slots: slots.clone(),
            policy: self.config.failure_policy,
            tracker: Arc::clone(&tracker),
            stats: Arc::clone(&stats),
            shutdown: Arc::clone(&shutdown),
        };

        let expansion_handle = tokio::spawn(expansion.run(query_rx, id_tx));
        let download_handle = tokio::spawn(downloads.run(id_rx));

        info!("pipeline started");
        if let Err(error) = feed_queries(&mut queries, &query_tx, &tracker, &shutdown).await {
            shutdown.fail(error);
        }
        drop(query_tx);
        tracker.queries().seal();

        tokio::select! {
            () = tracker.wait_all() => debug!("all stages drained"),
            () = shutdown.cancelled() => slots.close(),
        }

        if let Err(error) = expansion_handle.await {
            shutdown.fail(PipelineError::task_panicked("expansion", &error));
        }
        if let Err(error) = download_handle.await {
            shutdown.fail(PipelineError::task_panicked("dispatcher", &error));
        }

        if let Err(error) = log.close().await {
            shutdown.fail(error.into());
        }

        if let Some(error) = shutdown.take_error() {
            return Err(error);
        }
        if shutdown.is_cancelled() {
            return Err(PipelineError::Interrupted);
        }

        let stats = Arc::try_unwrap(stats).unwrap_or_else(|shared| shared.snapshot());
        info!(
            queries = stats.queries(),
            candidates = stats.candidates(),
            fetched = stats.fetched(),
            skipped = stats.skipped_known() + stats.skipped_duplicate(),
            failed = stats.failed(),
            "pipeline finished"
        );
        Ok(stats)
    }
}

/// Streams queries into the expansion stage, counting each before it is sent.
async fn feed_queries<R>(
    queries: &mut QueryReader<R>,
    query_tx: &mpsc::Sender<String>,
    tracker: &CompletionTracker,
    shutdown: &Shutdown,
) -> Result<(), PipelineError>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(query) = queries.next_query().await? {
        debug!(query = %query, "query read");
        tracker.queries().add()?;
        let sent = tokio::select! {
            biased;
            () = shutdown.cancelled() => false,
            sent = query_tx.send(query) => sent.is_ok(),
        };
        if !sent {
            tracker.queries().done();
            break;
        }
    }
    Ok(())
}
