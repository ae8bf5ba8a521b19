use std::sync::atomic::{AtomicUsize, Ordering};

/// Statistics from one pipeline run.
///
/// Uses atomic counters so both stages and every download task can update
/// them without locking.
#[derive(Debug, Default)]
pub struct PipelineStats {
    queries: AtomicUsize,
    search_failures: AtomicUsize,
    candidates: AtomicUsize,
    dropped: AtomicUsize,
    skipped_known: AtomicUsize,
    skipped_duplicate: AtomicUsize,
    fetched: AtomicUsize,
    failed: AtomicUsize,
}

impl PipelineStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries whose search succeeded.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Queries whose search failed.
    #[must_use]
    pub fn search_failures(&self) -> usize {
        self.search_failures.load(Ordering::SeqCst)
    }

    /// Identifiers forwarded to the download stage.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.candidates.load(Ordering::SeqCst)
    }

    /// Search results dropped because they were not playable.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Identifiers skipped because a ledger already had them.
    #[must_use]
    pub fn skipped_known(&self) -> usize {
        self.skipped_known.load(Ordering::SeqCst)
    }

    /// Identifiers skipped because another task already claimed them this run.
    #[must_use]
    pub fn skipped_duplicate(&self) -> usize {
        self.skipped_duplicate.load(Ordering::SeqCst)
    }

    /// Successful fetches.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    /// Failed fetches.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Fetch attempts (fetched + failed).
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.fetched() + self.failed()
    }

    pub(crate) fn increment_queries(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_search_failures(&self) {
        self.search_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_candidates(&self) {
        self.candidates.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_skipped_known(&self) {
        self.skipped_known.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_skipped_duplicate(&self) {
        self.skipped_duplicate.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Copies the current counter values into a fresh instance.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        let copy = |counter: &AtomicUsize| AtomicUsize::new(counter.load(Ordering::SeqCst));
        Self {
            queries: copy(&self.queries),
            search_failures: copy(&self.search_failures),
            candidates: copy(&self.candidates),
            dropped: copy(&self.dropped),
            skipped_known: copy(&self.skipped_known),
            skipped_duplicate: copy(&self.skipped_duplicate),
            fetched: copy(&self.fetched),
            failed: copy(&self.failed),
        }
    }
}
