//! In-memory collaborators for driving the pipeline without network or
//! subprocesses.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tubefetch_core::{
    CompletionLog, FailurePolicy, FetchError, FetchOutput, Fetcher, ItemId, LedgerPaths,
    LedgerSnapshot, Pipeline, PipelineConfig, PipelineError, PipelineStats, QueryReader,
    SearchError, SearchHit, SearchPage, SearchProvider,
};

/// Search provider backed by a fixed query -> hits table.
#[derive(Default)]
pub struct FakeSearch {
    results: HashMap<String, Vec<SearchHit>>,
    failing: HashSet<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert(query.to_string(), hits);
        self
    }

    pub fn with_videos(self, query: &str, ids: &[&str]) -> Self {
        let hits = ids.iter().map(|id| SearchHit::video(*id)).collect();
        self.with_hits(query, hits)
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, query: &str, page: &SearchPage) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(query) {
            return Err(SearchError::api(query, 403, "quotaExceeded"));
        }
        Ok(self
            .results
            .get(query)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .skip(page.skip_first)
            .collect())
    }
}

/// Fetcher that records calls and the peak number of concurrent fetches.
#[derive(Default)]
pub struct FakeFetcher {
    delay: Duration,
    failing: HashSet<ItemId>,
    unspawnable: HashSet<ItemId>,
    calls: Mutex<Vec<ItemId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(ItemId::from(id));
        self
    }

    /// Fails `id` as if the tool could not be started at all.
    pub fn spawn_failing_on(mut self, id: &str) -> Self {
        self.unspawnable.insert(ItemId::from(id));
        self
    }

    pub fn calls(&self) -> Vec<ItemId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, id: &str) -> usize {
        let id = ItemId::from(id);
        self.calls().iter().filter(|called| **called == id).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, id: &ItemId) -> Result<FetchOutput, FetchError> {
        self.calls.lock().unwrap().push(id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.unspawnable.contains(id) {
            return Err(FetchError::Spawn {
                program: PathBuf::from("youtube-dl"),
                id: id.clone(),
                source: std::io::Error::other("too many open files"),
            });
        }
        if self.failing.contains(id) {
            return Err(FetchError::failed(
                id.clone(),
                "exit status: 1",
                "",
                "ERROR: video unavailable",
            ));
        }
        Ok(FetchOutput {
            stdout: format!("[download] {id} done\n"),
        })
    }
}

/// Temporary directory holding both ledgers.
pub struct Workspace {
    pub dir: TempDir,
    pub paths: LedgerPaths,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_ledgers(&[], &[])
    }

    pub fn with_ledgers(completed: &[&str], failed: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let paths = LedgerPaths::new(dir.path().join("dled.txt"), dir.path().join("fails.txt"));
        std::fs::write(&paths.completed, lines(completed)).unwrap();
        std::fs::write(&paths.failed, lines(failed)).unwrap();
        Self { dir, paths }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn completed_lines(&self) -> Vec<String> {
        read_lines(&self.paths.completed)
    }

    pub fn failed_lines(&self) -> Vec<String> {
        read_lines(&self.paths.failed)
    }

    /// Loads the ledgers from disk and runs `pipeline` over `input`.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        input: &str,
    ) -> Result<PipelineStats, PipelineError> {
        let ledger = LedgerSnapshot::load(&self.paths, false).await?;
        let log = Arc::new(CompletionLog::open(&self.paths).await?);
        pipeline
            .run(QueryReader::from_reader(input.as_bytes()), ledger, log)
            .await
    }
}

pub fn pipeline(
    parallelism: usize,
    policy: FailurePolicy,
    search: &Arc<FakeSearch>,
    fetcher: &Arc<FakeFetcher>,
) -> Pipeline {
    let config = PipelineConfig::new(parallelism)
        .unwrap()
        .with_failure_policy(policy);
    let search: Arc<dyn SearchProvider> = Arc::clone(search) as Arc<dyn SearchProvider>;
    let fetcher: Arc<dyn Fetcher> = Arc::clone(fetcher) as Arc<dyn Fetcher>;
    Pipeline::new(config, search, fetcher)
}

fn lines(ids: &[&str]) -> String {
    ids.iter().map(|id| format!("{id}\n")).collect()
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
