use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tubefetch_core::{CommandFetcher, Pipeline, PipelineError, YouTubeSearch};

use crate::ProcessExit;
use crate::app::{config_manager, exit_handler, terminal};
use crate::cli::Args;

pub(crate) async fn run_tubefetch() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    terminal::init_tracing(&args);

    debug!("CLI arguments parsed");
    info!("tubefetch starting");

    let resolved = config_manager::resolve_config(&args)?;

    let fetch_command = resolved
        .fetch_command
        .resolve()
        .context("download tool is not available")?;
    debug!(program = %fetch_command.program().display(), "download tool found");
    let fetcher = Arc::new(CommandFetcher::new(fetch_command));

    let search = Arc::new(
        YouTubeSearch::with_base_url(resolved.api_key, resolved.api_base)
            .context("cannot build search client")?,
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let pipeline = Pipeline::new(resolved.pipeline, search, fetcher).with_cancellation(cancel);

    let stats = match pipeline
        .run_files(
            &resolved.input,
            &resolved.ledger_paths,
            resolved.init_ledgers,
        )
        .await
    {
        Ok(stats) => stats,
        Err(PipelineError::Interrupted) => {
            warn!("Interrupted. Run again to resume.");
            return Ok(ProcessExit::Failure);
        }
        Err(error) => return Err(error).context("pipeline stopped"),
    };

    info!(
        queries = stats.queries(),
        fetched = stats.fetched(),
        already_done = stats.skipped_known(),
        duplicates = stats.skipped_duplicate(),
        dropped = stats.dropped(),
        failed = stats.failed(),
        search_failures = stats.search_failures(),
        "Run complete"
    );

    Ok(exit_handler::exit_outcome_for(&stats))
}
