//! Configuration lifecycle: merge CLI flags and environment into run settings.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tubefetch_core::{
    FailurePolicy, FetchCommand, LedgerPaths, PipelineConfig, SearchPage,
};

use crate::cli::Args;

/// Environment variable consulted when `--api-key` is absent.
pub(crate) const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Resolved configuration bundle used by the runtime.
pub(crate) struct ResolvedConfig {
    pub(crate) input: PathBuf,
    pub(crate) ledger_paths: LedgerPaths,
    pub(crate) init_ledgers: bool,
    pub(crate) pipeline: PipelineConfig,
    pub(crate) api_key: String,
    pub(crate) api_base: String,
    pub(crate) fetch_command: FetchCommand,
}

/// Single entry point that returns a resolved config bundle.
pub(crate) fn resolve_config(args: &Args) -> Result<ResolvedConfig> {
    let api_key = resolve_api_key(args.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())?;

    let policy = if args.keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::FailFast
    };
    let pipeline = PipelineConfig::new(usize::from(args.parallelism))
        .context("invalid pipeline configuration")?
        .with_page(SearchPage {
            max_results: args.max_results,
            skip_first: args.skip_first,
        })
        .with_failure_policy(policy);

    Ok(ResolvedConfig {
        input: args.input.clone(),
        ledger_paths: LedgerPaths::new(&args.completed_log, &args.failed_log),
        init_ledgers: args.init_ledgers,
        pipeline,
        api_key,
        api_base: args.api_base.clone(),
        fetch_command: build_fetch_command(args),
    })
}

fn resolve_api_key(flag: Option<&str>, env: Option<String>) -> Result<String> {
    let key = flag
        .map(str::to_string)
        .or(env)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());
    match key {
        Some(key) => Ok(key),
        None => bail!("missing search API key: pass --api-key or set {API_KEY_ENV}"),
    }
}

fn build_fetch_command(args: &Args) -> FetchCommand {
    let command = if args.fetch_args.is_empty() {
        FetchCommand::audio_extract(&args.fetch_program)
    } else {
        args.fetch_args
            .iter()
            .fold(FetchCommand::new(&args.fetch_program), |command, arg| {
                command.arg(arg)
            })
    };
    command.niceness(Some(args.niceness))
}
