//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use tubefetch_core::fetch::{DEFAULT_FETCH_PROGRAM, DEFAULT_NICENESS};
use tubefetch_core::input::DEFAULT_INPUT_FILE;
use tubefetch_core::ledger::{DEFAULT_COMPLETED_LOG, DEFAULT_FAILED_LOG};
use tubefetch_core::search::DEFAULT_API_BASE;
use tubefetch_core::{DEFAULT_MAX_RESULTS, DEFAULT_PARALLELISM};

/// Turn search queries into a deduplicated set of downloaded media.
///
/// Each line of the input file is searched on YouTube; every video found is
/// downloaded once with an external tool, and completed ids are remembered in
/// a ledger so later runs skip them.
#[derive(Parser, Debug)]
#[command(name = "tubefetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Query file, one search per line
    #[arg(short, long, default_value = DEFAULT_INPUT_FILE)]
    pub input: PathBuf,

    /// Ledger of completed ids (read at start, appended on success)
    #[arg(long, default_value = DEFAULT_COMPLETED_LOG)]
    pub completed_log: PathBuf,

    /// Ledger of failed ids (read at start, appended on failure)
    #[arg(long, default_value = DEFAULT_FAILED_LOG)]
    pub failed_log: PathBuf,

    /// Create missing ledger files instead of failing
    #[arg(long)]
    pub init_ledgers: bool,

    /// Maximum concurrent downloads (1-64)
    #[arg(short = 'c', long, default_value_t = DEFAULT_PARALLELISM as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub parallelism: u8,

    /// Search results requested per query (1-50)
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_RESULTS, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub max_results: u32,

    /// Leading search results to ignore per query
    #[arg(long, default_value_t = 0)]
    pub skip_first: usize,

    /// YouTube Data API key (falls back to YOUTUBE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Search API base URL
    #[arg(long, default_value = DEFAULT_API_BASE, hide = true)]
    pub api_base: String,

    /// Download executable
    #[arg(long, default_value = DEFAULT_FETCH_PROGRAM)]
    pub fetch_program: PathBuf,

    /// Replace the default download arguments (repeatable; {id} and {url} are substituted)
    #[arg(long = "fetch-arg", allow_hyphen_values = true)]
    pub fetch_args: Vec<String>,

    /// Scheduling priority adjustment for downloads (0 disables `nice`)
    #[arg(long, default_value_t = DEFAULT_NICENESS, value_parser = clap::value_parser!(u8).range(0..=20))]
    pub niceness: u8,

    /// Record failures and keep going instead of stopping at the first error
    #[arg(short = 'k', long)]
    pub keep_going: bool,
}
