//! Exit code logic for the tubefetch process.
//!
//! Single responsibility: map fetched/failed counts to the process exit outcome.

use tubefetch_core::PipelineStats;

use crate::ProcessExit;

/// Determines the process exit outcome from fetched and failed unit counts.
pub(crate) fn determine_exit_outcome(fetched: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if fetched > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Search failures and fetch failures both count as failed units.
pub(crate) fn exit_outcome_for(stats: &PipelineStats) -> ProcessExit {
    determine_exit_outcome(stats.fetched(), stats.failed() + stats.search_failures())
}
