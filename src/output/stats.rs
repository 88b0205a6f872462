//! Run and year statistics
//!
//! Run statistics are folded from the outcomes recorded during one run and
//! returned to the caller; nothing here keeps global counters. Year
//! summaries are read back from the outcome store.

use crate::state::{BoundaryEstimate, IdStatus};
use crate::storage::{OutcomeStore, RunRecord, StorageResult};
use std::collections::HashMap;

/// Per-run tallies accumulated by the batch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Probes issued
    pub attempted: u64,
    pub success: u64,
    pub no_record: u64,

    /// Ids escalated during this run
    pub failed: u64,
    pub skipped: u64,

    /// Ids that failed but still have retries left
    pub pending: u64,
}

/// Statistics for one batch invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    pub start_id: u32,

    /// Last id actually covered; earlier than requested if the run stopped early
    pub end_id: u32,
    pub total: u64,
    pub attempted: u64,
    pub success: u64,
    pub no_record: u64,
    pub failed: u64,
    pub skipped: u64,

    /// Ids left `UNKNOWN` or failed-but-retryable, eligible for a future run
    pub unresolved: u64,
}

impl RunStatistics {
    /// Returns true if every id in the range is accounted for exactly once
    pub fn is_consistent(&self) -> bool {
        self.total == self.success + self.no_record + self.failed + self.skipped + self.unresolved
    }
}

/// Builds run statistics for `start..=end` from the run's counters
///
/// An empty range (`end < start`) has a total of zero.
pub fn summarize(start: u32, end: u32, counters: &RunCounters) -> RunStatistics {
    let total = if end >= start {
        (end - start) as u64 + 1
    } else {
        0
    };

    let settled = counters.success + counters.no_record + counters.failed + counters.skipped;

    RunStatistics {
        start_id: start,
        end_id: end,
        total,
        attempted: counters.attempted,
        success: counters.success,
        no_record: counters.no_record,
        failed: counters.failed,
        skipped: counters.skipped,
        unresolved: total.saturating_sub(settled),
    }
}

/// Prints run statistics to stdout in a formatted manner
pub fn print_run_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");
    println!("  Range: {}..={} ({} ids)", stats.start_id, stats.end_id, stats.total);
    println!("  Probes issued: {}", stats.attempted);
    println!("  Success: {}", stats.success);
    println!("  No record: {}", stats.no_record);
    println!("  Failed (escalated): {}", stats.failed);
    println!("  Skipped (already settled): {}", stats.skipped);
    println!("  Unresolved (retry next run): {}", stats.unresolved);
}

/// Stored state of one year's id space
#[derive(Debug, Clone)]
pub struct YearSummary {
    pub year: u8,

    /// Count of ids by stored status
    pub by_status: HashMap<IdStatus, u64>,

    /// Failed ids that will no longer be retried
    pub escalated: u64,

    pub boundary: Option<BoundaryEstimate>,
    pub recent_runs: Vec<RunRecord>,
}

impl YearSummary {
    pub fn count(&self, status: IdStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.by_status.values().sum()
    }
}

/// Loads a year summary from storage
///
/// # Arguments
///
/// * `storage` - The outcome store to query
/// * `year` - Two-digit year scope
/// * `retry_limit` - Used to tell escalated failures from retryable ones
pub fn load_year_summary(
    storage: &dyn OutcomeStore,
    year: u8,
    retry_limit: u32,
) -> StorageResult<YearSummary> {
    Ok(YearSummary {
        year,
        by_status: storage.count_by_status(year)?,
        escalated: storage.count_escalated(year, retry_limit)?,
        boundary: storage.get_boundary(year)?,
        recent_runs: storage.recent_runs(year, 5)?,
    })
}

/// Prints a year summary to stdout
pub fn print_year_summary(summary: &YearSummary) {
    println!("=== Year {:02} ===\n", summary.year);

    println!("Ids by Status:");
    let total = summary.total();
    for status in IdStatus::all_statuses() {
        let count = summary.count(status);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    if total == 0 {
        println!("  (no ids recorded)");
    }
    println!("  Escalated failures: {}", summary.escalated);
    println!();

    match &summary.boundary {
        Some(boundary) => {
            println!("Boundary:");
            println!("  High-water mark: {}", boundary.high_water_mark);
            println!("  Confirmed empty at: {}", boundary.confidence_upper);
            println!(
                "  Resolved: {} ({} probes, {})",
                boundary.resolved,
                boundary.probes,
                boundary.computed_at.to_rfc3339()
            );
        }
        None => println!("Boundary: not located yet"),
    }
    println!();

    if !summary.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &summary.recent_runs {
            let end = run
                .end_id
                .map(|end| end.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "  #{} {} [{}..={}] {} success, {} no record, {} failed, {} skipped ({})",
                run.id,
                run.status.to_db_string(),
                run.start_id,
                end,
                run.success,
                run.no_record,
                run.failed,
                run.skipped,
                run.started_at
            );
        }
    }
}
