//! Output module for run statistics and stored summaries
//!
//! This module handles:
//! - Folding per-run counters into run statistics
//! - Reading year-level summaries back from the outcome store
//! - Printing both for the command line

pub mod stats;

pub use stats::{
    load_year_summary, print_run_statistics, print_year_summary, summarize, RunCounters,
    RunStatistics, YearSummary,
};
