//! Storage traits and error types
//!
//! This module defines the trait interface for outcome store backends and
//! associated error types.

use crate::case::{CaseId, CaseRecord};
use crate::output::RunStatistics;
use crate::state::{BoundaryEstimate, IdRecord, IdStatus, Observation};
use crate::storage::{RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt value in column {column}: {value}")]
    Corrupt { column: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for outcome store backends
///
/// Every mutating call must be durable before it returns: a process killed
/// right after `record` must find that outcome on restart.
pub trait OutcomeStore {
    // ===== Id Records =====

    /// Gets the stored record for an id, or the `Unknown` default if absent
    fn get(&self, id: &CaseId) -> StorageResult<IdRecord>;

    /// Applies an observation to an id's record and persists the result
    ///
    /// # Returns
    ///
    /// The record as stored after the transition
    fn record(&mut self, id: &CaseId, observation: &Observation) -> StorageResult<IdRecord>;

    /// Returns true if the id is unknown, or failed with retries left
    fn needs_probe(&self, id: &CaseId, retry_limit: u32) -> StorageResult<bool> {
        Ok(self.get(id)?.needs_probe(retry_limit))
    }

    /// Makes every failed id of a year eligible for probing again
    ///
    /// # Returns
    ///
    /// The number of ids that were reset
    fn reset_failed(&mut self, year: u8) -> StorageResult<u64>;

    /// Counts stored ids of a year by status
    fn count_by_status(&self, year: u8) -> StorageResult<HashMap<IdStatus, u64>>;

    /// Counts failed ids of a year that have used up their retries
    fn count_escalated(&self, year: u8, retry_limit: u32) -> StorageResult<u64>;

    // ===== Boundaries =====

    /// Gets the cached boundary estimate for a year
    fn get_boundary(&self, year: u8) -> StorageResult<Option<BoundaryEstimate>>;

    /// Stores (or replaces) the boundary estimate for a year
    fn put_boundary(&mut self, estimate: &BoundaryEstimate) -> StorageResult<()>;

    // ===== Case Data =====

    /// Saves extracted case data, replacing any earlier copy
    fn save_case(&mut self, case: &CaseRecord) -> StorageResult<()>;

    /// Loads saved case data for an id
    fn get_case(&self, id: &CaseId) -> StorageResult<Option<CaseRecord>>;

    // ===== Run Management =====

    /// Creates a new batch run record
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, year: u8, start_id: u32, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as finished with its final statistics
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &RunStatistics,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs for a year, newest first
    fn recent_runs(&self, year: u8, limit: u32) -> StorageResult<Vec<RunRecord>>;

    /// Marks runs left in the running state by a dead process as interrupted
    fn mark_interrupted_runs(&mut self) -> StorageResult<u64>;

    // ===== Locking =====

    /// Tries to take the single-writer lock
    ///
    /// A lock older than `stale_after` is taken over.
    ///
    /// # Returns
    ///
    /// * `None` - The lock is now held by `owner`
    /// * `Some(holder)` - Another owner holds the lock
    fn acquire_lock(
        &mut self,
        owner: &str,
        stale_after: chrono::Duration,
    ) -> StorageResult<Option<String>>;

    /// Releases the lock if `owner` holds it
    fn release_lock(&mut self, owner: &str) -> StorageResult<()>;
}
