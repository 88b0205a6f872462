//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the OutcomeStore trait.

use crate::case::{CaseId, CaseRecord, DocketEntry};
use crate::output::RunStatistics;
use crate::state::{BoundaryEstimate, IdRecord, IdStatus, Observation};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{OutcomeStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;

const LOCK_NAME: &str = "collector";

const RUN_COLUMNS: &str = "id, year, started_at, finished_at, config_hash, status, start_id, end_id,
     success, no_record, failed, skipped";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        // FULL sync: an outcome must survive a crash right after it is recorded
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn read_id_record(conn: &Connection, id: &CaseId) -> StorageResult<IdRecord> {
    let row: Option<(String, u32, Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT status, attempts, last_attempt_time, last_error
             FROM id_records WHERE year = ?1 AND number = ?2",
            params![id.year(), id.number()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;

    let Some((status, attempts, last_attempt_time, last_error)) = row else {
        return Ok(IdRecord::default());
    };

    let status = IdStatus::from_db_string(&status).ok_or(StorageError::Corrupt {
        column: "id_records.status",
        value: status.clone(),
    })?;

    Ok(IdRecord {
        status,
        attempts,
        last_attempt_time: last_attempt_time.and_then(|s| s.parse::<DateTime<Utc>>().ok()),
        last_error,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(RunRecord, String)> {
    let status: String = row.get(5)?;
    let run = RunRecord {
        id: row.get(0)?,
        year: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::Running,
        start_id: row.get(6)?,
        end_id: row.get(7)?,
        success: row.get::<_, i64>(8)? as u64,
        no_record: row.get::<_, i64>(9)? as u64,
        failed: row.get::<_, i64>(10)? as u64,
        skipped: row.get::<_, i64>(11)? as u64,
    };
    Ok((run, status))
}

fn resolve_run_status((mut run, status): (RunRecord, String)) -> StorageResult<RunRecord> {
    run.status = RunStatus::from_db_string(&status).ok_or(StorageError::Corrupt {
        column: "runs.status",
        value: status.clone(),
    })?;
    Ok(run)
}

impl OutcomeStore for SqliteStorage {
    // ===== Id Records =====

    fn get(&self, id: &CaseId) -> StorageResult<IdRecord> {
        read_id_record(&self.conn, id)
    }

    fn record(&mut self, id: &CaseId, observation: &Observation) -> StorageResult<IdRecord> {
        // Read-modify-write under a write lock so concurrent callers serialize
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = read_id_record(&tx, id)?;
        let next = current.apply(observation, Utc::now());

        tx.execute(
            "INSERT INTO id_records (year, number, prefix, status, attempts, last_attempt_time, last_error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(year, number) DO UPDATE SET
                prefix = excluded.prefix,
                status = excluded.status,
                attempts = excluded.attempts,
                last_attempt_time = excluded.last_attempt_time,
                last_error = excluded.last_error",
            params![
                id.year(),
                id.number(),
                id.prefix(),
                next.status.to_db_string(),
                next.attempts,
                next.last_attempt_time.map(|t| t.to_rfc3339()),
                next.last_error,
            ],
        )?;
        tx.commit()?;

        Ok(next)
    }

    fn reset_failed(&mut self, year: u8) -> StorageResult<u64> {
        let changed = self.conn.execute(
            "UPDATE id_records SET status = ?1, attempts = 0, last_error = NULL
             WHERE year = ?2 AND status = ?3",
            params![
                IdStatus::Unknown.to_db_string(),
                year,
                IdStatus::Failed.to_db_string()
            ],
        )?;
        Ok(changed as u64)
    }

    fn count_by_status(&self, year: u8) -> StorageResult<HashMap<IdStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM id_records WHERE year = ?1 GROUP BY status")?;

        let rows = stmt.query_map(params![year], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (status, count) = row?;
            let status = IdStatus::from_db_string(&status).ok_or(StorageError::Corrupt {
                column: "id_records.status",
                value: status.clone(),
            })?;
            counts.insert(status, count as u64);
        }

        Ok(counts)
    }

    fn count_escalated(&self, year: u8, retry_limit: u32) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM id_records WHERE year = ?1 AND status = ?2 AND attempts >= ?3",
            params![year, IdStatus::Failed.to_db_string(), retry_limit],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Boundaries =====

    fn get_boundary(&self, year: u8) -> StorageResult<Option<BoundaryEstimate>> {
        let row: Option<(u32, u32, u32, i32, String)> = self
            .conn
            .query_row(
                "SELECT high_water_mark, confidence_upper, probes, resolved, computed_at
                 FROM boundaries WHERE year = ?1",
                params![year],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((high_water_mark, confidence_upper, probes, resolved, computed_at)) = row else {
            return Ok(None);
        };

        let computed_at =
            computed_at
                .parse::<DateTime<Utc>>()
                .map_err(|_| StorageError::Corrupt {
                    column: "boundaries.computed_at",
                    value: computed_at.clone(),
                })?;

        Ok(Some(BoundaryEstimate {
            year,
            high_water_mark,
            confidence_upper,
            probes,
            resolved: resolved != 0,
            computed_at,
        }))
    }

    fn put_boundary(&mut self, estimate: &BoundaryEstimate) -> StorageResult<()> {
        let resolved_int = if estimate.resolved { 1 } else { 0 };
        self.conn.execute(
            "INSERT OR REPLACE INTO boundaries
             (year, high_water_mark, confidence_upper, probes, resolved, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                estimate.year,
                estimate.high_water_mark,
                estimate.confidence_upper,
                estimate.probes,
                resolved_int,
                estimate.computed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ===== Case Data =====

    fn save_case(&mut self, case: &CaseRecord) -> StorageResult<()> {
        let year = case.id.year();
        let number = case.id.number();
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        // Cascades to fields and docket entries
        tx.execute(
            "DELETE FROM cases WHERE year = ?1 AND number = ?2",
            params![year, number],
        )?;
        tx.execute(
            "INSERT INTO cases (year, number, case_id, title, fetched_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![year, number, case.id.to_string(), case.title, now],
        )?;

        for (position, (label, value)) in case.fields.iter().enumerate() {
            tx.execute(
                "INSERT INTO case_fields (year, number, position, label, value) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![year, number, position as i64, label, value],
            )?;
        }

        for (position, entry) in case.docket.iter().enumerate() {
            tx.execute(
                "INSERT INTO docket_entries
                 (year, number, position, entry_number, entry_date, office, summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    year,
                    number,
                    position as i64,
                    entry.number,
                    entry.date,
                    entry.office,
                    entry.summary
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_case(&self, id: &CaseId) -> StorageResult<Option<CaseRecord>> {
        let title: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT title FROM cases WHERE year = ?1 AND number = ?2",
                params![id.year(), id.number()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(title) = title else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT label, value FROM case_fields WHERE year = ?1 AND number = ?2 ORDER BY position",
        )?;
        let fields = stmt
            .query_map(params![id.year(), id.number()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT entry_number, entry_date, office, summary FROM docket_entries
             WHERE year = ?1 AND number = ?2 ORDER BY position",
        )?;
        let docket = stmt
            .query_map(params![id.year(), id.number()], |row| {
                Ok(DocketEntry {
                    number: row.get(0)?,
                    date: row.get(1)?,
                    office: row.get(2)?,
                    summary: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CaseRecord {
            id: id.clone(),
            title,
            fields,
            docket,
        }))
    }

    // ===== Run Management =====

    fn create_run(&mut self, year: u8, start_id: u32, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (year, started_at, config_hash, status, start_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![year, now, config_hash, RunStatus::Running.to_db_string(), start_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &RunStatistics,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, end_id = ?3,
             success = ?4, no_record = ?5, failed = ?6, skipped = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                stats.end_id,
                stats.success as i64,
                stats.no_record as i64,
                stats.failed as i64,
                stats.skipped as i64,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;

        resolve_run_status(row)
    }

    fn recent_runs(&self, year: u8, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs WHERE year = ?1 ORDER BY id DESC LIMIT ?2",
            RUN_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![year, limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(resolve_run_status).collect()
    }

    fn mark_interrupted_runs(&mut self) -> StorageResult<u64> {
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE status = ?2",
            params![
                RunStatus::Interrupted.to_db_string(),
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(changed as u64)
    }

    // ===== Locking =====

    fn acquire_lock(
        &mut self,
        owner: &str,
        stale_after: chrono::Duration,
    ) -> StorageResult<Option<String>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(String, String)> = tx
            .query_row(
                "SELECT owner, acquired_at FROM locks WHERE name = ?1",
                params![LOCK_NAME],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((holder, acquired_at)) = existing {
            let fresh = acquired_at
                .parse::<DateTime<Utc>>()
                .map(|at| Utc::now() - at < stale_after)
                .unwrap_or(false);

            if holder != owner && fresh {
                return Ok(Some(holder));
            }
            if holder != owner {
                tracing::warn!("Taking over stale lock held by {}", holder);
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO locks (name, owner, acquired_at) VALUES (?1, ?2, ?3)",
            params![LOCK_NAME, owner, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(None)
    }

    fn release_lock(&mut self, owner: &str) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM locks WHERE name = ?1 AND owner = ?2",
            params![LOCK_NAME, owner],
        )?;
        Ok(())
    }
}
