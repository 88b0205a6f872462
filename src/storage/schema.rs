//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Docket-Sweep database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track batch runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    start_id INTEGER NOT NULL,
    end_id INTEGER,
    success INTEGER NOT NULL DEFAULT 0,
    no_record INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_year ON runs(year);

-- Last-known outcome per probed id, scoped by year
CREATE TABLE IF NOT EXISTS id_records (
    year INTEGER NOT NULL,
    number INTEGER NOT NULL,
    prefix TEXT NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_attempt_time TEXT,
    last_error TEXT,
    PRIMARY KEY (year, number)
);

CREATE INDEX IF NOT EXISTS idx_id_records_status ON id_records(year, status);

-- Located upper end of each year's id space
CREATE TABLE IF NOT EXISTS boundaries (
    year INTEGER PRIMARY KEY,
    high_water_mark INTEGER NOT NULL,
    confidence_upper INTEGER NOT NULL,
    probes INTEGER NOT NULL,
    resolved INTEGER NOT NULL,
    computed_at TEXT NOT NULL
);

-- Collected case data
CREATE TABLE IF NOT EXISTS cases (
    year INTEGER NOT NULL,
    number INTEGER NOT NULL,
    case_id TEXT NOT NULL,
    title TEXT,
    fetched_at TEXT NOT NULL,
    PRIMARY KEY (year, number)
);

CREATE TABLE IF NOT EXISTS case_fields (
    year INTEGER NOT NULL,
    number INTEGER NOT NULL,
    position INTEGER NOT NULL,
    label TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (year, number, position),
    FOREIGN KEY (year, number) REFERENCES cases(year, number) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS docket_entries (
    year INTEGER NOT NULL,
    number INTEGER NOT NULL,
    position INTEGER NOT NULL,
    entry_number INTEGER,
    entry_date TEXT,
    office TEXT,
    summary TEXT NOT NULL,
    PRIMARY KEY (year, number, position),
    FOREIGN KEY (year, number) REFERENCES cases(year, number) ON DELETE CASCADE
);

-- Advisory single-writer lock
CREATE TABLE IF NOT EXISTS locks (
    name TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    acquired_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
