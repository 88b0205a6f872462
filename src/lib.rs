//! Docket-Sweep: a polite collector for sparse, year-scoped case ids
//!
//! This crate discovers which ids of the form `PREFIX-<number>-<year>` exist on
//! an origin service and collects each existing case, while keeping the number
//! of requests low and making repeated runs incremental and resumable.

pub mod case;
pub mod collector;
pub mod config;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Docket-Sweep operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Case id error: {0}")]
    CaseId(#[from] CaseIdError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Run {run_id} stopped by a storage failure: {source}")]
    RunFailed {
        run_id: i64,
        /// Statistics for the ids covered before the failure
        stats: Box<RunStatistics>,
        #[source]
        source: Box<HarvestError>,
    },

    #[error("Outcome store is locked by {owner}")]
    Locked { owner: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Errors produced when parsing or building a case id
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaseIdError {
    #[error("Malformed case id: {0}")]
    Malformed(String),

    #[error("Case id prefix cannot be empty")]
    EmptyPrefix,

    #[error("Year must be a two-digit value, got {0}")]
    InvalidYear(u32),
}

/// Result type alias for Docket-Sweep operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use case::{CaseId, CaseRecord, DocketEntry};
pub use collector::{Collector, RunReport, RunWarning};
pub use config::Config;
pub use output::RunStatistics;
pub use state::{BoundaryEstimate, IdRecord, IdStatus, Observation};
