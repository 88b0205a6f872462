/// Per-id collection state
///
/// This module defines the persisted status of every probed id and the rules
/// for moving between statuses after a probe.
use crate::collector::ProbeOutcome;
use chrono::{DateTime, Utc};
use std::fmt;

/// Last-known outcome for a case id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdStatus {
    /// Never probed (the default for ids with no stored record)
    Unknown,

    // ===== Terminal States =====
    /// The case exists and its data was extracted at least once
    Success,

    /// The origin reported that no such case exists
    NoRecord,

    // ===== Retryable State =====
    /// The last attempt(s) failed transiently or the page could not be extracted
    Failed,
}

impl IdStatus {
    /// Returns true for statuses that are never re-probed by batch runs
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success | Self::NoRecord)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Success => "success",
            Self::NoRecord => "no_record",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "success" => Some(Self::Success),
            "no_record" => Some(Self::NoRecord),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Unknown, Self::Success, Self::NoRecord, Self::Failed]
    }
}

impl fmt::Display for IdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// What one probe (plus extraction, for existing ids) observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The case exists and the extractor produced a case record
    Extracted,

    /// The case exists but its content could not be extracted
    ExtractionFailed(String),

    /// The origin reported no such case
    NotFound,

    /// The probe failed for a network, timeout or anti-abuse reason
    Transient(String),
}

impl Observation {
    /// The tri-state probe outcome underlying this observation
    pub fn outcome(&self) -> ProbeOutcome {
        match self {
            Self::Extracted | Self::ExtractionFailed(_) => ProbeOutcome::Exists,
            Self::NotFound => ProbeOutcome::NotFound,
            Self::Transient(_) => ProbeOutcome::TransientError,
        }
    }

    fn error_message(&self) -> Option<&str> {
        match self {
            Self::ExtractionFailed(message) | Self::Transient(message) => Some(message),
            Self::Extracted | Self::NotFound => None,
        }
    }
}

/// Stored state for one id within a year scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRecord {
    pub status: IdStatus,

    /// Consecutive failed attempts; zero unless `status` is `Failed`
    pub attempts: u32,

    pub last_attempt_time: Option<DateTime<Utc>>,

    /// Message from the most recent failed attempt
    pub last_error: Option<String>,
}

impl Default for IdRecord {
    fn default() -> Self {
        Self {
            status: IdStatus::Unknown,
            attempts: 0,
            last_attempt_time: None,
            last_error: None,
        }
    }
}

impl IdRecord {
    /// Computes the record that results from applying an observation
    ///
    /// | Observation | New status | Attempts |
    /// |-------------|------------|----------|
    /// | Extracted | Success | reset to 0 |
    /// | ExtractionFailed | Failed | +1 |
    /// | NotFound | NoRecord | reset to 0 |
    /// | Transient | Failed | +1 |
    pub fn apply(&self, observation: &Observation, now: DateTime<Utc>) -> IdRecord {
        let (status, attempts) = match observation {
            Observation::Extracted => (IdStatus::Success, 0),
            Observation::NotFound => (IdStatus::NoRecord, 0),
            Observation::ExtractionFailed(_) | Observation::Transient(_) => {
                // Only consecutive failures count toward the retry limit
                let previous = if self.status == IdStatus::Failed {
                    self.attempts
                } else {
                    0
                };
                (IdStatus::Failed, previous.saturating_add(1))
            }
        };

        IdRecord {
            status,
            attempts,
            last_attempt_time: Some(now),
            last_error: observation.error_message().map(str::to_string),
        }
    }

    /// Returns true if a batch run should probe this id
    pub fn needs_probe(&self, retry_limit: u32) -> bool {
        match self.status {
            IdStatus::Unknown => true,
            IdStatus::Failed => self.attempts < retry_limit,
            IdStatus::Success | IdStatus::NoRecord => false,
        }
    }

    /// Returns true for a failed id that has used up its retry budget
    pub fn is_escalated(&self, retry_limit: u32) -> bool {
        self.status == IdStatus::Failed && self.attempts >= retry_limit
    }
}
