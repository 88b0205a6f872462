//! Probing and extraction contracts
//!
//! The collector only depends on these traits; the HTTP and HTML
//! implementations live in `fetcher` and `parser`.

use crate::case::{CaseId, CaseRecord};
use thiserror::Error;

/// Tri-state result of one existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOutcome {
    Exists,
    NotFound,
    TransientError,
}

/// Raw content fetched for an existing case
#[derive(Debug, Clone)]
pub struct CaseDocument {
    pub id: CaseId,
    pub url: String,
    pub body: String,
}

/// What a prober returns for one id
#[derive(Debug, Clone)]
pub enum ProbeResponse {
    /// The case exists; the document can be handed to an extractor
    Exists(CaseDocument),

    /// The origin reported no such case
    NotFound,

    /// Network error, timeout or anti-abuse response
    TransientError(String),
}

impl ProbeResponse {
    pub fn outcome(&self) -> ProbeOutcome {
        match self {
            Self::Exists(_) => ProbeOutcome::Exists,
            Self::NotFound => ProbeOutcome::NotFound,
            Self::TransientError(_) => ProbeOutcome::TransientError,
        }
    }
}

/// Performs one existence check per call against the origin service
///
/// Implementations must not cache results; remembering outcomes is the
/// outcome store's job.
#[allow(async_fn_in_trait)]
pub trait Prober {
    async fn probe(&mut self, id: &CaseId) -> ProbeResponse;
}

/// Errors raised when a fetched document cannot be turned into a case record
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Malformed case document for {id}: {message}")]
    Malformed { id: String, message: String },

    #[error("Invalid selector {0}")]
    Selector(String),
}

/// Turns a fetched case document into structured case data
pub trait Extractor {
    fn extract(&self, document: &CaseDocument) -> Result<CaseRecord, ExtractionError>;
}
