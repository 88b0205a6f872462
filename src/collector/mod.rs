//! Collector module - probing, boundary search and batch collection
//!
//! This module contains:
//! - The `Prober` and `Extractor` contracts and their HTTP/HTML implementations
//! - Randomized request pacing
//! - The boundary locator for a year's id space
//! - The batch collector that drives resumable runs

mod coordinator;
mod fetcher;
mod locator;
mod parser;
mod prober;
mod scheduler;

pub use coordinator::{BatchRequest, Collector, RunReport, RunWarning};
pub use fetcher::{build_http_client, render_case_url, HttpProber};
pub use locator::BoundaryLocator;
pub use parser::HtmlExtractor;
pub use prober::{CaseDocument, ExtractionError, Extractor, ProbeOutcome, ProbeResponse, Prober};
pub use scheduler::Throttle;
