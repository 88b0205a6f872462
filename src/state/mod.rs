//! State module for tracking collection progress
//!
//! This module provides the persisted state the collector works from.
//!
//! # Components
//!
//! - `IdStatus` / `IdRecord`: per-id outcome and retry counter
//! - `Observation`: what a probe saw, driving `IdRecord` transitions
//! - `BoundaryEstimate`: the located upper end of a year's id space

mod boundary;
mod id_record;

// Re-export main types
pub use boundary::BoundaryEstimate;
pub use id_record::{IdRecord, IdStatus, Observation};
