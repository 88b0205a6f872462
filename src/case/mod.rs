//! Case identity and collected case data
//!
//! # Components
//!
//! - `CaseId`: the `PREFIX-<number>-<year>` value object the whole crate is keyed by
//! - `CaseRecord` / `DocketEntry`: what an extractor produces for an existing case

mod id;
mod record;

pub use id::CaseId;
pub use record::{CaseRecord, DocketEntry};
