//! Integration tests for Docket-Sweep
//!
//! These tests run the HTTP prober and the batch collector against
//! wiremock servers standing in for the origin service.

mod collect_tests;
mod common;
mod probe_tests;
