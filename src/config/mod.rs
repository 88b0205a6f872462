//! Configuration module for Docket-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use docket_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Collecting {} ids, retry limit {}", config.collector.prefix, config.collector.retry_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BoundaryConfig, CollectorConfig, Config, ExtractorConfig, OriginConfig, OutputConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
