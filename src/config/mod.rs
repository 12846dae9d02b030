//! Configuration module for docmapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use docmapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docmapper.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DeduplicationConfig, OutputConfig, OutputFormat, OutputLayout,
    QualityConfig, SortKey, TreeConfig, UserAgentConfig, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, read_config};
pub use validation::validate;
