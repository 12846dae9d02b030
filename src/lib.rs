//! docmapper: a polite documentation-site mapper
//!
//! This crate crawls a documentation site from a single root URL, decides which
//! discovered links are worth visiting, suppresses duplicate and low-value pages,
//! and assembles the accepted pages into a hierarchy that mirrors the site's URL
//! structure.

pub mod config;
pub mod crawler;
pub mod output;
pub mod quality;
pub mod robots;
pub mod tree;
pub mod url;

use thiserror::Error;

/// Main error type for docmapper operations
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Crawling disallowed by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Invalid proxy configuration: {0}")]
    ProxyConfiguration(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
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
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for docmapper operations
pub type Result<T> = std::result::Result<T, MapperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlReport, CrawlStats, PageRecord};
pub use quality::{ContentQuality, ContentQualityAnalyzer};
pub use tree::{DocumentNode, DocumentTree, NodeId, TreeBuilder};
pub use url::{normalize_url, DuplicateIndex, LinkPolicy, NormalizationPolicy};
