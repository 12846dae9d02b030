//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with proxy and user-agent rotation
//! - HTML extraction of titles, content and links
//! - Frontier scheduling and politeness delays
//! - The coordinator that gates links and pages and owns the results

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::Coordinator;
pub use extractor::{clean_text, extract_content, extract_links, extract_page, extract_title, ExtractedPage, UNTITLED};
pub use fetcher::{build_http_client, is_html, FetchResult, HttpFetcher, PageFetcher};
pub use scheduler::{QueuedUrl, ScheduledFetch, Scheduler};

use crate::config::Config;
use crate::quality::{ContentQuality, QualityStats};
use crate::url::Rejection;
use crate::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A page that passed every gate
///
/// Created once per admitted page and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Hops from the root URL
    pub depth: usize,
    pub fetched_at: DateTime<Utc>,
    /// Present when quality gating was enabled
    pub quality: Option<ContentQuality>,
}

/// Why a link or page did not become a [`PageRecord`]
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// Rejected by the link admission policy
    Rejected(Rejection),
    /// Disallowed by a per-path robots.txt rule
    RobotsDisallowed,
    /// Canonical form already admitted
    Duplicate,
    /// Scored too low, a navigation page, or carrying an error issue
    QualityRejected { score: f64 },
    /// Page had no extractable text (quality gating disabled)
    EmptyContent,
    /// Network or HTTP failure
    FetchFailure(String),
    /// Response was not HTML
    NotHtml { content_type: Option<String> },
    /// Redirected outside the crawl domain
    OffScopeRedirect { final_url: String },
    /// Left in the frontier when the deadline passed
    DeadlineReached,
}

/// Counters for every filtering outcome of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_admitted: usize,
    pub policy_rejected: usize,
    pub robots_rejected: usize,
    pub duplicates: usize,
    pub quality_rejected: usize,
    pub empty_pages: usize,
    pub fetch_errors: usize,
    pub non_html: usize,
    pub off_scope_redirects: usize,
    pub abandoned: usize,
}

impl CrawlStats {
    pub fn record(&mut self, reason: &DropReason) {
        match reason {
            DropReason::Rejected(_) => self.policy_rejected += 1,
            DropReason::RobotsDisallowed => self.robots_rejected += 1,
            DropReason::Duplicate => self.duplicates += 1,
            DropReason::QualityRejected { .. } => self.quality_rejected += 1,
            DropReason::EmptyContent => self.empty_pages += 1,
            DropReason::FetchFailure(_) => self.fetch_errors += 1,
            DropReason::NotHtml { .. } => self.non_html += 1,
            DropReason::OffScopeRedirect { .. } => self.off_scope_redirects += 1,
            DropReason::DeadlineReached => self.abandoned += 1,
        }
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub root_url: String,
    /// Admitted pages in admission order
    pub pages: Vec<PageRecord>,
    pub stats: CrawlStats,
    pub quality: QualityStats,
    pub elapsed: Duration,
    pub deadline_reached: bool,
}

/// Runs a complete crawl over HTTP
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl drained its frontier
/// * `Err(MapperError)` - Invalid root URL, proxy configuration, or a robots.txt block
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    crawl_with_deadline(config, None).await
}

/// Like [`crawl`], but stops dispatching new fetches once `timeout` has elapsed
pub async fn crawl_with_deadline(config: Config, timeout: Option<Duration>) -> Result<CrawlReport> {
    let fetcher = HttpFetcher::from_config(&config)?;
    let mut coordinator = Coordinator::new(config, fetcher)?;
    let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
    coordinator.run_with_deadline(deadline).await
}
