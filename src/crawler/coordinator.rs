//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - The robots.txt check and seeding of the frontier
//! - Dispatching fetch workers within the concurrency limit
//! - Gating links (admission policy, robots rules, duplicates) and pages (quality)
//! - Collecting admitted pages and statistics
//!
//! Workers only fetch, extract and score. Every decision that touches shared
//! state happens here, on the coordinator's own task, as worker outcomes arrive.

use crate::config::Config;
use crate::crawler::extractor::{extract_page, ExtractedPage};
use crate::crawler::fetcher::{is_html, FetchResult, PageFetcher};
use crate::crawler::scheduler::{QueuedUrl, ScheduledFetch, Scheduler};
use crate::crawler::{CrawlReport, CrawlStats, DropReason, PageRecord};
use crate::quality::{ContentQuality, ContentQualityAnalyzer, QualityStats};
use crate::robots::{check_robots, ParsedRobots};
use crate::url::{scope_key, DuplicateIndex, LinkPolicy, NormalizationPolicy};
use crate::{MapperError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Pages between progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// What a worker hands back to the coordinator
enum WorkerOutcome {
    Fetched(FetchedPage),
    Dropped { queued: QueuedUrl, reason: DropReason },
}

struct FetchedPage {
    queued: QueuedUrl,
    final_url: Url,
    page: ExtractedPage,
    quality: Option<ContentQuality>,
    fetched_at: DateTime<Utc>,
}

/// Main crawler coordinator structure
pub struct Coordinator<F: PageFetcher> {
    config: Arc<Config>,
    fetcher: Arc<F>,
    analyzer: Option<Arc<ContentQualityAnalyzer>>,
    policy: LinkPolicy,
    dedup: DuplicateIndex,
    scheduler: Scheduler,
    root: Url,
    root_host: String,
    /// Treat `www.host` and `host` as one site
    strip_www: bool,
    robots: ParsedRobots,
    deadline: Option<tokio::time::Instant>,
    pages: Vec<PageRecord>,
    stats: CrawlStats,
    quality_stats: QualityStats,
}

impl<F: PageFetcher> Coordinator<F> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Source of pages
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(MapperError::InvalidUrl)` - The root URL cannot be parsed or has no host
    pub fn new(config: Config, fetcher: F) -> Result<Self> {
        let root_url = config.crawler.root_url.trim();
        let root = Url::parse(root_url).map_err(|e| MapperError::InvalidUrl {
            url: root_url.to_string(),
            reason: e.to_string(),
        })?;
        let strip_www = config.deduplication.enabled && config.deduplication.strip_www;
        let root_host = scope_key(&root, strip_www).map_err(|e| MapperError::InvalidUrl {
            url: root_url.to_string(),
            reason: e.to_string(),
        })?;

        let policy = if config.deduplication.enabled {
            config.deduplication.policy()
        } else {
            NormalizationPolicy::identity()
        };

        let analyzer = config
            .quality
            .enabled
            .then(|| Arc::new(ContentQualityAnalyzer::new(config.quality.clone())));

        let scheduler = Scheduler::new(&config.crawler);

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            analyzer,
            policy: LinkPolicy::new(),
            dedup: DuplicateIndex::new(policy),
            scheduler,
            root,
            root_host,
            strip_www,
            robots: ParsedRobots::allow_all(),
            deadline: None,
            pages: Vec::new(),
            stats: CrawlStats::default(),
            quality_stats: QualityStats::default(),
        })
    }

    /// Runs the crawl until the frontier is drained
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.run_with_deadline(None).await
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Checks robots.txt and seeds the frontier with the root URL
    /// 2. Dispatches queued URLs to workers while slots are free
    /// 3. Handles each worker outcome as it completes
    /// 4. Stops when the frontier is empty and no worker is running
    ///
    /// Once `deadline` passes no new fetches are dispatched; running workers
    /// are still awaited and their pages kept.
    pub async fn run_with_deadline(
        &mut self,
        deadline: Option<tokio::time::Instant>,
    ) -> Result<CrawlReport> {
        self.deadline = deadline;
        let start_time = Instant::now();

        tracing::info!(
            "Starting crawl of {} (max depth {}, concurrency {})",
            self.root,
            self.config.crawler.max_depth,
            self.config.crawler.concurrency
        );

        if self.config.crawler.respect_robots {
            self.robots = check_robots(
                self.fetcher.as_ref(),
                &self.root,
                &self.config.user_agent.robots_name,
            )
            .await?;
        }

        self.dedup.admit(self.root.as_str());
        self.scheduler.add_to_frontier(self.root.clone(), 0);

        let mut workers: JoinSet<WorkerOutcome> = JoinSet::new();
        let concurrency = self.config.crawler.concurrency.max(1);

        loop {
            while !self.scheduler.is_empty() && workers.len() < concurrency {
                if self.deadline_passed() {
                    self.abandon_frontier();
                    break;
                }

                let Some(scheduled) = self.scheduler.next_url().await else {
                    break;
                };

                tracing::debug!(
                    "Dispatching {} (depth {})",
                    scheduled.url.url,
                    scheduled.url.depth
                );
                workers.spawn(run_worker(
                    Arc::clone(&self.fetcher),
                    self.analyzer.clone(),
                    scheduled,
                ));
            }

            let Some(joined) = workers.join_next().await else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            match joined {
                Ok(outcome) => self.handle_outcome(outcome),
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    self.stats.fetch_errors += 1;
                }
            }
        }

        self.stats.pages_admitted = self.pages.len();
        let elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl completed: {} pages admitted in {:?} ({} duplicates, {} rejected by quality, {} fetch errors)",
            self.stats.pages_admitted,
            elapsed,
            self.stats.duplicates,
            self.stats.quality_rejected,
            self.stats.fetch_errors
        );

        Ok(CrawlReport {
            root_url: self.root.to_string(),
            pages: std::mem::take(&mut self.pages),
            stats: self.stats.clone(),
            quality: self.quality_stats.clone(),
            elapsed,
            deadline_reached: self.deadline_passed(),
        })
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| tokio::time::Instant::now() >= deadline)
    }

    fn abandon_frontier(&mut self) {
        let discarded = self.scheduler.clear_frontier();
        if discarded > 0 {
            tracing::warn!("Deadline reached, abandoning {} queued URLs", discarded);
        }
        self.stats.abandoned += discarded;
    }

    fn drop_page(&mut self, url: &str, reason: DropReason) {
        tracing::debug!("Dropping {}: {:?}", url, reason);
        self.stats.record(&reason);
    }

    fn handle_outcome(&mut self, outcome: WorkerOutcome) {
        match outcome {
            WorkerOutcome::Dropped { queued, reason } => {
                if let DropReason::FetchFailure(message) = &reason {
                    tracing::warn!("Failed to fetch {}: {}", queued.url, message);
                }
                self.drop_page(queued.url.as_str(), reason);
            }
            WorkerOutcome::Fetched(fetched) => self.handle_fetched(fetched),
        }
    }

    /// Applies the redirect, quality and content gates, then follows links
    fn handle_fetched(&mut self, fetched: FetchedPage) {
        let FetchedPage {
            queued,
            final_url,
            page,
            quality,
            fetched_at,
        } = fetched;

        if final_url != queued.url {
            if scope_key(&final_url, self.strip_www).ok().as_deref() != Some(self.root_host.as_str()) {
                let reason = DropReason::OffScopeRedirect {
                    final_url: final_url.to_string(),
                };
                self.drop_page(queued.url.as_str(), reason);
                return;
            }

            // The queued URL was admitted when it was enqueued; only a redirect
            // to a different canonical page needs its own admission
            let same_page = self.dedup.canonical_of(final_url.as_str())
                == self.dedup.canonical_of(queued.url.as_str());
            if !same_page && !self.dedup.admit(final_url.as_str()) {
                tracing::debug!("{} redirected to known page {}", queued.url, final_url);
                self.drop_page(queued.url.as_str(), DropReason::Duplicate);
                return;
            }
        }

        let admitted = match (self.analyzer.as_deref(), &quality) {
            (Some(analyzer), Some(assessment)) => {
                self.quality_stats.record(assessment);
                if analyzer.should_skip(assessment) {
                    tracing::debug!(
                        "Quality gate rejected {} (score {:.2}, {} issues, navigation: {})",
                        final_url,
                        assessment.score,
                        assessment.issues.len(),
                        assessment.is_navigation_page
                    );
                    self.stats.record(&DropReason::QualityRejected {
                        score: assessment.score,
                    });
                    false
                } else {
                    true
                }
            }
            _ if page.content.trim().is_empty() => {
                self.drop_page(final_url.as_str(), DropReason::EmptyContent);
                false
            }
            _ => true,
        };

        // Links are followed even from rejected pages
        self.enqueue_links(&page.links, &final_url, queued.depth + 1);

        if admitted {
            self.pages.push(PageRecord {
                url: final_url.to_string(),
                title: page.title,
                content: page.content,
                depth: queued.depth,
                fetched_at,
                quality,
            });
            self.report_progress();
        }
    }

    /// Admission policy, robots rules, then duplicate suppression
    fn enqueue_links(&mut self, links: &[String], origin: &Url, depth: usize) {
        let max_depth = self.config.crawler.max_depth;

        for link in links {
            let mut target = match self.policy.evaluate(link, origin, depth, max_depth) {
                Ok(url) => url,
                Err(rejection) => {
                    tracing::trace!("Rejected link {} on {}: {}", link, origin, rejection);
                    self.stats.record(&DropReason::Rejected(rejection));
                    continue;
                }
            };
            target.set_fragment(None);

            if self.config.crawler.respect_robots
                && !self
                    .robots
                    .is_allowed(target.as_str(), &self.config.user_agent.robots_name)
            {
                tracing::debug!("URL {} disallowed by robots.txt", target);
                self.stats.record(&DropReason::RobotsDisallowed);
                continue;
            }

            if self.deadline_passed() {
                self.stats.record(&DropReason::DeadlineReached);
                continue;
            }

            if !self.dedup.admit(target.as_str()) {
                tracing::trace!("Duplicate link {}", target);
                self.stats.record(&DropReason::Duplicate);
                continue;
            }

            self.scheduler.add_to_frontier(target, depth);
        }
    }

    fn report_progress(&self) {
        let admitted = self.pages.len();
        if admitted % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages admitted, {} in frontier, {} in flight",
                admitted,
                self.scheduler.frontier_size(),
                self.scheduler.in_flight()
            );
        }
    }
}

/// Fetches, extracts and scores one URL
///
/// The slot permit is held until the outcome is ready.
async fn run_worker<F: PageFetcher>(
    fetcher: Arc<F>,
    analyzer: Option<Arc<ContentQualityAnalyzer>>,
    scheduled: ScheduledFetch,
) -> WorkerOutcome {
    let ScheduledFetch {
        url: queued,
        delay,
        permit: _permit,
    } = scheduled;

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let result = fetcher.fetch(&queued.url).await;
    let (final_url, content_type, body) = match result {
        FetchResult::Success {
            final_url,
            content_type,
            body,
            ..
        } => (final_url, content_type, body),
        failure => {
            let message = failure
                .error_for(&queued.url)
                .map(|e| e.to_string())
                .unwrap_or_default();
            return WorkerOutcome::Dropped {
                queued,
                reason: DropReason::FetchFailure(message),
            };
        }
    };

    if !is_html(content_type.as_deref()) {
        return WorkerOutcome::Dropped {
            queued,
            reason: DropReason::NotHtml { content_type },
        };
    }

    let final_url = Url::parse(&final_url).unwrap_or_else(|_| queued.url.clone());
    let page = extract_page(&body);
    let quality = analyzer.map(|analyzer| analyzer.analyze(&page.title, &page.content));

    WorkerOutcome::Fetched(FetchedPage {
        queued,
        final_url,
        page,
        quality,
        fetched_at: Utc::now(),
    })
}
