//! Scheduler for managing the crawl frontier and politeness
//!
//! This module handles:
//! - The frontier of admitted-but-unfetched URLs, shallowest first
//! - Worker concurrency limiting via a semaphore
//! - Sampling a per-request delay from the configured range

use crate::config::CrawlerConfig;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct QueuedUrl {
    /// The URL to fetch
    pub url: Url,

    /// Hops from the root URL
    pub depth: usize,

    /// Insertion order, used to keep the queue FIFO within a depth
    sequence: u64,
}

// Shallower URLs pop first; equal depths pop in insertion order
impl Ord for QueuedUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .depth
            .cmp(&self.depth)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for QueuedUrl {}

/// A scheduled fetch holding a worker slot
pub struct ScheduledFetch {
    /// The URL to fetch
    pub url: QueuedUrl,

    /// How long the worker waits before issuing the request
    pub delay: Duration,

    /// The semaphore permit for this fetch; dropping it frees the slot
    pub permit: OwnedSemaphorePermit,
}

/// Scheduler manages the frontier queue and worker slots
pub struct Scheduler {
    /// Semaphore limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// Frontier of URLs to fetch
    frontier: BinaryHeap<QueuedUrl>,

    concurrency: usize,
    min_delay: Duration,
    max_delay: Duration,
    next_sequence: u64,
}

impl Scheduler {
    /// Creates a new scheduler with an empty frontier
    pub fn new(config: &CrawlerConfig) -> Self {
        let concurrency = config.concurrency.max(1);

        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            frontier: BinaryHeap::new(),
            concurrency,
            min_delay: Duration::from_millis(config.min_delay),
            max_delay: Duration::from_millis(config.max_delay.max(config.min_delay)),
            next_sequence: 0,
        }
    }

    /// Adds a URL to the frontier
    pub fn add_to_frontier(&mut self, url: Url, depth: usize) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.frontier.push(QueuedUrl {
            url,
            depth,
            sequence,
        });
    }

    /// Gets the next URL to fetch
    ///
    /// Waits for a free worker slot, then pops the shallowest queued URL.
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - A URL with its slot and politeness delay
    /// * `None` - The frontier is empty
    pub async fn next_url(&mut self) -> Option<ScheduledFetch> {
        if self.frontier.is_empty() {
            return None;
        }

        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        let url = self.frontier.pop()?;
        let delay = self.sample_delay();

        tracing::trace!("Scheduling {} (depth {}) after {:?}", url.url, url.depth, delay);

        Some(ScheduledFetch { url, delay, permit })
    }

    /// Uniform sample from `[min_delay, max_delay]`
    pub fn sample_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..=self.max_delay)
    }

    /// Returns the number of URLs waiting in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Drops every queued URL, returning how many were discarded
    pub fn clear_frontier(&mut self) -> usize {
        let discarded = self.frontier.len();
        self.frontier.clear();
        discarded
    }

    /// Number of worker slots currently held
    pub fn in_flight(&self) -> usize {
        self.concurrency - self.semaphore.available_permits()
    }
}
