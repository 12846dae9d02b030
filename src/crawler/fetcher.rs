//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building one HTTP client per configured proxy (or a single direct client)
//! - Round-robin proxy rotation and a random user agent per request
//! - Error classification
//!
//! The coordinator only depends on the [`PageFetcher`] trait, so crawls can be
//! driven by any source of pages.

use crate::config::Config;
use crate::MapperError;
use rand::seq::SliceRandom;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value, if any
        content_type: Option<String>,
        /// Response body
        body: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// Final URL after redirects
        final_url: String,
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// The error this result represents for `url`, if it is a failure
    pub fn error_for(&self, url: &Url) -> Option<MapperError> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status_code, .. } => Some(MapperError::Http {
                url: url.to_string(),
                status: *status_code,
            }),
            Self::NetworkError { error } => Some(MapperError::Fetch {
                url: url.to_string(),
                message: error.clone(),
            }),
        }
    }
}

/// Source of pages for a crawl
///
/// Implementations must be shareable between worker tasks.
pub trait PageFetcher: Send + Sync + 'static {
    /// Issues a GET for `url`
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResult> + Send;
}

/// Returns true for HTML content types
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.contains("text/html") || ct.contains("application/xhtml+xml")
    })
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout` - Whole-request timeout
/// * `proxy` - Optional proxy all requests go through
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration, proxy: Option<Proxy>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }

    builder.build()
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug)]
pub struct HttpFetcher {
    clients: Vec<Client>,
    next_client: AtomicUsize,
    user_agents: Vec<String>,
}

impl HttpFetcher {
    /// Builds the client pool described by the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to fetch
    /// * `Err(MapperError::ProxyConfiguration)` - A configured proxy was rejected
    pub fn from_config(config: &Config) -> Result<Self, MapperError> {
        let timeout = Duration::from_secs(config.crawler.request_timeout);

        let clients = if config.user_agent.proxies.is_empty() {
            vec![build_http_client(timeout, None)?]
        } else {
            config
                .user_agent
                .proxies
                .iter()
                .map(|proxy_url| {
                    let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                        MapperError::ProxyConfiguration(format!("{}: {}", proxy_url, e))
                    })?;
                    build_http_client(timeout, Some(proxy)).map_err(|e| {
                        MapperError::ProxyConfiguration(format!("{}: {}", proxy_url, e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        tracing::debug!(
            "HTTP fetcher ready with {} client(s) and {} user agent(s)",
            clients.len(),
            config.user_agent.agents.len()
        );

        Ok(Self {
            clients,
            next_client: AtomicUsize::new(0),
            user_agents: config.user_agent.agents.clone(),
        })
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Next client in round-robin order
    fn next_client(&self) -> &Client {
        let index = self.next_client.fetch_add(1, Ordering::Relaxed);
        &self.clients[index % self.clients.len()]
    }

    fn pick_user_agent(&self) -> Option<&str> {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let mut request = self.next_client().get(url.clone());
        if let Some(agent) = self.pick_user_agent() {
            request = request.header(USER_AGENT, agent);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return FetchResult::HttpError {
                final_url,
                status_code: status.as_u16(),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                content_type,
                body,
            },
            Err(e) => classify_error(&e),
        }
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
