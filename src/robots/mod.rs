//! Robots.txt handling module
//!
//! This module fetches and parses the root site's robots.txt. A missing or
//! unreachable robots.txt allows everything.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::{FetchResult, PageFetcher};
use crate::{MapperError, Result};
use url::Url;

/// Fetches robots.txt for the site of `root`
///
/// # Arguments
///
/// * `fetcher` - The page source to fetch with
/// * `root` - Any URL on the site; only its origin is used
///
/// # Returns
///
/// The parsed rules, or an allow-all set when robots.txt could not be fetched
pub async fn fetch_robots<F: PageFetcher>(fetcher: &F, root: &Url) -> ParsedRobots {
    let robots_url = match root.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", root, e);
            return ParsedRobots::allow_all();
        }
    };

    tracing::debug!("Fetching {}", robots_url);

    match fetcher.fetch(&robots_url).await {
        FetchResult::Success { body, .. } => ParsedRobots::from_content(&body),
        FetchResult::HttpError { status_code, .. } => {
            if status_code == 404 {
                tracing::info!("No robots.txt at {}, allowing all", robots_url);
            } else {
                tracing::warn!(
                    "robots.txt at {} returned HTTP {}, allowing all",
                    robots_url,
                    status_code
                );
            }
            ParsedRobots::allow_all()
        }
        FetchResult::NetworkError { error } => {
            tracing::warn!("Failed to fetch {}: {}, allowing all", robots_url, error);
            ParsedRobots::allow_all()
        }
    }
}

/// Fetches robots.txt and refuses the crawl if it blocks the whole site
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - The rules to apply to individual links
/// * `Err(MapperError::RobotsDisallowed)` - `agent` may not crawl the site at all
pub async fn check_robots<F: PageFetcher>(
    fetcher: &F,
    root: &Url,
    agent: &str,
) -> Result<ParsedRobots> {
    let robots = fetch_robots(fetcher, root).await;

    if robots.disallows_all(agent) {
        tracing::error!("robots.txt disallows crawling {} for {}", root, agent);
        return Err(MapperError::RobotsDisallowed {
            url: root.to_string(),
        });
    }

    Ok(robots)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResponse(FetchResult);

    impl PageFetcher for FixedResponse {
        async fn fetch(&self, _url: &Url) -> FetchResult {
            self.0.clone()
        }
    }

    fn robots_body(body: &str) -> FixedResponse {
        FixedResponse(FetchResult::Success {
            final_url: "https://example.com/robots.txt".to_string(),
            status_code: 200,
            content_type: Some("text/plain".to_string()),
            body: body.to_string(),
        })
    }

    fn root() -> Url {
        Url::parse("https://example.com/docs/").unwrap()
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let fetcher = FixedResponse(FetchResult::HttpError {
            final_url: "https://example.com/robots.txt".to_string(),
            status_code: 404,
        });

        let robots = check_robots(&fetcher, &root(), "docmapper").await.unwrap();
        assert!(robots.is_allowed("https://example.com/anything", "docmapper"));
    }

    #[tokio::test]
    async fn test_network_error_allows_all() {
        let fetcher = FixedResponse(FetchResult::NetworkError {
            error: "Connection refused".to_string(),
        });

        let robots = fetch_robots(&fetcher, &root()).await;
        assert!(robots.is_allowed("https://example.com/private/", "docmapper"));
    }

    #[tokio::test]
    async fn test_disallow_all_aborts() {
        let fetcher = robots_body("User-agent: *\nDisallow: /\n");

        let result = check_robots(&fetcher, &root(), "docmapper").await;
        assert!(matches!(result, Err(MapperError::RobotsDisallowed { .. })));
    }

    #[tokio::test]
    async fn test_partial_disallow_is_per_link() {
        let fetcher = robots_body("User-agent: *\nDisallow: /private/\n");

        let robots = check_robots(&fetcher, &root(), "docmapper").await.unwrap();
        assert!(robots.is_allowed("https://example.com/docs/", "docmapper"));
        assert!(!robots.is_allowed("https://example.com/private/x", "docmapper"));
    }
}
