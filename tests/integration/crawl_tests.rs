//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small documentation site and drive
//! the full crawl cycle end-to-end through the public API.

use docmapper::config::{Config, OutputFormat, OutputLayout};
use docmapper::crawler::{crawl, crawl_with_deadline};
use docmapper::output::{write_output, CrawlOutput, JsonDocument};
use docmapper::tree::TreeBuilder;
use docmapper::MapperError;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration rooted at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.crawler.root_url = format!("{}/", server.uri());
    config.crawler.min_delay = 0;
    config.crawler.max_delay = 0;
    config.crawler.concurrency = 2;
    config.crawler.request_timeout = 5;
    config.quality.enabled = false;
    config
}

fn html(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><main><p>{}</p><ul>{}</ul></main></body></html>",
        title, body, anchors
    )
}

fn prose(words: usize) -> String {
    let sentence = "the guide explains how the tool reads a project and writes the result to disk";
    sentence
        .split_whitespace()
        .cycle()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Serves `/ -> /docs/ -> {/docs/install, /docs/usage}` plus a few traps
async fn mount_docs_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        html(
            "Home",
            "Welcome to the project documentation",
            &["/docs/", "/docs", "https://other.example.org/", "/files/manual.pdf"],
        ),
    )
    .await;
    mount_page(
        server,
        "/docs/",
        html(
            "Docs",
            "Start here to learn the basics",
            &["/docs/install", "/docs/usage#options", "/"],
        ),
    )
    .await;
    mount_page(
        server,
        "/docs/install",
        html("Install", "Download the installer and run it", &["/docs/"]),
    )
    .await;
    mount_page(
        server,
        "/docs/usage",
        html("Usage", "Run the tool against a project directory", &["/docs/install"]),
    )
    .await;
}

fn crawled_paths(pages: &[docmapper::PageRecord]) -> Vec<String> {
    let mut paths: Vec<String> = pages
        .iter()
        .map(|page| url::Url::parse(&page.url).unwrap().path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_full_crawl_of_docs_site() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /")).await;
    mount_docs_site(&server).await;

    let report = crawl(create_test_config(&server)).await.unwrap();

    assert_eq!(
        crawled_paths(&report.pages),
        vec!["/", "/docs/", "/docs/install", "/docs/usage"]
    );
    assert_eq!(report.pages[0].title, "Home");
    assert_eq!(report.pages[0].depth, 0);
    assert_eq!(report.stats.pages_admitted, 4);
    assert_eq!(report.stats.fetch_errors, 0);
    // external host and the pdf
    assert_eq!(report.stats.policy_rejected, 2);
    assert!(!report.deadline_reached);
}

#[tokio::test]
async fn test_duplicate_urls_fetched_once() {
    let server = MockServer::start().await;
    mount_docs_site(&server).await;

    let report = crawl(create_test_config(&server)).await.unwrap();

    // "/docs" and "/docs/" share a canonical form, as do the back links
    assert!(report.stats.duplicates >= 3);

    let requests = server.received_requests().await.unwrap();
    for route in ["/", "/docs/", "/docs/install", "/docs/usage"] {
        let hits = requests.iter().filter(|r| r.url.path() == route).count();
        assert_eq!(hits, 1, "{} fetched {} times", route, hits);
    }
    assert!(!requests.iter().any(|r| r.url.path() == "/docs"));
}

#[tokio::test]
async fn test_robots_disallow_all_aborts_crawl() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"),
    )
    .await;
    mount_docs_site(&server).await;

    let result = crawl(create_test_config(&server)).await;
    assert!(matches!(result, Err(MapperError::RobotsDisallowed { .. })));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/robots.txt");
}

#[tokio::test]
async fn test_robots_fetch_failure_fails_open() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(500)).await;
    mount_docs_site(&server).await;

    let report = crawl(create_test_config(&server)).await.unwrap();
    assert_eq!(report.pages.len(), 4);
}

#[tokio::test]
async fn test_robots_rules_filter_individual_links() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/install"),
    )
    .await;
    mount_docs_site(&server).await;

    let report = crawl(create_test_config(&server)).await.unwrap();

    assert!(!crawled_paths(&report.pages).contains(&"/docs/install".to_string()));
    assert!(report.stats.robots_rejected >= 1);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    mount_docs_site(&server).await;

    let mut config = create_test_config(&server);
    config.crawler.max_depth = 1;

    let report = crawl(config).await.unwrap();

    assert_eq!(crawled_paths(&report.pages), vec!["/", "/docs/"]);
    assert!(report.pages.iter().all(|page| page.depth <= 1));
}

#[tokio::test]
async fn test_quality_gate_rejects_error_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html("Home", &prose(600), &["/guide", "/missing"]),
    )
    .await;
    mount_page(&server, "/guide", html("Guide", &prose(600), &[])).await;
    mount_page(&server, "/missing", html("Error 404", "Not found", &[])).await;

    let mut config = create_test_config(&server);
    config.quality.enabled = true;

    let report = crawl(config).await.unwrap();

    assert_eq!(crawled_paths(&report.pages), vec!["/", "/guide"]);
    assert_eq!(report.stats.quality_rejected, 1);
    assert_eq!(report.quality.total_pages, 3);
    assert!(report.pages.iter().all(|page| page.quality.is_some()));
}

#[tokio::test]
async fn test_http_errors_and_non_html_counted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html("Home", "Welcome", &["/gone", "/feed"])).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let report = crawl(create_test_config(&server)).await.unwrap();

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.stats.fetch_errors, 1);
    assert_eq!(report.stats.non_html, 1);
}

#[tokio::test]
async fn test_tree_assembled_from_crawl() {
    let server = MockServer::start().await;
    mount_docs_site(&server).await;

    let mut config = create_test_config(&server);
    config.tree.enabled = true;
    let report = crawl(config.clone()).await.unwrap();

    let tree = TreeBuilder::new(config.tree.clone()).build(&report.pages);

    assert_eq!(tree.total_nodes(), 4);
    assert_eq!(tree.max_depth(), 2);
    assert_eq!(tree.root().title, "Home");

    let docs = tree.find_node(&format!("{}/docs/", server.uri())).unwrap();
    assert_eq!(docs.level, 1);
    let mut children: Vec<&str> = tree.children(docs.id).map(|n| n.title.as_str()).collect();
    children.sort();
    assert_eq!(children, vec!["Install", "Usage"]);
}

#[tokio::test]
async fn test_json_output_written_from_crawl() {
    let server = MockServer::start().await;
    mount_docs_site(&server).await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server);
    config.tree.enabled = true;
    config.output.format = OutputFormat::Json;
    config.output.layout = OutputLayout::Single;
    config.output.directory = dir.path().join("out").to_string_lossy().into_owned();

    let report = crawl(config.clone()).await.unwrap();
    let tree = TreeBuilder::new(config.tree.clone()).build(&report.pages);
    let output = CrawlOutput::new(&report.root_url, &report.pages, Some(&tree));

    let files = write_output(&config, &output, "test-hash").unwrap();
    assert_eq!(files.len(), 1);

    let raw = std::fs::read_to_string(&files[0]).unwrap();
    let document: JsonDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(document.total_pages, 4);
    assert_eq!(document.pages[0].title, "Home");
    assert_eq!(document.tree.unwrap().children.len(), 1);
}

#[tokio::test]
async fn test_deadline_returns_partial_results() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html("Home", "Welcome", &["/a", "/b", "/c"])).await;
    for route in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html("Slow", "Slow page", &[]), "text/html")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server);
    config.crawler.concurrency = 1;

    let report = crawl_with_deadline(config, Some(Duration::from_millis(150)))
        .await
        .unwrap();

    assert!(report.deadline_reached);
    assert!(report.pages.len() < 4);
    assert!(report.stats.abandoned >= 1);
}
