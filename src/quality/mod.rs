//! Content quality scoring
//!
//! Every fetched page is scored in `[0, 1]` from simple text metrics and
//! checked for issues. The coordinator uses [`ContentQualityAnalyzer::should_skip`]
//! to decide whether the page is admitted.

mod metrics;

pub use metrics::{extract_code_blocks, extract_metrics, CodeBlock, ContentMetrics};

use crate::config::QualityConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Pages scoring below this are always skipped
pub const MIN_ACCEPTABLE_SCORE: f64 = 0.3;

/// Pages scoring at or above this count as passed in [`QualityStats`]
pub const PASSING_SCORE: f64 = 0.4;

const WORD_SATURATION: f64 = 500.0;
const CODE_BLOCK_SATURATION: f64 = 3.0;
const HEADER_SATURATION: f64 = 3.0;

/// Link-to-word ratio above which a page looks like a link list
const NAVIGATION_LINK_RATIO: f64 = 0.3;

const NAVIGATION_INDICATORS: &[&str] = &[
    "table of contents",
    "navigation",
    "site map",
    "index",
    "directory",
    "menu",
    "links",
];

const COMMON_ENGLISH_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Relative weight of each sub-score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityWeights {
    pub word_count: f64,
    pub code_blocks: f64,
    pub headers: f64,
    pub content_ratio: f64,
    pub title_presence: f64,
    /// Reserved: extracted text carries no image information
    pub images: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            word_count: 0.30,
            code_blocks: 0.20,
            headers: 0.15,
            content_ratio: 0.15,
            title_presence: 0.10,
            images: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    WordCount,
    MissingTitle,
    EmptyContent,
    BlacklistedContent,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WordCount => "word_count",
            Self::MissingTitle => "missing_title",
            Self::EmptyContent => "empty_content",
            Self::BlacklistedContent => "blacklisted_content",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
}

/// Quality assessment of one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentQuality {
    pub score: f64,
    pub word_count: usize,
    pub code_block_count: usize,
    pub header_count: usize,
    pub empty_line_ratio: f64,
    pub content_ratio: f64,
    pub has_title: bool,
    pub has_headers: bool,
    pub is_navigation_page: bool,
    pub language: String,
    pub issues: Vec<QualityIssue>,
    pub tags: Vec<String>,
}

impl ContentQuality {
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }
}

/// Scores pages against a [`QualityConfig`]
///
/// The analyzer is immutable and can be shared between workers; running
/// totals are kept separately in [`QualityStats`].
#[derive(Debug, Clone)]
pub struct ContentQualityAnalyzer {
    config: QualityConfig,
    weights: QualityWeights,
}

impl ContentQualityAnalyzer {
    pub fn new(config: QualityConfig) -> Self {
        Self::with_weights(config, QualityWeights::default())
    }

    pub fn with_weights(config: QualityConfig, weights: QualityWeights) -> Self {
        Self { config, weights }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Computes metrics, score, issues and tags for a page
    pub fn analyze(&self, title: &str, content: &str) -> ContentQuality {
        let metrics = extract_metrics(title, content);

        ContentQuality {
            score: self.score(&metrics),
            word_count: metrics.word_count,
            code_block_count: metrics.code_block_count,
            header_count: metrics.header_count,
            empty_line_ratio: metrics.empty_line_ratio,
            content_ratio: metrics.content_ratio,
            has_title: metrics.has_title,
            has_headers: metrics.has_headers,
            is_navigation_page: is_navigation_page(title, content),
            language: detect_language(content).to_string(),
            issues: self.detect_issues(title, content, &metrics),
            tags: generate_tags(&metrics),
        }
    }

    /// Weighted sum of saturating sub-scores, clamped to `[0, 1]`
    pub fn score(&self, metrics: &ContentMetrics) -> f64 {
        let w = &self.weights;

        let word_score = ramp(metrics.word_count as f64, WORD_SATURATION);
        let code_score = ramp(metrics.code_block_count as f64, CODE_BLOCK_SATURATION);
        let header_score = ramp(metrics.header_count as f64, HEADER_SATURATION);
        let ratio_score = metrics.content_ratio.clamp(0.0, 1.0);
        let title_score = if metrics.has_title { 1.0 } else { 0.0 };
        let image_score = 0.0;

        let score = word_score * w.word_count
            + code_score * w.code_blocks
            + header_score * w.headers
            + ratio_score * w.content_ratio
            + title_score * w.title_presence
            + image_score * w.images;

        score.clamp(0.0, 1.0)
    }

    fn detect_issues(&self, title: &str, content: &str, metrics: &ContentMetrics) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        if metrics.word_count < self.config.min_word_count {
            issues.push(QualityIssue {
                kind: IssueKind::WordCount,
                severity: Severity::Warning,
                description: format!(
                    "Content has {} words, fewer than the minimum of {}",
                    metrics.word_count, self.config.min_word_count
                ),
            });
        }

        if self.config.require_title && !metrics::has_title(title) {
            issues.push(QualityIssue {
                kind: IssueKind::MissingTitle,
                severity: Severity::Error,
                description: "Page is missing a title".to_string(),
            });
        }

        if self.config.require_content && content.trim().is_empty() {
            issues.push(QualityIssue {
                kind: IssueKind::EmptyContent,
                severity: Severity::Error,
                description: "Page has no content".to_string(),
            });
        }

        let lowered = content.to_lowercase();
        let matched: Vec<&str> = self
            .config
            .blacklist_patterns
            .iter()
            .filter(|pattern| lowered.contains(&pattern.to_lowercase()))
            .map(String::as_str)
            .collect();

        if !matched.is_empty() {
            let description = if matched.len() == 1 {
                format!("Content contains blacklisted pattern: {}", matched[0])
            } else {
                format!("Content contains blacklisted patterns: {}", matched.join(", "))
            };
            issues.push(QualityIssue {
                kind: IssueKind::BlacklistedContent,
                severity: Severity::Warning,
                description,
            });
        }

        issues
    }

    /// True iff the page should not be admitted
    pub fn should_skip(&self, quality: &ContentQuality) -> bool {
        quality.score < MIN_ACCEPTABLE_SCORE
            || (self.config.skip_navigation_pages && quality.is_navigation_page)
            || quality.has_errors()
    }
}

fn ramp(value: f64, saturation: f64) -> f64 {
    (value / saturation).min(1.0)
}

/// Weighted count of navigation indicators; a page is navigation at 2 or more
pub fn is_navigation_page(title: &str, content: &str) -> bool {
    let body = content.to_lowercase();
    let title = title.to_lowercase();

    let mut indicators = 0;
    for indicator in NAVIGATION_INDICATORS {
        if body.contains(indicator) {
            indicators += 1;
        }
        if title.contains(indicator) {
            indicators += 2;
        }
    }

    let words = metrics::count_words(content);
    if words > 0 && metrics::count_markdown_links(content) as f64 / words as f64 > NAVIGATION_LINK_RATIO {
        indicators += 1;
    }

    indicators >= 2
}

/// "en" when common English function words exceed 5% of the text, else "unknown"
pub fn detect_language(content: &str) -> &'static str {
    let lowered = content.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let english = words
        .iter()
        .filter(|word| COMMON_ENGLISH_WORDS.contains(*word))
        .count();

    if english > words.len() / 20 {
        "en"
    } else {
        "unknown"
    }
}

fn generate_tags(metrics: &ContentMetrics) -> Vec<String> {
    let mut tags = Vec::new();

    if metrics.code_block_count > 0 {
        tags.push("technical");
    }
    if metrics.word_count > 1000 {
        tags.push("long-form");
    } else if metrics.word_count < 200 {
        tags.push("short-form");
    }
    if metrics.has_headers {
        tags.push("structured");
    }
    if metrics.word_count >= 500 && metrics.code_block_count >= 2 {
        tags.push("comprehensive");
    }
    if metrics.content_ratio < 0.3 {
        tags.push("low-content");
    }

    tags.into_iter().map(String::from).collect()
}

/// Running totals over every analyzed page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityStats {
    pub total_pages: usize,
    pub passed_pages: usize,
    pub failed_pages: usize,
    pub average_score: f64,
    pub average_word_count: f64,
    pub issue_counts: BTreeMap<IssueKind, usize>,
}

impl QualityStats {
    pub fn record(&mut self, quality: &ContentQuality) {
        self.total_pages += 1;
        if quality.score >= PASSING_SCORE {
            self.passed_pages += 1;
        } else {
            self.failed_pages += 1;
        }

        let n = self.total_pages as f64;
        self.average_score += (quality.score - self.average_score) / n;
        self.average_word_count += (quality.word_count as f64 - self.average_word_count) / n;

        for issue in &quality.issues {
            *self.issue_counts.entry(issue.kind).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> QualityConfig {
        QualityConfig {
            enabled: true,
            min_word_count: 50,
            require_title: true,
            require_content: true,
            skip_navigation_pages: true,
            blacklist_patterns: vec!["404".to_string()],
        }
    }

    fn rich_page() -> String {
        let mut page = String::new();
        for section in 0..3 {
            page.push_str(&format!("# Section {}\n\n", section));
            for _ in 0..40 {
                page.push_str("Tokio tasks are scheduled cooperatively ");
            }
            page.push_str("\n\n```rust\nlet rt = Runtime::new();\n```\n\n");
        }
        page
    }

    #[test]
    fn test_rich_page_scores_high() {
        let analyzer = ContentQualityAnalyzer::new(create_test_config());
        let content = rich_page();
        let quality = analyzer.analyze("Runtime Guide", &content);

        assert!(quality.word_count >= 500);
        assert_eq!(quality.code_block_count, 3);
        assert_eq!(quality.header_count, 3);
        assert!(quality.content_ratio >= 0.8);
        assert!(quality.score >= 0.8, "score was {}", quality.score);
        assert!(!analyzer.should_skip(&quality));
    }

    #[test]
    fn test_poor_page_scores_low() {
        let analyzer = ContentQualityAnalyzer::new(create_test_config());
        let quality = analyzer.analyze("", "Copyright menu footer header subscribe");

        assert!(quality.word_count < 50);
        assert!(quality.content_ratio <= 0.2);
        assert!(quality.score <= 0.3, "score was {}", quality.score);
        assert!(analyzer.should_skip(&quality));
    }

    #[test]
    fn test_error_page_issues() {
        let analyzer = ContentQualityAnalyzer::new(create_test_config());
        let quality = analyzer.analyze("", "Error 404");

        let kinds: Vec<IssueKind> = quality.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::MissingTitle));
        assert!(kinds.contains(&IssueKind::BlacklistedContent));
        assert!(!kinds.contains(&IssueKind::EmptyContent));

        let blacklisted = quality
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::BlacklistedContent)
            .unwrap();
        assert_eq!(blacklisted.severity, Severity::Warning);
        assert_eq!(
            blacklisted.description,
            "Content contains blacklisted pattern: 404"
        );

        assert!(quality.score < MIN_ACCEPTABLE_SCORE);
        assert!(analyzer.should_skip(&quality));
    }

    #[test]
    fn test_multiple_blacklist_matches_named() {
        let mut config = create_test_config();
        config.blacklist_patterns = vec!["404".to_string(), "Not Found".to_string()];
        let analyzer = ContentQualityAnalyzer::new(config);

        let quality = analyzer.analyze("Oops", "404 page not found");
        let issue = quality
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::BlacklistedContent)
            .unwrap();
        assert_eq!(
            issue.description,
            "Content contains blacklisted patterns: 404, Not Found"
        );
    }

    #[test]
    fn test_empty_content_is_error() {
        let analyzer = ContentQualityAnalyzer::new(create_test_config());
        let quality = analyzer.analyze("Title", "   ");

        assert!(quality
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::EmptyContent && i.severity == Severity::Error));
        assert!(analyzer.should_skip(&quality));
    }

    #[test]
    fn test_requirements_can_be_disabled() {
        let mut config = create_test_config();
        config.require_title = false;
        config.require_content = false;
        config.min_word_count = 0;
        config.blacklist_patterns.clear();
        let analyzer = ContentQualityAnalyzer::new(config);

        let quality = analyzer.analyze("", "");
        assert!(quality.issues.is_empty());
    }

    #[test]
    fn test_score_always_in_unit_range() {
        let weights = QualityWeights {
            word_count: 1.0,
            code_blocks: 1.0,
            headers: 1.0,
            content_ratio: 1.0,
            title_presence: 1.0,
            images: 1.0,
        };
        let analyzer = ContentQualityAnalyzer::with_weights(create_test_config(), weights);

        for (title, content) in [("", ""), ("T", "word"), ("Guide", rich_page().as_str())] {
            let score = analyzer.analyze(title, content).score;
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_navigation_detection() {
        // Title indicator alone weighs 2
        assert!(is_navigation_page("Site Map", "Pages about things"));
        // Two body indicators
        assert!(is_navigation_page(
            "Docs",
            "Table of contents and the full directory"
        ));
        // One body indicator is not enough
        assert!(!is_navigation_page("Docs", "See the index for details"));
        // Link-heavy markdown plus one indicator
        assert!(is_navigation_page(
            "Docs",
            "links [a](/a) [b](/b) [c](/c)"
        ));
    }

    #[test]
    fn test_navigation_page_skipped_only_when_configured() {
        let mut config = create_test_config();
        config.min_word_count = 0;
        let content = rich_page();

        let analyzer = ContentQualityAnalyzer::new(config.clone());
        let quality = analyzer.analyze("Table of Contents", &content);
        assert!(quality.is_navigation_page);
        assert!(analyzer.should_skip(&quality));

        config.skip_navigation_pages = false;
        let analyzer = ContentQualityAnalyzer::new(config);
        assert!(!analyzer.should_skip(&quality));
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(
            detect_language("The runtime spawns tasks on a pool of threads and parks them"),
            "en"
        );
        assert_eq!(detect_language("fn main let mut x"), "unknown");
    }

    #[test]
    fn test_tags() {
        let analyzer = ContentQualityAnalyzer::new(create_test_config());
        let quality = analyzer.analyze("Guide", &rich_page());

        assert!(quality.tags.contains(&"technical".to_string()));
        assert!(quality.tags.contains(&"structured".to_string()));
        assert!(quality.tags.contains(&"comprehensive".to_string()));
        assert!(!quality.tags.contains(&"low-content".to_string()));
    }

    #[test]
    fn test_quality_stats() {
        let analyzer = ContentQualityAnalyzer::new(create_test_config());
        let mut stats = QualityStats::default();

        stats.record(&analyzer.analyze("Guide", &rich_page()));
        stats.record(&analyzer.analyze("", "Error 404"));

        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.passed_pages, 1);
        assert_eq!(stats.failed_pages, 1);
        assert!(stats.average_score > 0.0 && stats.average_score < 1.0);
        assert_eq!(stats.issue_counts.get(&IssueKind::MissingTitle), Some(&1));
    }
}
