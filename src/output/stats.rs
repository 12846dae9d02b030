//! End-of-run statistics report
//!
//! This module formats the counters collected by the coordinator and the
//! quality analyzer for display.

use crate::crawler::CrawlReport;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Formats statistics for display
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `tree_nodes` - Number of nodes in the assembled tree, if one was built
pub fn format_statistics(report: &CrawlReport, tree_nodes: Option<usize>) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Root URL: {}", report.root_url);
    let _ = writeln!(out, "  Pages admitted: {}", stats.pages_admitted);
    let _ = writeln!(out, "  Elapsed: {:.2}s", report.elapsed.as_secs_f64());
    let secs = report.elapsed.as_secs_f64();
    if secs > 0.0 {
        let _ = writeln!(
            out,
            "  Rate: {:.2} pages/sec",
            stats.pages_admitted as f64 / secs
        );
    }
    if report.deadline_reached {
        let _ = writeln!(out, "  Deadline reached: {} queued URLs abandoned", stats.abandoned);
    }
    if let Some(nodes) = tree_nodes {
        let _ = writeln!(out, "  Tree nodes: {}", nodes);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Filtered:");
    for (label, count) in [
        ("Rejected by link policy", stats.policy_rejected),
        ("Disallowed by robots.txt", stats.robots_rejected),
        ("Duplicates", stats.duplicates),
        ("Rejected by quality", stats.quality_rejected),
        ("Empty pages", stats.empty_pages),
        ("Fetch errors", stats.fetch_errors),
        ("Non-HTML responses", stats.non_html),
        ("Off-site redirects", stats.off_scope_redirects),
    ] {
        let _ = writeln!(out, "  {}: {}", label, count);
    }

    let quality = &report.quality;
    if quality.total_pages > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Content Quality:");
        let _ = writeln!(out, "  Pages analyzed: {}", quality.total_pages);
        let pass_rate = quality.passed_pages as f64 / quality.total_pages as f64 * 100.0;
        let _ = writeln!(out, "  Passed: {} ({:.1}%)", quality.passed_pages, pass_rate);
        let _ = writeln!(out, "  Failed: {}", quality.failed_pages);
        let _ = writeln!(out, "  Average score: {:.2}", quality.average_score);
        let _ = writeln!(out, "  Average word count: {:.0}", quality.average_word_count);

        if !quality.issue_counts.is_empty() {
            let _ = writeln!(out, "  Issues:");
            for (kind, count) in &quality.issue_counts {
                let _ = writeln!(out, "    {}: {}", kind, count);
            }
        }
    }

    let depths = depth_breakdown(report);
    if !depths.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Pages by Depth:");
        for (depth, count) in depths {
            let _ = writeln!(out, "  {}: {}", depth, count);
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(report: &CrawlReport, tree_nodes: Option<usize>) {
    print!("{}", format_statistics(report, tree_nodes));
}

fn depth_breakdown(report: &CrawlReport) -> BTreeMap<usize, usize> {
    let mut depths = BTreeMap::new();
    for page in &report.pages {
        *depths.entry(page.depth).or_insert(0) += 1;
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlStats;
    use crate::output::test_support::sample_pages;
    use crate::quality::QualityStats;
    use std::time::Duration;

    fn create_test_report() -> CrawlReport {
        CrawlReport {
            root_url: "https://example.com/".to_string(),
            pages: sample_pages(),
            stats: CrawlStats {
                pages_admitted: 3,
                duplicates: 4,
                fetch_errors: 1,
                ..CrawlStats::default()
            },
            quality: QualityStats::default(),
            elapsed: Duration::from_secs(2),
            deadline_reached: false,
        }
    }

    #[test]
    fn test_format_statistics() {
        let text = format_statistics(&create_test_report(), Some(3));

        assert!(text.contains("Pages admitted: 3"));
        assert!(text.contains("Duplicates: 4"));
        assert!(text.contains("Fetch errors: 1"));
        assert!(text.contains("Rate: 1.50 pages/sec"));
        assert!(text.contains("Tree nodes: 3"));
        assert!(!text.contains("Content Quality"));
        assert!(!text.contains("Deadline reached"));
    }

    #[test]
    fn test_depth_breakdown() {
        let breakdown = depth_breakdown(&create_test_report());
        assert_eq!(breakdown.into_iter().collect::<Vec<_>>(), vec![(0, 1), (1, 1), (2, 1)]);
    }
}
