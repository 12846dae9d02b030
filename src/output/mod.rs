//! Output module for writing crawl results
//!
//! This module handles:
//! - Markdown, plain text, JSON and SQLite serialization of admitted pages
//! - Single-file and per-page layouts
//! - Flat (crawl order) or hierarchical (tree pre-order) page ordering
//! - The end-of-run statistics report

mod json;
mod markdown;
mod sqlite_output;
pub mod stats;
mod text;

pub use json::{JsonDocument, JsonNode, JsonPage, JsonWriter};
pub use markdown::MarkdownWriter;
pub use sqlite_output::SqliteWriter;
pub use stats::{format_statistics, print_statistics};
pub use text::TextWriter;

use crate::config::{Config, OutputFormat, OutputLayout};
use crate::crawler::PageRecord;
use crate::tree::DocumentTree;
use crate::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static UNSAFE_FILENAME_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_\s]").ok());
static UNSAFE_ANCHOR_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").ok());

const MAX_FILENAME_STEM: usize = 50;

/// Everything a writer needs to serialize one crawl
#[derive(Debug, Clone)]
pub struct CrawlOutput<'a> {
    pub root_url: &'a str,
    pub generated_at: DateTime<Utc>,
    /// Admitted pages in crawl order
    pub pages: &'a [PageRecord],
    /// Present for hierarchical output
    pub tree: Option<&'a DocumentTree>,
}

/// One page as it appears in an output file
#[derive(Debug, Clone, PartialEq)]
pub struct OutputEntry<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub content: &'a str,
    pub depth: usize,
    /// Tree level; 0 for every entry of flat output
    pub level: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<'a> CrawlOutput<'a> {
    pub fn new(root_url: &'a str, pages: &'a [PageRecord], tree: Option<&'a DocumentTree>) -> Self {
        Self {
            root_url,
            generated_at: Utc::now(),
            pages,
            tree,
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        self.tree.is_some()
    }

    /// Pages in output order
    ///
    /// Flat output follows crawl order. Hierarchical output follows the tree
    /// in pre-order and leaves out a synthetic root and any page the tree
    /// did not place.
    pub fn entries(&self) -> Vec<OutputEntry<'a>> {
        match self.tree {
            Some(tree) => tree
                .pre_order()
                .into_iter()
                .filter(|node| !node.url.is_empty())
                .map(|node| OutputEntry {
                    title: &node.title,
                    url: &node.url,
                    content: &node.content,
                    depth: node.depth,
                    level: node.level,
                    fetched_at: node.fetched_at,
                })
                .collect(),
            None => self
                .pages
                .iter()
                .map(|page| OutputEntry {
                    title: &page.title,
                    url: &page.url,
                    content: &page.content,
                    depth: page.depth,
                    level: 0,
                    fetched_at: Some(page.fetched_at),
                })
                .collect(),
        }
    }
}

/// Serializes a crawl into files
pub trait OutputWriter {
    /// Writes `output` under `directory`
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PathBuf>)` - Every file created
    /// * `Err(MapperError)` - An I/O, JSON or database failure
    fn write(&self, output: &CrawlOutput<'_>, directory: &Path) -> Result<Vec<PathBuf>>;
}

/// Picks the writer for the configured format and layout
pub fn writer_for(config: &Config, config_hash: &str) -> Box<dyn OutputWriter> {
    let layout = config.output.layout;
    match config.output.format {
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(layout)),
        OutputFormat::Text => Box::new(TextWriter::new(layout)),
        OutputFormat::Json => Box::new(JsonWriter::new(layout)),
        OutputFormat::Sqlite => Box::new(SqliteWriter::new(config_hash)),
    }
}

/// Creates the output directory and writes the crawl in the configured format
pub fn write_output(config: &Config, output: &CrawlOutput<'_>, config_hash: &str) -> Result<Vec<PathBuf>> {
    let directory = Path::new(&config.output.directory);
    fs::create_dir_all(directory)?;

    let files = writer_for(config, config_hash).write(output, directory)?;

    tracing::info!(
        "Wrote {} file(s) to {} ({:?}, {:?})",
        files.len(),
        directory.display(),
        config.output.format,
        config.output.layout
    );

    Ok(files)
}

/// Filesystem-safe `<title>_<index><extension>`
pub fn safe_filename(title: &str, index: usize, extension: &str) -> String {
    let cleaned = match UNSAFE_FILENAME_CHARS.as_ref() {
        Some(unsafe_chars) => unsafe_chars.replace_all(title, "").into_owned(),
        None => title.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
    };
    let stem: String = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('_')
        .chars()
        .take(MAX_FILENAME_STEM)
        .collect();

    if stem.is_empty() {
        format!("page_{}{}", index, extension)
    } else {
        format!("{}_{}{}", stem, index, extension)
    }
}

/// Lowercase, dash-separated anchor for a heading
pub fn anchor(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned = match UNSAFE_ANCHOR_CHARS.as_ref() {
        Some(unsafe_chars) => unsafe_chars.replace_all(&lowered, "").into_owned(),
        None => lowered,
    };
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .trim_matches('-')
        .to_string()
}

/// Hands out unique anchors, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub(crate) struct Anchors {
    seen: HashMap<String, usize>,
}

impl Anchors {
    pub(crate) fn next(&mut self, title: &str) -> String {
        let base = anchor(title);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let unique = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        unique
    }
}

pub(crate) fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Whether `layout` writes one file per page
pub(crate) fn is_per_page(layout: OutputLayout) -> bool {
    layout == OutputLayout::PerPage
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::crawler::PageRecord;
    use chrono::{TimeZone, Utc};

    pub fn page(url: &str, title: &str, content: &str, depth: usize) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            depth,
            fetched_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            quality: None,
        }
    }

    pub fn sample_pages() -> Vec<PageRecord> {
        vec![
            page("https://example.com/", "Home", "Welcome to the docs", 0),
            page("https://example.com/docs/", "Docs", "Documentation overview", 1),
            page("https://example.com/docs/install", "Install", "Run the installer", 2),
        ]
    }
}
