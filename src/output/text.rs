//! Plain-text output

use crate::config::OutputLayout;
use crate::output::json::write_metadata;
use crate::output::{format_timestamp, is_per_page, safe_filename, CrawlOutput, OutputWriter};
use crate::Result;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 80;

pub struct TextWriter {
    layout: OutputLayout,
}

impl TextWriter {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }
}

impl OutputWriter for TextWriter {
    fn write(&self, output: &CrawlOutput<'_>, directory: &Path) -> Result<Vec<PathBuf>> {
        if !is_per_page(self.layout) {
            let path = directory.join("documentation.txt");
            fs::write(&path, format_single(output))?;
            return Ok(vec![path]);
        }

        let entries = output.entries();
        let mut files = Vec::with_capacity(entries.len() + 1);
        let mut names = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let mut text = String::new();
            let _ = writeln!(text, "TITLE: {}", entry.title);
            let _ = writeln!(text, "URL: {}", entry.url);
            let _ = writeln!(text, "FETCHED: {}\n", format_timestamp(entry.fetched_at));
            let _ = writeln!(text, "{}", entry.content);

            let name = safe_filename(entry.title, i, ".txt");
            let path = directory.join(&name);
            fs::write(&path, text)?;
            files.push(path);
            names.push(name);
        }

        files.push(write_metadata(output, &entries, &names, directory)?);
        Ok(files)
    }
}

/// Renders every page into one text document
pub fn format_single(output: &CrawlOutput<'_>) -> String {
    let entries = output.entries();
    let rule = "=".repeat(RULE_WIDTH);

    let mut text = String::new();
    text.push_str("DOCUMENTATION MAP\n");
    text.push_str("=================\n\n");
    let _ = writeln!(text, "Root: {}", output.root_url);
    let _ = writeln!(text, "Generated: {}", output.generated_at.to_rfc3339());
    let _ = writeln!(text, "Total Pages: {}\n", entries.len());
    let _ = writeln!(text, "{}\n", rule);

    for (i, entry) in entries.iter().enumerate() {
        let indent = "  ".repeat(entry.level);
        let _ = writeln!(text, "{}TITLE: {}", indent, entry.title);
        let _ = writeln!(text, "{}URL: {}", indent, entry.url);
        let _ = writeln!(text, "{}FETCHED: {}", indent, format_timestamp(entry.fetched_at));
        let _ = writeln!(text, "CONTENT:\n{}", entry.content);

        if i + 1 < entries.len() {
            let _ = write!(text, "\n{}\n\n", rule);
        }
    }

    text
}
