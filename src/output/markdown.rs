//! Markdown output
//!
//! The single layout writes `documentation.md` with a table of contents; the
//! per-page layout writes `page_NNN.md` files plus an `index.md`. Hierarchical
//! output indents the table of contents and deepens headings by tree level.

use crate::config::OutputLayout;
use crate::output::{format_timestamp, is_per_page, Anchors, CrawlOutput, OutputEntry, OutputWriter};
use crate::Result;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Markdown headings stop at this level
const MAX_HEADING_LEVEL: usize = 6;

pub struct MarkdownWriter {
    layout: OutputLayout,
}

impl MarkdownWriter {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }
}

impl OutputWriter for MarkdownWriter {
    fn write(&self, output: &CrawlOutput<'_>, directory: &Path) -> Result<Vec<PathBuf>> {
        if is_per_page(self.layout) {
            write_per_page(output, directory)
        } else {
            let path = directory.join("documentation.md");
            fs::write(&path, format_single(output))?;
            Ok(vec![path])
        }
    }
}

fn write_header(md: &mut String, title: &str, output: &CrawlOutput<'_>, total: usize) {
    let _ = writeln!(md, "# {}\n", title);
    let _ = writeln!(md, "**Root:** {}  ", output.root_url);
    let _ = writeln!(md, "**Generated:** {}  ", output.generated_at.to_rfc3339());
    let _ = writeln!(md, "**Total Pages:** {}\n", total);
}

fn heading(entry: &OutputEntry<'_>, hierarchical: bool) -> String {
    let level = if hierarchical { entry.level + 2 } else { 2 };
    "#".repeat(level.min(MAX_HEADING_LEVEL))
}

/// Renders the single-file document
pub fn format_single(output: &CrawlOutput<'_>) -> String {
    let entries = output.entries();
    let hierarchical = output.is_hierarchical();

    let mut anchors = Anchors::default();
    let anchor_ids: Vec<String> = entries.iter().map(|entry| anchors.next(entry.title)).collect();

    let mut md = String::new();
    write_header(&mut md, "Documentation Map", output, entries.len());
    md.push_str("---\n\n## Table of Contents\n\n");

    for (i, (entry, id)) in entries.iter().zip(&anchor_ids).enumerate() {
        if hierarchical {
            let indent = "  ".repeat(entry.level);
            let _ = writeln!(md, "{}- [{}](#{})", indent, entry.title, id);
        } else {
            let _ = writeln!(md, "{}. [{}](#{})", i + 1, entry.title, id);
        }
    }
    md.push_str("\n---\n\n");

    for (i, (entry, id)) in entries.iter().zip(&anchor_ids).enumerate() {
        let _ = writeln!(md, "{} {} {{#{}}}\n", heading(entry, hierarchical), entry.title, id);
        let _ = writeln!(md, "**URL:** {}  ", entry.url);
        let _ = writeln!(md, "**Fetched:** {}\n", format_timestamp(entry.fetched_at));
        let _ = writeln!(md, "{}\n", entry.content);

        if i + 1 < entries.len() {
            md.push_str("---\n\n");
        }
    }

    md
}

fn page_filename(position: usize) -> String {
    format!("page_{:03}.md", position + 1)
}

fn write_per_page(output: &CrawlOutput<'_>, directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = output.entries();
    let mut files = Vec::with_capacity(entries.len() + 1);

    for (i, entry) in entries.iter().enumerate() {
        let mut md = String::new();
        let _ = writeln!(md, "# {}\n", entry.title);
        let _ = writeln!(md, "**URL:** {}  ", entry.url);
        let _ = writeln!(md, "**Fetched:** {}\n", format_timestamp(entry.fetched_at));
        md.push_str("---\n\n");
        let _ = writeln!(md, "{}", entry.content);

        let path = directory.join(page_filename(i));
        fs::write(&path, md)?;
        files.push(path);
    }

    let mut index = String::new();
    write_header(&mut index, "Documentation Index", output, entries.len());
    index.push_str("## Pages\n\n");
    for (i, entry) in entries.iter().enumerate() {
        if output.is_hierarchical() {
            let indent = "  ".repeat(entry.level);
            let _ = writeln!(index, "{}- [{}]({})", indent, entry.title, page_filename(i));
        } else {
            let _ = writeln!(index, "{}. [{}]({})", i + 1, entry.title, page_filename(i));
        }
    }

    let path = directory.join("index.md");
    fs::write(&path, index)?;
    files.push(path);

    Ok(files)
}
