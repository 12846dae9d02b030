//! JSON output as explicit serde records

use crate::config::OutputLayout;
use crate::output::{is_per_page, safe_filename, CrawlOutput, OutputEntry, OutputWriter};
use crate::tree::{DocumentNode, DocumentTree};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One admitted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPage {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub depth: usize,
    pub level: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    /// File holding the page in per-page layouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// One node of the page hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonNode {
    pub title: String,
    pub url: String,
    pub path: String,
    pub level: usize,
    pub index: usize,
    pub children: Vec<JsonNode>,
}

/// Top-level JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub root_url: String,
    pub generated_at: DateTime<Utc>,
    pub total_pages: usize,
    pub pages: Vec<JsonPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<JsonNode>,
}

impl JsonPage {
    fn from_entry(entry: &OutputEntry<'_>, with_content: bool) -> Self {
        Self {
            title: entry.title.to_string(),
            url: entry.url.to_string(),
            content: with_content.then(|| entry.content.to_string()),
            depth: entry.depth,
            level: entry.level,
            fetched_at: entry.fetched_at,
            file: None,
        }
    }
}

impl JsonNode {
    /// Converts the subtree rooted at `node`
    pub fn from_tree(tree: &DocumentTree, node: &DocumentNode) -> Self {
        Self {
            title: node.title.clone(),
            url: node.url.clone(),
            path: node.path.clone(),
            level: node.level,
            index: node.index,
            children: tree
                .children(node.id)
                .map(|child| Self::from_tree(tree, child))
                .collect(),
        }
    }
}

impl JsonDocument {
    pub fn from_output(output: &CrawlOutput<'_>) -> Self {
        let pages: Vec<JsonPage> = output
            .entries()
            .iter()
            .map(|entry| JsonPage::from_entry(entry, true))
            .collect();

        Self {
            root_url: output.root_url.to_string(),
            generated_at: output.generated_at,
            total_pages: pages.len(),
            pages,
            tree: output.tree.map(|tree| JsonNode::from_tree(tree, tree.root())),
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Writes `metadata.json` describing per-page files
pub(crate) fn write_metadata(
    output: &CrawlOutput<'_>,
    entries: &[OutputEntry<'_>],
    files: &[String],
    directory: &Path,
) -> Result<PathBuf> {
    let pages: Vec<JsonPage> = entries
        .iter()
        .zip(files)
        .map(|(entry, file)| JsonPage {
            file: Some(file.clone()),
            ..JsonPage::from_entry(entry, false)
        })
        .collect();

    let metadata = JsonDocument {
        root_url: output.root_url.to_string(),
        generated_at: output.generated_at,
        total_pages: pages.len(),
        pages,
        tree: None,
    };

    let path = directory.join("metadata.json");
    write_json(&path, &metadata)?;
    Ok(path)
}

pub struct JsonWriter {
    layout: OutputLayout,
}

impl JsonWriter {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }
}

impl OutputWriter for JsonWriter {
    fn write(&self, output: &CrawlOutput<'_>, directory: &Path) -> Result<Vec<PathBuf>> {
        if !is_per_page(self.layout) {
            let path = directory.join("documentation.json");
            write_json(&path, &JsonDocument::from_output(output))?;
            return Ok(vec![path]);
        }

        let entries = output.entries();
        let mut files = Vec::with_capacity(entries.len() + 1);
        let mut names = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let name = safe_filename(entry.title, i, ".json");
            let path = directory.join(&name);
            write_json(&path, &JsonPage::from_entry(entry, true))?;
            files.push(path);
            names.push(name);
        }

        files.push(write_metadata(output, &entries, &names, directory)?);
        Ok(files)
    }
}
