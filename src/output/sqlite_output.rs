//! SQLite output
//!
//! Each run appends one `runs` row, its admitted pages, and (for
//! hierarchical output) the tree shape, so one database can hold many crawls.

use crate::output::{CrawlOutput, OutputWriter};
use crate::Result;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// File name of the database inside the output directory
pub const DATABASE_FILE: &str = "docmapper.db";

/// SQL schema for the output database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl written to this database
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_url TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    total_pages INTEGER NOT NULL
);

-- Admitted pages in crawl order
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    depth INTEGER NOT NULL,
    fetched_at TEXT NOT NULL,
    quality_score REAL,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_run ON pages(run_id);

-- Page hierarchy; parent_url is NULL for the root
CREATE TABLE IF NOT EXISTS tree_nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    path TEXT NOT NULL,
    parent_url TEXT,
    level INTEGER NOT NULL,
    node_index INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tree_nodes_run ON tree_nodes(run_id);
"#;

/// Initializes the output schema; safe to call on an existing database
pub fn initialize_schema(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

pub struct SqliteWriter {
    config_hash: String,
}

impl SqliteWriter {
    pub fn new(config_hash: &str) -> Self {
        Self {
            config_hash: config_hash.to_string(),
        }
    }

    /// Writes one run in a single transaction
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - The id of the new `runs` row
    /// * `Err(MapperError::Database)` - Any SQLite failure; nothing is committed
    pub fn write_run(&self, conn: &mut Connection, output: &CrawlOutput<'_>) -> Result<i64> {
        initialize_schema(conn)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO runs (root_url, generated_at, config_hash, total_pages) VALUES (?1, ?2, ?3, ?4)",
            params![
                output.root_url,
                output.generated_at.to_rfc3339(),
                self.config_hash,
                output.pages.len() as i64
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut insert_page = tx.prepare(
                "INSERT OR IGNORE INTO pages (run_id, position, url, title, content, depth, fetched_at, quality_score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (position, page) in output.pages.iter().enumerate() {
                insert_page.execute(params![
                    run_id,
                    position as i64,
                    page.url,
                    page.title,
                    page.content,
                    page.depth as i64,
                    page.fetched_at.to_rfc3339(),
                    page.quality.as_ref().map(|q| q.score),
                ])?;
            }
        }

        if let Some(tree) = output.tree {
            let mut insert_node = tx.prepare(
                "INSERT INTO tree_nodes (run_id, url, path, parent_url, level, node_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for node in tree.pre_order() {
                let parent_url = tree.parent(node.id).map(|parent| parent.url.as_str());
                insert_node.execute(params![
                    run_id,
                    node.url,
                    node.path,
                    parent_url,
                    node.level as i64,
                    node.index as i64,
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!("Stored run {} with {} pages", run_id, output.pages.len());
        Ok(run_id)
    }
}

impl OutputWriter for SqliteWriter {
    fn write(&self, output: &CrawlOutput<'_>, directory: &Path) -> Result<Vec<PathBuf>> {
        let path = directory.join(DATABASE_FILE);
        let mut conn = Connection::open(&path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        self.write_run(&mut conn, output)?;
        Ok(vec![path])
    }
}
