//! Hierarchy assembly from a flat list of admitted pages
//!
//! Parents are inferred from URL paths: a node's parent is the existing node
//! on the same host whose path is the longest proper ancestor of its own
//! (`/docs/guide` is an ancestor of `/docs/guide/start`). Equally long
//! candidates resolve to the earliest inserted one.

use crate::config::{SortKey, TreeConfig};
use crate::crawler::PageRecord;
use crate::tree::node::{DocumentNode, DocumentTree, NodeId};
use crate::url::host_key;
use std::cmp::Ordering;
use std::collections::HashMap;
use url::Url;

/// Builds a [`DocumentTree`] according to a [`TreeConfig`]
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    config: TreeConfig,
}

impl TreeBuilder {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    /// Assembles the tree
    ///
    /// The first page becomes the root. Remaining pages are inserted by
    /// ascending path depth, keeping crawl order among equal depths, so a
    /// parent directory is always placed before its children. With no pages
    /// the tree holds only a synthetic root.
    pub fn build(&self, pages: &[PageRecord]) -> DocumentTree {
        let root = match pages.first() {
            Some(first) => node_from_page(first, NodeId(0), 0),
            None => synthetic_root(),
        };

        let mut url_index = HashMap::new();
        if !root.url.is_empty() {
            url_index.insert(root.url.clone(), root.id);
        }

        let mut tree = DocumentTree {
            nodes: vec![root],
            root: NodeId(0),
            url_index,
            max_depth: 0,
            total_nodes: 1,
        };

        let mut rest: Vec<(usize, &PageRecord)> = pages.iter().enumerate().skip(1).collect();
        rest.sort_by_key(|(_, page)| path_depth(&page.url));

        for (position, page) in rest {
            self.add_node(&mut tree, page, position);
        }

        assign_levels(&mut tree);

        if self.config.sort_children {
            tree.sort_children(self.config.sort_by);
        }
        if self.config.auto_index {
            tree.reindex();
        }

        tree.refresh_totals();

        tracing::debug!(
            "Built document tree: {} nodes, max depth {}",
            tree.total_nodes,
            tree.max_depth
        );

        tree
    }

    /// Inserts one page under its inferred parent
    ///
    /// # Returns
    ///
    /// * `Some(NodeId)` - The page was placed in the tree
    /// * `None` - Already present, or no parent and root fallback disabled
    pub fn add_node(&self, tree: &mut DocumentTree, page: &PageRecord, index: usize) -> Option<NodeId> {
        if tree.url_index.contains_key(&page.url) {
            tracing::debug!("{} already in tree", page.url);
            return None;
        }

        let mut node = node_from_page(page, NodeId(tree.nodes.len()), index);

        let parent = match find_parent(tree, &node) {
            Some(parent) => parent,
            None if self.config.fallback_to_root => tree.root,
            None => {
                tracing::debug!("No parent for {}, leaving it out of the tree", page.url);
                return None;
            }
        };

        let id = node.id;
        node.parent = Some(parent);
        tree.url_index.insert(node.url.clone(), id);
        tree.nodes.push(node);
        tree.node_mut(parent).children.push(id);

        Some(id)
    }
}

impl DocumentTree {
    /// Stable sort of every node's children by `key`
    pub fn sort_children(&mut self, key: SortKey) {
        for position in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[position].children);
            children.sort_by(|a, b| compare_nodes(&self.nodes[a.0], &self.nodes[b.0], key));
            self.nodes[position].children = children;
        }
    }

    /// Renumbers `index` in pre-order, starting at 0 for the root
    pub fn reindex(&mut self) {
        let mut next = 0;
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            node.index = next;
            next += 1;
            stack.extend(node.children.iter().rev().copied());
        }
    }

    pub(crate) fn refresh_totals(&mut self) {
        self.total_nodes = self.nodes.len();
        self.max_depth = self.nodes.iter().map(|node| node.level).max().unwrap_or(0);
    }
}

fn compare_nodes(a: &DocumentNode, b: &DocumentNode, key: SortKey) -> Ordering {
    match key {
        SortKey::Index => a.index.cmp(&b.index),
        SortKey::Title => a.title.cmp(&b.title),
        SortKey::Url => a.url.cmp(&b.url),
        SortKey::Date => a.fetched_at.cmp(&b.fetched_at),
    }
}

/// Sets `level` and `depth` to each node's distance from the root
fn assign_levels(tree: &mut DocumentTree) {
    let mut stack = vec![(tree.root, 0)];

    while let Some((id, level)) = stack.pop() {
        let node = tree.node_mut(id);
        node.level = level;
        node.depth = level;
        stack.extend(node.children.iter().map(|child| (*child, level + 1)));
    }
}

/// Longest ancestor path on the same host; earliest inserted wins ties
fn find_parent(tree: &DocumentTree, node: &DocumentNode) -> Option<NodeId> {
    let key = path_key(&node.path);
    if key.is_empty() {
        return Some(tree.root);
    }

    let mut best: Option<(usize, NodeId)> = None;
    for candidate in &tree.nodes {
        if candidate.host != node.host {
            continue;
        }

        let candidate_key = path_key(&candidate.path);
        if !is_ancestor(candidate_key, key) {
            continue;
        }

        if best.map_or(true, |(len, _)| candidate_key.len() > len) {
            best = Some((candidate_key.len(), candidate.id));
        }
    }

    best.map(|(_, id)| id)
}

/// True if `ancestor` is a proper directory prefix of `path`
fn is_ancestor(ancestor: &str, path: &str) -> bool {
    ancestor.len() < path.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Path without trailing slashes; the site root becomes ""
fn path_key(path: &str) -> &str {
    path.trim_end_matches('/')
}

fn path_depth(url: &str) -> usize {
    Url::parse(url)
        .map(|url| {
            path_key(url.path())
                .split('/')
                .filter(|segment| !segment.is_empty())
                .count()
        })
        .unwrap_or(usize::MAX)
}

fn node_from_page(page: &PageRecord, id: NodeId, index: usize) -> DocumentNode {
    let parsed = Url::parse(&page.url).ok();

    DocumentNode {
        id,
        url: page.url.clone(),
        path: parsed
            .as_ref()
            .map(|url| url.path().to_string())
            .unwrap_or_else(|| "/".to_string()),
        host: parsed
            .as_ref()
            .and_then(|url| host_key(url).ok())
            .unwrap_or_default(),
        title: page.title.clone(),
        content: page.content.clone(),
        depth: page.depth,
        level: 0,
        index,
        fetched_at: Some(page.fetched_at),
        children: Vec::new(),
        parent: None,
    }
}

fn synthetic_root() -> DocumentNode {
    DocumentNode {
        id: NodeId(0),
        url: String::new(),
        path: "/".to_string(),
        host: String::new(),
        title: "Root".to_string(),
        content: String::new(),
        depth: 0,
        level: 0,
        index: 0,
        fetched_at: None,
        children: Vec::new(),
        parent: None,
    }
}
