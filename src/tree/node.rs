//! Arena-backed document tree types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Handle to a node in a [`DocumentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One page placed in the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentNode {
    pub id: NodeId,
    /// Empty for a synthetic root
    pub url: String,
    /// URL path component
    pub path: String,
    #[serde(skip)]
    pub(crate) host: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    pub depth: usize,
    /// Distance from the root; 0 only for the root
    pub level: usize,
    /// Position in traversal order
    pub index: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub children: Vec<NodeId>,
    #[serde(skip)]
    pub parent: Option<NodeId>,
}

impl DocumentNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Hierarchy of admitted pages
///
/// Nodes live in an arena and refer to each other by [`NodeId`]; the tree is
/// read-only once built apart from [`DocumentTree::sort_children`] and
/// [`DocumentTree::reindex`].
#[derive(Debug, Clone)]
pub struct DocumentTree {
    pub(crate) nodes: Vec<DocumentNode>,
    pub(crate) root: NodeId,
    pub(crate) url_index: HashMap<String, NodeId>,
    pub(crate) max_depth: usize,
    pub(crate) total_nodes: usize,
}

impl DocumentTree {
    pub fn root(&self) -> &DocumentNode {
        &self.nodes[self.root.0]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&DocumentNode> {
        self.nodes.get(id.0)
    }

    /// Looks a node up by its exact URL
    pub fn find_node(&self, url: &str) -> Option<&DocumentNode> {
        self.url_index.get(url).and_then(|id| self.node(*id))
    }

    pub fn parent(&self, id: NodeId) -> Option<&DocumentNode> {
        self.node(id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.node(parent))
    }

    /// Children of `id` in their current order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &DocumentNode> + '_ {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.node(*child))
    }

    /// Every node in insertion order, root first
    pub fn nodes(&self) -> impl Iterator<Item = &DocumentNode> + '_ {
        self.nodes.iter()
    }

    /// Deepest level in the tree
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of nodes including the root
    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut DocumentNode {
        &mut self.nodes[id.0]
    }
}
