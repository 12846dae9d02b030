//! Document tree module
//!
//! Reconstructs the site hierarchy from admitted pages and provides traversal
//! utilities. Visitors return a `Result`; the first error stops the traversal
//! and is returned to the caller.

mod builder;
mod node;

pub use builder::TreeBuilder;
pub use node::{DocumentNode, DocumentTree, NodeId};

use std::collections::VecDeque;
use std::convert::Infallible;

impl DocumentTree {
    /// Pre-order traversal from the root
    pub fn depth_first<'a, E, V>(&'a self, mut visit: V) -> Result<(), E>
    where
        V: FnMut(&'a DocumentNode) -> Result<(), E>,
    {
        let mut stack = vec![self.root_id()];

        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            visit(node)?;
            stack.extend(node.children.iter().rev().copied());
        }

        Ok(())
    }

    /// Level-order traversal from the root
    pub fn breadth_first<'a, E, V>(&'a self, mut visit: V) -> Result<(), E>
    where
        V: FnMut(&'a DocumentNode) -> Result<(), E>,
    {
        let mut queue = VecDeque::from([self.root_id()]);

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.node(id) else {
                continue;
            };
            visit(node)?;
            queue.extend(node.children.iter().copied());
        }

        Ok(())
    }

    /// Nodes at `level`, left to right
    pub fn nodes_at_level(&self, level: usize) -> Vec<&DocumentNode> {
        let mut found = Vec::new();
        let _ = self.breadth_first(|node| -> Result<(), Infallible> {
            if node.level == level {
                found.push(node);
            }
            Ok(())
        });
        found
    }

    /// Every node in pre-order
    pub fn pre_order(&self) -> Vec<&DocumentNode> {
        let mut ordered = Vec::with_capacity(self.total_nodes());
        let _ = self.depth_first(|node| -> Result<(), Infallible> {
            ordered.push(node);
            Ok(())
        });
        ordered
    }
}
