//! Budgets and dedup bookkeeping for a single materialization run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_MAX_ELEMENTS: usize = 1000;
pub const DEFAULT_MAX_LINKS_PER_NODE: usize = 50;

/// Limits applied to every network document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOptions {
    /// Number of expansion levels below the root.
    pub max_depth: usize,
    /// Upper bound on nodes + links per document. `0` stops immediately.
    pub max_elements: usize,
    /// Links produced for one node before its expansion is cut short.
    pub max_links_per_node: usize,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_elements: DEFAULT_MAX_ELEMENTS,
            max_links_per_node: DEFAULT_MAX_LINKS_PER_NODE,
        }
    }
}

/// Mutable state threaded through every frontier expansion of one run.
///
/// The root id is visited from the start. The element budget only ever
/// decreases and saturates at zero.
#[derive(Debug, Clone)]
pub struct TraversalState {
    remaining_elements: usize,
    max_links_per_node: usize,
    visited: HashSet<String>,
}

impl TraversalState {
    pub fn new(root_id: &str, options: &NetworkOptions) -> Self {
        Self {
            remaining_elements: options.max_elements,
            max_links_per_node: options.max_links_per_node,
            visited: HashSet::from([root_id.to_string()]),
        }
    }

    pub fn remaining_elements(&self) -> usize {
        self.remaining_elements
    }

    pub fn max_links_per_node(&self) -> usize {
        self.max_links_per_node
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_elements == 0
    }

    /// True once a node has produced its share of links or the document
    /// budget is spent.
    pub fn should_truncate(&self, links_for_node: usize) -> bool {
        links_for_node >= self.max_links_per_node || self.is_exhausted()
    }

    pub fn consume(&mut self, elements: usize) {
        self.remaining_elements = self.remaining_elements.saturating_sub(elements);
    }

    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    /// Returns `false` if the id was already visited.
    pub fn visit(&mut self, id: &str) -> bool {
        if self.visited.contains(id) {
            return false;
        }
        self.visited.insert(id.to_string())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
