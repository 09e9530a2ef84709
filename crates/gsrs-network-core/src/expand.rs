//! One level of network expansion.
//!
//! Every frontier node is expanded in order. References are resolved through
//! the [`RecordStore`]; each new node and each link costs one unit of the
//! document's element budget. Budgets are checked before every reference, so
//! a node can be cut short part-way through its references. Whatever it
//! produced before the cut is kept and the node is marked unfetched.

use tracing::{debug, warn};

use crate::build::{build_link, build_node};
use crate::classify::LinkClassifier;
use crate::document::{FetchStatus, Link, Node};
use crate::record::{RawRecord, RecordStore};
use crate::state::TraversalState;

/// A node paired with the record it was built from.
#[derive(Debug, Clone)]
pub struct FrontierEntry<'a> {
    pub node: Node,
    pub record: &'a RawRecord,
}

impl<'a> FrontierEntry<'a> {
    pub fn new(record: &'a RawRecord) -> Self {
        Self {
            node: build_node(record),
            record,
        }
    }

    /// Marks a node the traversal reached but never expanded. Its reference
    /// count is still reported so the frontend can show what is hidden.
    pub fn mark_unexpanded(&mut self, reference_field: &str) {
        if self.node.fetch_status().is_some() {
            return;
        }
        let references = self.record.reference_paths(reference_field).len();
        self.node.set_relationship_count(references, false);
        self.node.mark(FetchStatus::Unfetched);
    }
}

/// Counters for the non-fatal conditions met while expanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub references: usize,
    pub missing_targets: usize,
    pub self_references: usize,
    pub truncated_nodes: usize,
}

impl ExpansionStats {
    pub fn absorb(&mut self, other: ExpansionStats) {
        self.references += other.references;
        self.missing_targets += other.missing_targets;
        self.self_references += other.self_references;
        self.truncated_nodes += other.truncated_nodes;
    }
}

#[derive(Debug)]
pub struct Expansion<'a> {
    /// Newly discovered nodes, in discovery order. They form the next frontier.
    pub frontier: Vec<FrontierEntry<'a>>,
    pub links: Vec<Link>,
    /// True if any frontier node was cut short by a budget.
    pub truncated: bool,
    pub stats: ExpansionStats,
}

pub fn expand<'a>(
    frontier: &mut [FrontierEntry<'a>],
    store: &'a RecordStore,
    classifier: &LinkClassifier,
    state: &mut TraversalState,
) -> Expansion<'a> {
    let mut expansion = Expansion {
        frontier: Vec::new(),
        links: Vec::new(),
        truncated: false,
        stats: ExpansionStats::default(),
    };
    for entry in frontier.iter_mut() {
        expand_node(entry, store, classifier, state, &mut expansion);
    }
    expansion
}

fn expand_node<'a>(
    entry: &mut FrontierEntry<'a>,
    store: &'a RecordStore,
    classifier: &LinkClassifier,
    state: &mut TraversalState,
    out: &mut Expansion<'a>,
) {
    let field = store.reference_field();
    let source = entry.record;
    let source_id = source.id();
    let paths = source.reference_paths(field);
    debug!(uuid = source_id, references = paths.len(), "expanding node");
    out.stats.references += paths.len();

    let mut links_for_node = 0usize;
    for path in &paths {
        if state.should_truncate(links_for_node) {
            warn!(
                uuid = source_id,
                references = paths.len(),
                links = links_for_node,
                remaining = state.remaining_elements(),
                "budget reached; node left unfetched"
            );
            entry.node.set_relationship_count(paths.len(), true);
            entry.node.mark(FetchStatus::Unfetched);
            out.truncated = true;
            out.stats.truncated_nodes += 1;
            return;
        }

        let Some(target_id) = source.reference_target(path, field) else {
            warn!(uuid = source_id, path = %path, "reference has no string target id");
            out.stats.missing_targets += 1;
            continue;
        };
        let Some(target) = store.get(target_id) else {
            warn!(
                uuid = source_id,
                target = target_id,
                path = %path,
                "referenced record not found"
            );
            out.stats.missing_targets += 1;
            continue;
        };

        if target_id == source_id {
            warn!(uuid = source_id, path = %path, "self-reference");
            out.stats.self_references += 1;
        } else if state.visit(target_id) {
            out.frontier.push(FrontierEntry::new(target));
            state.consume(1);
        }

        // Links to already-visited nodes and to the source itself still count.
        out.links.push(build_link(source, target_id, path, classifier));
        state.consume(1);
        links_for_node += 1;
    }

    entry.node.set_relationship_count(paths.len(), false);
    entry.node.mark(FetchStatus::Fetched);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ATTR_RELATIONSHIP_COUNT, OVER_BUDGET_WARNING};
    use crate::record::RecordOptions;
    use crate::state::NetworkOptions;
    use serde_json::{json, Value};

    fn substance(id: &str, refs: &[&str]) -> Value {
        let relationships: Vec<Value> = refs
            .iter()
            .map(|r| json!({"type": "REL", "relatedSubstance": {"refuuid": r}}))
            .collect();
        json!({"uuid": id, "substanceClass": "chemical", "relationships": relationships})
    }

    fn store(values: Vec<Value>) -> RecordStore {
        RecordStore::from_values(RecordOptions::default(), values).unwrap()
    }

    fn run<'a>(
        store: &'a RecordStore,
        root: &str,
        options: NetworkOptions,
    ) -> (Vec<FrontierEntry<'a>>, Expansion<'a>, TraversalState) {
        let mut frontier = vec![FrontierEntry::new(store.get(root).unwrap())];
        let mut state = TraversalState::new(root, &options);
        let expansion = expand(&mut frontier, store, &LinkClassifier::default(), &mut state);
        (frontier, expansion, state)
    }

    fn ids(entries: &[FrontierEntry<'_>]) -> Vec<String> {
        entries.iter().map(|e| e.node.id.clone()).collect()
    }

    #[test]
    fn resolves_references_in_order() {
        let store = store(vec![substance("r", &["a", "b"]), substance("a", &[]), substance("b", &[])]);
        let (frontier, expansion, state) = run(&store, "r", NetworkOptions::default());

        assert_eq!(ids(&expansion.frontier), vec!["a", "b"]);
        assert_eq!(expansion.links.len(), 2);
        assert!(!expansion.truncated);
        assert_eq!(frontier[0].node.fetch_status(), Some(FetchStatus::Fetched));
        assert_eq!(frontier[0].node.attributes[ATTR_RELATIONSHIP_COUNT], json!(2));
        assert_eq!(state.remaining_elements(), 1000 - 4);
    }

    #[test]
    fn missing_targets_are_skipped() {
        let store = store(vec![substance("r", &["ghost", "a"]), substance("a", &[])]);
        let (frontier, expansion, _) = run(&store, "r", NetworkOptions::default());

        assert_eq!(ids(&expansion.frontier), vec!["a"]);
        assert_eq!(expansion.links.len(), 1);
        assert_eq!(expansion.stats.missing_targets, 1);
        assert_eq!(frontier[0].node.fetch_status(), Some(FetchStatus::Fetched));
        assert_eq!(frontier[0].node.attributes[ATTR_RELATIONSHIP_COUNT], json!(2));
    }

    #[test]
    fn self_and_repeat_references_produce_links_only() {
        let store = store(vec![substance("r", &["r", "a", "a"]), substance("a", &[])]);
        let (_, expansion, state) = run(&store, "r", NetworkOptions::default());

        assert_eq!(ids(&expansion.frontier), vec!["a"]);
        let pairs: Vec<(&str, &str)> = expansion
            .links
            .iter()
            .map(|l| (l.source.as_str(), l.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("r", "r"), ("r", "a"), ("r", "a")]);
        assert_eq!(expansion.stats.self_references, 1);
        assert_eq!(state.remaining_elements(), 1000 - 4);
    }

    #[test]
    fn per_node_link_budget_truncates_mid_node() {
        let store = store(vec![
            substance("r", &["a", "b", "c"]),
            substance("a", &[]),
            substance("b", &[]),
            substance("c", &[]),
        ]);
        let options = NetworkOptions {
            max_links_per_node: 2,
            ..NetworkOptions::default()
        };
        let (frontier, expansion, _) = run(&store, "r", options);

        assert_eq!(ids(&expansion.frontier), vec!["a", "b"]);
        assert_eq!(expansion.links.len(), 2);
        assert!(expansion.truncated);
        let root = &frontier[0].node;
        assert_eq!(root.fetch_status(), Some(FetchStatus::Unfetched));
        assert_eq!(
            root.attributes[ATTR_RELATIONSHIP_COUNT],
            json!(format!("3 {OVER_BUDGET_WARNING}"))
        );
    }

    #[test]
    fn element_budget_stops_following_nodes_but_not_empty_ones() {
        let store = store(vec![
            substance("r", &["a"]),
            substance("a", &["b"]),
            substance("b", &[]),
            substance("c", &[]),
        ]);
        let options = NetworkOptions {
            max_elements: 2,
            ..NetworkOptions::default()
        };
        let mut frontier = vec![
            FrontierEntry::new(store.get("a").unwrap()),
            FrontierEntry::new(store.get("r").unwrap()),
            FrontierEntry::new(store.get("c").unwrap()),
        ];
        let mut state = TraversalState::new("a", &options);
        state.visit("r");
        state.visit("c");
        let expansion = expand(&mut frontier, &store, &LinkClassifier::default(), &mut state);

        // `a` spends the whole budget on node `b` plus its link.
        assert_eq!(ids(&expansion.frontier), vec!["b"]);
        assert!(state.is_exhausted());
        assert_eq!(frontier[0].node.fetch_status(), Some(FetchStatus::Fetched));
        assert_eq!(frontier[1].node.fetch_status(), Some(FetchStatus::Unfetched));
        // No references to examine, so nothing to cut short.
        assert_eq!(frontier[2].node.fetch_status(), Some(FetchStatus::Fetched));
        assert_eq!(expansion.stats.truncated_nodes, 1);
    }

    #[test]
    fn node_without_references_is_fetched() {
        let store = store(vec![substance("r", &[])]);
        let (frontier, expansion, _) = run(&store, "r", NetworkOptions::default());
        assert!(expansion.frontier.is_empty());
        assert!(expansion.links.is_empty());
        assert_eq!(frontier[0].node.fetch_status(), Some(FetchStatus::Fetched));
        assert_eq!(frontier[0].node.attributes[ATTR_RELATIONSHIP_COUNT], json!(0));
    }
}
