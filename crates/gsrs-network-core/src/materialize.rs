//! Level-by-level materialization of one root's network.

use tracing::{debug, info};

use crate::classify::LinkClassifier;
use crate::document::NetworkDocument;
use crate::expand::{expand, ExpansionStats, FrontierEntry};
use crate::legend::{annotate_multi_edges, build_tags_and_legend};
use crate::record::{RawRecord, RecordStore};
use crate::state::{NetworkOptions, TraversalState};

/// Why the level loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every permitted level was expanded.
    DepthLimit,
    /// The element budget hit zero.
    BudgetExhausted,
    /// A level produced no new nodes.
    EmptyFrontier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Levels actually expanded.
    pub levels: usize,
    pub stop: StopReason,
    pub stats: ExpansionStats,
}

#[derive(Debug, Clone)]
pub struct Materialized {
    pub document: NetworkDocument,
    pub report: MaterializeReport,
}

pub fn materialize(
    root: &RawRecord,
    store: &RecordStore,
    options: &NetworkOptions,
    classifier: &LinkClassifier,
) -> NetworkDocument {
    materialize_with_report(root, store, options, classifier).document
}

/// Expands `root` level by level until the depth limit, the element budget or
/// the supply of new nodes runs out, then finalizes link metadata and tags.
///
/// Nodes are listed in discovery order with the root first. Nodes on the
/// outermost level were never expanded and are marked unfetched.
pub fn materialize_with_report(
    root: &RawRecord,
    store: &RecordStore,
    options: &NetworkOptions,
    classifier: &LinkClassifier,
) -> Materialized {
    let field = store.reference_field();
    let mut state = TraversalState::new(root.id(), options);
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut frontier = vec![FrontierEntry::new(root)];
    let mut report = MaterializeReport {
        levels: 0,
        stop: StopReason::DepthLimit,
        stats: ExpansionStats::default(),
    };

    if options.max_depth == 0 || state.is_exhausted() {
        debug!(uuid = root.id(), "nothing to expand");
        if state.is_exhausted() {
            report.stop = StopReason::BudgetExhausted;
        }
        mark_unexpanded(&mut frontier, field);
    }

    for depth in 0..options.max_depth {
        if report.stop != StopReason::DepthLimit {
            break;
        }
        let level = depth + 1;
        debug!(uuid = root.id(), level, frontier = frontier.len(), "expanding level");

        let expansion = expand(&mut frontier, store, classifier, &mut state);
        report.levels = level;
        report.stats.absorb(expansion.stats);
        nodes.extend(frontier.into_iter().map(|entry| entry.node));
        links.extend(expansion.links);
        frontier = expansion.frontier;

        if state.is_exhausted() {
            info!(
                uuid = root.id(),
                level,
                "element budget reached; deeper levels skipped"
            );
            report.stop = StopReason::BudgetExhausted;
            mark_unexpanded(&mut frontier, field);
        } else if frontier.is_empty() {
            debug!(uuid = root.id(), level, "no new nodes; stopping");
            report.stop = StopReason::EmptyFrontier;
        } else if level == options.max_depth {
            mark_unexpanded(&mut frontier, field);
        }
    }
    nodes.extend(frontier.into_iter().map(|entry| entry.node));

    annotate_multi_edges(&mut links);
    let (tags, legend) = build_tags_and_legend(&nodes, &links);

    Materialized {
        document: NetworkDocument {
            nodes,
            links,
            tags,
            legend,
        },
        report,
    }
}

fn mark_unexpanded(frontier: &mut [FrontierEntry<'_>], field: &str) {
    for entry in frontier {
        entry.mark_unexpanded(field);
    }
}
