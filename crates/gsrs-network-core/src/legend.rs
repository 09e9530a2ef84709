//! Post-processing over the finished node and link lists: multi-edge
//! ordinals, the tag index and the legend.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::classify::capitalize_first;
use crate::document::{FetchStatus, Legend, Link, LinkLegendEntry, Node, NodeLegendEntry, Tag};

/// Stamps `linkTotal`/`linkNumber` on every link whose unordered node pair
/// is connected more than once.
///
/// Links are grouped by `(source, target)`. Each group is merged with its
/// reverse group; the merged order is forward links first, then reverse
/// links, each in encounter order. A self-loop pair is its own reverse and is
/// counted once.
pub fn annotate_multi_edges(links: &mut [Link]) {
    let mut groups: IndexMap<(String, String), Vec<usize>> = IndexMap::new();
    for (index, link) in links.iter().enumerate() {
        groups
            .entry((link.source.clone(), link.target.clone()))
            .or_default()
            .push(index);
    }

    let mut merged_from_reverse: HashSet<(String, String)> = HashSet::new();
    for (key, forward) in &groups {
        if merged_from_reverse.contains(key) {
            continue;
        }
        let reverse_key = (key.1.clone(), key.0.clone());
        let mut members = forward.clone();
        if reverse_key != *key {
            if let Some(reverse) = groups.get(&reverse_key) {
                members.extend_from_slice(reverse);
            }
        }

        if members.len() > 1 {
            let total = members.len();
            for (number, index) in members.into_iter().enumerate() {
                links[index].link_total = Some(total);
                links[index].link_number = Some(number);
            }
        }
        merged_from_reverse.insert(reverse_key);
    }
}

/// Builds the tag index and legend.
///
/// Tags start with the two fetch-status entries, then one per distinct node
/// type, then one per distinct link type, each in first-encounter order.
pub fn build_tags_and_legend(nodes: &[Node], links: &[Link]) -> (Vec<Tag>, Legend) {
    let mut tags: Vec<Tag> = [FetchStatus::Fetched, FetchStatus::Unfetched]
        .into_iter()
        .map(|status| Tag {
            id: status.as_str().to_string(),
            text: capitalize_first(status.as_str()),
        })
        .collect();
    let mut legend = Legend::default();

    let node_types: IndexSet<&str> = nodes.iter().map(|n| n.node_type.as_str()).collect();
    for node_type in node_types {
        let text = capitalize_first(node_type);
        tags.push(Tag {
            id: node_type.to_string(),
            text: text.clone(),
        });
        legend.nodes.push(NodeLegendEntry {
            node_type: node_type.to_string(),
            text,
        });
    }

    // Link types are already category names; they keep their spelling.
    let link_types: IndexSet<&str> = links
        .iter()
        .map(|l| l.link_type.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    for link_type in link_types {
        tags.push(Tag {
            id: link_type.to_string(),
            text: link_type.to_string(),
        });
        legend.links.push(LinkLegendEntry {
            link_type: link_type.to_string(),
            text: link_type.to_string(),
        });
    }

    (tags, legend)
}
