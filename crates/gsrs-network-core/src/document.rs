//! The network document handed to graph-visualization frontends.
//!
//! Field names on the wire follow the frontend's format (`n`, `obj`,
//! `nodeType`, `linkTotal`, ...). Attribute maps and tag sets are
//! insertion-ordered because their order is visible in the rendered output.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ATTR_UUID: &str = "UUID";
pub const ATTR_SUBSTANCE_CLASS: &str = "Substance Class";
pub const ATTR_TYPE: &str = "Type";
pub const ATTR_STATUS: &str = "Status";
pub const ATTR_UNII: &str = "UNII";
pub const ATTR_OTHER_NAMES: &str = "Other Names";
pub const ATTR_CODES: &str = "Codes";
pub const ATTR_RELATIONSHIP_COUNT: &str = "Number Of Relationships";
pub const ATTR_LINK_TYPE: &str = "Link Type";

pub const OVER_BUDGET_WARNING: &str =
    "(WARNING: this number exceeds the maximum number of links supported by this visualization)";

pub type Attributes = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Fetched,
    Unfetched,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchStatus::Fetched => "fetched",
            FetchStatus::Unfetched => "unfetched",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "n")]
    pub display_name: String,
    #[serde(rename = "nodeType")]
    pub node_type: String,
    #[serde(rename = "obj")]
    pub attributes: Attributes,
    #[serde(default)]
    pub tags: IndexSet<String>,
    #[serde(skip)]
    fetch_status: Option<FetchStatus>,
}

impl Node {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            node_type: node_type.into(),
            attributes: Attributes::new(),
            tags: IndexSet::new(),
            fetch_status: None,
        }
    }

    /// Status assigned during this run; `None` for deserialized nodes and
    /// nodes the traversal has not reached a verdict on.
    pub fn fetch_status(&self) -> Option<FetchStatus> {
        self.fetch_status
    }

    /// Decorates `nodeType` with the status suffix and resets the tags to
    /// `{decorated type, status}`. A node is decorated at most once.
    pub fn mark(&mut self, status: FetchStatus) {
        if self.fetch_status.is_some() {
            return;
        }
        self.node_type = format!("{} ({})", self.node_type, status.as_str());
        self.tags = IndexSet::from([self.node_type.clone(), status.as_str().to_string()]);
        self.fetch_status = Some(status);
    }

    pub fn set_relationship_count(&mut self, count: usize, over_budget: bool) {
        let value = if over_budget {
            Value::String(format!("{count} {OVER_BUDGET_WARNING}"))
        } else {
            Value::from(count)
        };
        self.attributes.insert(ATTR_RELATIONSHIP_COUNT.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(rename = "linkType")]
    pub link_type: String,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "obj")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub tags: IndexSet<String>,
    #[serde(rename = "linkTotal", default, skip_serializing_if = "Option::is_none")]
    pub link_total: Option<usize>,
    #[serde(rename = "linkNumber", default, skip_serializing_if = "Option::is_none")]
    pub link_number: Option<usize>,
}

impl Link {
    pub fn is_self_reference(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLegendEntry {
    #[serde(rename = "nodeType")]
    pub node_type: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkLegendEntry {
    #[serde(rename = "linkType")]
    pub link_type: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    pub nodes: Vec<NodeLegendEntry>,
    pub links: Vec<LinkLegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub tags: Vec<Tag>,
    pub legend: Legend,
}

impl NetworkDocument {
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes plus links, the quantity the element budget limits.
    pub fn element_count(&self) -> usize {
        self.nodes.len() + self.links.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mark_decorates_once() {
        let mut node = Node::new("a", "Aspirin", "chemical");
        node.mark(FetchStatus::Fetched);
        node.mark(FetchStatus::Unfetched);
        assert_eq!(node.node_type, "chemical (fetched)");
        assert_eq!(
            node.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["chemical (fetched)", "fetched"]
        );
        assert_eq!(node.fetch_status(), Some(FetchStatus::Fetched));
    }

    #[test]
    fn relationship_count_carries_warning_when_over_budget() {
        let mut node = Node::new("a", "a", "chemical");
        node.set_relationship_count(3, false);
        assert_eq!(node.attributes[ATTR_RELATIONSHIP_COUNT], json!(3));
        node.set_relationship_count(120, true);
        assert_eq!(
            node.attributes[ATTR_RELATIONSHIP_COUNT],
            json!(format!("120 {OVER_BUDGET_WARNING}"))
        );
    }

    #[test]
    fn wire_format_uses_frontend_keys() {
        let mut node = Node::new("a", "Aspirin", "chemical");
        node.attributes.insert(ATTR_UUID.into(), json!("a"));
        let link = Link {
            source: "a".into(),
            target: "b".into(),
            link_type: "Relationship".into(),
            display_name: None,
            attributes: Attributes::new(),
            tags: IndexSet::new(),
            link_total: Some(2),
            link_number: Some(0),
        };

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"id": "a", "n": "Aspirin", "nodeType": "chemical", "obj": {"UUID": "a"}, "tags": []})
        );
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({
                "source": "a", "target": "b", "linkType": "Relationship",
                "obj": {}, "linkTotal": 2, "linkNumber": 0
            })
        );
    }
}
