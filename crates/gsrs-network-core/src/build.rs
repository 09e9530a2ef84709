//! Converts raw records and reference paths into nodes and links.

use indexmap::IndexSet;
use serde_json::Value;

use crate::classify::LinkClassifier;
use crate::document::{
    Attributes, Link, Node, ATTR_CODES, ATTR_LINK_TYPE, ATTR_OTHER_NAMES, ATTR_STATUS,
    ATTR_SUBSTANCE_CLASS, ATTR_TYPE, ATTR_UNII, ATTR_UUID,
};
use crate::path::JsonPath;
use crate::query;
use crate::record::RawRecord;

/// Code system whose value identifies a substance when `approvalID` is absent.
pub const UNII_CODE_SYSTEM: &str = "FDA UNII";

const LIST_DELIMITER: &str = "<br>";

pub fn build_node(record: &RawRecord) -> Node {
    let doc = record.document();
    let substance_class = str_field(doc, "substanceClass").unwrap_or_default();
    let display_name = display_name(doc).unwrap_or(record.id());

    let mut node = Node::new(record.id(), display_name, substance_class);
    let attrs = &mut node.attributes;
    attrs.insert(ATTR_UUID.into(), Value::from(record.id()));
    attrs.insert(ATTR_SUBSTANCE_CLASS.into(), Value::from(substance_class));
    attrs.insert(ATTR_TYPE.into(), Value::from(substance_class));
    if let Some(status) = str_field(doc, "status") {
        attrs.insert(ATTR_STATUS.into(), Value::from(status));
    }
    if let Some(unii) = unii(doc) {
        attrs.insert(ATTR_UNII.into(), Value::from(unii));
    }

    let other_names: Vec<&str> = names(doc).filter_map(|n| str_field(n, "name")).collect();
    if !other_names.is_empty() {
        attrs.insert(ATTR_OTHER_NAMES.into(), Value::from(other_names.join(LIST_DELIMITER)));
    }

    let codes: Vec<String> = codes(doc)
        .filter_map(|c| {
            let system = str_field(c, "codeSystem").filter(|s| !s.is_empty())?;
            let code = str_field(c, "code").filter(|s| !s.is_empty())?;
            Some(format!("{system}: {code}"))
        })
        .collect();
    if !codes.is_empty() {
        attrs.insert(ATTR_CODES.into(), Value::from(codes.join(LIST_DELIMITER)));
    }

    node
}

/// Builds the link for the reference at `path` inside `source`.
///
/// The link's label and extra attributes come from the object that owns the
/// reference (see [`JsonPath::parent_object`]); its type comes from the
/// classifier applied to the reference path itself.
pub fn build_link(
    source: &RawRecord,
    target_id: &str,
    path: &JsonPath,
    classifier: &LinkClassifier,
) -> Link {
    let link_type = classifier.classify(path);
    let parent = query::read(source.references(), &path.parent_object());
    let parent_type = parent.and_then(|p| str_field(p, "type"));
    let parent_name = parent.and_then(|p| str_field(p, "name"));
    let parent_uuid = parent.and_then(|p| str_field(p, "uuid"));

    let mut attributes = Attributes::new();
    attributes.insert(ATTR_LINK_TYPE.into(), Value::from(link_type.as_str()));
    if let Some(t) = parent_type {
        attributes.insert(ATTR_TYPE.into(), Value::from(t));
    }
    if let Some(uuid) = parent_uuid {
        attributes.insert(ATTR_UUID.into(), Value::from(uuid));
    }

    Link {
        source: source.id().to_string(),
        target: target_id.to_string(),
        display_name: parent_name.or(parent_type).map(str::to_string),
        tags: IndexSet::from([link_type.clone()]),
        link_type,
        attributes,
        link_total: None,
        link_number: None,
    }
}

fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field)?.as_str()
}

fn flag(value: &Value, field: &str) -> bool {
    value.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn names(doc: &Value) -> impl Iterator<Item = &Value> {
    doc.get("names")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn codes(doc: &Value) -> impl Iterator<Item = &Value> {
    doc.get("codes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Display-name entry, then preferred entry, then the first named entry.
fn display_name(doc: &Value) -> Option<&str> {
    flagged_name(doc, "displayName")
        .or_else(|| flagged_name(doc, "preferred"))
        .or_else(|| names(doc).find_map(|n| str_field(n, "name")))
}

fn flagged_name<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    names(doc)
        .filter(|n| flag(n, field))
        .find_map(|n| str_field(n, "name"))
}

fn unii(doc: &Value) -> Option<&str> {
    str_field(doc, "approvalID").or_else(|| {
        codes(doc)
            .filter(|c| str_field(c, "codeSystem") == Some(UNII_CODE_SYSTEM))
            .find_map(|c| str_field(c, "code"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordOptions;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value, &RecordOptions::default()).unwrap()
    }

    #[test]
    fn display_name_prefers_flagged_entries() {
        let rec = record(json!({
            "uuid": "a",
            "substanceClass": "chemical",
            "names": [
                {"name": "first"},
                {"name": "preferred", "preferred": true},
                {"name": "display", "displayName": true}
            ]
        }));
        assert_eq!(build_node(&rec).display_name, "display");

        let rec = record(json!({
            "uuid": "a",
            "names": [{"name": "first"}, {"name": "preferred", "preferred": true}]
        }));
        assert_eq!(build_node(&rec).display_name, "preferred");

        let rec = record(json!({"uuid": "a", "names": [{"type": "cn"}, {"name": "second"}]}));
        assert_eq!(build_node(&rec).display_name, "second");
    }

    #[test]
    fn nameless_record_falls_back_to_id() {
        let node = build_node(&record(json!({"uuid": "abc-123"})));
        assert_eq!(node.display_name, "abc-123");
        assert_eq!(node.node_type, "");
        assert!(node.tags.is_empty());
    }

    #[test]
    fn node_attributes_are_ordered() {
        let rec = record(json!({
            "uuid": "a",
            "substanceClass": "chemical",
            "status": "approved",
            "names": [{"name": "Aspirin", "displayName": true}, {"name": "ASA"}],
            "codes": [
                {"codeSystem": "FDA UNII", "code": "R16CO5Y76E"},
                {"codeSystem": "CAS", "code": "50-78-2"},
                {"codeSystem": "", "code": "ignored"}
            ]
        }));
        let node = build_node(&rec);
        let keys: Vec<&str> = node.attributes.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![ATTR_UUID, ATTR_SUBSTANCE_CLASS, ATTR_TYPE, ATTR_STATUS, ATTR_UNII, ATTR_OTHER_NAMES, ATTR_CODES]
        );
        assert_eq!(node.attributes[ATTR_UNII], json!("R16CO5Y76E"));
        assert_eq!(node.attributes[ATTR_OTHER_NAMES], json!("Aspirin<br>ASA"));
        assert_eq!(
            node.attributes[ATTR_CODES],
            json!("FDA UNII: R16CO5Y76E<br>CAS: 50-78-2")
        );
    }

    #[test]
    fn approval_id_wins_over_unii_code() {
        let rec = record(json!({
            "uuid": "a",
            "approvalID": "DIRECT",
            "codes": [{"codeSystem": "FDA UNII", "code": "FROMCODE"}]
        }));
        assert_eq!(build_node(&rec).attributes[ATTR_UNII], json!("DIRECT"));

        let rec = record(json!({"uuid": "a", "codes": [{"codeSystem": "CAS", "code": "1"}]}));
        assert!(!build_node(&rec).attributes.contains_key(ATTR_UNII));
    }

    #[test]
    fn link_reads_owner_of_indexed_reference() {
        let rec = record(json!({
            "uuid": "a",
            "relationships": [
                {"uuid": "r0", "type": "SALT->PARENT", "relatedSubstance": {"refuuid": "b", "name": "ignored"}}
            ]
        }));
        let path = JsonPath::parse("relationships[0].relatedSubstance").unwrap();
        let link = build_link(&rec, "b", &path, &LinkClassifier::default());

        assert_eq!(link.source, "a");
        assert_eq!(link.target, "b");
        assert_eq!(link.link_type, "Relationship");
        assert_eq!(link.display_name.as_deref(), Some("SALT->PARENT"));
        assert_eq!(
            serde_json::to_value(&link.attributes).unwrap(),
            json!({"Link Type": "Relationship", "Type": "SALT->PARENT", "UUID": "r0"})
        );
        assert!(link.tags.contains("Relationship"));
    }

    #[test]
    fn singular_reference_is_its_own_owner() {
        let options = RecordOptions {
            reference_sections: vec![],
            ..RecordOptions::default()
        };
        let rec = RawRecord::from_value(
            json!({
                "uuid": "a",
                "mixture": {"parentSubstance": {"refuuid": "m", "name": "Parent Mix"}}
            }),
            &options,
        )
        .unwrap();
        let path = JsonPath::parse("mixture.parentSubstance").unwrap();
        let link = build_link(&rec, "m", &path, &LinkClassifier::default());

        assert_eq!(link.link_type, "Mixture");
        assert_eq!(link.display_name.as_deref(), Some("Parent Mix"));
        assert_eq!(link.attributes.len(), 1);
    }
}
