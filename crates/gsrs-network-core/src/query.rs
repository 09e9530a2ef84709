//! Path queries over raw JSON records.

use serde_json::Value;

use crate::path::{JsonPath, Segment};

/// Reads the value at `path`, or `None` when any step is missing.
pub fn read<'a>(doc: &'a Value, path: &JsonPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |current, segment| match segment {
            Segment::Key(k) => current.as_object()?.get(k),
            Segment::Index(i) => current.as_array()?.get(*i),
        })
}

/// Reads `<path>.<field>` as a string.
pub fn reference_id<'a>(doc: &'a Value, path: &JsonPath, field: &str) -> Option<&'a str> {
    read(doc, path)?.get(field)?.as_str()
}

/// Every path (document order, pre-order) at which an object directly
/// contains `field`. The document root itself is never reported.
pub fn reference_paths(doc: &Value, field: &str) -> Vec<JsonPath> {
    let mut out = Vec::new();
    scan_children(doc, &JsonPath::root(), field, &mut out);
    out
}

fn scan_children(value: &Value, path: &JsonPath, field: &str, out: &mut Vec<JsonPath>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                visit(child, path.child_key(key.as_str()), field, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                visit(child, path.child_index(index), field, out);
            }
        }
        _ => {}
    }
}

fn visit(value: &Value, path: JsonPath, field: &str, out: &mut Vec<JsonPath>) {
    if value.as_object().is_some_and(|m| m.contains_key(field)) {
        out.push(path.clone());
    }
    scan_children(value, &path, field, out);
}
