//! Path-addressed access into a nested JSON document.

use crate::StorePath;
use serde_json::{Map, Value};

/// An empty store document.
pub fn empty() -> Value {
    Value::Object(Map::new())
}

/// Look up the value at `path`.
pub fn get_at<'a>(doc: &'a Value, path: &StorePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |node, segment| node.as_object()?.get(segment))
}

/// Write `value` at `path`.
///
/// Missing intermediate mappings are created; an intermediate that is not a
/// mapping is replaced by one.
pub fn set_at(doc: &mut Value, path: &StorePath, value: Value) {
    let (parents, last) = path.split_last();
    let mut node = doc;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.clone())
            .or_insert_with(empty);
    }
    ensure_object(node).insert(last.to_string(), value);
}

/// Remove the value at `path`. Returns whether anything was removed.
pub fn remove_at(doc: &mut Value, path: &StorePath) -> bool {
    let (parents, last) = path.split_last();
    let mut node = doc;
    for segment in parents {
        match node.as_object_mut().and_then(|m| m.get_mut(segment)) {
            Some(next) => node = next,
            None => return false,
        }
    }
    node.as_object_mut()
        .is_some_and(|m| m.remove(last).is_some())
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = empty();
    }
    match node {
        Value::Object(map) => map,
        // Just replaced above.
        _ => unreachable!("node was normalised to an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    #[test]
    fn test_set_creates_intermediate_maps() {
        let mut doc = empty();
        set_at(&mut doc, &p("a.b.c"), json!(1));
        assert_eq!(doc, json!({"a": {"b": {"c": 1}}}));
        assert_eq!(get_at(&doc, &p("a.b")), Some(&json!({"c": 1})));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut doc = json!({"a": 5});
        set_at(&mut doc, &p("a.b"), json!("x"));
        assert_eq!(doc, json!({"a": {"b": "x"}}));
    }

    #[test]
    fn test_get_through_scalar_is_none() {
        let doc = json!({"a": 5});
        assert_eq!(get_at(&doc, &p("a.b")), None);
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut doc = json!({"a": {"b": 1}});
        assert!(remove_at(&mut doc, &p("a.b")));
        assert!(!remove_at(&mut doc, &p("a.b")));
        assert!(!remove_at(&mut doc, &p("x.y")));
        assert_eq!(doc, json!({"a": {}}));
    }

    #[test]
    fn test_explicit_null_is_present() {
        let mut doc = empty();
        set_at(&mut doc, &p("k"), Value::Null);
        assert_eq!(get_at(&doc, &p("k")), Some(&Value::Null));
    }
}
