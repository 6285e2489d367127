//! Dotted-path navigation over value trees.
//!
//! A path is a string of segments separated by `.`; the empty path denotes the
//! root. Mapping segments are keys, sequence segments are indices.

use crate::error::{LayerError, LayerResult};
use crate::value::{MAX_INDEX_GAP, Value};
use tracing::debug;

/// Split a dotted path into its segments.
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Parse a canonical sequence index (`0`, `1`, ... without leading zeros).
pub fn parse_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical { segment.parse().ok() } else { None }
}

/// Look up `path` under `root`.
///
/// Returns `None` at the first missing link, including when an intermediate
/// value is not a container.
pub fn get(root: &Value, path: &str) -> Option<Value> {
    let mut current = root.clone();
    for segment in segments(path) {
        current = child(&current, segment)?;
    }
    Some(current)
}

fn child(container: &Value, segment: &str) -> Option<Value> {
    match container {
        Value::Object(obj) => obj.get(segment),
        Value::Array(arr) => parse_index(segment).and_then(|i| arr.get(i)),
        _ => None,
    }
}

/// Write `value` at `path` under `root`, creating missing structure.
///
/// Intermediate values that are not containers are replaced by a fresh
/// sequence when the following segment is an index, by a fresh mapping
/// otherwise. A sequence addressed with a non-index segment, or with an index
/// more than [`MAX_INDEX_GAP`] past its end, is promoted to a mapping keyed by
/// its stringified indices. Returns the value written.
///
/// The empty path replaces `root` itself, which must then be composite. A
/// non-composite `root`, or a sequence `root` promoted by the first segment,
/// is also replaced, so handles to the previous root no longer see writes.
pub fn set(root: &mut Value, path: &str, value: Value) -> LayerResult<Value> {
    let parts = segments(path);
    let Some(first) = parts.first() else {
        if !value.is_composite() {
            return Err(LayerError::invalid_target(value.kind()).with_field("(root)"));
        }
        *root = value.clone();
        return Ok(value);
    };

    if !root.is_composite() {
        *root = fresh_container(first);
    }
    if let Some(promoted) = promote_for(root, first) {
        *root = promoted;
    }

    let mut container = root.clone();
    for (i, segment) in parts.iter().enumerate() {
        let Some(next) = parts.get(i + 1) else {
            assign(&container, segment, value.clone());
            break;
        };

        let existing = child(&container, segment).filter(Value::is_composite);
        let descend = match existing {
            Some(existing) => match promote_for(&existing, next) {
                Some(promoted) => {
                    assign(&container, segment, promoted.clone());
                    promoted
                }
                None => existing,
            },
            None => {
                let fresh = fresh_container(next);
                assign(&container, segment, fresh.clone());
                fresh
            }
        };
        container = descend;
    }

    Ok(value)
}

/// Container created for missing structure: a sequence when the following
/// segment is an index an empty sequence can hold.
fn fresh_container(next_segment: &str) -> Value {
    if parse_index(next_segment).is_some_and(|i| i <= MAX_INDEX_GAP) {
        Value::array()
    } else {
        Value::object()
    }
}

/// A mapping replacing `container` when it is a sequence that cannot hold
/// `segment`.
fn promote_for(container: &Value, segment: &str) -> Option<Value> {
    match container {
        Value::Array(arr) if !parse_index(segment).is_some_and(|i| arr.can_hold(i)) => {
            debug!(segment, len = arr.len(), "promoting sequence to mapping");
            Some(Value::Object(arr.to_object()))
        }
        _ => None,
    }
}

/// Store `value` under `segment` in a container already able to hold it.
fn assign(container: &Value, segment: &str, value: Value) {
    match container {
        Value::Object(obj) => {
            obj.insert(segment, value);
        }
        Value::Array(arr) => {
            let stored = parse_index(segment).is_some_and(|index| arr.set(index, value));
            if !stored {
                debug!(segment, "dropping write the sequence cannot hold");
            }
        }
        _ => debug!(segment, kind = container.kind(), "dropping write into scalar"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Value {
        Value::from(json!({
            "a": {
                "b": {
                    "c": true,
                    "d": 5,
                    "e": "pippo",
                    "f": [{"g": true}]
                }
            }
        }))
    }

    #[test]
    fn test_segments() {
        assert!(segments("").is_empty());
        assert_eq!(segments("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(segments("a..b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("01"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1a"), None);
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn test_get_nested() {
        let data = tree();
        assert_eq!(get(&data, "a.b.c"), Some(Value::Bool(true)));
        assert_eq!(get(&data, "a.b.e"), Some(Value::from("pippo")));
        assert_eq!(get(&data, "a.b.f.0.g"), Some(Value::Bool(true)));
        assert_eq!(get(&data, "a.b.z"), None);
    }

    #[test]
    fn test_get_empty_path_returns_root_handle() {
        let data = tree();
        assert!(get(&data, "").unwrap().ptr_eq(&data));
    }

    #[test]
    fn test_get_through_scalar_is_absent() {
        let data = tree();
        assert_eq!(get(&data, "a.b.c.z"), None);
        assert_eq!(get(&data, "a.b.f.x"), None);
        assert_eq!(get(&data, "a.b.f.5"), None);
    }

    #[test]
    fn test_set_creates_mappings() {
        let mut data = Value::object();
        let written = set(&mut data, "a.b.h", Value::from(10)).unwrap();
        assert_eq!(written, Value::from(10));
        assert_eq!(data, Value::from(json!({"a": {"b": {"h": 10}}})));
    }

    #[test]
    fn test_set_creates_sequence_for_numeric_segment() {
        let mut data = Value::object();
        set(&mut data, "a.0.j", Value::from("x")).unwrap();
        assert_eq!(data, Value::from(json!({"a": [{"j": "x"}]})));
        assert!(get(&data, "a").unwrap().is_array());
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut data = tree();
        set(&mut data, "a.b.c.z", Value::from(100)).unwrap();
        assert_eq!(get(&data, "a.b.c"), Some(Value::from(json!({"z": 100}))));
    }

    #[test]
    fn test_set_mutates_in_place() {
        let mut data = tree();
        let alias = data.clone();
        set(&mut data, "a.b.h", Value::from(11)).unwrap();
        assert!(data.ptr_eq(&alias));
        assert_eq!(get(&alias, "a.b.h"), Some(Value::from(11)));
    }

    #[test]
    fn test_set_promotes_sequence_for_named_segment() {
        let mut data = Value::from(json!({"a": ["x", "y"]}));
        set(&mut data, "a.name", Value::from("z")).unwrap();
        assert_eq!(
            data,
            Value::from(json!({"a": {"0": "x", "1": "y", "name": "z"}}))
        );
    }

    #[test]
    fn test_set_pads_sequence() {
        let mut data = Value::from(json!({"a": []}));
        set(&mut data, "a.2", Value::from(true)).unwrap();
        assert_eq!(data, Value::from(json!({"a": [null, null, true]})));
    }

    #[test]
    fn test_set_far_index_uses_mapping() {
        let mut data = Value::object();
        set(&mut data, "a.18446744073709551615", Value::from(1)).unwrap();
        assert_eq!(
            data,
            Value::from(json!({"a": {"18446744073709551615": 1}}))
        );

        set(&mut data, "b.100000000000.c", Value::from(2)).unwrap();
        assert_eq!(get(&data, "b.100000000000.c"), Some(Value::from(2)));
        assert!(get(&data, "b").unwrap().is_object());
    }

    #[test]
    fn test_set_far_index_promotes_existing_sequence() {
        let mut data = Value::from(json!({"a": ["x"]}));
        set(&mut data, "a.100000000000", Value::from(true)).unwrap();
        assert_eq!(
            data,
            Value::from(json!({"a": {"0": "x", "100000000000": true}}))
        );

        let mut root = Value::from(json!(["x"]));
        set(&mut root, "18446744073709551615", Value::from(1)).unwrap();
        assert_eq!(
            root,
            Value::from(json!({"0": "x", "18446744073709551615": 1}))
        );
    }

    #[test]
    fn test_set_index_within_gap_pads() {
        let mut data = Value::object();
        set(&mut data, &format!("a.{MAX_INDEX_GAP}"), Value::from(1)).unwrap();
        let arr = get(&data, "a").unwrap();
        assert_eq!(arr.as_array().unwrap().len(), MAX_INDEX_GAP + 1);
    }

    #[test]
    fn test_set_empty_path_replaces_root() {
        let mut data = tree();
        let replacement = Value::from(json!({"x": 1}));
        set(&mut data, "", replacement.clone()).unwrap();
        assert!(data.ptr_eq(&replacement));

        let err = set(&mut data, "", Value::from(1)).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidTarget);
    }
}
