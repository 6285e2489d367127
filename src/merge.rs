//! Recursive structural merge over value trees.
//!
//! Sources are applied to the target left to right, in place:
//!
//! - Leaves (including null) overwrite the target slot
//! - Buffers are copied byte for byte, timestamps by value
//! - Mappings merge key by key into a mapping, replacing any other value
//! - Sequences merge index by index into a sequence, replacing any other
//!   value; target elements past the end of the source are kept
//! - A source value identical to the target it would merge into is skipped

use crate::config::{MergeOptions, MergePolicy};
use crate::error::{LayerError, LayerResult};
use crate::path::parse_index;
use crate::value::Value;
use tracing::debug;

/// Signature shared by the merge entry points.
pub type MergeFn = fn(&Value, &[Value]) -> LayerResult<Value>;

/// Merge `sources` into `target` with default options.
///
/// Mutates `target` in place and returns a handle to it.
///
/// # Example
/// ```
/// use layer_tree::{Value, deep_merge};
/// use serde_json::json;
///
/// let target = Value::from(json!({"server": {"port": 8080, "host": "localhost"}}));
/// let overlay = Value::from(json!({"server": {"port": 9000}}));
/// let result = deep_merge(&target, &[overlay]).unwrap();
/// assert!(result.ptr_eq(&target));
/// assert_eq!(result, Value::from(json!({"server": {"port": 9000, "host": "localhost"}})));
/// ```
pub fn deep_merge(target: &Value, sources: &[Value]) -> LayerResult<Value> {
    deep_merge_with(target, sources, &MergeOptions::default())
}

/// Conventional name for [`deep_merge`].
pub fn deep_extend(target: &Value, sources: &[Value]) -> LayerResult<Value> {
    deep_merge(target, sources)
}

/// Merge `sources` into `target` under explicit options.
///
/// Every argument is validated before anything is written, so a failed call
/// leaves `target` untouched.
pub fn deep_merge_with(
    target: &Value,
    sources: &[Value],
    options: &MergeOptions,
) -> LayerResult<Value> {
    match target {
        Value::Null => return Err(LayerError::missing_target()),
        t if !t.is_composite() => return Err(LayerError::invalid_target(t.kind())),
        _ => {}
    }

    let applicable = validate(target, sources, options.policy)?;
    let mut merger = Merger::new(options);
    for source in applicable {
        merger.merge_into(target, source);
    }
    Ok(target.clone())
}

/// Merge `sources` in order into a fresh mapping.
pub fn deep_merge_all(sources: &[Value]) -> LayerResult<Value> {
    deep_merge(&Value::object(), sources)
}

/// Merge `source` into `target` without argument checks.
///
/// Both must be composite; a mapping source must only carry index keys when
/// the target is a sequence.
pub(crate) fn merge_value(target: &Value, source: &Value, options: &MergeOptions) {
    Merger::new(options).merge_into(target, source);
}

fn validate<'a>(
    target: &Value,
    sources: &'a [Value],
    policy: MergePolicy,
) -> LayerResult<Vec<&'a Value>> {
    let mut applicable = Vec::with_capacity(sources.len());
    // Positions count the target as argument 0.
    for (position, source) in sources.iter().enumerate().map(|(i, s)| (i + 1, s)) {
        let problem = if !source.is_composite() {
            Some(LayerError::invalid_argument(position, source.kind()))
        } else {
            non_index_key(target, source).map(|key| LayerError::non_index_key(position, &key))
        };

        match (problem, policy) {
            (None, _) => applicable.push(source),
            (Some(err), MergePolicy::Strict) => return Err(err),
            (Some(err), MergePolicy::Lenient) => debug!(position, "skipping merge source: {}", err),
        }
    }
    Ok(applicable)
}

/// First key of a mapping source that a sequence target cannot hold: a
/// non-index key, or an index too far past the target's current end.
fn non_index_key(target: &Value, source: &Value) -> Option<String> {
    match (target, source) {
        (Value::Array(arr), Value::Object(obj)) => obj
            .keys()
            .into_iter()
            .find(|key| !parse_index(key).is_some_and(|i| arr.can_hold(i))),
        _ => None,
    }
}

/// Slot address within a container.
enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    fn lookup(&self, target: &Value) -> Option<Value> {
        match (target, self) {
            (Value::Object(obj), Key::Name(name)) => obj.get(name),
            (Value::Object(obj), Key::Index(i)) => obj.get(&i.to_string()),
            (Value::Array(arr), Key::Index(i)) => arr.get(*i),
            (Value::Array(arr), Key::Name(name)) => parse_index(name).and_then(|i| arr.get(i)),
            _ => None,
        }
    }

    fn store(&self, target: &Value, value: Value) {
        match (target, self) {
            (Value::Object(obj), Key::Name(name)) => {
                obj.insert(name.clone(), value);
            }
            (Value::Object(obj), Key::Index(i)) => {
                obj.insert(i.to_string(), value);
            }
            (Value::Array(arr), Key::Index(i)) => {
                if !arr.set(*i, value) {
                    debug!(index = *i, "dropping out-of-range index for sequence target");
                }
            }
            (Value::Array(arr), Key::Name(name)) => {
                if !parse_index(name).is_some_and(|i| arr.set(i, value)) {
                    debug!(key = %name, "dropping key the sequence target cannot hold");
                }
            }
            _ => {}
        }
    }
}

/// Entries of a composite source, snapshotted so no borrow is held while the
/// target is written.
fn entries(source: &Value) -> Vec<(Key, Value)> {
    match source {
        Value::Array(arr) => arr
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Key::Index(i), v))
            .collect(),
        Value::Object(obj) => obj
            .entries()
            .into_iter()
            .map(|(k, v)| (Key::Name(k), v))
            .collect(),
        _ => Vec::new(),
    }
}

struct Merger<'a> {
    options: &'a MergeOptions,
    /// Source containers on the current recursion path.
    active: Vec<*const ()>,
}

impl<'a> Merger<'a> {
    fn new(options: &'a MergeOptions) -> Self {
        Self {
            options,
            active: Vec::new(),
        }
    }

    fn is_active(&self, value: &Value) -> bool {
        value.addr().is_some_and(|addr| self.active.contains(&addr))
    }

    fn merge_into(&mut self, target: &Value, source: &Value) {
        let tracked = self.options.detect_cycles.then(|| source.addr()).flatten();
        if let Some(addr) = tracked {
            self.active.push(addr);
        }

        for (key, value) in entries(source) {
            if value.ptr_eq(target) {
                continue;
            }

            let merged = match &value {
                Value::Buffer(buf) => Value::Buffer(buf.deep_copy()),
                Value::Array(_) | Value::Object(_) => {
                    if self.options.detect_cycles && self.is_active(&value) {
                        debug!(kind = value.kind(), "skipping cyclic source branch");
                        continue;
                    }
                    let child = match (&value, key.lookup(target)) {
                        (Value::Array(_), Some(existing @ Value::Array(_))) => existing,
                        (Value::Array(_), _) => Value::array(),
                        (_, Some(existing @ Value::Object(_))) => existing,
                        _ => Value::object(),
                    };
                    self.merge_into(&child, &value);
                    child
                }
                leaf => leaf.clone(),
            };
            key.store(target, merged);
        }

        if tracked.is_some() {
            self.active.pop();
        }
    }
}

/// Adapter exposing the merge under its conventional name, for utility
/// collections that adopt extension functions.
#[derive(Clone, Copy)]
pub struct Mixin {
    pub deep_extend: MergeFn,
}

impl std::fmt::Debug for Mixin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixin").finish_non_exhaustive()
    }
}

pub fn mixin() -> Mixin {
    Mixin { deep_extend }
}
