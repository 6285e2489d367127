//! Layered data nodes.
//!
//! A [`Layer`] owns one data tree and optionally borrows a parent layer.
//! Reads fall through to the parent chain when a path is absent locally;
//! writes only ever touch the layer they are called on. [`Layer::merge_path`]
//! composes the effective value of a path across the whole chain.
//!
//! ```
//! use layer_tree::{Layer, Value};
//! use serde_json::json;
//!
//! let defaults = Layer::new(Value::from(json!({"theme": "light", "font": {"size": 12}}))).unwrap();
//! let user = Layer::with_parent(Value::from(json!({"font": {"size": 14}})), &defaults).unwrap();
//!
//! assert_eq!(user.get_path("theme"), Some(Value::from("light")));
//! assert_eq!(
//!     user.merge_path("").unwrap(),
//!     Value::from(json!({"theme": "light", "font": {"size": 14}}))
//! );
//! ```

use crate::config::MergeOptions;
use crate::error::{LayerError, LayerResult};
use crate::merge::merge_value;
use crate::path;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use tracing::trace;

/// One layer of data in a parent chain.
#[derive(Debug)]
pub struct Layer<'p> {
    /// This layer's own values; always a mapping or sequence.
    data: RefCell<Value>,
    parent: Option<&'p Layer<'p>>,
    dirty: Cell<bool>,
    options: MergeOptions,
}

impl<'p> Layer<'p> {
    /// Create a root layer.
    pub fn new(data: impl Into<Value>) -> LayerResult<Self> {
        Self::build(data.into(), None)
    }

    /// Create a layer overriding `parent`.
    pub fn with_parent(data: impl Into<Value>, parent: &'p Layer<'p>) -> LayerResult<Self> {
        Self::build(data.into(), Some(parent))
    }

    fn build(data: Value, parent: Option<&'p Layer<'p>>) -> LayerResult<Self> {
        match &data {
            Value::Null => return Err(LayerError::missing_data()),
            d if !d.is_composite() => return Err(LayerError::data_not_composite(d.kind())),
            _ => {}
        }
        Ok(Self {
            data: RefCell::new(data),
            parent,
            dirty: Cell::new(false),
            options: MergeOptions::default(),
        })
    }

    /// Replace the merge options used by [`Layer::merge_path`].
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    /// Handle to this layer's own data tree.
    ///
    /// Writes normally land in this tree, so the handle keeps seeing them. The
    /// exceptions replace the root: an empty-path write, and a write to a
    /// sequence root whose first segment is not an index it can hold (the
    /// root becomes a mapping). Take a fresh handle after those.
    pub fn data(&self) -> Value {
        self.data.borrow().clone()
    }

    pub fn parent(&self) -> Option<&'p Layer<'p>> {
        self.parent
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Local lookup; never consults the parent.
    pub fn path_get(&self, path: &str) -> Option<Value> {
        path::get(&self.data.borrow(), path)
    }

    /// Write `value` at `path` in this layer, creating missing structure, and
    /// mark the layer dirty. Returns the value written.
    pub fn path_set(&self, path: &str, value: impl Into<Value>) -> LayerResult<Value> {
        let written = path::set(&mut self.data.borrow_mut(), path, value.into())?;
        self.dirty.set(true);
        Ok(written)
    }

    /// Same as [`Layer::path_set`].
    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> LayerResult<Value> {
        self.path_set(path, value)
    }

    /// Shadow `path` with null.
    ///
    /// The key is kept: a removed key would fall through to the parent again,
    /// a null one hides the inherited value.
    pub fn path_unset(&self, path: &str) -> LayerResult<Value> {
        self.path_set(path, Value::Null)
    }

    /// Same as [`Layer::path_unset`].
    pub fn unset_path(&self, path: &str) -> LayerResult<Value> {
        self.path_unset(path)
    }

    /// Lookup falling through the parent chain; the nearest layer holding a
    /// value at `path` wins.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        match self.path_get(path) {
            Some(value) => Some(value),
            None => {
                let parent = self.parent?;
                trace!(path, "falling through to parent layer");
                parent.get_path(path)
            }
        }
    }

    /// Lookup of a value that may be a table of variants keyed by type.
    ///
    /// When the value at `path` is a mapping, returns its entry for `kind`
    /// (lowercased), else its entry for `default`. Any other value is returned
    /// as is.
    pub fn get_typed_path(&self, path: &str, kind: &str, default: Option<&str>) -> Option<Value> {
        match self.get_path(path)? {
            Value::Object(variants) => variants
                .get(&kind.to_lowercase())
                .or_else(|| default.and_then(|key| variants.get(key))),
            other => Some(other),
        }
    }

    /// Effective value of `path`: the ancestors' composed value with this
    /// layer's local value merged over it.
    ///
    /// The result is always a fresh tree that shares no container or buffer
    /// with any layer's data. `None` when no layer in the chain has a value
    /// at `path`.
    pub fn merge_path(&self, path: &str) -> Option<Value> {
        let inherited = self.parent.and_then(|parent| parent.merge_path(path));
        let local = self.path_get(path);

        match (inherited, local) {
            (inherited, None) => inherited,
            (None, Some(local)) => Some(self.detach(&local)),
            (Some(base), Some(local)) => Some(self.overlay(base, &local)),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Independent copy of `value`, made through the merge so cyclic data
    /// follows the configured cycle handling.
    fn detach(&self, value: &Value) -> Value {
        match value {
            Value::Array(_) | Value::Object(_) => {
                let fresh = if value.is_array() {
                    Value::array()
                } else {
                    Value::object()
                };
                merge_value(&fresh, value, &self.options);
                fresh
            }
            Value::Buffer(buf) => Value::Buffer(buf.deep_copy()),
            leaf => leaf.clone(),
        }
    }

    /// Merge `local` over a freshly composed `base`. A kind mismatch
    /// replaces the base, as in nested merges.
    fn overlay(&self, base: Value, local: &Value) -> Value {
        match (&base, local) {
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
                merge_value(&base, local, &self.options);
                base
            }
            _ => self.detach(local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::value::Buffer;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_new_records_data_handle() {
        let data = Value::object();
        let layer = Layer::new(data.clone()).unwrap();
        assert!(layer.data().ptr_eq(&data));
        assert!(layer.parent().is_none());
    }

    #[test]
    fn test_null_data_rejected() {
        let err = Layer::new(Value::Null).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingData);
        assert_eq!(err.message, "missing data");
    }

    #[test]
    fn test_scalar_data_rejected() {
        let err = Layer::new(true).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingData);
    }

    #[test]
    fn test_sequence_data_accepted() {
        let layer = Layer::new(v(json!(["a", "b"]))).unwrap();
        assert_eq!(layer.path_get("1"), Some(Value::from("b")));
    }

    #[test]
    fn test_failed_write_keeps_layer_clean() {
        let layer = Layer::new(Value::object()).unwrap();
        assert!(layer.path_set("", 1).is_err());
        assert!(!layer.is_dirty());
    }

    #[test]
    fn test_unset_shadows_inherited_value() {
        let root = Layer::new(v(json!({"a": {"b": 1}}))).unwrap();
        let child = Layer::with_parent(Value::object(), &root).unwrap();

        child.unset_path("a.b").unwrap();
        assert_eq!(child.get_path("a.b"), Some(Value::Null));
        assert_eq!(child.path_get("a"), Some(v(json!({"b": null}))));
        assert_eq!(root.get_path("a.b"), Some(Value::from(1)));
        assert_eq!(child.merge_path("a"), Some(v(json!({"b": null}))));
    }

    #[test]
    fn test_typed_path_null_variant_is_present() {
        let layer = Layer::new(v(json!({"greet": {"it": null, "en": "hi"}}))).unwrap();
        assert_eq!(
            layer.get_typed_path("greet", "it", Some("en")),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_typed_path_lowercases_type() {
        let layer = Layer::new(v(json!({"greet": {"it": "ciao"}}))).unwrap();
        assert_eq!(
            layer.get_typed_path("greet", "IT", None),
            Some(Value::from("ciao"))
        );
    }

    #[test]
    fn test_typed_path_sequence_returned_unchanged() {
        let layer = Layer::new(v(json!({"list": ["it", "en"]}))).unwrap();
        assert_eq!(
            layer.get_typed_path("list", "it", Some("en")),
            Some(v(json!(["it", "en"])))
        );
        assert_eq!(layer.get_typed_path("missing", "it", Some("en")), None);
    }

    #[test]
    fn test_merge_path_without_parent_is_a_copy() {
        let data = v(json!({"c": {"f": {"g": true}}}));
        let layer = Layer::new(data.clone()).unwrap();

        let merged = layer.merge_path("").unwrap();
        assert_eq!(merged, data);
        assert!(!merged.ptr_eq(&data));

        let branch = layer.merge_path("c.f").unwrap();
        assert_eq!(branch, v(json!({"g": true})));
        assert!(!branch.ptr_eq(&layer.path_get("c.f").unwrap()));
    }

    #[test]
    fn test_merge_path_scalar_and_absent() {
        let root = Layer::new(v(json!({"a": 1}))).unwrap();
        let child = Layer::with_parent(v(json!({"b": "x"})), &root).unwrap();
        assert_eq!(child.merge_path("a"), Some(Value::from(1)));
        assert_eq!(child.merge_path("b"), Some(Value::from("x")));
        assert_eq!(child.merge_path("z"), None);
    }

    #[test]
    fn test_merge_path_kind_mismatch_local_wins() {
        let root = Layer::new(v(json!({"a": {"x": 1}}))).unwrap();
        let child = Layer::with_parent(v(json!({"a": ["y"]})), &root).unwrap();
        assert_eq!(child.merge_path("a"), Some(v(json!(["y"]))));
    }

    #[test]
    fn test_merge_path_copies_buffers() {
        let buf = Buffer::from(vec![7u8, 8]);
        let data = Value::object();
        data.as_object().unwrap().insert("bin", Value::Buffer(buf.clone()));
        let layer = Layer::new(data).unwrap();

        let merged = layer.merge_path("bin").unwrap();
        assert_eq!(merged, Value::Buffer(buf.clone()));
        assert!(!merged.as_buffer().unwrap().ptr_eq(&buf));
    }

    #[test]
    fn test_merge_path_does_not_mutate_parent() {
        let root = Layer::new(v(json!({"a": {"b": 1}}))).unwrap();
        let child = Layer::with_parent(v(json!({"a": {"c": 2}})), &root).unwrap();

        assert_eq!(child.merge_path(""), Some(v(json!({"a": {"b": 1, "c": 2}}))));
        assert_eq!(root.data(), v(json!({"a": {"b": 1}})));
        assert_eq!(child.data(), v(json!({"a": {"c": 2}})));
    }

    #[test]
    fn test_sequence_root_promotion_replaces_data_handle() {
        let layer = Layer::new(v(json!(["x"]))).unwrap();
        let before = layer.data();

        layer.path_set("0", "y").unwrap();
        assert!(layer.data().ptr_eq(&before));

        layer.path_set("name", "z").unwrap();
        assert!(!layer.data().ptr_eq(&before));
        assert_eq!(layer.data(), v(json!({"0": "y", "name": "z"})));
        assert_eq!(before, v(json!(["y"])));
    }

    #[test]
    fn test_merge_path_with_cyclic_data_terminates() {
        let data = Value::object();
        let inner = Value::object();
        inner.as_object().unwrap().insert("up", data.clone());
        data.as_object().unwrap().insert("inner", inner);
        data.as_object().unwrap().insert("n", Value::from(1));

        let layer = Layer::new(data).unwrap();
        assert_eq!(layer.merge_path(""), Some(v(json!({"inner": {}, "n": 1}))));
    }
}
