//! Generic value model.
//!
//! A [`Value`] is a tagged tree of scalars and containers. Containers
//! ([`Array`], [`Object`]) and binary payloads ([`Buffer`]) are shared handles:
//! cloning a `Value` clones the handle, not the contents. Use
//! [`Value::deep_clone`] for an independent copy and [`Value::ptr_eq`] to test
//! identity. `==` compares structure.
//!
//! Handles make cyclic trees possible. Structural equality, `Debug` and
//! [`Value::to_json`] recurse without a bound and do not terminate on them;
//! only the merge (with cycle detection on) walks cycles safely.

mod convert;

use chrono::{DateTime, Utc};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Largest number of `Null` slots a write past the end of a sequence pads.
pub const MAX_INDEX_GAP: usize = 1024;

/// Key-value storage behind an [`Object`].
pub type Map = BTreeMap<String, Value>;

/// A node of a value tree.
#[derive(Clone, Default)]
pub enum Value {
    /// Present null. Absence is modelled as `Option::None` by lookups.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Ordered sequence.
    Array(Array),
    /// String-keyed mapping.
    Object(Object),
    /// Opaque binary payload.
    Buffer(Buffer),
    /// A point in time.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Create an empty mapping.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// Create an empty sequence.
    pub fn array() -> Self {
        Value::Array(Array::new())
    }

    /// True for mappings and sequences.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Value::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "sequence",
            Value::Object(_) => "mapping",
            Value::Buffer(_) => "buffer",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Identity comparison.
    ///
    /// Handles compare by address. Scalars have no identity of their own and
    /// never compare identical.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Buffer(a), Value::Buffer(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Address of the shared allocation behind a handle, if any.
    pub(crate) fn addr(&self) -> Option<*const ()> {
        match self {
            Value::Array(a) => Some(Rc::as_ptr(&a.0) as *const ()),
            Value::Object(o) => Some(Rc::as_ptr(&o.0) as *const ()),
            Value::Buffer(b) => Some(Rc::as_ptr(&b.0) as *const ()),
            _ => None,
        }
    }

    /// Copy the whole tree into freshly allocated containers.
    ///
    /// Does not terminate on cyclic input.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(a) => {
                Value::Array(Array::from(a.borrow().iter().map(Value::deep_clone).collect::<Vec<_>>()))
            }
            Value::Object(o) => {
                let map = o
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect::<Map>();
                Value::Object(Object::from(map))
            }
            Value::Buffer(b) => Value::Buffer(b.deep_copy()),
            other => other.clone(),
        }
    }
}

/// Structural equality. Does not terminate on cyclic trees unless both sides
/// are the same handle.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

/// Does not terminate on cyclic trees.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(a) => fmt::Debug::fmt(a, f),
            Value::Object(o) => fmt::Debug::fmt(o, f),
            Value::Buffer(b) => fmt::Debug::fmt(b, f),
            Value::Timestamp(t) => write!(f, "Timestamp({})", t.to_rfc3339()),
        }
    }
}

/// Shared handle to an ordered sequence of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Element at `index` (a handle clone for containers).
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Whether [`Array::set`] accepts `index`: an existing slot, or one at
    /// most [`MAX_INDEX_GAP`] places past the end.
    pub fn can_hold(&self, index: usize) -> bool {
        index <= self.len().saturating_add(MAX_INDEX_GAP)
    }

    /// Store `value` at `index`, padding any gap with `Null`.
    ///
    /// Returns `false` and writes nothing when `index` is beyond
    /// [`Array::can_hold`].
    pub fn set(&self, index: usize, value: Value) -> bool {
        if !self.can_hold(index) {
            return false;
        }
        let mut items = self.0.borrow_mut();
        match items.get_mut(index) {
            Some(slot) => *slot = value,
            None => {
                items.resize(index, Value::Null);
                items.push(value);
            }
        }
        true
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    /// Snapshot of the elements (handle clones).
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A new mapping holding the elements under their stringified indices.
    pub fn to_object(&self) -> Object {
        let map = self
            .0
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect::<Map>();
        Object::from(map)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

/// Shared handle to a string-keyed mapping.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Map>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Insert `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries (handle clones).
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn borrow(&self) -> Ref<'_, Map> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Map> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Map> for Object {
    fn from(map: Map) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

/// Shared handle to a mutable byte buffer.
#[derive(Clone, Default)]
pub struct Buffer(Rc<RefCell<Vec<u8>>>);

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<u8>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<u8>> {
        self.0.borrow_mut()
    }

    /// Byte-for-byte copy into a new allocation.
    pub fn deep_copy(&self) -> Buffer {
        Buffer::from(self.to_vec())
    }

    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Rc::new(RefCell::new(bytes)))
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({:?})", self.0.borrow())
    }
}
