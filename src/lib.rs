//! Layered value trees.
//!
//! - [`Value`]: generic tree of scalars, sequences, mappings, buffers and timestamps
//! - [`deep_merge`]: recursive structural merge with cycle and special-leaf handling
//! - [`Layer`]: a data layer inheriting from an optional parent, with dotted-path
//!   get/set, type-keyed lookup and chain-wide merge

pub mod config;
pub mod error;
pub mod layer;
pub mod logging;
pub mod merge;
pub mod path;
pub mod value;

pub use config::{MergeOptions, MergePolicy};
pub use error::{ErrorCode, LayerError, LayerResult};
pub use layer::Layer;
pub use merge::{Mixin, deep_extend, deep_merge, deep_merge_all, deep_merge_with, mixin};
pub use value::{Array, Buffer, Map, Object, Value};
