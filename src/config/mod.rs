//! Merge configuration.
//!
//! Options are plain serde types so they can be embedded in a host
//! application's own configuration file. Two tiers apply:
//! 1. **Defaults** - strict argument checking, cycle detection on
//! 2. **Environment** - overrides read by [`MergeOptions::from_env`]
//!
//! ## Environment Variables
//! - `LAYER_TREE_MERGE_POLICY` - `strict` or `lenient`
//! - `LAYER_TREE_DETECT_CYCLES` - `true`/`false` (also `1`/`0`, `yes`/`no`, `on`/`off`)

mod loader;
mod types;

pub use loader::{ENV_DETECT_CYCLES, ENV_MERGE_POLICY};
pub use types::{MergeOptions, MergePolicy};
