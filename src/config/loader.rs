//! Environment overrides for merge options.

use super::types::{MergeOptions, MergePolicy};
use tracing::warn;

/// Environment variable selecting the merge policy (`strict` | `lenient`).
pub const ENV_MERGE_POLICY: &str = "LAYER_TREE_MERGE_POLICY";

/// Environment variable toggling cycle detection (`true`/`false`/`1`/`0`).
pub const ENV_DETECT_CYCLES: &str = "LAYER_TREE_DETECT_CYCLES";

impl MergeOptions {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        Self::apply_overrides(&mut options, lookup);
        options
    }

    fn apply_overrides(options: &mut MergeOptions, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_MERGE_POLICY) {
            match raw.parse::<MergePolicy>() {
                Ok(policy) => options.policy = policy,
                Err(err) => warn!("Ignoring {}: {}", ENV_MERGE_POLICY, err),
            }
        }

        if let Some(raw) = lookup(ENV_DETECT_CYCLES) {
            match parse_flag(&raw) {
                Some(enabled) => options.detect_cycles = enabled,
                None => warn!("Ignoring {}: expected a boolean, got '{}'", ENV_DETECT_CYCLES, raw),
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
