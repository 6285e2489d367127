//! Configuration types for structural merge.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a merge treats sources that are not mappings or sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Reject non-composite sources with `InvalidArgument` (default)
    #[default]
    Strict,
    /// Skip non-composite sources silently
    Lenient,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(MergePolicy::Strict),
            "lenient" => Ok(MergePolicy::Lenient),
            other => Err(format!("unknown merge policy '{}'", other)),
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergePolicy::Strict => write!(f, "strict"),
            MergePolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Options for structural merge and layer composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Argument strictness (default: strict).
    #[serde(default)]
    pub policy: MergePolicy,

    /// Skip source containers already being merged higher up the recursion,
    /// so cyclic sources terminate (default: true). When disabled only a
    /// source value identical to the current target is skipped.
    #[serde(default = "default_detect_cycles")]
    pub detect_cycles: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            policy: MergePolicy::default(),
            detect_cycles: default_detect_cycles(),
        }
    }
}

fn default_detect_cycles() -> bool {
    true
}

impl MergeOptions {
    pub fn lenient() -> Self {
        Self {
            policy: MergePolicy::Lenient,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }
}
