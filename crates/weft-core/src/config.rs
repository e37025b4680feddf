//! Configuration for the multiverse layer.

use serde::{Deserialize, Serialize};

/// Configuration for the orchestration service and store setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiverseConfig {
    /// Name of the reserved root branch that hosts the Prime timeline.
    pub root_branch: String,
    /// Display name used when initializing Prime without an explicit name.
    pub prime_name: String,
    /// Travel method recorded when callers do not specify one.
    pub default_travel_method: String,
}

impl Default for MultiverseConfig {
    fn default() -> Self {
        Self {
            root_branch: "main".to_string(),
            prime_name: "Prime Material".to_string(),
            default_travel_method: "portal".to_string(),
        }
    }
}
