//! Workspace membership configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to bulk membership operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Maximum number of candidates accepted by a single bulk-add call.
    #[serde(default = "default_max_bulk_members")]
    pub max_bulk_members: usize,
    /// Maximum accepted roster upload size in bytes.
    #[serde(default = "default_max_roster_bytes")]
    pub max_roster_bytes: usize,
}

fn default_max_bulk_members() -> usize {
    600
}

fn default_max_roster_bytes() -> usize {
    1024 * 1024
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_bulk_members: default_max_bulk_members(),
            max_roster_bytes: default_max_roster_bytes(),
        }
    }
}
