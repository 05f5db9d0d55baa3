//! Invitation lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Settings governing invitation expiry and the background sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Days until a pending invitation expires (end-of-day aligned).
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
    /// Interval between expired-invitation sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_expiry_days() -> i64 {
    7
}

fn default_sweep_interval() -> u64 {
    3600
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_expiry_days(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}
