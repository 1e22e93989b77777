//! Account configuration.

use serde::{Deserialize, Serialize};

use keyward_perms::SessionLimits;

/// Configuration for a [`KeyAccount`](crate::KeyAccount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Whether to snapshot tracked assets around session-gated calls and
    /// charge their outflow.
    pub asset_accounting: bool,
    /// Maximum distinct destinations per session.
    pub max_destinations: usize,
    /// Maximum tracked assets per session.
    pub max_tracked_assets: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            asset_accounting: true,
            max_destinations: limits.max_destinations,
            max_tracked_assets: limits.max_tracked_assets,
        }
    }
}

impl AccountConfig {
    /// The structural limits sessions are validated against.
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_destinations: self.max_destinations,
            max_tracked_assets: self.max_tracked_assets,
        }
    }
}
