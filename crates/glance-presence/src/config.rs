//! Presence timing configuration.

use std::time::Duration;

/// Timing knobs for the [`PresenceTracker`](crate::PresenceTracker).
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// How long a client may stay silent before it is reported offline.
    ///
    /// Must be well above the agent's own report/heartbeat interval so
    /// jitter and a dropped request or two don't cause flapping.
    pub offline_after: Duration,

    /// How often the timeout loop scans the presence map.
    pub check_interval: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            offline_after: Duration::from_secs(360),
            check_interval: Duration::from_secs(30),
        }
    }
}
