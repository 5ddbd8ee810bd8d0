//! Collector configuration.

use std::time::Duration;

use glance_auth::AuthConfig;
use glance_presence::{DEFAULT_CAPACITY, PresenceConfig};

/// Everything the collector needs besides its key registry.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// Shared secret accepted by the static-token (v0) update endpoint.
    /// `None` disables that endpoint: every v0 request is rejected.
    pub legacy_token: Option<String>,
    /// Challenge and session lifetimes.
    pub auth: AuthConfig,
    /// Liveness window and check period.
    pub presence: PresenceConfig,
    /// Presence event buffer size.
    pub bus_capacity: usize,
    /// Upper bound on handling a single request (the event stream is
    /// exempt once its headers are sent).
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9975".to_string(),
            legacy_token: None,
            auth: AuthConfig::default(),
            presence: PresenceConfig::default(),
            bus_capacity: DEFAULT_CAPACITY,
            request_timeout: Duration::from_secs(10),
        }
    }
}
