//! Agent configuration.

use std::time::Duration;

/// Everything the agent needs to reach and authenticate with a collector.
///
/// Leaving `client_id` or `private_key` empty makes the agent skip the
/// handshake and use `legacy_token` from the start.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Collector base URL, without a trailing path.
    pub base_url: String,
    /// The identifier this agent is registered under.
    pub client_id: String,
    /// Base64 Ed25519 private key (32-byte seed or 64-byte keypair).
    pub private_key: String,
    /// Shared secret for the static-token (v0) fallback.
    pub legacy_token: String,
    /// Operating system tag sent with every report.
    pub os: String,
    /// How often the focused window is checked.
    pub poll_interval: Duration,
    /// How often a v1 agent sends a heartbeat.
    pub heartbeat_interval: Duration,
    /// Upper bound on any single request to the collector.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9975".to_string(),
            client_id: String::new(),
            private_key: String::new(),
            legacy_token: String::new(),
            os: std::env::consts::OS.to_string(),
            poll_interval: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
        }
    }
}
