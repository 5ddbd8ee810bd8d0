//! Timeouts and sizes for the authentication layer.

use std::time::Duration;

/// Configuration for challenge and session lifetimes.
///
/// Sensible defaults are provided; override only the fields you care
/// about with struct update syntax:
///
/// ```rust
/// use std::time::Duration;
/// use glance_auth::AuthConfig;
///
/// let config = AuthConfig {
///     session_ttl: Duration::from_secs(3600),
///     ..AuthConfig::default()
/// };
/// assert_eq!(config.challenge_ttl, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long a client has to answer a challenge.
    ///
    /// Default: 30 seconds.
    pub challenge_ttl: Duration,

    /// How long an issued session token stays valid. Validating a session
    /// never extends it.
    ///
    /// Default: 1 day.
    pub session_ttl: Duration,

    /// How often expired challenges and sessions are evicted from memory.
    ///
    /// Default: 60 seconds.
    pub sweep_interval: Duration,

    /// Number of random bytes in a nonce (before base64 encoding).
    ///
    /// Default: 32.
    pub nonce_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::from_secs(30),
            session_ttl: Duration::from_secs(60 * 60 * 24),
            sweep_interval: Duration::from_secs(60),
            nonce_len: 32,
        }
    }
}
