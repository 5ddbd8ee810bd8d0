//! Error types for the agent.

use glance_auth::AuthError;
use glance_protocol::{ErrorCode, RpcError};

/// Errors that can occur while talking to the collector.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got an answer: connection refused, timeout, or an
    /// unreadable response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with an error.
    #[error("server rejected request: {0}")]
    Rejected(RpcError),

    /// The agent has no usable identity for the v1 handshake.
    #[error("no signing identity configured")]
    NoIdentity,

    /// The configured private key couldn't be used.
    #[error(transparent)]
    Signer(#[from] AuthError),

    /// The focused window couldn't be read.
    #[error("focused window unavailable: {0}")]
    TitleUnavailable(String),
}

impl ClientError {
    /// Returns `true` if the collector refused the credential, which is the
    /// one failure a fresh handshake can fix.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Rejected(err) if err.code == ErrorCode::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth_failure_only_for_unauthenticated() {
        let expired = ClientError::Rejected(RpcError::new(
            ErrorCode::Unauthenticated,
            "invalid or expired token",
        ));
        let down = ClientError::Rejected(RpcError::new(ErrorCode::Internal, "boom"));

        assert!(expired.is_auth_failure());
        assert!(!down.is_auth_failure());
        assert!(!ClientError::NoIdentity.is_auth_failure());
    }
}
