//! Error types for the authentication layer.

use glance_protocol::{ClientId, ErrorCode};

/// Errors that can occur during the handshake or session validation.
///
/// Every variant maps onto one [`ErrorCode`] through [`AuthError::code`],
/// which is what the HTTP layer reports to the caller. The finer-grained
/// variants exist for logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required request field was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// No challenge is outstanding for this client. Either none was
    /// requested, or it was already consumed by an earlier attempt.
    #[error("challenge not found or already used for client {0}")]
    ChallengeNotFound(ClientId),

    /// The challenge existed but its answer arrived too late.
    #[error("challenge expired for client {0}")]
    ChallengeExpired(ClientId),

    /// The signature wasn't valid base64 or had the wrong length.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The signature is well-formed but doesn't verify against the
    /// client's registered public key.
    #[error("invalid signature for client {0}")]
    InvalidSignature(ClientId),

    /// The registry holds a public key for this client that isn't a valid
    /// Ed25519 key.
    #[error("invalid public key registered for client {0}")]
    InvalidPublicKey(ClientId),

    /// The bearer token is unknown or expired.
    #[error("invalid or expired session token")]
    InvalidSession,

    /// The client identifier isn't in the registry, even after a reload.
    #[error("client {0} not found")]
    UnknownClient(ClientId),

    /// A private key couldn't be parsed into a signer.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The operating system's random source failed.
    #[error("failed to generate challenge: {0}")]
    Randomness(String),

    /// The key registry's backing source couldn't be read.
    #[error("key registry unavailable: {0}")]
    Registry(String),
}

impl AuthError {
    /// The wire-level category of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingField(_) | Self::InvalidPrivateKey(_) => {
                ErrorCode::InvalidArgument
            }
            Self::ChallengeNotFound(_)
            | Self::ChallengeExpired(_)
            | Self::MalformedSignature(_)
            | Self::InvalidSignature(_)
            | Self::InvalidPublicKey(_)
            | Self::InvalidSession => ErrorCode::Unauthenticated,
            Self::UnknownClient(_) => ErrorCode::NotFound,
            Self::Randomness(_) | Self::Registry(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_replay_is_unauthenticated() {
        let err = AuthError::ChallengeNotFound(ClientId::new("C1"));
        assert_eq!(err.code(), ErrorCode::Unauthenticated);
        assert!(err.to_string().contains("already used"));
    }

    #[test]
    fn test_code_unknown_client_is_not_found() {
        let err = AuthError::UnknownClient(ClientId::new("ghost"));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_code_missing_field_is_invalid_argument() {
        assert_eq!(
            AuthError::MissingField("client_id").code(),
            ErrorCode::InvalidArgument
        );
    }

    #[test]
    fn test_code_randomness_is_internal() {
        assert_eq!(
            AuthError::Randomness("entropy".into()).code(),
            ErrorCode::Internal
        );
    }
}
