//! Error types for the protocol layer.
//!
//! Two kinds of "error" live here. [`ProtocolError`] is a local failure
//! to encode or decode bytes. [`ErrorCode`] and [`RpcError`] describe a
//! failure that one side reports to the other over the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur while encoding or decoding wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The encoded bytes are not valid UTF-8 and can't be sent as text.
    #[error("encoded data is not utf-8")]
    NotUtf8,
}

// ---------------------------------------------------------------------------
// ErrorCode — the failure taxonomy shared by every surface
// ---------------------------------------------------------------------------

/// The category of a failed request.
///
/// Every error the collector returns falls into exactly one of these
/// buckets, whichever encoding (legacy JSON or typed RPC) carried the
/// request. The agent relies on [`ErrorCode::Unauthenticated`] to decide
/// when to re-run the handshake.
///
/// Serialized in `snake_case`: `"invalid_argument"`, `"unauthenticated"`, …
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A required field (client id, signature) was missing or empty.
    InvalidArgument,
    /// The caller could not prove who it is: challenge missing, expired or
    /// already used, bad signature, unknown session, wrong legacy token.
    Unauthenticated,
    /// The client identifier is not in the key registry, even after reload.
    NotFound,
    /// Something broke on the server (randomness, serialization).
    Internal,
}

impl ErrorCode {
    /// The HTTP status code this error is reported with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::Unauthenticated => 401,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// Maps an HTTP status back onto the taxonomy.
    ///
    /// Used by the agent when a response carries no parseable error body
    /// (e.g. the legacy endpoint, or a proxy in front of the collector).
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidArgument,
            401 | 403 => Self::Unauthenticated,
            404 => Self::NotFound,
            _ => Self::Internal,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The JSON body of a failed request: `{"code": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Machine-readable category.
    pub code: ErrorCode,
    /// Human-readable detail. Never contains secrets.
    pub message: String,
}

impl RpcError {
    /// Creates an error envelope.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::InvalidArgument).unwrap();
        assert_eq!(json, r#""invalid_argument""#);
    }

    #[test]
    fn test_error_code_http_status_mapping() {
        assert_eq!(ErrorCode::InvalidArgument.http_status(), 400);
        assert_eq!(ErrorCode::Unauthenticated.http_status(), 401);
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn test_from_http_status_unknown_is_internal() {
        assert_eq!(ErrorCode::from_http_status(401), ErrorCode::Unauthenticated);
        assert_eq!(ErrorCode::from_http_status(502), ErrorCode::Internal);
    }

    #[test]
    fn test_rpc_error_parses_wire_body() {
        let body = r#"{"code":"unauthenticated","message":"invalid or expired token"}"#;
        let err: RpcError = serde_json::from_str(body).unwrap();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(err.to_string(), "unauthenticated: invalid or expired token");
    }
}
