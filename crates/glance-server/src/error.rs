//! Error types for the collector.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use glance_auth::AuthError;
use glance_protocol::{ErrorCode, RpcError};

/// Errors that stop the collector from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address couldn't be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server failed while running.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The key registry couldn't be initialised.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

// ---------------------------------------------------------------------------
// ApiError — per-request failures, rendered for the caller
// ---------------------------------------------------------------------------

/// A failed request. Rendered as an [`RpcError`] JSON body with the HTTP
/// status of its [`ErrorCode`].
#[derive(Debug)]
pub(crate) struct ApiError(pub(crate) RpcError);

impl ApiError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self(RpcError::new(ErrorCode::InvalidArgument, message))
    }

    pub(crate) fn unauthenticated(message: impl Into<String>) -> Self {
        Self(RpcError::new(ErrorCode::Unauthenticated, message))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(RpcError::new(err.code(), err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        (status, Json(self.0)).into_response()
    }
}
