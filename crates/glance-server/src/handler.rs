//! Request handlers: handshake, reporting, and the static-token update.
//!
//! Each handshake operation is served twice, once per encoding. Both
//! variants call the same [`Authenticator`](glance_auth::Authenticator)
//! method and differ only in field casing. Reporting comes in two
//! generations that both funnel into the same
//! [`PresenceTracker`](glance_presence::PresenceTracker) call:
//!
//! | generation | credential                         | identity            |
//! |------------|------------------------------------|---------------------|
//! | v1 (RPC)   | `Authorization: Bearer <session>`  | from the session    |
//! | v0         | `?token=` or `token` cookie        | fixed legacy client |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use glance_auth::{KeyProvider, SessionIdentity};
use glance_protocol::{
    ChallengeRequest, ChallengeResponse, ClientId, Codec, CreateChallengeRequest,
    CreateChallengeResponse, HeartbeatRequest, HeartbeatResponse,
    ReportWindowRequest, ReportWindowResponse, UpdatePayload,
    VerifyChallengeRequest, VerifyChallengeResponse, VerifyRequest,
    VerifyResponse,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::server::ServerState;

/// Identity every static-token update is attributed to.
pub(crate) const LEGACY_CLIENT_ID: &str = "legacy";
pub(crate) const LEGACY_CLIENT_NAME: &str = "Legacy Client";

type AppState<K> = State<Arc<ServerState<K>>>;

/// Unwraps a JSON body, turning a missing or malformed body into an
/// `invalid_argument` error instead of axum's plain-text rejection.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_argument(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Handshake — legacy JSON
// ---------------------------------------------------------------------------

pub(crate) async fn legacy_challenge<K: KeyProvider>(
    State(state): AppState<K>,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let req = body(payload)?;
    let challenge = state
        .auth
        .create_challenge(&ClientId::new(req.client_id))
        .await?;
    Ok(Json(ChallengeResponse { challenge }))
}

pub(crate) async fn legacy_verify<K: KeyProvider>(
    State(state): AppState<K>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let req = body(payload)?;
    let issued = state
        .auth
        .validate_challenge_and_issue_token(
            &ClientId::new(req.client_id),
            &req.signature,
        )
        .await?;
    Ok(Json(VerifyResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

// ---------------------------------------------------------------------------
// Handshake — typed RPC
// ---------------------------------------------------------------------------

pub(crate) async fn create_challenge<K: KeyProvider>(
    State(state): AppState<K>,
    payload: Result<Json<CreateChallengeRequest>, JsonRejection>,
) -> Result<Json<CreateChallengeResponse>, ApiError> {
    let req = body(payload)?;
    let challenge = state
        .auth
        .create_challenge(&ClientId::new(req.client_id))
        .await?;
    Ok(Json(CreateChallengeResponse { challenge }))
}

pub(crate) async fn verify_challenge<K: KeyProvider>(
    State(state): AppState<K>,
    payload: Result<Json<VerifyChallengeRequest>, JsonRejection>,
) -> Result<Json<VerifyChallengeResponse>, ApiError> {
    let req = body(payload)?;
    let issued = state
        .auth
        .validate_challenge_and_issue_token(
            &ClientId::new(req.client_id),
            &req.signature,
        )
        .await?;
    Ok(Json(VerifyChallengeResponse {
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

// ---------------------------------------------------------------------------
// Reporting — v1
// ---------------------------------------------------------------------------

pub(crate) async fn report_window<K: KeyProvider>(
    State(state): AppState<K>,
    headers: HeaderMap,
    payload: Result<Json<ReportWindowRequest>, JsonRejection>,
) -> Result<Json<ReportWindowResponse>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let req = body(payload)?;
    state
        .presence
        .report_window(
            &identity.client_id,
            &identity.display_name,
            &req.title,
            &req.os,
        )
        .await;
    Ok(Json(ReportWindowResponse::default()))
}

pub(crate) async fn heartbeat<K: KeyProvider>(
    State(state): AppState<K>,
    headers: HeaderMap,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let req = body(payload)?;
    let count = state
        .presence
        .heartbeat(&identity.client_id, &identity.display_name, req.count)
        .await;
    Ok(Json(HeartbeatResponse { count }))
}

/// Resolves the session behind the request's bearer credential.
async fn authenticate<K: KeyProvider>(
    state: &ServerState<K>,
    headers: &HeaderMap,
) -> Result<SessionIdentity, ApiError> {
    let token = bearer_token(headers).unwrap_or_default();
    state
        .auth
        .validate_session(&token)
        .await
        .ok_or_else(|| ApiError::unauthenticated("invalid or expired token"))
}

/// Reads the session token: `Authorization` (with or without the
/// `Bearer ` prefix), falling back to a `token` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|token| !token.is_empty());

    from_authorization
        .or_else(|| {
            headers
                .get("token")
                .and_then(|value| value.to_str().ok())
                .filter(|token| !token.is_empty())
        })
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Reporting — v0 static token
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenQuery {
    token: Option<String>,
}

/// `POST /api/v0/update`. The body is parsed leniently: anything that
/// isn't a valid payload is treated as an empty report.
pub(crate) async fn legacy_update<K: KeyProvider>(
    State(state): AppState<K>,
    query: Result<Query<TokenQuery>, QueryRejection>,
    headers: HeaderMap,
    raw: Bytes,
) -> Result<String, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable v0 query");
        ApiError::unauthenticated("Unauthorized")
    })?;
    let presented = query
        .token
        .filter(|token| !token.is_empty())
        .or_else(|| cookie_token(&headers));

    let authorized = match (&state.legacy_token, presented) {
        (Some(expected), Some(presented)) => tokens_match(expected, &presented),
        _ => false,
    };
    if !authorized {
        return Err(ApiError::unauthenticated("Unauthorized"));
    }

    let payload: UpdatePayload = state.codec.decode(&raw).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "unreadable v0 payload, treating as empty");
        UpdatePayload::default()
    });

    state
        .presence
        .report_window(
            &ClientId::new(LEGACY_CLIENT_ID),
            LEGACY_CLIENT_NAME,
            &payload.title,
            &payload.os,
        )
        .await;
    Ok(format!("Update received from {LEGACY_CLIENT_NAME}"))
}

/// Compares a presented static token against the configured one without
/// leaking where they differ through timing.
fn tokens_match(expected: &str, presented: &str) -> bool {
    let (expected, presented) = (expected.as_bytes(), presented.as_bytes());
    expected.len() == presented.len() && bool::from(expected.ct_eq(presented))
}

/// Finds `token=<value>` among the request's cookies.
pub(crate) fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == "token" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

// ---------------------------------------------------------------------------
// CORS preflight
// ---------------------------------------------------------------------------

/// Answers a bare `OPTIONS` with 200. Proper CORS preflights are handled
/// by the CORS layer before they get here.
pub(crate) async fn preflight() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_strips_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_token_accepts_bare_authorization_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_token_falls_back_to_token_header() {
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("xyz"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("xyz"));
        assert!(bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_cookie_token_finds_token_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=s3cret; lang=en"),
        );
        assert_eq!(cookie_token(&headers).as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_tokens_match_requires_exact_value() {
        assert!(tokens_match("secret-token", "secret-token"));
        assert!(!tokens_match("secret-token", "secret-tokeN"));
        assert!(!tokens_match("secret-token", "secret"));
        assert!(!tokens_match("secret-token", ""));
    }

    #[test]
    fn test_cookie_token_missing_returns_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(cookie_token(&headers).is_none());
    }
}
