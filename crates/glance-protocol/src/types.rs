//! Core protocol types for glance's wire format.
//!
//! Every type here is serialized to JSON and sent over HTTP. There are two
//! families of request/response types for the handshake:
//!
//! - the **legacy JSON** form (`snake_case` fields, e.g. `client_id`), and
//! - the **typed RPC** form (`camelCase` fields, e.g. `clientId`).
//!
//! Both carry the same information and are handled by the same
//! authenticator on the server; only the encoding differs.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identifier a client agent is registered under.
///
/// A newtype over `String` so a client id can't be confused with a token,
/// a nonce, or a display name — all of which are also strings.
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Creates a client id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is empty (never a valid registration).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Presence events — what observers see on the push stream
// ---------------------------------------------------------------------------

/// The status tag carried by a [`PresenceEvent`].
///
/// ```text
///   offline ──(update/heartbeat)──→ online ──(new title)──→ update
///      ↑                              │                        │
///      └────────────(timeout)─────────┴────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The client just came (back) online.
    Online,
    /// An already-online client reported a new title.
    Update,
    /// The client went silent for longer than the liveness window.
    Offline,
}

/// One record on the `/events` stream.
///
/// All four fields are always present — browser front-ends call string
/// methods on `title` without checking for `undefined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// The last reported window title, or empty if none was reported yet.
    pub title: String,
    /// The operating system the client reported.
    pub os: String,
    /// The client's display name.
    pub client: String,
    /// What happened.
    pub status: Status,
}

// ---------------------------------------------------------------------------
// Legacy JSON handshake
// ---------------------------------------------------------------------------

/// `POST /api/v1/auth/challenge` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    #[serde(default)]
    pub client_id: String,
}

/// `POST /api/v1/auth/challenge` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// `POST /api/v1/auth/verify` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub client_id: String,
    /// Base64 (standard alphabet) Ed25519 signature over the challenge.
    #[serde(default)]
    pub signature: String,
}

/// `POST /api/v1/auth/verify` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub token: String,
    /// Session lifetime in seconds.
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// Typed RPC messages
// ---------------------------------------------------------------------------

/// `AuthService/CreateChallenge` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    #[serde(default)]
    pub client_id: String,
}

/// `AuthService/CreateChallenge` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeResponse {
    pub challenge: String,
}

/// `AuthService/VerifyChallenge` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyChallengeRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub signature: String,
}

/// `AuthService/VerifyChallenge` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyChallengeResponse {
    pub token: String,
    pub expires_in: u64,
}

/// `WindowService/ReportWindow` request. Requires a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWindowRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub os: String,
}

/// `WindowService/ReportWindow` response. Carries no payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindowResponse {}

/// `WindowService/Heartbeat` request. Requires a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    /// Monotonic counter chosen by the client.
    pub count: u64,
}

/// `WindowService/Heartbeat` response: the last counter the server accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Static-token (v0) update
// ---------------------------------------------------------------------------

/// `POST /api/v0/update` body. The credential travels separately, as a
/// `token` cookie or `?token=` query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub os: String,
}
