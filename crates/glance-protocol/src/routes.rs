//! HTTP paths shared by the collector and the agent.
//!
//! The typed RPC paths follow the `/<package>.<Service>/<Method>` shape
//! so generated RPC clients can call them directly.

/// Typed RPC: request a challenge for a client identifier.
pub const RPC_CREATE_CHALLENGE: &str = "/glance.v1.AuthService/CreateChallenge";
/// Typed RPC: submit a signed challenge and receive a session token.
pub const RPC_VERIFY_CHALLENGE: &str = "/glance.v1.AuthService/VerifyChallenge";
/// Typed RPC: report the focused window title.
pub const RPC_REPORT_WINDOW: &str = "/glance.v1.WindowService/ReportWindow";
/// Typed RPC: liveness heartbeat with a monotonic counter.
pub const RPC_HEARTBEAT: &str = "/glance.v1.WindowService/Heartbeat";

/// Legacy JSON handshake: request a challenge.
pub const LEGACY_CHALLENGE: &str = "/api/v1/auth/challenge";
/// Legacy JSON handshake: verify a signed challenge.
pub const LEGACY_VERIFY: &str = "/api/v1/auth/verify";
/// Static-token (v0) window update.
pub const LEGACY_UPDATE: &str = "/api/v0/update";

/// Push stream of presence events.
pub const EVENTS: &str = "/events";
/// Alias of [`EVENTS`] kept for existing browser front-ends.
pub const EVENTS_V1: &str = "/api/v1/events";
