//! Wire protocol for glance.
//!
//! This crate defines the "language" that agents, the collector, and
//! browser observers speak:
//!
//! - **Types** ([`PresenceEvent`], the handshake and reporting DTOs) —
//!   the structures that travel on the wire, in both the legacy JSON
//!   encoding and the typed RPC encoding.
//! - **Errors** ([`ErrorCode`], [`RpcError`]) — the shared failure
//!   taxonomy and its on-the-wire envelope.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are turned
//!   into bytes for the push stream.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about keys, sessions, or presence.
//! It only describes what a request or an event looks like.
//!
//! ```text
//! Agent (client) ──DTOs──→ Collector (server) ──PresenceEvent──→ Observers
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
pub mod routes;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::{ErrorCode, ProtocolError, RpcError};
pub use types::{
    ChallengeRequest, ChallengeResponse, ClientId, CreateChallengeRequest,
    CreateChallengeResponse, HeartbeatRequest, HeartbeatResponse,
    PresenceEvent, ReportWindowRequest, ReportWindowResponse, Status,
    UpdatePayload, VerifyChallengeRequest, VerifyChallengeResponse,
    VerifyRequest, VerifyResponse,
};
