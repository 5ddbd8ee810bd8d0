//! Trust and session management for glance.
//!
//! This crate answers one question for the collector: "is this request
//! really from the client it claims to be?" It does so in three steps:
//!
//! 1. **Challenge** — the server hands the client a single-use random
//!    nonce ([`ChallengeStore`]).
//! 2. **Proof** — the client signs the nonce with its Ed25519 private key
//!    ([`ClientSigner`]); the server checks the signature against the
//!    public key the [`KeyProvider`] has registered for that client.
//! 3. **Session** — on success the server issues an opaque bearer token
//!    ([`SessionStore`]) that later requests present instead of repeating
//!    the handshake.
//!
//! [`Authenticator`] orchestrates all three and runs a periodic sweep that
//! evicts expired challenges and sessions.
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP surface (glance-server)  ← calls the Authenticator per request
//!     ↕
//! Auth layer (this crate)       ← challenges, signatures, sessions
//!     ↕
//! Protocol layer                ← ClientId, ErrorCode
//! ```

#![allow(async_fn_in_trait)]

mod authenticator;
mod challenge;
mod config;
mod error;
mod key;
mod session;
mod signer;

pub use authenticator::{Authenticator, IssuedToken, SweepReport};
pub use challenge::{Challenge, ChallengeStore};
pub use config::AuthConfig;
pub use error::AuthError;
pub use key::{KeyProvider, KeyRecord, KeyRegistry, RegistrySource, StaticSource};
pub use session::{Session, SessionIdentity, SessionStore};
pub use signer::ClientSigner;
