//! # glance-client
//!
//! The agent side of glance: proves its identity to the collector, then
//! reports every change of the focused window.
//!
//! - [`ServerApi`] — the calls the agent makes, with [`HttpApi`] as the
//!   real HTTP implementation.
//! - [`ConnectionManager`] — picks the protocol generation once per run
//!   (challenge-response v1, or the static-token v0 fallback) and
//!   re-authenticates at most once per failed call.
//! - [`Agent`] — the poll loop: read the title from a [`TitleSource`],
//!   report it when it changed, heartbeat in between.
//!
//! ```text
//! TitleSource ──title──→ Agent ──→ ConnectionManager ──→ ServerApi ──HTTP──→ collector
//! ```

#![allow(async_fn_in_trait)]

mod agent;
mod api;
mod config;
mod connection;
mod error;

pub use agent::{Agent, TickOutcome, TitleSource};
pub use api::{HttpApi, ServerApi};
pub use config::ClientConfig;
pub use connection::{ConnectionManager, Mode};
pub use error::ClientError;
