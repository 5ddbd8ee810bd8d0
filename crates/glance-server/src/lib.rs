//! # glance-server
//!
//! The collector. Agents prove who they are, report their focused window,
//! and browser observers watch the result live.
//!
//! This crate only wires the HTTP surface to the layers below it:
//!
//! ```text
//! axum router (this crate)
//!   ├─ handshake (legacy JSON + typed RPC) ─→ glance-auth::Authenticator
//!   ├─ ReportWindow / Heartbeat / v0 update ─→ glance-presence::PresenceTracker
//!   └─ /events (SSE)                        ←─ glance-presence::EventBus
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use glance_auth::KeyRegistry;
//! use glance_server::{GlanceServerBuilder, JsonFileSource};
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = KeyRegistry::new(JsonFileSource::new("./data/config.json")).await?;
//! let server = GlanceServerBuilder::new()
//!     .bind("0.0.0.0:9975")
//!     .build(registry)
//!     .await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod handler;
mod registry;
mod server;
mod stream;

pub use config::ServerConfig;
pub use error::ServerError;
pub use registry::{ClientEntry, ConfigFile, JsonFileSource};
pub use server::{GlanceServer, GlanceServerBuilder, ServerState, router};
