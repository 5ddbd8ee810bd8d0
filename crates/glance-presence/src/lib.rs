//! Presence tracking for glance.
//!
//! Turns the stream of authenticated reports coming into the collector
//! into a per-client online/offline picture, and fans every change out to
//! observers.
//!
//! - [`PresenceTracker`] — owns the presence map, applies window reports
//!   and heartbeats, and flips silent clients to offline.
//! - [`EventBus`] — a bounded broadcast channel. Publishing never blocks;
//!   a full buffer drops the oldest event instead.
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP surface (glance-server)  ← report_window / heartbeat per request
//!     ↕
//! Presence layer (this crate)   ← ClientPresence map + timeout loop
//!     ↓ PresenceEvent
//! EventBus ──→ /events subscribers
//! ```

mod bus;
mod config;
mod tracker;

pub use bus::{DEFAULT_CAPACITY, DEFAULT_CHANNEL, EventBus, MAX_CAPACITY, Subscription};
pub use config::PresenceConfig;
pub use tracker::{ClientPresence, PresenceTracker};
