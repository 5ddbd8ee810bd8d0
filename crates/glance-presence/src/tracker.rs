//! Per-client presence state and its transitions.
//!
//! ```text
//!   (unknown) ──report / heartbeat──→ online ──report──→ online ("update")
//!                                      │  ↑
//!          silent for > offline_after  │  │  report / fresh heartbeat
//!                                      ↓  │
//!                                     offline
//! ```
//!
//! Every transition into `online` or `offline` publishes one event. A
//! window report from a client that is already online publishes its new
//! title as `update`. Heartbeats from an online client publish nothing.
//!
//! # Locking
//!
//! The whole map sits behind one mutex, and every operation holds it from
//! the read of a client's state through the write and the publish. The
//! timeout loop can therefore never flip a client offline based on a
//! `last_seen_at` that a concurrent report has already bumped.

use std::collections::HashMap;
use std::sync::Arc;

use glance_protocol::{ClientId, PresenceEvent, Status};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EventBus, PresenceConfig};

// ---------------------------------------------------------------------------
// ClientPresence
// ---------------------------------------------------------------------------

/// What the collector currently believes about one client.
///
/// Created on the client's first report or heartbeat and never removed;
/// a client that goes quiet stays in the map as offline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPresence {
    pub client_id: ClientId,
    pub display_name: String,
    /// Empty until the client sends a window report.
    pub os: String,
    /// Empty until the client sends a window report.
    pub last_title: String,
    /// `None` until the first heartbeat is accepted.
    pub last_heartbeat_seq: Option<u64>,
    pub last_seen_at: Instant,
    pub is_online: bool,
}

impl ClientPresence {
    fn new(client_id: &ClientId, display_name: &str, now: Instant) -> Self {
        Self {
            client_id: client_id.clone(),
            display_name: display_name.to_string(),
            os: String::new(),
            last_title: String::new(),
            last_heartbeat_seq: None,
            last_seen_at: now,
            is_online: false,
        }
    }

    fn event(&self, status: Status) -> PresenceEvent {
        PresenceEvent {
            title: self.last_title.clone(),
            os: self.os.clone(),
            client: self.display_name.clone(),
            status,
        }
    }
}

// ---------------------------------------------------------------------------
// PresenceTracker
// ---------------------------------------------------------------------------

/// Tracks which clients are online and publishes every change.
pub struct PresenceTracker {
    config: PresenceConfig,
    bus: EventBus,
    clients: Mutex<HashMap<ClientId, ClientPresence>>,
}

impl PresenceTracker {
    /// Creates a tracker that publishes to `bus`.
    pub fn new(config: PresenceConfig, bus: EventBus) -> Self {
        Self {
            config,
            bus,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// The bus this tracker publishes to.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Records a focused-window report and returns the status it published:
    /// [`Status::Online`] if the client was unknown or offline,
    /// [`Status::Update`] if it was already online.
    pub async fn report_window(
        &self,
        client_id: &ClientId,
        display_name: &str,
        title: &str,
        os: &str,
    ) -> Status {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let state = clients
            .entry(client_id.clone())
            .or_insert_with(|| ClientPresence::new(client_id, display_name, now));

        state.display_name = display_name.to_string();
        state.os = os.to_string();
        state.last_title = title.to_string();
        state.last_seen_at = now;

        let status = if state.is_online {
            Status::Update
        } else {
            state.is_online = true;
            tracing::info!(%client_id, client = %display_name, "client online");
            Status::Online
        };
        tracing::debug!(%client_id, %title, %os, "window reported");

        self.bus.publish(state.event(status));
        status
    }

    /// Records a heartbeat and returns the last accepted sequence number.
    ///
    /// A `seq` not greater than the last accepted one is a replay: nothing
    /// changes (not even `last_seen_at`) and the previous value is echoed.
    /// An accepted heartbeat from an offline or unknown client brings it
    /// online.
    pub async fn heartbeat(
        &self,
        client_id: &ClientId,
        display_name: &str,
        seq: u64,
    ) -> u64 {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let state = clients
            .entry(client_id.clone())
            .or_insert_with(|| ClientPresence::new(client_id, display_name, now));

        match state.last_heartbeat_seq {
            Some(last) if seq <= last => {
                tracing::debug!(%client_id, seq, last, "stale heartbeat ignored");
                return last;
            }
            _ => {}
        }

        state.last_heartbeat_seq = Some(seq);
        state.last_seen_at = now;

        if !state.is_online {
            state.is_online = true;
            tracing::info!(%client_id, client = %state.display_name, "client online via heartbeat");
            self.bus.publish(state.event(Status::Online));
        }
        seq
    }

    /// Flips every online client that has been silent for longer than
    /// `offline_after` to offline, publishing one event each. Returns how
    /// many clients went offline.
    ///
    /// An already-offline client is never republished.
    pub async fn sweep_timeouts(&self) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let mut flipped = 0;

        for state in clients.values_mut() {
            if state.is_online
                && now.duration_since(state.last_seen_at) > self.config.offline_after
            {
                state.is_online = false;
                flipped += 1;
                tracing::info!(
                    client_id = %state.client_id,
                    client = %state.display_name,
                    "client offline (timeout)"
                );
                self.bus.publish(state.event(Status::Offline));
            }
        }
        flipped
    }

    /// A snapshot of one client's state.
    pub async fn get(&self, client_id: &ClientId) -> Option<ClientPresence> {
        self.clients.lock().await.get(client_id).cloned()
    }

    /// Number of clients ever seen.
    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Returns `true` if no client has reported yet.
    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }

    /// Spawns the timeout loop. Sweeps every `config.check_interval` until
    /// `cancel` fires.
    pub fn spawn_timeout_loop(
        self: Arc<Self>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let period = self.config.check_interval;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep_timeouts().await;
                    }
                }
            }
            tracing::debug!("presence timeout loop stopped");
        })
    }
}
