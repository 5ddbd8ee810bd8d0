//! `GlanceServer` builder, router, and run loop.
//!
//! This is the entry point for running a collector. It ties together the
//! layers: HTTP → auth → presence → event bus.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use glance_auth::{AuthConfig, Authenticator, KeyProvider};
use glance_presence::{EventBus, PresenceConfig, PresenceTracker};
use glance_protocol::{JsonCodec, routes};
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{
    create_challenge, heartbeat, legacy_challenge, legacy_update,
    legacy_verify, preflight, report_window, verify_challenge,
};
use crate::stream::events;
use crate::{ServerConfig, ServerError};

/// Shared state passed to every request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned into each request. The
/// authenticator and tracker each guard their own maps; nothing here
/// needs an outer lock.
pub struct ServerState<K: KeyProvider> {
    pub auth: Arc<Authenticator<K>>,
    pub presence: Arc<PresenceTracker>,
    pub legacy_token: Option<String>,
    pub request_timeout: Duration,
    pub(crate) codec: JsonCodec,
}

impl<K: KeyProvider> ServerState<K> {
    pub fn new(
        auth: Arc<Authenticator<K>>,
        presence: Arc<PresenceTracker>,
        legacy_token: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            auth,
            presence,
            legacy_token,
            request_timeout,
            codec: JsonCodec,
        }
    }
}

/// Builds the full HTTP surface over `state`, CORS and tracing included.
pub fn router<K: KeyProvider>(state: Arc<ServerState<K>>) -> Router {
    let timeout = state.request_timeout;
    Router::new()
        // Handshake, both encodings.
        .route(routes::LEGACY_CHALLENGE, post(legacy_challenge::<K>))
        .route(routes::LEGACY_VERIFY, post(legacy_verify::<K>))
        .route(routes::RPC_CREATE_CHALLENGE, post(create_challenge::<K>))
        .route(routes::RPC_VERIFY_CHALLENGE, post(verify_challenge::<K>))
        // Reporting.
        .route(
            routes::RPC_REPORT_WINDOW,
            post(report_window::<K>).options(preflight),
        )
        .route(routes::RPC_HEARTBEAT, post(heartbeat::<K>).options(preflight))
        .route(routes::LEGACY_UPDATE, post(legacy_update::<K>).options(preflight))
        // Observation.
        .route(routes::EVENTS, get(events::<K>).options(preflight))
        .route(routes::EVENTS_V1, get(events::<K>).options(preflight))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a collector.
///
/// # Example
///
/// ```rust,ignore
/// let server = GlanceServerBuilder::new()
///     .bind("0.0.0.0:9975")
///     .legacy_token("0123456789abcdef0123456789abcdef")
///     .build(registry)
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct GlanceServerBuilder {
    config: ServerConfig,
}

impl GlanceServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to listen on. `127.0.0.1:0` picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Enables the static-token update endpoint with this secret.
    pub fn legacy_token(mut self, token: impl Into<String>) -> Self {
        self.config.legacy_token = Some(token.into());
        self
    }

    pub fn auth_config(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    pub fn presence_config(mut self, presence: PresenceConfig) -> Self {
        self.config.presence = presence;
        self
    }

    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.config.bus_capacity = capacity;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Binds the listener and assembles the server around `keys`.
    ///
    /// Background tasks don't start until [`GlanceServer::run`].
    pub async fn build<K: KeyProvider>(
        self,
        keys: K,
    ) -> Result<GlanceServer<K>, ServerError> {
        let config = self.config;
        let listener = TcpListener::bind(&config.bind_addr).await.map_err(
            |source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            },
        )?;

        let bus = EventBus::new(glance_presence::DEFAULT_CHANNEL, config.bus_capacity);
        let presence = Arc::new(PresenceTracker::new(config.presence, bus));
        let auth = Arc::new(Authenticator::new(keys, config.auth));
        if config.legacy_token.is_none() {
            tracing::info!("no static token configured, v0 updates disabled");
        }
        let state = Arc::new(ServerState::new(
            auth,
            presence,
            config.legacy_token,
            config.request_timeout,
        ));

        Ok(GlanceServer {
            listener,
            state,
            shutdown: CancellationToken::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound collector, created by [`GlanceServerBuilder::build`]. Call
/// [`run()`](Self::run) to start serving.
pub struct GlanceServer<K: KeyProvider> {
    listener: TcpListener,
    state: Arc<ServerState<K>>,
    shutdown: CancellationToken,
}

impl<K: KeyProvider> GlanceServer<K> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The shared state, for inspecting presence or sessions in-process.
    pub fn state(&self) -> Arc<ServerState<K>> {
        Arc::clone(&self.state)
    }

    /// A token that stops the server (and its background tasks) when
    /// cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Starts the auth sweeper and presence timeout loop, then serves
    /// requests until the shutdown token fires.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            listener,
            state,
            shutdown,
        } = self;

        let sweeper = Arc::clone(&state.auth).spawn_sweeper(shutdown.child_token());
        let timeouts =
            Arc::clone(&state.presence).spawn_timeout_loop(shutdown.child_token());

        tracing::info!(addr = ?listener.local_addr().ok(), "glance server running");

        let signal = shutdown.clone();
        let served = axum::serve(listener, router(state))
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await;

        shutdown.cancel();
        let (sweeper, timeouts) = tokio::join!(sweeper, timeouts);
        report_task_exit("auth sweeper", sweeper);
        report_task_exit("presence timeout loop", timeouts);
        tracing::info!("glance server stopped");
        served.map_err(ServerError::from)
    }
}

/// Logs a background task that panicked or was aborted. Returns `false` in
/// that case.
fn report_task_exit(task: &str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(task, error = %e, "background task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_task_exit_panicked_task_is_failure() {
        let panicked: Result<(), JoinError> =
            tokio::spawn(async { panic!("sweeper blew up") }).await;
        let finished = tokio::spawn(async {}).await;

        assert!(!report_task_exit("auth sweeper", panicked));
        assert!(report_task_exit("presence timeout loop", finished));
    }
}
