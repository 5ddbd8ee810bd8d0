//! Protocol negotiation, handshake, and the bounded re-authentication rule.
//!
//! ```text
//! connect()
//!   ├─ no client id / key ──────────────────────────→ Legacy
//!   ├─ challenge → sign → verify succeeds ───────────→ V1 { token }
//!   └─ handshake fails (network, rejection) ─────────→ Legacy (for this run)
//!
//! send_update() in V1
//!   report ─ok──→ done
//!     └─ unauthenticated → handshake → report once more ─ok/err──→ done
//! ```
//!
//! The mode is decided once per run. A failed handshake is not retried in
//! the background, and an update is never attempted more than twice.

use glance_auth::ClientSigner;

use crate::{ClientConfig, ClientError, ServerApi};

/// The protocol generation in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Challenge-response session; reports carry the bearer token.
    V1 { token: String },
    /// Static shared token.
    Legacy,
}

/// The agent's connection to the collector.
///
/// Not re-entrant: every method takes `&mut self`, so at most one call is
/// in flight at a time.
pub struct ConnectionManager<A: ServerApi> {
    api: A,
    client_id: String,
    signer: Option<ClientSigner>,
    legacy_token: String,
    mode: Mode,
    heartbeat_count: u64,
}

impl<A: ServerApi> ConnectionManager<A> {
    /// Creates a manager in [`Mode::Legacy`]. Call
    /// [`connect`](Self::connect) to attempt the v1 handshake.
    ///
    /// An unusable private key is logged and treated as absent.
    pub fn new(api: A, config: &ClientConfig) -> Self {
        let signer = if config.private_key.is_empty() {
            None
        } else {
            match ClientSigner::from_base64(&config.private_key) {
                Ok(signer) => Some(signer),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unusable private key");
                    None
                }
            }
        };

        Self {
            api,
            client_id: config.client_id.clone(),
            signer,
            legacy_token: config.legacy_token.clone(),
            mode: Mode::Legacy,
            heartbeat_count: 0,
        }
    }

    /// The protocol generation currently in use.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// The underlying API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Decides the protocol generation for this run.
    ///
    /// Without a client id and a usable key the handshake is skipped. A
    /// failed handshake is logged and falls back to [`Mode::Legacy`]; it
    /// never fails the caller.
    pub async fn connect(&mut self) -> &Mode {
        if self.signer.is_none() || self.client_id.is_empty() {
            tracing::info!("no signing identity configured, using static token (v0)");
            self.mode = Mode::Legacy;
            return &self.mode;
        }

        self.mode = match self.handshake().await {
            Ok(token) => {
                tracing::info!(client_id = %self.client_id, "authenticated, using v1");
                Mode::V1 { token }
            }
            Err(e) => {
                tracing::warn!(error = %e, "handshake failed, falling back to static token (v0)");
                Mode::Legacy
            }
        };
        &self.mode
    }

    /// Reports a focused-window title.
    ///
    /// In v1, an authentication failure triggers one fresh handshake and
    /// one retry of the same report. Whatever the retry returns is final.
    pub async fn send_update(
        &mut self,
        title: &str,
        os: &str,
    ) -> Result<(), ClientError> {
        let token = match &self.mode {
            Mode::Legacy => {
                return self.api.legacy_update(&self.legacy_token, title, os).await;
            }
            Mode::V1 { token } => token.clone(),
        };

        match self.api.report_window(&token, title, os).await {
            Err(e) if e.is_auth_failure() => {
                let token = self.reauthenticate(&e).await?;
                tracing::debug!("re-authenticated, retrying report once");
                self.api.report_window(&token, title, os).await
            }
            other => other,
        }
    }

    /// Sends the next heartbeat. Returns the counter the collector
    /// accepted, or `None` in [`Mode::Legacy`], which has no heartbeat.
    ///
    /// The counter increases on every call, retries included, so the
    /// collector never mistakes a retry for a replay.
    pub async fn send_heartbeat(&mut self) -> Result<Option<u64>, ClientError> {
        let token = match &self.mode {
            Mode::Legacy => return Ok(None),
            Mode::V1 { token } => token.clone(),
        };

        self.heartbeat_count += 1;
        match self.api.heartbeat(&token, self.heartbeat_count).await {
            Ok(count) => Ok(Some(count)),
            Err(e) if e.is_auth_failure() => {
                let token = self.reauthenticate(&e).await?;
                self.heartbeat_count += 1;
                self.api
                    .heartbeat(&token, self.heartbeat_count)
                    .await
                    .map(Some)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the handshake again after `cause` and stores the new token.
    /// On failure the old token is kept.
    async fn reauthenticate(
        &mut self,
        cause: &ClientError,
    ) -> Result<String, ClientError> {
        tracing::warn!(error = %cause, "session rejected, re-authenticating");
        let token = self.handshake().await.inspect_err(|e| {
            tracing::warn!(error = %e, "re-authentication failed");
        })?;
        self.mode = Mode::V1 {
            token: token.clone(),
        };
        Ok(token)
    }

    /// challenge → sign → verify. Returns the session token.
    async fn handshake(&self) -> Result<String, ClientError> {
        let signer = self.signer.as_ref().ok_or(ClientError::NoIdentity)?;
        let challenge = self.api.create_challenge(&self.client_id).await?;
        let signature = signer.sign_challenge(&challenge);
        let verified = self
            .api
            .verify_challenge(&self.client_id, &signature)
            .await?;
        tracing::debug!(expires_in = verified.expires_in, "session issued");
        Ok(verified.token)
    }
}
