//! The authenticator: challenge issuance, verification, and sessions.
//!
//! ## Lifecycle
//!
//! ```text
//! create_challenge() ──→ [Challenge] ──→ validate_challenge_and_issue_token()
//!                                               │ (challenge removed first,
//!                                               │  whatever the outcome)
//!                                               ▼
//!                                          [Session] ──→ validate_session()
//!                                               │
//!                                               ▼ (after session TTL)
//!                                          sweep_expired()
//! ```
//!
//! # Concurrency note
//!
//! Challenges and sessions live in two independently locked stores. No
//! lock is held across the registry lookup or the signature math, so a
//! slow verification never stalls a concurrent `validate_session`.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as B64};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use glance_protocol::ClientId;
use rand::TryRngCore;
use rand::rngs::OsRng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    AuthConfig, AuthError, Challenge, ChallengeStore, KeyProvider, Session,
    SessionIdentity, SessionStore,
};

/// A freshly issued bearer token and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The opaque bearer token.
    pub token: String,
    /// Seconds until the token stops being accepted.
    pub expires_in: u64,
}

/// How many entries one sweep evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub challenges: usize,
    pub sessions: usize,
}

/// Orchestrates the challenge-response handshake and session validation.
///
/// Generic over the [`KeyProvider`] so tests can swap in a fixed key set
/// while the collector uses a reloadable registry.
pub struct Authenticator<K: KeyProvider> {
    keys: K,
    config: AuthConfig,
    challenges: ChallengeStore,
    sessions: SessionStore,
}

impl<K: KeyProvider> Authenticator<K> {
    /// Creates an authenticator with empty stores.
    ///
    /// No background work starts here; call
    /// [`spawn_sweeper`](Self::spawn_sweeper) to bound memory use.
    pub fn new(keys: K, config: AuthConfig) -> Self {
        Self {
            keys,
            config,
            challenges: ChallengeStore::new(),
            sessions: SessionStore::new(),
        }
    }

    /// The key provider this authenticator verifies against.
    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// The active configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issues a new challenge for `client_id` and returns its nonce.
    ///
    /// Any earlier challenge for the same client is superseded. The client
    /// does not need to be registered yet; that is checked at verification.
    ///
    /// # Errors
    /// - [`AuthError::MissingField`] — empty client id
    /// - [`AuthError::Randomness`] — the OS random source failed
    pub async fn create_challenge(
        &self,
        client_id: &ClientId,
    ) -> Result<String, AuthError> {
        if client_id.is_empty() {
            return Err(AuthError::MissingField("client_id"));
        }

        let nonce = generate_nonce(self.config.nonce_len)?;
        let superseded = self
            .challenges
            .issue(Challenge {
                client_id: client_id.clone(),
                nonce: nonce.clone(),
                expires_at: Instant::now() + self.config.challenge_ttl,
            })
            .await;

        tracing::debug!(
            %client_id,
            superseded = superseded.is_some(),
            "challenge issued"
        );
        Ok(nonce)
    }

    /// Consumes the client's challenge, verifies `signature` over it, and
    /// issues a session on success.
    ///
    /// The challenge is removed *before* the signature is checked. A second
    /// call for the same client — same or different signature, whether the
    /// first call passed or failed — finds nothing and fails with
    /// [`AuthError::ChallengeNotFound`]. A retrying client has to run a
    /// fresh handshake.
    ///
    /// # Errors
    /// - [`AuthError::MissingField`] — empty client id or signature
    /// - [`AuthError::ChallengeNotFound`] / [`AuthError::ChallengeExpired`]
    /// - [`AuthError::UnknownClient`] — not in the registry after reload
    /// - [`AuthError::MalformedSignature`] / [`AuthError::InvalidSignature`]
    pub async fn validate_challenge_and_issue_token(
        &self,
        client_id: &ClientId,
        signature: &str,
    ) -> Result<IssuedToken, AuthError> {
        if client_id.is_empty() {
            return Err(AuthError::MissingField("client_id"));
        }
        if signature.is_empty() {
            return Err(AuthError::MissingField("signature"));
        }

        let challenge = self
            .challenges
            .take(client_id)
            .await
            .ok_or_else(|| AuthError::ChallengeNotFound(client_id.clone()))?;

        if challenge.is_expired(Instant::now()) {
            return Err(AuthError::ChallengeExpired(client_id.clone()));
        }

        self.verify_signature(client_id, &challenge.nonce, signature)
            .await?;

        let token = uuid::Uuid::new_v4().to_string();
        let display_name = self.resolve_display_name(client_id).await;
        let expires_in = self.config.session_ttl.as_secs();

        self.sessions
            .insert(Session {
                token: token.clone(),
                identity: SessionIdentity {
                    client_id: client_id.clone(),
                    display_name: display_name.clone(),
                },
                expires_at: Instant::now() + self.config.session_ttl,
            })
            .await;

        tracing::info!(%client_id, %display_name, "session issued");
        Ok(IssuedToken { token, expires_in })
    }

    /// Returns the identity behind `token`, or `None` if the token is
    /// unknown or expired. Never extends the session.
    pub async fn validate_session(
        &self,
        token: &str,
    ) -> Option<SessionIdentity> {
        if token.is_empty() {
            return None;
        }
        self.sessions.get(token, Instant::now()).await
    }

    /// Checks an Ed25519 signature over `nonce` against the public key
    /// registered for `client_id`. Touches neither store.
    pub async fn verify_signature(
        &self,
        client_id: &ClientId,
        nonce: &str,
        signature: &str,
    ) -> Result<(), AuthError> {
        let key_bytes = self.keys.public_key(client_id).await?;
        let key = VerifyingKey::try_from(key_bytes.as_slice())
            .map_err(|_| AuthError::InvalidPublicKey(client_id.clone()))?;

        let sig_bytes = B64
            .decode(signature)
            .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;
        let sig = Signature::from_slice(&sig_bytes)
            .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

        key.verify(nonce.as_bytes(), &sig)
            .map_err(|_| AuthError::InvalidSignature(client_id.clone()))
    }

    /// Evicts every expired challenge and session.
    ///
    /// Only bounds memory: both lookup paths check expiry on their own, so
    /// correctness never depends on when this runs.
    pub async fn sweep_expired(&self) -> SweepReport {
        let now = Instant::now();
        let report = SweepReport {
            challenges: self.challenges.sweep(now).await,
            sessions: self.sessions.sweep(now).await,
        };
        if report != SweepReport::default() {
            tracing::debug!(
                challenges = report.challenges,
                sessions = report.sessions,
                "expired auth state swept"
            );
        }
        report
    }

    /// Number of outstanding challenges (including not-yet-swept expired ones).
    pub async fn pending_challenges(&self) -> usize {
        self.challenges.len().await
    }

    /// Number of stored sessions (including not-yet-swept expired ones).
    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// Spawns the periodic sweep. Runs every `config.sweep_interval` until
    /// `cancel` fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let period = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep_expired().await;
                    }
                }
            }
            tracing::debug!("auth sweeper stopped");
        })
    }

    async fn resolve_display_name(&self, client_id: &ClientId) -> String {
        match self.keys.display_name(client_id).await {
            Some(name) if !name.is_empty() => name,
            _ => format!("Client-{client_id}"),
        }
    }
}

/// Generates `len` bytes from the OS random source, base64-encoded.
fn generate_nonce(len: usize) -> Result<String, AuthError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Randomness(e.to_string()))?;
    Ok(B64.encode(bytes))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `Authenticator`.
    //!
    //! Time-dependent behavior (challenge/session expiry, the sweeper) runs
    //! on Tokio's paused clock, so `advance` moves time forward instantly
    //! and deterministically.

    use std::time::Duration;

    use super::*;
    use crate::{ClientSigner, KeyRecord, KeyRegistry, StaticSource};

    // -- Helpers ----------------------------------------------------------

    /// A key provider that knows keys but no names.
    struct KeysOnly(Vec<(ClientId, Vec<u8>)>);

    impl KeyProvider for KeysOnly {
        async fn public_key(
            &self,
            client_id: &ClientId,
        ) -> Result<Vec<u8>, AuthError> {
            self.0
                .iter()
                .find(|(id, _)| id == client_id)
                .map(|(_, key)| key.clone())
                .ok_or_else(|| AuthError::UnknownClient(client_id.clone()))
        }
    }

    fn cid(id: &str) -> ClientId {
        ClientId::new(id)
    }

    async fn setup(
        config: AuthConfig,
    ) -> (Authenticator<KeyRegistry<StaticSource>>, ClientSigner) {
        let signer = ClientSigner::generate();
        let registry = KeyRegistry::new(StaticSource(vec![KeyRecord::new(
            "C1",
            "laptop",
            signer.public_key_base64(),
        )]))
        .await
        .unwrap();
        (Authenticator::new(registry, config), signer)
    }

    // =====================================================================
    // create_challenge()
    // =====================================================================

    #[tokio::test]
    async fn test_create_challenge_returns_32_byte_base64_nonce() {
        let (auth, _) = setup(AuthConfig::default()).await;

        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();

        assert_eq!(B64.decode(&nonce).unwrap().len(), 32);
        assert_eq!(auth.pending_challenges().await, 1);
    }

    #[tokio::test]
    async fn test_create_challenge_empty_client_id_returns_missing_field() {
        let (auth, _) = setup(AuthConfig::default()).await;

        let result = auth.create_challenge(&cid("")).await;

        assert!(matches!(result, Err(AuthError::MissingField("client_id"))));
    }

    #[tokio::test]
    async fn test_create_challenge_twice_supersedes_first() {
        let (auth, signer) = setup(AuthConfig::default()).await;
        let first = auth.create_challenge(&cid("C1")).await.unwrap();
        let _second = auth.create_challenge(&cid("C1")).await.unwrap();

        // A signature over the superseded nonce no longer works.
        let result = auth
            .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&first))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidSignature(_))));
        assert_eq!(auth.pending_challenges().await, 0);
    }

    // =====================================================================
    // validate_challenge_and_issue_token()
    // =====================================================================

    #[tokio::test]
    async fn test_validate_valid_signature_issues_token() {
        let (auth, signer) = setup(AuthConfig::default()).await;
        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();

        let issued = auth
            .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&nonce))
            .await
            .unwrap();

        assert!(!issued.token.is_empty());
        assert_eq!(issued.expires_in, 86400);
        let identity = auth.validate_session(&issued.token).await.unwrap();
        assert_eq!(identity.client_id, cid("C1"));
        assert_eq!(identity.display_name, "laptop");
    }

    #[tokio::test]
    async fn test_validate_replay_after_success_returns_not_found() {
        let (auth, signer) = setup(AuthConfig::default()).await;
        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();
        let sig = signer.sign_challenge(&nonce);
        auth.validate_challenge_and_issue_token(&cid("C1"), &sig)
            .await
            .unwrap();

        let replay = auth.validate_challenge_and_issue_token(&cid("C1"), &sig).await;

        assert!(matches!(replay, Err(AuthError::ChallengeNotFound(_))));
    }

    #[tokio::test]
    async fn test_validate_after_failed_attempt_returns_not_found() {
        // A failed verification still consumes the challenge, so the
        // correct signature can't be tried afterwards.
        let (auth, signer) = setup(AuthConfig::default()).await;
        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();
        let wrong = ClientSigner::generate().sign_challenge(&nonce);

        let first = auth.validate_challenge_and_issue_token(&cid("C1"), &wrong).await;
        let second = auth
            .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&nonce))
            .await;

        assert!(matches!(first, Err(AuthError::InvalidSignature(_))));
        assert!(matches!(second, Err(AuthError::ChallengeNotFound(_))));
    }

    #[tokio::test]
    async fn test_validate_without_challenge_returns_not_found() {
        let (auth, signer) = setup(AuthConfig::default()).await;

        let result = auth
            .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge("x"))
            .await;

        assert!(matches!(result, Err(AuthError::ChallengeNotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_expired_challenge_returns_expired() {
        let (auth, signer) = setup(AuthConfig::default()).await;
        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        let result = auth
            .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&nonce))
            .await;

        assert!(matches!(result, Err(AuthError::ChallengeExpired(_))));
        assert_eq!(auth.pending_challenges().await, 0, "expired challenge consumed too");
    }

    #[tokio::test]
    async fn test_validate_empty_signature_returns_missing_field() {
        let (auth, _) = setup(AuthConfig::default()).await;
        auth.create_challenge(&cid("C1")).await.unwrap();

        let result = auth.validate_challenge_and_issue_token(&cid("C1"), "").await;

        assert!(matches!(result, Err(AuthError::MissingField("signature"))));
        // Rejected before the store was touched.
        assert_eq!(auth.pending_challenges().await, 1);
    }

    #[tokio::test]
    async fn test_validate_unknown_client_returns_unknown_client() {
        let (auth, signer) = setup(AuthConfig::default()).await;
        let nonce = auth.create_challenge(&cid("stranger")).await.unwrap();

        let result = auth
            .validate_challenge_and_issue_token(&cid("stranger"), &signer.sign_challenge(&nonce))
            .await;

        assert!(matches!(result, Err(AuthError::UnknownClient(_))));
    }

    #[tokio::test]
    async fn test_validate_garbage_signature_returns_malformed() {
        let (auth, _) = setup(AuthConfig::default()).await;
        auth.create_challenge(&cid("C1")).await.unwrap();

        let result = auth
            .validate_challenge_and_issue_token(&cid("C1"), "AAAA")
            .await;

        assert!(matches!(result, Err(AuthError::MalformedSignature(_))));
    }

    #[tokio::test]
    async fn test_validate_provider_without_names_synthesizes_name() {
        let signer = ClientSigner::generate();
        let pk = B64.decode(signer.public_key_base64()).unwrap();
        let auth = Authenticator::new(KeysOnly(vec![(cid("C9"), pk)]), AuthConfig::default());
        let nonce = auth.create_challenge(&cid("C9")).await.unwrap();

        let issued = auth
            .validate_challenge_and_issue_token(&cid("C9"), &signer.sign_challenge(&nonce))
            .await
            .unwrap();

        let identity = auth.validate_session(&issued.token).await.unwrap();
        assert_eq!(identity.display_name, "Client-C9");
    }

    #[tokio::test]
    async fn test_validate_tokens_are_unique_per_handshake() {
        let (auth, signer) = setup(AuthConfig::default()).await;
        let mut tokens = Vec::new();
        for _ in 0..3 {
            let nonce = auth.create_challenge(&cid("C1")).await.unwrap();
            let issued = auth
                .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&nonce))
                .await
                .unwrap();
            tokens.push(issued.token);
        }

        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 3);
    }

    // =====================================================================
    // validate_session()
    // =====================================================================

    #[tokio::test]
    async fn test_validate_session_unknown_token_returns_none() {
        let (auth, _) = setup(AuthConfig::default()).await;
        assert!(auth.validate_session("invalid-token-xyz").await.is_none());
        assert!(auth.validate_session("").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_session_after_ttl_returns_none() {
        let config = AuthConfig {
            session_ttl: Duration::from_secs(60),
            ..AuthConfig::default()
        };
        let (auth, signer) = setup(config).await;
        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();
        let issued = auth
            .validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&nonce))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(auth.validate_session(&issued.token).await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(auth.validate_session(&issued.token).await.is_none());
    }

    // =====================================================================
    // verify_signature()
    // =====================================================================

    #[tokio::test]
    async fn test_verify_signature_is_stateless() {
        let (auth, signer) = setup(AuthConfig::default()).await;

        let ok = auth
            .verify_signature(&cid("C1"), "any-nonce", &signer.sign_challenge("any-nonce"))
            .await;

        assert!(ok.is_ok());
        assert_eq!(auth.pending_challenges().await, 0);
        assert_eq!(auth.active_sessions().await, 0);
    }

    // =====================================================================
    // sweep_expired() / spawn_sweeper()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_sweep_expired_evicts_stale_challenges_and_sessions() {
        let config = AuthConfig {
            session_ttl: Duration::from_secs(120),
            ..AuthConfig::default()
        };
        let (auth, signer) = setup(config).await;
        let nonce = auth.create_challenge(&cid("C1")).await.unwrap();
        auth.validate_challenge_and_issue_token(&cid("C1"), &signer.sign_challenge(&nonce))
            .await
            .unwrap();
        auth.create_challenge(&cid("C1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        let first = auth.sweep_expired().await;
        tokio::time::advance(Duration::from_secs(120)).await;
        let second = auth.sweep_expired().await;

        assert_eq!(first, SweepReport { challenges: 1, sessions: 0 });
        assert_eq!(second, SweepReport { challenges: 0, sessions: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_sweeper_runs_periodically_until_cancelled() {
        let config = AuthConfig {
            challenge_ttl: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(10),
            ..AuthConfig::default()
        };
        let (auth, _) = setup(config).await;
        let auth = Arc::new(auth);
        auth.create_challenge(&cid("C1")).await.unwrap();
        let cancel = CancellationToken::new();
        let handle = Arc::clone(&auth).spawn_sweeper(cancel.clone());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(auth.pending_challenges().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
