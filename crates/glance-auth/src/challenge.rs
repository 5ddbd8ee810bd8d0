//! In-flight authentication challenges.
//!
//! A challenge is the server's half of the handshake: a random nonce the
//! client must sign. Challenges are short-lived and single-use — the store
//! hands each one out through [`ChallengeStore::take`] exactly once.

use std::collections::HashMap;

use glance_protocol::ClientId;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// One outstanding challenge.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// The client that asked for it.
    pub client_id: ClientId,
    /// The base64-encoded nonce the client must sign.
    pub nonce: String,
    /// After this instant the challenge is treated as absent.
    pub expires_at: Instant,
}

impl Challenge {
    /// Returns `true` once `now` is past the expiry instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Holds at most one live challenge per client identifier.
///
/// The map is private and every operation takes the lock for a single
/// bounded step, so callers can never observe or hold a half-updated map.
#[derive(Debug, Default)]
pub struct ChallengeStore {
    challenges: Mutex<HashMap<ClientId, Challenge>>,
}

impl ChallengeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a challenge, superseding any earlier one for the same client.
    ///
    /// Returns the superseded challenge, if any.
    pub async fn issue(&self, challenge: Challenge) -> Option<Challenge> {
        let mut challenges = self.challenges.lock().await;
        challenges.insert(challenge.client_id.clone(), challenge)
    }

    /// Removes and returns the challenge for `client_id`.
    ///
    /// The entry is gone after this call whatever the caller does with it,
    /// so a nonce can be checked against a signature at most once.
    pub async fn take(&self, client_id: &ClientId) -> Option<Challenge> {
        self.challenges.lock().await.remove(client_id)
    }

    /// Evicts every challenge that expired before `now`. Returns how many
    /// were removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut challenges = self.challenges.lock().await;
        let before = challenges.len();
        challenges.retain(|_, challenge| !challenge.is_expired(now));
        before - challenges.len()
    }

    /// Number of stored challenges, expired or not.
    pub async fn len(&self) -> usize {
        self.challenges.lock().await.len()
    }

    /// Returns `true` if no challenges are stored.
    pub async fn is_empty(&self) -> bool {
        self.challenges.lock().await.is_empty()
    }
}
