//! Session types and the store that holds them.
//!
//! A "session" is the server's record of a client that has proven who it
//! is. It tracks:
//! - WHO the client is ([`SessionIdentity`])
//! - HOW later requests prove it (an opaque bearer token)
//! - WHEN the proof stops being accepted (a fixed expiry, no sliding)

use std::collections::HashMap;

use glance_protocol::ClientId;
use tokio::sync::RwLock;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// SessionIdentity
// ---------------------------------------------------------------------------

/// Who a valid bearer token belongs to.
///
/// This is what request handlers get back from
/// [`Authenticator::validate_session`](crate::Authenticator::validate_session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// The registered client identifier.
    pub client_id: ClientId,
    /// The name observers see for this client.
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single issued session.
///
/// Created only after a successful signature verification. Lives until the
/// sweep evicts it after `expires_at` (or the process exits — sessions are
/// never persisted, so a restart forces every client to re-authenticate).
#[derive(Debug, Clone)]
pub struct Session {
    /// The bearer token. Globally unique and opaque to the client.
    pub token: String,
    /// The resolved identity of the client.
    pub identity: SessionIdentity,
    /// Always `creation time + session TTL`.
    pub expires_at: Instant,
}

impl Session {
    /// Returns `true` once `now` is past the expiry instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// All issued sessions, keyed by token.
///
/// Reads vastly outnumber writes (every report validates a token, only a
/// handshake inserts one), so the map sits behind a `RwLock` and lookups
/// from concurrent handlers don't serialize.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly issued session.
    pub async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session);
    }

    /// Looks up the identity behind a token.
    ///
    /// An expired session is reported exactly like a missing one, whether
    /// or not the sweep has removed it yet. The lookup never touches the
    /// expiry.
    pub async fn get(
        &self,
        token: &str,
        now: Instant,
    ) -> Option<SessionIdentity> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|session| !session.is_expired(now))
            .map(|session| session.identity.clone())
    }

    /// Evicts every session that expired before `now`. Returns how many
    /// were removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    /// Number of stored sessions, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn session(token: &str, ttl: Duration) -> Session {
        Session {
            token: token.to_string(),
            identity: SessionIdentity {
                client_id: ClientId::new("C1"),
                display_name: "laptop".into(),
            },
            expires_at: Instant::now() + ttl,
        }
    }

    #[tokio::test]
    async fn test_get_unknown_token_returns_none() {
        let store = SessionStore::new();
        assert!(store.get("nope", Instant::now()).await.is_none());
    }

    #[tokio::test]
    async fn test_get_live_session_returns_identity() {
        let store = SessionStore::new();
        store.insert(session("T", Duration::from_secs(60))).await;

        let identity = store.get("T", Instant::now()).await.unwrap();

        assert_eq!(identity.client_id, ClientId::new("C1"));
        assert_eq!(identity.display_name, "laptop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_expired_but_unswept_returns_none() {
        let store = SessionStore::new();
        store.insert(session("T", Duration::from_secs(10))).await;

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(store.get("T", Instant::now()).await.is_none());
        // Still physically present until the sweep runs.
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_does_not_extend_lifetime() {
        let store = SessionStore::new();
        store.insert(session("T", Duration::from_secs(10))).await;

        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(store.get("T", Instant::now()).await.is_some());
        }
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(store.get("T", Instant::now()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_keeps_live() {
        let store = SessionStore::new();
        store.insert(session("old", Duration::from_secs(1))).await;
        store.insert(session("new", Duration::from_secs(100))).await;

        tokio::time::advance(Duration::from_secs(5)).await;
        let removed = store.sweep(Instant::now()).await;

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("new", Instant::now()).await.is_some());
    }
}
