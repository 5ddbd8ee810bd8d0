//! Public-key lookup for registered clients.
//!
//! glance doesn't decide which clients are trusted — the operator does, by
//! listing `{id, name, public key}` records in a registry. The
//! [`KeyProvider`] trait is the read-only view the [`Authenticator`] has of
//! that registry. [`KeyRegistry`] is the standard implementation: an
//! in-memory index that re-reads its [`RegistrySource`] when a lookup
//! misses, so a client that registers a brand-new key after the server
//! started is picked up without a restart.
//!
//! [`Authenticator`]: crate::Authenticator

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::STANDARD as B64};
use glance_protocol::ClientId;
use tokio::sync::RwLock;

use crate::AuthError;

// ---------------------------------------------------------------------------
// KeyProvider
// ---------------------------------------------------------------------------

/// Resolves a client identifier to its registered public key.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared by every request handler.
/// - `'static` → lives as long as the server.
///
/// # Example
///
/// ```rust
/// use glance_auth::{AuthError, KeyProvider};
/// use glance_protocol::ClientId;
///
/// /// Trusts exactly one client.
/// struct SingleKey {
///     id: ClientId,
///     key: [u8; 32],
/// }
///
/// impl KeyProvider for SingleKey {
///     async fn public_key(&self, client_id: &ClientId) -> Result<Vec<u8>, AuthError> {
///         if *client_id == self.id {
///             Ok(self.key.to_vec())
///         } else {
///             Err(AuthError::UnknownClient(client_id.clone()))
///         }
///     }
/// }
/// ```
pub trait KeyProvider: Send + Sync + 'static {
    /// Returns the raw Ed25519 public key bytes for `client_id`.
    ///
    /// # Errors
    /// [`AuthError::UnknownClient`] if the client isn't registered.
    fn public_key(
        &self,
        client_id: &ClientId,
    ) -> impl Future<Output = Result<Vec<u8>, AuthError>> + Send;

    /// Returns the display name for `client_id`, if the provider knows one.
    ///
    /// Optional extension: providers that only store keys can keep the
    /// default, and the authenticator synthesizes a name instead.
    fn display_name(
        &self,
        client_id: &ClientId,
    ) -> impl Future<Output = Option<String>> + Send {
        let _ = client_id;
        async { None }
    }
}

// ---------------------------------------------------------------------------
// KeyRecord
// ---------------------------------------------------------------------------

/// One registered client, as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// The identifier the client authenticates as.
    pub client_id: ClientId,
    /// The name observers see.
    pub display_name: String,
    /// Base64 (standard alphabet) Ed25519 public key.
    pub public_key: String,
}

impl KeyRecord {
    /// Creates a record.
    pub fn new(
        client_id: impl Into<ClientId>,
        display_name: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            display_name: display_name.into(),
            public_key: public_key.into(),
        }
    }

    /// Decodes the base64 public key.
    fn public_key_bytes(&self) -> Result<Vec<u8>, AuthError> {
        B64.decode(&self.public_key)
            .map_err(|_| AuthError::InvalidPublicKey(self.client_id.clone()))
    }
}

// ---------------------------------------------------------------------------
// RegistrySource
// ---------------------------------------------------------------------------

/// Where a [`KeyRegistry`] reads its records from.
///
/// The collector's implementation reads the operator's JSON config file;
/// tests use [`StaticSource`] or an in-memory source they can mutate.
pub trait RegistrySource: Send + Sync + 'static {
    /// Reads the full current list of registered clients.
    fn load(
        &self,
    ) -> impl Future<Output = Result<Vec<KeyRecord>, AuthError>> + Send;
}

/// A fixed list of records. Reloading it is a no-op.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<KeyRecord>);

impl RegistrySource for StaticSource {
    async fn load(&self) -> Result<Vec<KeyRecord>, AuthError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// KeyRegistry
// ---------------------------------------------------------------------------

/// A reloadable, in-memory index of registered clients.
///
/// Lookups read from an id → record map. A public-key lookup that misses
/// triggers exactly one reload of the source and one retry before the
/// client is reported as unknown.
pub struct KeyRegistry<S: RegistrySource> {
    source: S,
    records: RwLock<HashMap<ClientId, KeyRecord>>,
}

impl<S: RegistrySource> KeyRegistry<S> {
    /// Creates a registry and performs the initial load.
    ///
    /// # Errors
    /// Whatever the source returns if the initial load fails.
    pub async fn new(source: S) -> Result<Self, AuthError> {
        let registry = Self {
            source,
            records: RwLock::new(HashMap::new()),
        };
        registry.reload().await?;
        Ok(registry)
    }

    /// Re-reads the source and swaps in the new index. Returns the number
    /// of registered clients.
    ///
    /// The old index stays in place if the source fails.
    pub async fn reload(&self) -> Result<usize, AuthError> {
        let loaded = self.source.load().await?;
        let index: HashMap<ClientId, KeyRecord> = loaded
            .into_iter()
            .map(|record| (record.client_id.clone(), record))
            .collect();
        let count = index.len();
        *self.records.write().await = index;
        tracing::debug!(clients = count, "key registry loaded");
        Ok(count)
    }

    /// Returns a copy of the record for `client_id` without reloading.
    pub async fn get(&self, client_id: &ClientId) -> Option<KeyRecord> {
        self.records.read().await.get(client_id).cloned()
    }

    /// Number of registered clients in the current index.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if no clients are registered.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<S: RegistrySource> KeyProvider for KeyRegistry<S> {
    async fn public_key(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<u8>, AuthError> {
        if let Some(record) = self.get(client_id).await {
            return record.public_key_bytes();
        }

        // The client may have registered after our last load.
        tracing::debug!(%client_id, "client not in registry, reloading");
        if let Err(e) = self.reload().await {
            tracing::warn!(%client_id, error = %e, "registry reload failed");
            return Err(AuthError::UnknownClient(client_id.clone()));
        }

        self.get(client_id)
            .await
            .ok_or_else(|| AuthError::UnknownClient(client_id.clone()))?
            .public_key_bytes()
    }

    async fn display_name(&self, client_id: &ClientId) -> Option<String> {
        self.get(client_id).await.map(|record| record.display_name)
    }
}
